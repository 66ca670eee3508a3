//! The canonical 2D disk template and its contour sampler.
//!
//! The standardized right-atrium template is an outer disk of radius 0.5
//! with two small circular holes (superior vena cava at the center,
//! inferior vena cava below it) and one pinned interior point for the
//! appendage apex. All contours are sampled starting at angle 3π/2, the
//! angle where the dividing path from the inferior vena cava meets each
//! circle.

use std::f64::consts::{PI, TAU};

use nalgebra::Point2;

use super::contours::ContourRole;

/// A target circle on the template.
#[derive(Debug, Clone, Copy)]
pub struct CircleSpec {
    /// Circle center.
    pub center: Point2<f64>,
    /// Circle radius.
    pub radius: f64,
}

/// Template geometry: one circle per contour role plus the apex pin.
#[derive(Debug, Clone)]
pub struct DiskTemplate {
    /// Tricuspid valve: the outer disk boundary.
    pub valve: CircleSpec,
    /// Superior vena cava hole.
    pub superior: CircleSpec,
    /// Inferior vena cava hole.
    pub inferior: CircleSpec,
    /// Fixed position of the appendage apex.
    pub apex: Point2<f64>,
}

impl Default for DiskTemplate {
    /// The standard template of the FIMH-2019 flattening.
    fn default() -> Self {
        Self {
            valve: CircleSpec {
                center: Point2::new(0.0, 0.0),
                radius: 0.5,
            },
            superior: CircleSpec {
                center: Point2::new(0.0, 0.0),
                radius: 0.05,
            },
            inferior: CircleSpec {
                center: Point2::new(0.0, -0.25),
                radius: 0.05,
            },
            apex: Point2::new(0.10, 0.10),
        }
    }
}

impl DiskTemplate {
    /// The target circle for a contour role.
    pub fn circle(&self, role: ContourRole) -> &CircleSpec {
        match role {
            ContourRole::Valve => &self.valve,
            ContourRole::SuperiorVessel => &self.superior,
            ContourRole::InferiorVessel => &self.inferior,
        }
    }
}

/// Sample `n` target positions uniformly around a circle.
///
/// Angles run over the half-open range `[3π/2, 3π/2 + 2π)`, so sample 0
/// lands exactly at 3π/2 and no sample duplicates it at the far end.
/// Sample `i` pairs positionally with vertex `i` of an ordered contour,
/// which is the entire reason contours are canonically ordered first.
pub fn sample_circle(n: usize, circle: &CircleSpec) -> Vec<Point2<f64>> {
    let start = 3.0 * PI / 2.0;
    (0..n)
        .map(|i| {
            let theta = start + TAU * i as f64 / n as f64;
            Point2::new(
                circle.center.x + circle.radius * theta.cos(),
                circle.center.y + circle.radius * theta.sin(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count_and_radius() {
        let circle = CircleSpec {
            center: Point2::new(0.25, -0.5),
            radius: 0.3,
        };
        let samples = sample_circle(17, &circle);
        assert_eq!(samples.len(), 17);
        for p in &samples {
            let r = (p - circle.center).norm();
            assert!((r - 0.3).abs() < 1e-12);
        }
    }

    #[test]
    fn test_first_sample_at_three_half_pi() {
        // N = 40 valve contour on the default template: first sample at
        // (0.5 cos 3π/2, 0.5 sin 3π/2) = (0, -0.5).
        let template = DiskTemplate::default();
        let samples = sample_circle(40, &template.valve);
        assert!((samples[0].x - 0.0).abs() < 1e-12);
        assert!((samples[0].y + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_spacing_no_duplicate_endpoint() {
        let circle = CircleSpec {
            center: Point2::new(0.0, 0.0),
            radius: 1.0,
        };
        let n = 12;
        let samples = sample_circle(n, &circle);
        let expected_step = TAU / n as f64;
        for i in 0..n {
            let a = samples[i];
            let b = samples[(i + 1) % n];
            let chord = (b - a).norm();
            // Chord length of a uniform step.
            let expected = 2.0 * (expected_step / 2.0).sin();
            assert!((chord - expected).abs() < 1e-12);
        }
        // Last sample must not wrap onto the first.
        assert!((samples[n - 1] - samples[0]).norm() > 1e-6);
    }

    #[test]
    fn test_vessel_circles_scenarios() {
        let template = DiskTemplate::default();

        let ivc = sample_circle(12, &template.inferior);
        for p in &ivc {
            let r = (p - Point2::new(0.0, -0.25)).norm();
            assert!((r - 0.05).abs() < 1e-12);
        }

        let svc = sample_circle(12, &template.superior);
        for p in &svc {
            assert!((p.coords.norm() - 0.05).abs() < 1e-12);
        }
    }

    #[test]
    fn test_circle_lookup_by_role() {
        let template = DiskTemplate::default();
        assert_eq!(template.circle(ContourRole::Valve).radius, 0.5);
        assert_eq!(template.circle(ContourRole::InferiorVessel).center.y, -0.25);
    }
}
