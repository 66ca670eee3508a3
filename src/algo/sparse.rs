//! Sparse matrix and conjugate gradient solver.
//!
//! A compact CSR matrix plus a conjugate gradient solve, which is all the
//! constrained flattener needs: after Dirichlet elimination its systems are
//! symmetric and (for clamped cotangent weights on a connected region)
//! positive definite. The matrix-vector product is the only expensive step
//! in the whole pipeline and runs on rayon.

use nalgebra::DVector;
use rayon::prelude::*;

use crate::error::{FlatError, Result};

/// Compressed sparse row matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build a CSR matrix from (row, col, value) triplets.
    ///
    /// Duplicate entries at the same position are summed.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        // Merge duplicates; sorting made them adjacent.
        let mut merged: Vec<(usize, usize, f64)> = Vec::with_capacity(triplets.len());
        for (row, col, val) in triplets {
            debug_assert!(row < rows && col < cols);
            match merged.last_mut() {
                Some(last) if last.0 == row && last.1 == col => last.2 += val,
                _ => merged.push((row, col, val)),
            }
        }

        let mut row_ptr = vec![0usize; rows + 1];
        for &(row, _, _) in &merged {
            row_ptr[row + 1] += 1;
        }
        for i in 0..rows {
            row_ptr[i + 1] += row_ptr[i];
        }

        let col_idx: Vec<usize> = merged.iter().map(|t| t.1).collect();
        let values: Vec<f64> = merged.iter().map(|t| t.2).collect();

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Number of stored non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Compute `y = A * x`, one rayon task per chunk of rows.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "vector dimension mismatch");

        let y: Vec<f64> = (0..self.rows)
            .into_par_iter()
            .map(|i| {
                let mut sum = 0.0;
                for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                    sum += self.values[k] * x[self.col_idx[k]];
                }
                sum
            })
            .collect();

        DVector::from_vec(y)
    }
}

/// Solve `A * x = b` with the conjugate gradient method.
///
/// `A` must be symmetric positive definite. Converges when the relative
/// residual drops below `tolerance`.
///
/// # Errors
///
/// [`FlatError::ConvergenceFailed`] if the residual has not dropped below
/// tolerance after `max_iter` iterations, which for the flattener's systems
/// indicates a singular or badly conditioned constraint topology.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    max_iter: usize,
    tolerance: f64,
) -> Result<DVector<f64>> {
    let n = b.len();
    assert_eq!(a.nrows(), n, "matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), n, "matrix must be square");

    let mut x = DVector::zeros(n);

    let b_norm = b.norm();
    if b_norm < 1e-15 {
        // Zero right-hand side: the zero vector is exact.
        return Ok(x);
    }

    let mut r = b.clone();
    let mut p = r.clone();
    let mut r_norm_sq = r.dot(&r);

    for _ in 0..max_iter {
        if r_norm_sq.sqrt() / b_norm < tolerance {
            return Ok(x);
        }

        let ap = a.mul_vec(&p);
        let p_ap = p.dot(&ap);
        if p_ap.abs() < 1e-300 {
            break;
        }
        let alpha = r_norm_sq / p_ap;

        x += alpha * &p;
        r -= alpha * &ap;

        let r_new = r.dot(&r);
        let beta = r_new / r_norm_sq;
        p = &r + beta * &p;
        r_norm_sq = r_new;
    }

    if r_norm_sq.sqrt() / b_norm < tolerance {
        return Ok(x);
    }

    Err(FlatError::ConvergenceFailed {
        iterations: max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_from_triplets() {
        // [ 4 1 ]
        // [ 1 3 ]
        let a = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)],
        );
        assert_eq!(a.nrows(), 2);
        assert_eq!(a.ncols(), 2);
        assert_eq!(a.nnz(), 4);
    }

    #[test]
    fn test_csr_sums_duplicates() {
        let a = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 2.0), (0, 0, 2.0), (0, 1, 1.0), (1, 1, 3.0)],
        );
        let x = DVector::from_vec(vec![1.0, 0.0]);
        let y = a.mul_vec(&x);
        assert!((y[0] - 4.0).abs() < 1e-12);
        assert!((y[1] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_csr_empty_rows() {
        let a = CsrMatrix::from_triplets(3, 3, vec![(2, 2, 5.0)]);
        let x = DVector::from_vec(vec![1.0, 1.0, 1.0]);
        let y = a.mul_vec(&x);
        assert_eq!(y[0], 0.0);
        assert_eq!(y[1], 0.0);
        assert!((y[2] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_cg_solves_spd_system() {
        // [ 4 1 ] [x]   [1]      x = 1/11, y = 7/11
        // [ 1 3 ] [y] = [2]
        let a = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)],
        );
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let x = conjugate_gradient(&a, &b, 100, 1e-12).unwrap();
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-9);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_cg_zero_rhs() {
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, 1.0)]);
        let b = DVector::zeros(2);
        let x = conjugate_gradient(&a, &b, 10, 1e-12).unwrap();
        assert_eq!(x.norm(), 0.0);
    }

    #[test]
    fn test_cg_diagonally_dominant() {
        let mut triplets = Vec::new();
        let n = 20;
        for i in 0..n {
            triplets.push((i, i, 4.0));
            if i + 1 < n {
                triplets.push((i, i + 1, -1.0));
                triplets.push((i + 1, i, -1.0));
            }
        }
        let a = CsrMatrix::from_triplets(n, n, triplets);
        let b = DVector::from_element(n, 1.0);
        let x = conjugate_gradient(&a, &b, 1000, 1e-12).unwrap();
        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-9);
    }
}
