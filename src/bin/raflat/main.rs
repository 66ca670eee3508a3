//! raflat CLI - flatten an open right-atrium mesh onto the disk template.
//!
//! Usage: raflat [OPTIONS] <MESHFILE>
//!
//! Run `raflat --help` for available options.

use std::path::PathBuf;

use clap::Parser;

use raflat::pipeline::{self, PipelineOptions};

#[derive(Parser)]
#[command(name = "raflat")]
#[command(author, version, about = "Right-atrium mesh flattening", long_about = None)]
struct Cli {
    /// Input mesh file (legacy ASCII VTK polydata, open atrium surface)
    meshfile: PathBuf,

    /// Reverse contour traversal direction (use if the result is mirrored)
    #[arg(long)]
    flip: bool,

    /// Seed file with 3 picked points: apex, superior vessel, inferior
    /// vessel (defaults to <stem>_seeds.vtk next to the input)
    #[arg(long)]
    seeds: Option<PathBuf>,

    /// Output file (defaults to <stem>_flat.vtk next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let options = PipelineOptions {
        flip: cli.flip,
        ..Default::default()
    };

    if let Err(e) = pipeline::run(
        &cli.meshfile,
        cli.seeds.as_deref(),
        cli.output.as_deref(),
        &options,
    ) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
