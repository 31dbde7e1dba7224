use anyhow::{Context, Result};
use autobox::{run, IndexKind, PipelineConfig};
use autobox_segmentation::DbscanParams;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cluster a point cloud with DBSCAN and write one bounding box per cluster.
#[derive(Parser, Debug)]
#[command(name = "autobox", version, about)]
struct Args {
    /// Point cloud to label (.pcd, .ply, .xyz, .txt, .pts)
    input: PathBuf,

    /// Where to write the JSON list of boxes
    output: PathBuf,

    /// Neighborhood radius, in the cloud's units
    #[arg(long, default_value_t = 0.5)]
    eps: f32,

    /// Neighbors (the point included) that make a point a core point
    #[arg(long, default_value_t = 10)]
    min_pts: usize,

    /// Neighbor search backend
    #[arg(long, value_enum, default_value_t = IndexKind::KdTree)]
    index: IndexKind,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = PipelineConfig {
        dbscan: DbscanParams {
            eps: args.eps,
            min_pts: args.min_pts,
        },
        index: args.index,
    };

    let boxes = run(&args.input, &args.output, &config)
        .with_context(|| format!("labeling {} failed", args.input.display()))?;
    println!("{} boxes written to {}", boxes, args.output.display());
    Ok(())
}
