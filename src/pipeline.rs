use autobox_core::{BoundingBox, PointCloud};
use autobox_io::{read_point_cloud, write_boxes_json, IoError};
use autobox_segmentation::{
    dbscan_with_search, extract_bounding_boxes, DbscanParams, SegmentationError,
};
use autobox_spatial::{BruteForce, KdTree, VoxelGrid};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Neighbor search backend used by DBSCAN. All of them give identical labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum IndexKind {
    #[default]
    #[value(name = "kdtree")]
    #[serde(rename = "kdtree")]
    KdTree,
    /// Uniform hash grid with `eps`-sized cells.
    Grid,
    /// Linear scan. Quadratic, for small clouds and cross-checks.
    BruteForce,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub dbscan: DbscanParams,
    #[serde(default)]
    pub index: IndexKind,
}

impl PipelineConfig {
    pub fn new(eps: f32, min_pts: usize) -> Self {
        Self {
            dbscan: DbscanParams { eps, min_pts },
            index: IndexKind::default(),
        }
    }

    pub fn with_index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load point cloud")]
    Load(#[source] IoError),

    #[error("clustering failed")]
    Segmentation(#[source] SegmentationError),

    #[error("failed to write bounding boxes")]
    Write(#[source] IoError),
}

/// Cluster `cloud` and return one box per cluster, ordered by cluster id.
pub fn detect_boxes(
    cloud: &PointCloud,
    config: &PipelineConfig,
) -> Result<Vec<BoundingBox>, SegmentationError> {
    let params = &config.dbscan;
    params.validate()?;
    if cloud.is_empty() {
        return Ok(Vec::new());
    }

    let start = Instant::now();
    let labeling = match config.index {
        IndexKind::KdTree => dbscan_with_search(cloud, &KdTree::build(cloud), params)?,
        IndexKind::Grid => dbscan_with_search(cloud, &VoxelGrid::build(cloud, params.eps), params)?,
        IndexKind::BruteForce => dbscan_with_search(cloud, &BruteForce::new(cloud), params)?,
    };
    debug!(
        index = ?config.index,
        clusters = labeling.num_clusters(),
        noise = labeling.noise_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "dbscan finished"
    );

    extract_bounding_boxes(cloud, &labeling)
}

/// Load `input`, detect boxes and write them to `output` as JSON.
///
/// Parameters are checked before anything is read, and `output` is left
/// untouched unless loading and clustering both succeed. Returns the number
/// of boxes written.
pub fn run(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<usize, PipelineError> {
    let input = input.as_ref();
    let output = output.as_ref();
    config
        .dbscan
        .validate()
        .map_err(PipelineError::Segmentation)?;

    let cloud = read_point_cloud(input).map_err(PipelineError::Load)?;
    info!(path = %input.display(), points = cloud.len(), "loaded point cloud");
    debug!(extent = ?cloud.aabb().extent(), "scene extent");

    let boxes = detect_boxes(&cloud, config).map_err(PipelineError::Segmentation)?;
    info!(boxes = boxes.len(), "detected clusters");

    write_boxes_json(output, &boxes).map_err(PipelineError::Write)?;
    info!(path = %output.display(), "wrote bounding boxes");
    Ok(boxes.len())
}
