//! Auto-labeling of point clouds: load a scan, cluster it with DBSCAN and
//! emit one axis-aligned box per cluster.

#![forbid(unsafe_code)]

pub mod pipeline;

pub use autobox_core as core;
pub use autobox_io as io;
pub use autobox_segmentation as segmentation;
pub use autobox_spatial as spatial;

pub use pipeline::{detect_boxes, run, IndexKind, PipelineConfig, PipelineError};
