#![forbid(unsafe_code)]

pub mod dbscan;
pub mod error;
pub mod extract;

pub use dbscan::{dbscan, dbscan_with_search, DbscanParams};
pub use error::SegmentationError;
pub use extract::{extract_bounding_boxes, extract_cluster_boxes, ClusterBox};
