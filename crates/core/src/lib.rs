#![forbid(unsafe_code)]

pub mod bbox;
pub mod bounding_box;
pub mod cloud;
pub mod label;
pub mod point;

pub use bbox::Aabb;
pub use bounding_box::{BoundingBox, Rotation};
pub use cloud::PointCloud;
pub use label::{ClusterLabel, Labeling};
pub use point::PointXYZ;
