#![forbid(unsafe_code)]

pub mod error;
pub mod json;
pub mod pcd;
pub mod ply;
pub mod xyz;

use autobox_core::PointCloud;
use std::path::Path;
use tracing::debug;

pub use error::IoError;
pub use json::{boxes_to_json, read_boxes_json, write_boxes_json};
pub use pcd::{read_pcd, write_pcd, write_pcd_binary};
pub use ply::{read_ply, write_ply, write_ply_binary};
pub use xyz::read_xyz;

/// Point cloud file formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudFormat {
    Pcd,
    Ply,
    Xyz,
}

impl CloudFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pcd" => Ok(CloudFormat::Pcd),
            "ply" => Ok(CloudFormat::Ply),
            "xyz" | "txt" | "pts" => Ok(CloudFormat::Xyz),
            "" => Err(IoError::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(IoError::UnsupportedFormat(format!(".{}", other))),
        }
    }
}

/// Load a point cloud, picking the decoder from the file extension.
pub fn read_point_cloud(path: impl AsRef<Path>) -> Result<PointCloud, IoError> {
    let path = path.as_ref();
    let format = CloudFormat::from_path(path)?;
    let cloud = match format {
        CloudFormat::Pcd => read_pcd(path)?,
        CloudFormat::Ply => read_ply(path)?,
        CloudFormat::Xyz => read_xyz(path)?,
    };
    debug!(path = %path.display(), ?format, points = cloud.len(), "loaded point cloud");
    Ok(cloud)
}
