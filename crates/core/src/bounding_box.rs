use crate::Aabb;
use serde::{Deserialize, Serialize};

/// Heading of a box around the vertical axis, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub yaw: f32,
}

/// An annotation box: center, side lengths and heading.
///
/// Boxes produced by the extractor are axis-aligned, so `rotation.yaw` is
/// always `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub center: [f32; 3],
    pub dimensions: [f32; 3],
    pub rotation: Rotation,
}

impl BoundingBox {
    /// Axis-aligned box spanning `aabb` exactly. `None` for an empty `Aabb`.
    pub fn from_aabb(aabb: &Aabb) -> Option<Self> {
        Some(Self {
            center: aabb.center()?,
            dimensions: aabb.extent()?,
            rotation: Rotation::default(),
        })
    }
}
