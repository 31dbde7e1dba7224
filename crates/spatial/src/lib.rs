#![forbid(unsafe_code)]

pub mod kdtree;
pub mod search;
pub mod voxel_grid;

pub use kdtree::KdTree;
pub use search::{squared_distance, squared_radius, BruteForce, NeighborSearch};
pub use voxel_grid::VoxelGrid;
