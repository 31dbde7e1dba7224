use crate::search::{squared_distance, squared_radius, valid_query, NeighborSearch};
use autobox_core::PointCloud;
use kiddo::float::distance::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;

/// A KdTree for radius queries on 3D point clouds.
///
/// Built on top of kiddo v5's `ImmutableKdTree`, which uses a cache-optimized
/// layout for faster queries than the mutable variant. The tree is built once
/// and cannot be modified afterwards.
///
/// Only points with finite coordinates are inserted. The tree's items are
/// positions into `points`/`ids`; `ids` maps them back to cloud indices.
#[derive(Debug, Clone)]
pub struct KdTree {
    tree: ImmutableKdTree<f32, u32, 3, 32>,
    points: Vec<[f32; 3]>,
    ids: Vec<usize>,
}

impl KdTree {
    /// Build a KdTree from a PointCloud, skipping non-finite points.
    pub fn build(cloud: &PointCloud) -> Self {
        let mut points = Vec::with_capacity(cloud.len());
        let mut ids = Vec::with_capacity(cloud.len());
        for i in 0..cloud.len() {
            if cloud.is_finite(i) {
                points.push(cloud.point(i));
                ids.push(i);
            }
        }

        let tree = ImmutableKdTree::new_from_slice(&points);

        Self { tree, points, ids }
    }

    /// Number of indexed (finite) points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find all points within `radius` (Euclidean distance) of `query`.
    ///
    /// Returns cloud indices of points where `dist <= radius`, ascending.
    ///
    /// Edge cases:
    /// - Returns empty if radius <= 0, cloud is empty, radius is non-finite,
    ///   or query contains NaN.
    pub fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        if self.is_empty() || !valid_query(query, radius) {
            return Vec::new();
        }

        let radius_sq = squared_radius(radius);

        // kiddo's `within_unsorted` uses strict `<` and sums in f32. Query a
        // hair wider, then decide membership with `squared_distance` so the
        // boundary matches the other backends bit for bit.
        let query_radius_sq = radius_sq * (1.0 + 8.0 * f64::from(f32::EPSILON))
            + f64::from(f32::MIN_POSITIVE);

        let slots: Vec<usize> = if query_radius_sq < f64::from(f32::MAX) / 2.0 {
            self.tree
                .within_unsorted::<SquaredEuclidean>(query, query_radius_sq as f32)
                .into_iter()
                .map(|nn| nn.item as usize)
                .collect()
        } else {
            // kiddo's f32 distances would overflow; every point is a candidate.
            (0..self.points.len()).collect()
        };

        let mut indices: Vec<usize> = slots
            .into_iter()
            .filter(|&slot| squared_distance(query, &self.points[slot]) <= radius_sq)
            .map(|slot| self.ids[slot])
            .collect();

        // Sort by index for deterministic output order
        indices.sort_unstable();

        indices
    }
}

impl NeighborSearch for KdTree {
    fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        KdTree::radius_search(self, query, radius)
    }
}
