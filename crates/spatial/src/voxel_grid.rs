use crate::search::{squared_distance, squared_radius, valid_query, NeighborSearch};
use autobox_core::PointCloud;
use hashbrown::HashMap;

/// Uniform hash grid over the finite points of a cloud.
///
/// Each point lives in the cube `floor(p / cell_size)`. A radius query visits
/// every cube overlapping the query's bounding cube (plus a small slack for
/// float rounding) and keeps the candidates that pass the exact
/// `squared_distance` test. Works best when `cell_size` is close to the query
/// radius.
#[derive(Debug, Clone)]
pub struct VoxelGrid<'a> {
    cloud: &'a PointCloud,
    cell_size: f64,
    cells: HashMap<[i64; 3], Vec<usize>>,
    len: usize,
}

impl<'a> VoxelGrid<'a> {
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    pub fn build(cloud: &'a PointCloud, cell_size: f32) -> Self {
        assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "cell size must be positive and finite"
        );
        let cell_size = f64::from(cell_size);

        let mut cells: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
        let mut len = 0;
        for i in 0..cloud.len() {
            if !cloud.is_finite(i) {
                continue;
            }
            let p = cloud.point(i);
            let key = std::array::from_fn(|axis| cell_of(f64::from(p[axis]), cell_size));
            cells.entry(key).or_default().push(i);
            len += 1;
        }

        Self {
            cloud,
            cell_size,
            cells,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    fn candidates(&self, query: &[f32; 3], radius: f32, out: &mut Vec<usize>) {
        let r = f64::from(radius);
        let mut lo = [0i64; 3];
        let mut hi = [0i64; 3];
        let mut span: u128 = 1;
        for axis in 0..3 {
            let q = f64::from(query[axis]);
            let slack = r * 1e-5 + (q.abs() + r) * 1e-6;
            lo[axis] = cell_of(q - r - slack, self.cell_size);
            hi[axis] = cell_of(q + r + slack, self.cell_size);
            span = span.saturating_mul((hi[axis] - lo[axis] + 1) as u128);
        }

        // A radius much larger than the cells: walking occupied cells is cheaper.
        if span > self.cells.len() as u128 {
            for (key, members) in &self.cells {
                if (0..3).all(|axis| key[axis] >= lo[axis] && key[axis] <= hi[axis]) {
                    out.extend_from_slice(members);
                }
            }
            return;
        }

        for cx in lo[0]..=hi[0] {
            for cy in lo[1]..=hi[1] {
                for cz in lo[2]..=hi[2] {
                    if let Some(members) = self.cells.get(&[cx, cy, cz]) {
                        out.extend_from_slice(members);
                    }
                }
            }
        }
    }
}

fn cell_of(v: f64, cell_size: f64) -> i64 {
    (v / cell_size).floor() as i64
}

impl NeighborSearch for VoxelGrid<'_> {
    fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        if self.is_empty() || !valid_query(query, radius) {
            return Vec::new();
        }
        let radius_sq = squared_radius(radius);

        let mut indices = Vec::new();
        self.candidates(query, radius, &mut indices);
        indices.retain(|&j| squared_distance(query, &self.cloud.point(j)) <= radius_sq);
        indices.sort_unstable();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::VoxelGrid;
    use crate::search::{BruteForce, NeighborSearch};
    use autobox_core::PointCloud;
    use proptest::prelude::*;

    #[test]
    fn groups_points_by_cell() {
        let cloud = PointCloud::from_points(&[
            [0.1, 0.1, 0.1],
            [0.2, 0.2, 0.2],
            [1.5, 0.1, 0.1],
            [-0.5, 0.0, 0.0],
        ]);
        let grid = VoxelGrid::build(&cloud, 1.0);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.num_cells(), 3);
    }

    #[test]
    fn huge_radius_keeps_far_points_out() {
        let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0], [1e30, 0.0, 0.0]]);
        let grid = VoxelGrid::build(&cloud, 2e19);
        assert_eq!(grid.radius_search(&[0.0, 0.0, 0.0], 2e19), vec![0]);
        assert_eq!(grid.radius_search(&[1e30, 0.0, 0.0], 2e19), vec![1]);
    }

    #[test]
    fn finds_neighbors_across_cell_boundary() {
        let e = 1e-5_f32;
        let cloud = PointCloud::from_points(&[[1.0 - e, 0.0, 0.0], [1.0 + e, 0.0, 0.0]]);
        let grid = VoxelGrid::build(&cloud, 1.0);
        assert_eq!(grid.radius_search(&cloud.point(0), 0.5), vec![0, 1]);
    }

    #[test]
    fn exact_boundary_is_included() {
        let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0], [0.0, 0.0, 1.5], [0.0, 0.0, 3.0]]);
        let grid = VoxelGrid::build(&cloud, 1.5);
        assert_eq!(grid.radius_search(&[0.0, 0.0, 1.5], 1.5), vec![0, 1, 2]);
    }

    #[test]
    fn radius_larger_than_cells() {
        let cloud: PointCloud = (0..50).map(|i| [i as f32, 0.0, 0.0]).collect();
        let grid = VoxelGrid::build(&cloud, 0.25);
        let got = grid.radius_search(&[25.0, 0.0, 0.0], 10.0);
        assert_eq!(got, (15..=35).collect::<Vec<usize>>());
    }

    #[test]
    fn skips_non_finite_points() {
        let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0], [f32::NAN, 0.0, 0.0]]);
        let grid = VoxelGrid::build(&cloud, 1.0);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.radius_search(&[0.0, 0.0, 0.0], 100.0), vec![0]);
    }

    #[test]
    #[should_panic]
    fn zero_cell_size_panics() {
        let cloud = PointCloud::new();
        let _ = VoxelGrid::build(&cloud, 0.0);
    }

    proptest! {
        #[test]
        fn radius_search_matches_brute_force(
            pts in prop::collection::vec(
                (-50.0f32..50.0f32, -50.0f32..50.0f32, -50.0f32..50.0f32),
                1..200
            ),
            cell in 0.2f32..10.0f32,
            radius in 0.1f32..20.0f32,
            q in 0usize..200,
        ) {
            let cloud: PointCloud = pts.iter().map(|&(x, y, z)| [x, y, z]).collect();
            let grid = VoxelGrid::build(&cloud, cell);
            let query = cloud.point(q % cloud.len());
            let got = grid.radius_search(&query, radius);
            let expected = BruteForce::new(&cloud).radius_search(&query, radius);
            prop_assert_eq!(got, expected);
        }
    }
}
