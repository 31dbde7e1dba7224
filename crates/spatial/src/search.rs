use autobox_core::PointCloud;

/// Exact fixed-radius neighbor queries over an immutable point set.
///
/// Every implementation returns the indices `j` whose point satisfies
/// `squared_distance(query, p_j) <= squared_radius(radius)`, sorted ascending.
/// Points with a non-finite coordinate are never returned, and a non-finite
/// query or radius, or a radius `<= 0`, yields no neighbors.
pub trait NeighborSearch {
    fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize>;

    /// Number of neighbors within `radius`. Implementations may override this
    /// to avoid materializing the index list.
    fn radius_count(&self, query: &[f32; 3], radius: f32) -> usize {
        self.radius_search(query, radius).len()
    }
}

/// Squared Euclidean distance in f64, summed x then y then z.
///
/// All search backends compare with this exact expression so they agree on
/// points lying on the radius boundary. Any two finite `f32` points give a
/// finite result.
#[inline]
pub fn squared_distance(a: &[f32; 3], b: &[f32; 3]) -> f64 {
    let dx = f64::from(a[0]) - f64::from(b[0]);
    let dy = f64::from(a[1]) - f64::from(b[1]);
    let dz = f64::from(a[2]) - f64::from(b[2]);
    dx * dx + dy * dy + dz * dz
}

/// `radius * radius` in f64; finite for every finite `f32` radius.
#[inline]
pub fn squared_radius(radius: f32) -> f64 {
    let r = f64::from(radius);
    r * r
}

pub(crate) fn valid_query(query: &[f32; 3], radius: f32) -> bool {
    radius > 0.0 && radius.is_finite() && query.iter().all(|v| v.is_finite())
}

/// O(n) per query linear scan. The reference every index is checked against.
#[derive(Debug, Clone, Copy)]
pub struct BruteForce<'a> {
    cloud: &'a PointCloud,
}

impl<'a> BruteForce<'a> {
    pub fn new(cloud: &'a PointCloud) -> Self {
        Self { cloud }
    }
}

impl NeighborSearch for BruteForce<'_> {
    fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        if !valid_query(query, radius) {
            return Vec::new();
        }
        let radius_sq = squared_radius(radius);

        (0..self.cloud.len())
            .filter(|&j| {
                self.cloud.is_finite(j)
                    && squared_distance(query, &self.cloud.point(j)) <= radius_sq
            })
            .collect()
    }

    fn radius_count(&self, query: &[f32; 3], radius: f32) -> usize {
        if !valid_query(query, radius) {
            return 0;
        }
        let radius_sq = squared_radius(radius);

        (0..self.cloud.len())
            .filter(|&j| {
                self.cloud.is_finite(j)
                    && squared_distance(query, &self.cloud.point(j)) <= radius_sq
            })
            .count()
    }
}
