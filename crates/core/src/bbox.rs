/// Running per-axis min/max over a set of points.
///
/// Non-finite points are ignored, so an `Aabb` built only from NaN or
/// infinite coordinates stays empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
    empty: bool,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn expand_with_point(&mut self, point: [f32; 3]) {
        if !point.iter().all(|v| v.is_finite()) {
            return;
        }

        if self.empty {
            self.min = point;
            self.max = point;
            self.empty = false;
            return;
        }

        for (axis, &val) in point.iter().enumerate() {
            self.min[axis] = self.min[axis].min(val);
            self.max[axis] = self.max[axis].max(val);
        }
    }

    /// Midpoint `(min + max) / 2` on each axis. `None` when empty.
    pub fn center(&self) -> Option<[f32; 3]> {
        if self.empty {
            return None;
        }
        Some(std::array::from_fn(|axis| {
            (self.min[axis] + self.max[axis]) / 2.0
        }))
    }

    /// Side lengths `max - min` on each axis. `None` when empty.
    pub fn extent(&self) -> Option<[f32; 3]> {
        if self.empty {
            return None;
        }
        Some(std::array::from_fn(|axis| self.max[axis] - self.min[axis]))
    }

    pub fn from_xyz(x: &[f32], y: &[f32], z: &[f32]) -> Self {
        let n = x.len().min(y.len()).min(z.len());
        let mut aabb = Self::empty();
        for i in 0..n {
            aabb.expand_with_point([x[i], y[i], z[i]]);
        }
        aabb
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<[f32; 3]> for Aabb {
    fn from_iter<I: IntoIterator<Item = [f32; 3]>>(iter: I) -> Self {
        let mut aabb = Self::empty();
        for p in iter {
            aabb.expand_with_point(p);
        }
        aabb
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb;

    #[test]
    fn empty_has_no_center_or_extent() {
        let aabb = Aabb::empty();
        assert!(aabb.is_empty());
        assert_eq!(aabb.center(), None);
        assert_eq!(aabb.extent(), None);
    }

    #[test]
    fn single_point_has_zero_extent() {
        let aabb: Aabb = [[1.0, -2.0, 3.0]].into_iter().collect();
        assert_eq!(aabb.center(), Some([1.0, -2.0, 3.0]));
        assert_eq!(aabb.extent(), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn center_and_extent_follow_min_max() {
        let aabb: Aabb = [[0.0, 0.0, 0.0], [0.0, 0.0, 2.0], [0.0, 0.0, 1.0]]
            .into_iter()
            .collect();
        assert_eq!(aabb.min, [0.0, 0.0, 0.0]);
        assert_eq!(aabb.max, [0.0, 0.0, 2.0]);
        assert_eq!(aabb.center(), Some([0.0, 0.0, 1.0]));
        assert_eq!(aabb.extent(), Some([0.0, 0.0, 2.0]));
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let aabb: Aabb = [[f32::NAN, 0.0, 0.0], [f32::INFINITY, 1.0, 1.0]]
            .into_iter()
            .collect();
        assert!(aabb.is_empty());
    }

    #[test]
    fn negative_coordinates() {
        let aabb = Aabb::from_xyz(&[-4.0, -2.0], &[1.0, 3.0], &[-1.0, -1.0]);
        assert_eq!(aabb.center(), Some([-3.0, 2.0, -1.0]));
        assert_eq!(aabb.extent(), Some([2.0, 2.0, 0.0]));
    }
}
