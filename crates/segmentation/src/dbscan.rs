use crate::error::{Result, SegmentationError};
use autobox_core::{ClusterLabel, Labeling, PointCloud};
use autobox_spatial::{KdTree, NeighborSearch};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Below this many points the core classification runs on the calling thread.
const PARALLEL_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbscanParams {
    /// Neighborhood radius. Must be positive and finite.
    pub eps: f32,
    /// Neighbors (the point itself included) needed to make a core point.
    pub min_pts: usize,
}

impl Default for DbscanParams {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_pts: 10,
        }
    }
}

impl DbscanParams {
    pub fn new(eps: f32, min_pts: usize) -> Result<Self> {
        let params = Self { eps, min_pts };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(SegmentationError::InvalidParameter {
                name: "eps",
                reason: format!("must be a positive finite number, got {}", self.eps),
            });
        }
        if self.min_pts < 1 {
            return Err(SegmentationError::InvalidParameter {
                name: "min_pts",
                reason: format!("must be at least 1, got {}", self.min_pts),
            });
        }
        Ok(())
    }
}

/// Density-based clustering (DBSCAN) backed by a [`KdTree`].
///
/// See [`dbscan_with_search`] for the algorithm and guarantees.
pub fn dbscan(cloud: &PointCloud, params: &DbscanParams) -> Result<Labeling> {
    params.validate()?;
    if cloud.is_empty() {
        return Ok(Labeling::empty());
    }

    let tree = KdTree::build(cloud);
    dbscan_with_search(cloud, &tree, params)
}

/// Density-based clustering (DBSCAN) over any exact radius search.
///
/// A point whose `eps`-neighborhood (itself included) holds at least
/// `min_pts` points is a core point. Clusters are the closures of core points
/// under neighborhood reachability; non-core points reached from a core point
/// join its cluster as border points without extending it. Everything else is
/// [`ClusterLabel::Noise`].
///
/// Points are scanned by ascending index and cluster ids are handed out in
/// the order clusters are opened, so the result depends only on the input
/// order and the parameters. A border point within reach of several clusters
/// belongs to the one opened first.
///
/// # Algorithm
///
/// 1. Classify every point as core or not by counting its neighbors. This
///    is read-only and runs on the rayon pool for large clouds.
/// 2. Scan points in index order. An unlabeled core point opens a new
///    cluster, which grows breadth-first; the neighborhoods of core points
///    are queried again as they are reached, so memory stays linear.
/// 3. Unlabeled non-core points seen by the scan are marked noise and may be
///    reclaimed as border points by a later expansion.
///
/// `search` must index exactly the points of `cloud`.
pub fn dbscan_with_search<S>(
    cloud: &PointCloud,
    search: &S,
    params: &DbscanParams,
) -> Result<Labeling>
where
    S: NeighborSearch + Sync,
{
    params.validate()?;
    let n = cloud.len();
    if n == 0 {
        return Ok(Labeling::empty());
    }

    let eps = params.eps;
    let min_pts = params.min_pts;

    let classify = |i: usize| search.radius_count(&cloud.point(i), eps) >= min_pts;
    let is_core: Vec<bool> = if n >= PARALLEL_THRESHOLD {
        (0..n).into_par_iter().map(classify).collect()
    } else {
        (0..n).map(classify).collect()
    };

    let mut labels: Vec<Option<ClusterLabel>> = vec![None; n];
    let mut next_id = 0usize;
    let mut frontier = VecDeque::new();

    for seed in 0..n {
        if labels[seed].is_some() {
            continue;
        }
        if !is_core[seed] {
            labels[seed] = Some(ClusterLabel::Noise);
            continue;
        }

        let id = next_id;
        next_id += 1;
        labels[seed] = Some(ClusterLabel::Cluster(id));
        frontier.extend(search.radius_search(&cloud.point(seed), eps));

        while let Some(j) = frontier.pop_front() {
            match labels[j] {
                Some(ClusterLabel::Cluster(_)) => {}
                // Noise is only ever assigned to non-core points: reclaim as border.
                Some(ClusterLabel::Noise) => labels[j] = Some(ClusterLabel::Cluster(id)),
                None => {
                    labels[j] = Some(ClusterLabel::Cluster(id));
                    if is_core[j] {
                        frontier.extend(search.radius_search(&cloud.point(j), eps));
                    }
                }
            }
        }
    }

    let labels: Vec<ClusterLabel> = labels
        .into_iter()
        .map(|l| l.unwrap_or(ClusterLabel::Noise))
        .collect();
    let labeling = Labeling::from_labels(labels);

    debug!(
        points = n,
        clusters = labeling.num_clusters(),
        noise = labeling.noise_count(),
        eps,
        min_pts,
        "dbscan finished"
    );

    Ok(labeling)
}
