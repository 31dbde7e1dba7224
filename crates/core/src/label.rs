use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cluster assignment of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterLabel {
    Noise,
    Cluster(usize),
}

impl ClusterLabel {
    pub fn is_noise(self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }

    pub fn cluster_id(self) -> Option<usize> {
        match self {
            ClusterLabel::Noise => None,
            ClusterLabel::Cluster(id) => Some(id),
        }
    }
}

/// One label per point, indexed like the cloud it was computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labeling {
    labels: Vec<ClusterLabel>,
    num_clusters: usize,
}

impl Labeling {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an arbitrary label vector.
    ///
    /// Cluster ids need not be contiguous; `num_clusters` counts the distinct
    /// ids present.
    pub fn from_labels(labels: Vec<ClusterLabel>) -> Self {
        let mut ids: Vec<usize> = labels.iter().filter_map(|l| l.cluster_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        Self {
            num_clusters: ids.len(),
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    pub fn label(&self, i: usize) -> ClusterLabel {
        self.labels[i]
    }

    pub fn labels(&self) -> &[ClusterLabel] {
        &self.labels
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_noise()).count()
    }

    /// Member indices of every cluster, keyed and iterated by ascending id.
    /// Indices inside each cluster are ascending.
    pub fn clusters(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, label) in self.labels.iter().enumerate() {
            if let ClusterLabel::Cluster(id) = *label {
                clusters.entry(id).or_default().push(i);
            }
        }
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::{ClusterLabel, Labeling};

    #[test]
    fn from_labels_counts_distinct_ids() {
        let labeling = Labeling::from_labels(vec![
            ClusterLabel::Cluster(4),
            ClusterLabel::Noise,
            ClusterLabel::Cluster(1),
            ClusterLabel::Cluster(4),
        ]);
        assert_eq!(labeling.len(), 4);
        assert_eq!(labeling.num_clusters(), 2);
        assert_eq!(labeling.noise_count(), 1);
        assert!(labeling.label(1).is_noise());
    }

    #[test]
    fn clusters_iterate_in_ascending_id_order() {
        let labeling = Labeling::from_labels(vec![
            ClusterLabel::Cluster(7),
            ClusterLabel::Cluster(2),
            ClusterLabel::Cluster(7),
            ClusterLabel::Cluster(0),
        ]);
        let clusters = labeling.clusters();
        let ids: Vec<usize> = clusters.keys().copied().collect();
        assert_eq!(ids, vec![0, 2, 7]);
        assert_eq!(clusters[&7], vec![0, 2]);
    }

    #[test]
    fn empty_labeling() {
        let labeling = Labeling::empty();
        assert!(labeling.is_empty());
        assert_eq!(labeling.num_clusters(), 0);
        assert!(labeling.clusters().is_empty());
    }

    #[test]
    fn label_accessors() {
        assert!(ClusterLabel::Noise.is_noise());
        assert_eq!(ClusterLabel::Noise.cluster_id(), None);
        assert_eq!(ClusterLabel::Cluster(3).cluster_id(), Some(3));
    }
}
