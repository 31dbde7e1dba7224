use crate::error::{Result, SegmentationError};
use autobox_core::{Aabb, BoundingBox, Labeling, PointCloud};
use tracing::{debug, warn};

/// A cluster's box together with the id and member count it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterBox {
    pub cluster_id: usize,
    pub num_points: usize,
    pub bbox: BoundingBox,
}

/// One axis-aligned box per cluster, in ascending cluster id order.
///
/// Noise points are ignored. `center` is `(min + max) / 2` and `dimensions`
/// is `max - min` over the cluster's members, with no padding; a cluster of
/// coincident points gets zero dimensions.
pub fn extract_bounding_boxes(
    cloud: &PointCloud,
    labeling: &Labeling,
) -> Result<Vec<BoundingBox>> {
    Ok(extract_cluster_boxes(cloud, labeling)?
        .into_iter()
        .map(|c| c.bbox)
        .collect())
}

/// Like [`extract_bounding_boxes`], keeping the cluster id and size.
///
/// Members with a non-finite coordinate do not contribute to the extent. A
/// cluster without a single finite member produces no box.
pub fn extract_cluster_boxes(
    cloud: &PointCloud,
    labeling: &Labeling,
) -> Result<Vec<ClusterBox>> {
    if labeling.len() != cloud.len() {
        return Err(SegmentationError::LabelingMismatch {
            labels: labeling.len(),
            points: cloud.len(),
        });
    }

    let clusters = labeling.clusters();
    let mut boxes = Vec::with_capacity(clusters.len());
    for (cluster_id, members) in clusters {
        let aabb: Aabb = members.iter().map(|&i| cloud.point(i)).collect();
        let num_points = members.len();
        match BoundingBox::from_aabb(&aabb) {
            Some(bbox) => boxes.push(ClusterBox {
                cluster_id,
                num_points,
                bbox,
            }),
            None => warn!(cluster_id, num_points, "cluster has no finite points, skipping"),
        }
    }

    debug!(boxes = boxes.len(), "extracted bounding boxes");
    Ok(boxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobox_core::ClusterLabel;
    use proptest::prelude::*;

    #[test]
    fn linear_cluster_box() {
        let cloud = PointCloud::from_points(&[
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 2.0],
            [10.0, 10.0, 10.0],
        ]);
        let labeling = Labeling::from_labels(vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Noise,
        ]);
        let boxes = extract_bounding_boxes(&cloud, &labeling).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].center, [0.0, 0.0, 1.0]);
        assert_eq!(boxes[0].dimensions, [0.0, 0.0, 2.0]);
        assert_eq!(boxes[0].rotation.yaw, 0.0);
    }

    #[test]
    fn boxes_come_out_in_ascending_id_order() {
        let cloud = PointCloud::from_points(&[
            [30.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [20.0, 0.0, 0.0],
        ]);
        let labeling = Labeling::from_labels(vec![
            ClusterLabel::Cluster(9),
            ClusterLabel::Cluster(1),
            ClusterLabel::Cluster(4),
        ]);
        let boxes = extract_cluster_boxes(&cloud, &labeling).unwrap();
        let ids: Vec<usize> = boxes.iter().map(|b| b.cluster_id).collect();
        assert_eq!(ids, vec![1, 4, 9]);
        assert_eq!(boxes[0].bbox.center, [10.0, 0.0, 0.0]);
        assert_eq!(boxes[2].bbox.center, [30.0, 0.0, 0.0]);
    }

    #[test]
    fn coincident_points_have_zero_dimensions() {
        let cloud = PointCloud::from_points(&[[1.5, -2.0, 7.0]; 6]);
        let labeling = Labeling::from_labels(vec![ClusterLabel::Cluster(0); 6]);
        let boxes = extract_cluster_boxes(&cloud, &labeling).unwrap();
        assert_eq!(boxes[0].bbox.dimensions, [0.0, 0.0, 0.0]);
        assert_eq!(boxes[0].bbox.center, [1.5, -2.0, 7.0]);
        assert_eq!(boxes[0].num_points, 6);
    }

    #[test]
    fn all_noise_gives_no_boxes() {
        let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let labeling = Labeling::from_labels(vec![ClusterLabel::Noise; 2]);
        assert!(extract_bounding_boxes(&cloud, &labeling).unwrap().is_empty());
    }

    #[test]
    fn empty_inputs_give_no_boxes() {
        let boxes = extract_bounding_boxes(&PointCloud::new(), &Labeling::empty()).unwrap();
        assert!(boxes.is_empty());
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0]]);
        let err = extract_bounding_boxes(&cloud, &Labeling::empty()).unwrap_err();
        assert_eq!(
            err,
            SegmentationError::LabelingMismatch {
                labels: 0,
                points: 1
            }
        );
    }

    #[test]
    fn non_finite_members_are_skipped() {
        let cloud = PointCloud::from_points(&[
            [0.0, 0.0, 0.0],
            [f32::NAN, 100.0, 0.0],
            [2.0, 2.0, 2.0],
            [f32::INFINITY, 0.0, 0.0],
        ]);
        let labeling = Labeling::from_labels(vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(1),
        ]);
        let boxes = extract_cluster_boxes(&cloud, &labeling).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].cluster_id, 0);
        assert_eq!(boxes[0].num_points, 3);
        assert_eq!(boxes[0].bbox.center, [1.0, 1.0, 1.0]);
        assert_eq!(boxes[0].bbox.dimensions, [2.0, 2.0, 2.0]);
    }

    proptest! {
        #[test]
        fn extents_match_brute_force_min_max(
            pts in prop::collection::vec(
                ((-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0), 0usize..4),
                1..150
            ),
        ) {
            let cloud: PointCloud = pts.iter().map(|&((x, y, z), _)| [x, y, z]).collect();
            let labels: Vec<ClusterLabel> = pts
                .iter()
                .map(|&(_, l)| if l == 0 { ClusterLabel::Noise } else { ClusterLabel::Cluster(l) })
                .collect();
            let labeling = Labeling::from_labels(labels);
            let boxes = extract_cluster_boxes(&cloud, &labeling).unwrap();

            prop_assert_eq!(boxes.len(), labeling.num_clusters());
            for window in boxes.windows(2) {
                prop_assert!(window[0].cluster_id < window[1].cluster_id);
            }
            for b in &boxes {
                let members: Vec<[f32; 3]> = (0..cloud.len())
                    .filter(|&i| labeling.label(i) == ClusterLabel::Cluster(b.cluster_id))
                    .map(|i| cloud.point(i))
                    .collect();
                for axis in 0..3 {
                    let lo = members.iter().map(|p| p[axis]).fold(f32::INFINITY, f32::min);
                    let hi = members.iter().map(|p| p[axis]).fold(f32::NEG_INFINITY, f32::max);
                    prop_assert_eq!(b.bbox.center[axis], (lo + hi) / 2.0);
                    prop_assert_eq!(b.bbox.dimensions[axis], hi - lo);
                    prop_assert!(b.bbox.dimensions[axis] >= 0.0);
                }
                prop_assert_eq!(b.bbox.rotation.yaw, 0.0);
            }
        }
    }
}
