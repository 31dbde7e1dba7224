use autobox::core::PointCloud;
use autobox::io::{
    read_pcd, read_ply, read_point_cloud, write_pcd, write_pcd_binary, write_ply, write_ply_binary,
};
use proptest::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn sample() -> PointCloud {
    PointCloud::from_xyz(vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0])
}

fn assert_close(a: &PointCloud, b: &PointCloud) {
    assert_eq!(a.len(), b.len());
    for i in 0..a.len() {
        for (u, v) in a.point(i).iter().zip(b.point(i)) {
            assert!((u - v).abs() < 1e-4, "point {}: {:?} vs {:?}", i, a.point(i), b.point(i));
        }
    }
}

#[test]
fn pcd_ascii_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roundtrip.pcd");
    write_pcd(&path, &sample()).unwrap();
    assert_close(&read_pcd(&path).unwrap(), &sample());
}

#[test]
fn pcd_empty_cloud_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.pcd");
    write_pcd(&path, &PointCloud::new()).unwrap();
    assert_eq!(read_pcd(&path).unwrap().len(), 0);
}

#[test]
fn binary_writers_are_lossless() {
    let dir = tempdir().unwrap();
    let pcd = dir.path().join("cloud.pcd");
    let ply = dir.path().join("cloud.ply");
    write_pcd_binary(&pcd, &sample()).unwrap();
    write_ply_binary(&ply, &sample()).unwrap();
    assert_eq!(read_pcd(&pcd).unwrap(), sample());
    assert_eq!(read_ply(&ply).unwrap(), sample());
}

#[test]
fn uppercase_extension_dispatches() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("SCAN.PLY");
    write_ply(&path, &sample()).unwrap();
    assert_close(&read_point_cloud(&path).unwrap(), &sample());
}

fn roundtrip_all(dir: &Path, cloud: &PointCloud) {
    let pcd = dir.join("p.pcd");
    let ply = dir.join("p.ply");
    write_pcd_binary(&pcd, cloud).unwrap();
    write_ply_binary(&ply, cloud).unwrap();
    assert_eq!(&read_point_cloud(&pcd).unwrap(), cloud);
    assert_eq!(&read_point_cloud(&ply).unwrap(), cloud);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn binary_formats_preserve_points(pts in prop::collection::vec(prop::array::uniform3(-1e4f32..1e4), 0..64)) {
        let dir = tempdir().unwrap();
        roundtrip_all(dir.path(), &PointCloud::from_points(&pts));
    }
}
