use crate::error::{malformed, read_file, Result};
use autobox_core::PointCloud;
use std::path::Path;

const FORMAT: &str = "XYZ";

/// Reads a whitespace separated text cloud (`.xyz`, `.txt`, `.pts`).
///
/// The first three columns of each line are x, y and z; further columns
/// (normals, colors, intensity) are ignored. Blank lines and `#` comments are
/// skipped, as is a leading line holding a single integer (the point count
/// written by `.pts` exporters).
pub fn read_xyz(path: impl AsRef<Path>) -> Result<PointCloud> {
    let raw = read_file(path.as_ref())?;
    parse_xyz(&raw)
}

pub fn parse_xyz(raw: &[u8]) -> Result<PointCloud> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| malformed(FORMAT, format!("invalid UTF-8: {}", e)))?;

    let mut cloud = PointCloud::new();
    let mut first_record = true;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if first_record && parts.len() == 1 && parts[0].parse::<usize>().is_ok() {
            first_record = false;
            continue;
        }
        first_record = false;

        if parts.len() < 3 {
            return Err(malformed(
                FORMAT,
                format!("line {} has {} columns, expected at least 3", line_no + 1, parts.len()),
            ));
        }

        let mut p = [0.0f32; 3];
        for axis in 0..3 {
            p[axis] = parts[axis].parse::<f32>().map_err(|e| {
                malformed(FORMAT, format!("line {}: invalid coordinate: {}", line_no + 1, e))
            })?;
        }
        cloud.push(p);
    }

    Ok(cloud)
}
