use crate::error::{malformed, read_file, write_failed, IoError, Result};
use autobox_core::PointCloud;
use std::fs;
use std::io::{BufWriter, Write as _};
use std::path::Path;

const FORMAT: &str = "PCD";

/// Reads a PCD file (`DATA ascii` or `DATA binary`).
///
/// Only the `x`, `y` and `z` fields are kept. Field layout comes from the
/// `FIELDS`, `SIZE`, `TYPE` and `COUNT` header lines, so extra fields such as
/// `intensity` or `rgb` may appear anywhere in a record.
pub fn read_pcd(path: impl AsRef<Path>) -> Result<PointCloud> {
    let raw = read_file(path.as_ref())?;
    parse_pcd(&raw)
}

/// Decodes PCD bytes already in memory.
pub fn parse_pcd(raw: &[u8]) -> Result<PointCloud> {
    let header = parse_header(raw)?;
    let xyz = header.xyz_fields()?;

    match header.data {
        DataFormat::Ascii => read_pcd_ascii(&raw[header.data_offset..], &header, xyz),
        DataFormat::Binary => read_pcd_binary(&raw[header.data_offset..], &header, xyz),
    }
}

/// Writes a PCD file in ASCII format.
pub fn write_pcd(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let path = path.as_ref();
    let mut out = header_text(cloud.len(), "ascii");
    for p in cloud.iter_points() {
        out.push_str(&format!("{} {} {}\n", p[0], p[1], p[2]));
    }

    fs::write(path, out).map_err(write_failed(path))
}

/// Writes a PCD file in binary format.
pub fn write_pcd_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path).map_err(write_failed(path))?;
    let mut w = BufWriter::new(file);

    w.write_all(header_text(cloud.len(), "binary").as_bytes())
        .map_err(write_failed(path))?;
    for p in cloud.iter_points() {
        for v in p {
            w.write_all(&v.to_le_bytes()).map_err(write_failed(path))?;
        }
    }

    w.flush().map_err(write_failed(path))
}

fn header_text(num_points: usize, data: &str) -> String {
    let mut header = String::new();
    header.push_str("# .PCD v0.7 - Point Cloud Data file format\n");
    header.push_str("VERSION 0.7\n");
    header.push_str("FIELDS x y z\n");
    header.push_str("SIZE 4 4 4\n");
    header.push_str("TYPE F F F\n");
    header.push_str("COUNT 1 1 1\n");
    header.push_str(&format!("WIDTH {}\n", num_points));
    header.push_str("HEIGHT 1\n");
    header.push_str("VIEWPOINT 0 0 0 1 0 0 0\n");
    header.push_str(&format!("POINTS {}\n", num_points));
    header.push_str(&format!("DATA {}\n", data));
    header
}

// --- Internal helpers ---

#[derive(Debug, Clone, Copy, PartialEq)]
enum DataFormat {
    Ascii,
    Binary,
}

#[derive(Debug)]
struct PcdHeader {
    fields: Vec<String>,
    sizes: Vec<usize>,
    types: Vec<char>,
    counts: Vec<usize>,
    /// Values per ascii record.
    columns: usize,
    /// Bytes per binary record.
    stride: usize,
    points: usize,
    data: DataFormat,
    /// Byte offset just past the DATA line.
    data_offset: usize,
}

/// Location of one coordinate inside a record.
#[derive(Debug, Clone, Copy)]
struct FieldSlot {
    /// Token index in an ascii record.
    ascii_column: usize,
    /// Byte offset in a binary record.
    byte_offset: usize,
    size: usize,
}

impl PcdHeader {
    fn xyz_fields(&self) -> Result<[FieldSlot; 3]> {
        let mut slots = [FieldSlot {
            ascii_column: 0,
            byte_offset: 0,
            size: 4,
        }; 3];

        for (axis, name) in ["x", "y", "z"].iter().enumerate() {
            let idx = self
                .fields
                .iter()
                .position(|f| f == name)
                .ok_or_else(|| malformed(FORMAT, format!("missing `{}` field", name)))?;

            if self.counts[idx] == 0 {
                return Err(malformed(FORMAT, format!("field `{}` has COUNT 0", name)));
            }
            if self.types[idx] != 'F' || !matches!(self.sizes[idx], 4 | 8) {
                return Err(IoError::UnsupportedFormat(format!(
                    "PCD field `{}` has TYPE {} SIZE {}, expected a 4 or 8 byte float",
                    name, self.types[idx], self.sizes[idx]
                )));
            }

            // `columns` and `stride` were summed with overflow checks, so the
            // prefix sums below fit and the slot lies inside the record.
            slots[axis] = FieldSlot {
                ascii_column: self.counts[..idx].iter().sum(),
                byte_offset: (0..idx).map(|k| self.sizes[k] * self.counts[k]).sum(),
                size: self.sizes[idx],
            };
        }
        Ok(slots)
    }
}

fn parse_header(raw: &[u8]) -> Result<PcdHeader> {
    let mut fields: Option<Vec<String>> = None;
    let mut sizes: Option<Vec<usize>> = None;
    let mut types: Option<Vec<char>> = None;
    let mut counts: Option<Vec<usize>> = None;
    let mut points: Option<usize> = None;
    let mut width: Option<usize> = None;
    let mut height: usize = 1;

    let mut offset = 0;
    while offset < raw.len() {
        let end = raw[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| offset + p + 1)
            .unwrap_or(raw.len());
        let line = std::str::from_utf8(&raw[offset..end])
            .map_err(|_| malformed(FORMAT, "header is not valid UTF-8"))?
            .trim();
        offset = end;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or_default();
        let values: Vec<&str> = parts.collect();

        match keyword {
            "FIELDS" => fields = Some(values.iter().map(|s| s.to_string()).collect()),
            "SIZE" => sizes = Some(parse_list(keyword, &values)?),
            "COUNT" => counts = Some(parse_list(keyword, &values)?),
            "TYPE" => {
                types = Some(
                    values
                        .iter()
                        .map(|s| s.chars().next().unwrap_or('F').to_ascii_uppercase())
                        .collect(),
                )
            }
            "POINTS" => points = Some(parse_one(keyword, &values)?),
            "WIDTH" => width = Some(parse_one(keyword, &values)?),
            "HEIGHT" => height = parse_one(keyword, &values)?,
            "DATA" => {
                let data = match values.first().copied() {
                    Some("ascii") => DataFormat::Ascii,
                    Some("binary") => DataFormat::Binary,
                    Some(other) => {
                        return Err(IoError::UnsupportedFormat(format!(
                            "PCD DATA {}",
                            other
                        )))
                    }
                    None => return Err(malformed(FORMAT, "DATA line has no format")),
                };

                // Default to x y z if no FIELDS line found
                let fields = fields
                    .unwrap_or_else(|| vec!["x".to_string(), "y".to_string(), "z".to_string()]);
                let n = fields.len();
                let sizes = sizes.unwrap_or_else(|| vec![4; n]);
                let types = types.unwrap_or_else(|| vec!['F'; n]);
                let counts = counts.unwrap_or_else(|| vec![1; n]);
                if sizes.len() != n || types.len() != n || counts.len() != n {
                    return Err(malformed(
                        FORMAT,
                        "FIELDS, SIZE, TYPE and COUNT have different lengths",
                    ));
                }

                let points = match (points, width) {
                    (Some(points), _) => points,
                    (None, Some(w)) => w
                        .checked_mul(height)
                        .ok_or_else(|| malformed(FORMAT, "WIDTH x HEIGHT overflows"))?,
                    (None, None) => return Err(malformed(FORMAT, "missing POINTS/WIDTH header")),
                };

                let columns = counts
                    .iter()
                    .try_fold(0usize, |acc, &c| acc.checked_add(c))
                    .ok_or_else(|| malformed(FORMAT, "COUNT total overflows"))?;
                let stride = sizes
                    .iter()
                    .zip(&counts)
                    .try_fold(0usize, |acc, (&s, &c)| {
                        s.checked_mul(c).and_then(|b| acc.checked_add(b))
                    })
                    .ok_or_else(|| malformed(FORMAT, "record size overflows"))?;

                return Ok(PcdHeader {
                    fields,
                    sizes,
                    types,
                    counts,
                    columns,
                    stride,
                    points,
                    data,
                    data_offset: offset,
                });
            }
            _ => {}
        }
    }

    Err(malformed(FORMAT, "missing DATA line"))
}

fn parse_one(keyword: &str, values: &[&str]) -> Result<usize> {
    values
        .first()
        .ok_or_else(|| malformed(FORMAT, format!("{} has no value", keyword)))?
        .parse::<usize>()
        .map_err(|e| malformed(FORMAT, format!("invalid {} value: {}", keyword, e)))
}

fn parse_list(keyword: &str, values: &[&str]) -> Result<Vec<usize>> {
    values
        .iter()
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| malformed(FORMAT, format!("invalid {} value: {}", keyword, e)))
        })
        .collect()
}

fn read_pcd_ascii(body: &[u8], header: &PcdHeader, xyz: [FieldSlot; 3]) -> Result<PointCloud> {
    let content =
        std::str::from_utf8(body).map_err(|e| malformed(FORMAT, format!("invalid UTF-8: {}", e)))?;

    let columns = header.columns;
    // POINTS is untrusted; a record takes at least two bytes.
    let mut cloud = PointCloud::with_capacity(header.points.min(body.len() / 2));

    for line in content.lines() {
        if cloud.len() == header.points {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < columns {
            return Err(malformed(
                FORMAT,
                format!("record has {} values, expected {}", parts.len(), columns),
            ));
        }

        let mut p = [0.0f32; 3];
        for (axis, slot) in xyz.iter().enumerate() {
            let token = parts[slot.ascii_column];
            p[axis] = token
                .parse::<f32>()
                .map_err(|e| malformed(FORMAT, format!("invalid coordinate {:?}: {}", token, e)))?;
        }
        cloud.push(p);
    }

    if cloud.len() != header.points {
        return Err(malformed(
            FORMAT,
            format!("header declares {} points, found {}", header.points, cloud.len()),
        ));
    }

    Ok(cloud)
}

fn read_pcd_binary(body: &[u8], header: &PcdHeader, xyz: [FieldSlot; 3]) -> Result<PointCloud> {
    let stride = header.stride;
    let expected = header.points.checked_mul(stride).ok_or_else(|| {
        malformed(FORMAT, format!("{} points of {} bytes overflow", header.points, stride))
    })?;

    if body.len() < expected {
        return Err(malformed(
            FORMAT,
            format!(
                "binary data too short: have {} bytes, expected {} ({} points x {} bytes)",
                body.len(),
                expected,
                header.points,
                stride
            ),
        ));
    }

    let mut cloud = PointCloud::with_capacity(header.points);
    for record in body[..expected].chunks_exact(stride.max(1)).take(header.points) {
        let mut p = [0.0f32; 3];
        for (axis, slot) in xyz.iter().enumerate() {
            let bytes = &record[slot.byte_offset..slot.byte_offset + slot.size];
            p[axis] = match slot.size {
                8 => f64::from_le_bytes(bytes.try_into().unwrap_or([0; 8])) as f32,
                _ => f32::from_le_bytes(bytes.try_into().unwrap_or([0; 4])),
            };
        }
        cloud.push(p);
    }

    if cloud.len() != header.points {
        return Err(malformed(
            FORMAT,
            format!("header declares {} points, decoded {}", header.points, cloud.len()),
        ));
    }

    Ok(cloud)
}
