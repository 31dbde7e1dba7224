use crate::error::{malformed, read_file, write_failed, IoError, Result};
use autobox_core::PointCloud;
use std::fs;
use std::io::{BufWriter, Write as _};
use std::path::Path;

const FORMAT: &str = "PLY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

/// Scalar property type as declared in the PLY header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl PropType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "char" | "int8" => PropType::Int8,
            "uchar" | "uint8" => PropType::Uint8,
            "short" | "int16" => PropType::Int16,
            "ushort" | "uint16" => PropType::Uint16,
            "int" | "int32" => PropType::Int32,
            "uint" | "uint32" => PropType::Uint32,
            "float" | "float32" => PropType::Float32,
            "double" | "float64" => PropType::Float64,
            _ => return None,
        })
    }

    fn byte_size(self) -> usize {
        match self {
            PropType::Int8 | PropType::Uint8 => 1,
            PropType::Int16 | PropType::Uint16 => 2,
            PropType::Int32 | PropType::Uint32 | PropType::Float32 => 4,
            PropType::Float64 => 8,
        }
    }

    /// Decode one value; `bytes` holds exactly `byte_size()` bytes.
    fn decode(self, bytes: &[u8], big_endian: bool) -> f32 {
        macro_rules! read {
            ($t:ty, $n:literal) => {{
                let mut buf = [0u8; $n];
                buf.copy_from_slice(bytes);
                if big_endian {
                    <$t>::from_be_bytes(buf)
                } else {
                    <$t>::from_le_bytes(buf)
                }
            }};
        }

        match self {
            PropType::Int8 => read!(i8, 1) as f32,
            PropType::Uint8 => read!(u8, 1) as f32,
            PropType::Int16 => read!(i16, 2) as f32,
            PropType::Uint16 => read!(u16, 2) as f32,
            PropType::Int32 => read!(i32, 4) as f32,
            PropType::Uint32 => read!(u32, 4) as f32,
            PropType::Float32 => read!(f32, 4),
            PropType::Float64 => read!(f64, 8) as f32,
        }
    }
}

/// Parsed header information.
struct PlyHeader {
    format: PlyFormat,
    vertex_count: usize,
    property_names: Vec<String>,
    property_types: Vec<PropType>,
    header_end_offset: usize, // byte offset just after "end_header\n"
}

impl PlyHeader {
    fn column(&self, name: &str) -> Result<usize> {
        self.property_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| malformed(FORMAT, format!("vertex element has no `{}` property", name)))
    }

    fn byte_offset(&self, prop_idx: usize) -> usize {
        self.property_types[..prop_idx]
            .iter()
            .map(|t| t.byte_size())
            .sum()
    }
}

fn parse_ply_header(data: &[u8]) -> Result<PlyHeader> {
    let end_marker = b"end_header";
    let header_end = find_bytes(data, end_marker)
        .ok_or_else(|| malformed(FORMAT, "missing end_header"))?;
    let header_end_offset = data[header_end..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| header_end + p + 1)
        .unwrap_or(data.len());

    let header_text = std::str::from_utf8(&data[..header_end])
        .map_err(|_| malformed(FORMAT, "header not valid UTF-8"))?;

    let mut format = None;
    let mut vertex_count: Option<usize> = None;
    let mut property_names: Vec<String> = Vec::new();
    let mut property_types: Vec<PropType> = Vec::new();
    let mut in_vertex_element = false;
    let mut seen_ply_magic = false;

    for line in header_text.lines() {
        let line = line.trim();

        if !seen_ply_magic {
            if line == "ply" {
                seen_ply_magic = true;
                continue;
            }
            return Err(malformed(FORMAT, "file does not start with 'ply'"));
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.first().copied() {
            Some("format") => {
                format = Some(match parts.get(1).copied() {
                    Some("ascii") => PlyFormat::Ascii,
                    Some("binary_little_endian") => PlyFormat::BinaryLittleEndian,
                    Some("binary_big_endian") => PlyFormat::BinaryBigEndian,
                    _ => {
                        return Err(IoError::UnsupportedFormat(format!("PLY {}", line)));
                    }
                });
            }
            Some("element") if parts.get(1) == Some(&"vertex") => {
                if !property_names.is_empty() || vertex_count.is_some() {
                    return Err(malformed(FORMAT, "duplicate vertex element"));
                }
                let count = parts
                    .get(2)
                    .ok_or_else(|| malformed(FORMAT, "invalid element vertex line"))?;
                vertex_count = Some(count.parse::<usize>().map_err(|e| {
                    malformed(FORMAT, format!("invalid vertex count: {}", e))
                })?);
                in_vertex_element = true;
            }
            Some("element") => {
                if vertex_count.is_none() {
                    // Records of an earlier element would precede the vertices.
                    return Err(IoError::UnsupportedFormat(format!(
                        "PLY element `{}` before vertex element",
                        parts.get(1).unwrap_or(&"?")
                    )));
                }
                in_vertex_element = false;
            }
            Some("property") if in_vertex_element => {
                if parts.get(1) == Some(&"list") {
                    return Err(IoError::UnsupportedFormat(
                        "PLY list property in vertex element".to_string(),
                    ));
                }
                let (type_name, name) = match (parts.get(1), parts.get(2)) {
                    (Some(t), Some(n)) => (*t, *n),
                    _ => return Err(malformed(FORMAT, format!("invalid property line: {}", line))),
                };
                let ptype = PropType::parse(type_name).ok_or_else(|| {
                    IoError::UnsupportedFormat(format!("PLY property type {}", type_name))
                })?;
                property_types.push(ptype);
                property_names.push(name.to_string());
            }
            _ => {}
        }
    }

    let format = format.ok_or_else(|| malformed(FORMAT, "format line missing"))?;

    Ok(PlyHeader {
        format,
        vertex_count: vertex_count.unwrap_or(0),
        property_names,
        property_types,
        header_end_offset,
    })
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Reads the vertex positions of a PLY file (ascii, binary little or big
/// endian). Other vertex properties and any later elements are ignored.
pub fn read_ply(path: impl AsRef<Path>) -> Result<PointCloud> {
    let data = read_file(path.as_ref())?;
    parse_ply(&data)
}

/// Decodes PLY bytes already in memory.
pub fn parse_ply(data: &[u8]) -> Result<PointCloud> {
    let header = parse_ply_header(data)?;
    let columns = [header.column("x")?, header.column("y")?, header.column("z")?];
    let vertex_count = header.vertex_count;
    let body = &data[header.header_end_offset..];

    let cloud = match header.format {
        PlyFormat::Ascii => {
            // The vertex count is untrusted; a vertex line takes at least two bytes.
            let mut cloud = PointCloud::with_capacity(vertex_count.min(body.len() / 2));
            let body = std::str::from_utf8(body)
                .map_err(|_| malformed(FORMAT, "body not valid UTF-8"))?;
            for line in body.lines() {
                if cloud.len() >= vertex_count {
                    break;
                }
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < header.property_names.len() {
                    return Err(malformed(
                        FORMAT,
                        format!(
                            "vertex line has {} fields, expected {}",
                            parts.len(),
                            header.property_names.len()
                        ),
                    ));
                }

                let mut p = [0.0f32; 3];
                for (axis, &col) in columns.iter().enumerate() {
                    p[axis] = parts[col].parse::<f32>().map_err(|e| {
                        malformed(FORMAT, format!("failed to parse float: {}", e))
                    })?;
                }
                cloud.push(p);
            }

            if cloud.len() < vertex_count {
                return Err(malformed(
                    FORMAT,
                    format!("expected {} vertices, found {}", vertex_count, cloud.len()),
                ));
            }
            cloud
        }
        PlyFormat::BinaryLittleEndian | PlyFormat::BinaryBigEndian => {
            let big_endian = header.format == PlyFormat::BinaryBigEndian;
            let stride: usize = header.property_types.iter().map(|t| t.byte_size()).sum();
            let needed = vertex_count.checked_mul(stride).ok_or_else(|| {
                malformed(FORMAT, format!("{} vertices of {} bytes overflow", vertex_count, stride))
            })?;
            if body.len() < needed {
                return Err(malformed(
                    FORMAT,
                    format!(
                        "binary body too short: need {} bytes, got {}",
                        needed,
                        body.len()
                    ),
                ));
            }

            let slots = columns.map(|col| {
                let off = header.byte_offset(col);
                let ty = header.property_types[col];
                (off, ty)
            });

            let mut cloud = PointCloud::with_capacity(vertex_count);
            for row in body[..needed].chunks_exact(stride.max(1)).take(vertex_count) {
                let p = slots.map(|(off, ty)| {
                    ty.decode(&row[off..off + ty.byte_size()], big_endian)
                });
                cloud.push(p);
            }
            cloud
        }
    };

    Ok(cloud)
}

/// Write the positions of `cloud` as an ASCII PLY file.
pub fn write_ply(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let path = path.as_ref();
    let mut out = header_text(cloud.len(), "ascii");
    for p in cloud.iter_points() {
        out.push_str(&format!("{} {} {}\n", p[0], p[1], p[2]));
    }

    fs::write(path, out).map_err(write_failed(path))
}

/// Write the positions of `cloud` as a binary_little_endian PLY file.
pub fn write_ply_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path).map_err(write_failed(path))?;
    let mut w = BufWriter::new(file);

    w.write_all(header_text(cloud.len(), "binary_little_endian").as_bytes())
        .map_err(write_failed(path))?;
    for p in cloud.iter_points() {
        for v in p {
            w.write_all(&v.to_le_bytes()).map_err(write_failed(path))?;
        }
    }

    w.flush().map_err(write_failed(path))
}

fn header_text(vertex_count: usize, format: &str) -> String {
    let mut out = String::new();
    out.push_str("ply\n");
    out.push_str(&format!("format {} 1.0\n", format));
    out.push_str(&format!("element vertex {}\n", vertex_count));
    out.push_str("property float x\n");
    out.push_str("property float y\n");
    out.push_str("property float z\n");
    out.push_str("end_header\n");
    out
}
