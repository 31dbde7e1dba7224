use crate::error::{read_file, write_failed, IoError, Result};
use autobox_core::BoundingBox;
use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;

/// Pretty JSON (2-space indent) for a list of boxes. An empty list is `[]`.
pub fn boxes_to_json(boxes: &[BoundingBox]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(boxes)
}

/// Write `boxes` to `path` as a pretty-printed JSON array.
///
/// Creates or truncates `path`. Any failure is reported as
/// [`IoError::SerializationFailure`].
pub fn write_boxes_json(path: impl AsRef<Path>, boxes: &[BoundingBox]) -> Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path).map_err(write_failed(path))?;
    let mut w = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut w, boxes)
        .map_err(io::Error::from)
        .map_err(write_failed(path))?;
    w.flush().map_err(write_failed(path))
}

/// Read back a box list written by [`write_boxes_json`].
pub fn read_boxes_json(path: impl AsRef<Path>) -> Result<Vec<BoundingBox>> {
    let raw = read_file(path.as_ref())?;
    serde_json::from_slice(&raw).map_err(|e| IoError::Malformed {
        format: "JSON",
        reason: e.to_string(),
    })
}
