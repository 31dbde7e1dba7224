use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("cannot read {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {format} data: {reason}")]
    Malformed { format: &'static str, reason: String },

    #[error("unsupported point cloud format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to write {}", path.display())]
    SerializationFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, IoError>;

pub(crate) fn malformed(format: &'static str, reason: impl Into<String>) -> IoError {
    IoError::Malformed {
        format,
        reason: reason.into(),
    }
}

/// Read a whole file, telling a missing file apart from other failures.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => IoError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => IoError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    })
}

pub(crate) fn write_failed(path: &Path) -> impl FnOnce(io::Error) -> IoError + '_ {
    move |source| IoError::SerializationFailure {
        path: path.to_path_buf(),
        source,
    }
}
