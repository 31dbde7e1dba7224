use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentationError {
    /// A clustering parameter is outside its valid range. Raised before any
    /// point is examined.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("labeling has {labels} entries but the cloud has {points} points")]
    LabelingMismatch { labels: usize, points: usize },
}

pub type Result<T> = std::result::Result<T, SegmentationError>;
