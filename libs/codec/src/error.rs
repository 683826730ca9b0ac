//! Codec-level errors
//!
//! Encoders and serializers never panic on bad input. When a transformation
//! cannot produce a payload they return a [`CodecError`], which callers above
//! the codec treat as the "no result" outcome of that step.

use thiserror::Error;

/// Failure of a single encode or serialize step
#[derive(Debug, Error)]
pub enum CodecError {
    /// Writing to or reading back from the row buffer failed
    #[error("I/O error while building payload: {0}")]
    Io(#[from] std::io::Error),

    /// The value nests deeper than the serializer allows
    #[error("Maximum nesting depth exceeded: depth {depth} > limit {limit}")]
    DepthExceeded { depth: usize, limit: usize },

    /// serde_json refused the value
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The input bytes are not valid in the declared source encoding
    #[error("Malformed input for encoding {encoding}")]
    Malformed { encoding: String },
}

impl CodecError {
    /// Create a malformed input error for the given encoding label
    pub fn malformed(encoding: impl Into<String>) -> Self {
        Self::Malformed {
            encoding: encoding.into(),
        }
    }

    /// Create a depth exceeded error
    pub fn depth_exceeded(depth: usize, limit: usize) -> Self {
        Self::DepthExceeded { depth, limit }
    }
}

/// Result alias used by every encoder and serializer
pub type CodecResult<T> = Result<T, CodecError>;
