//! Export pipeline errors
//!
//! Every component below the use case propagates [`ExportError`] with `?`.
//! The use case is the only place that catches it: the failure is logged and
//! dropped so the triggering event is never interrupted by a failed export.

use codec::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// A constructor parameter cannot be used and has no safe default
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No format with this name is registered in the family
    #[error("Unsupported {family} format: {name}")]
    UnsupportedFormat { family: &'static str, name: String },

    /// The encoder could not produce a payload
    #[error("Encoding failed: {0}")]
    EncodingFailed(#[source] CodecError),

    /// A serializer could not produce a payload
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[source] CodecError),

    /// The transport refused or failed the operation
    #[error("Transport error: {message}{}", code.map(|c| format!(" (code {})", c)).unwrap_or_default())]
    Transport { message: String, code: Option<i32> },
}

impl ExportError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn unsupported_format(family: &'static str, name: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            family,
            name: name.into(),
        }
    }

    /// Transport error without an underlying error code
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            code: None,
        }
    }

    /// Wrap an I/O failure, keeping the OS error code when there is one
    pub fn from_io(context: &str, error: &std::io::Error) -> Self {
        Self::Transport {
            message: format!("{}: {}", context, error),
            code: error.raw_os_error(),
        }
    }

    /// Whether this error comes from configuration rather than the data or
    /// the transport
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_) | Self::UnsupportedFormat { .. }
        )
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
