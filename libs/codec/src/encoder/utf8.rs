//! UTF-8 re-encoder
//!
//! Converts a payload from a configured source character encoding into UTF-8.
//! Encoding names follow the WHATWG label set (`latin1`, `windows-1252`,
//! `shift_jis`, `utf-16le`, ...). A blank or unknown label selects UTF-8,
//! which makes the encoder a validating pass-through.

use super::Encoder;
use crate::error::{CodecError, CodecResult};
use crate::validation::is_not_blank;
use encoding_rs::{Encoding, UTF_8};
use tracing::warn;

pub const FORMAT_NAME: &str = "enc_utf8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf8Encoder {
    encoding: &'static Encoding,
}

impl Utf8Encoder {
    /// Create an encoder reading `encoding`; `None`, blank or unknown labels
    /// fall back to UTF-8
    pub fn new(encoding: Option<&str>) -> Self {
        let encoding = match encoding {
            Some(label) if is_not_blank(label) => {
                Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
                    warn!(
                        encoding = label,
                        fallback = UTF_8.name(),
                        "Unknown source encoding, falling back to default"
                    );
                    UTF_8
                })
            }
            _ => UTF_8,
        };

        Self { encoding }
    }

    /// Canonical name of the source encoding
    pub fn source_encoding(&self) -> &'static str {
        self.encoding.name()
    }
}

impl Default for Utf8Encoder {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Encoder for Utf8Encoder {
    fn encode(&self, payload: &[u8]) -> CodecResult<String> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(payload)
            .map(|text| text.into_owned())
            .ok_or_else(|| CodecError::malformed(self.encoding.name()))
    }

    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }
}
