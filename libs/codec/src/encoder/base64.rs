//! Base64 encoder

use super::Encoder;
use crate::error::CodecResult;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub const FORMAT_NAME: &str = "enc_base64";

/// Standard alphabet, padded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Base64Encoder;

impl Base64Encoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for Base64Encoder {
    fn encode(&self, payload: &[u8]) -> CodecResult<String> {
        Ok(STANDARD.encode(payload))
    }

    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }
}
