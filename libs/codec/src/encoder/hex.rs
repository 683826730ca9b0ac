//! Base16 encoder

use super::Encoder;
use crate::error::CodecResult;

pub const FORMAT_NAME: &str = "enc_hex";

/// Lowercase hexadecimal representation of the payload bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexEncoder;

impl HexEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for HexEncoder {
    fn encode(&self, payload: &[u8]) -> CodecResult<String> {
        Ok(hex::encode(payload))
    }

    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }
}
