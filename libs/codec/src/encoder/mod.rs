//! Payload encoders
//!
//! An encoder turns the bytes produced by a serializer into the textual form
//! stored inside a record envelope. Encoders are stateless apart from their
//! own configuration and can be reused for any number of payloads.

pub mod base64;
pub mod hex;
pub mod utf8;

pub use self::base64::Base64Encoder;
pub use self::hex::HexEncoder;
pub use self::utf8::Utf8Encoder;

use crate::error::CodecResult;
use std::fmt::Debug;

/// Format group prefix shared by every encoder name
pub const FORMAT_GROUP: &str = "enc";

/// Transform a serialized payload into its encoded text form
pub trait Encoder: Send + Sync + Debug {
    /// Encode `payload`
    fn encode(&self, payload: &[u8]) -> CodecResult<String>;

    /// Registry name of this encoder
    fn format_name(&self) -> &'static str;
}

/// Built-in encoder formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderFormat {
    Utf8,
    Hex,
    Base64,
}

impl EncoderFormat {
    pub const ALL: [EncoderFormat; 3] = [Self::Utf8, Self::Hex, Self::Base64];

    /// Registry name, e.g. `enc_utf8`
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => utf8::FORMAT_NAME,
            Self::Hex => hex::FORMAT_NAME,
            Self::Base64 => base64::FORMAT_NAME,
        }
    }

    /// Human readable label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Hex => "Base16",
            Self::Base64 => "Base64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.name() == name)
    }
}
