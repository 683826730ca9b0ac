//! # Ticket Streamer Codec
//!
//! ## Purpose
//!
//! The "payload" layer of the export pipeline: everything needed to turn an
//! ordered collection of event fields into bytes and text, with no knowledge
//! of where those bytes go.
//!
//! - **Fields**: insertion-ordered `Offset -> Value` collection
//! - **Serializers**: CSV, JSON, NDJSON (`Fields` -> bytes)
//! - **Encoders**: UTF-8, hex, base64 (bytes -> text)
//! - **Validators**: integer ranges, host names, tube and stream names, and
//!   the logged parse-with-default helper
//!
//! ## Architecture Role
//!
//! ```text
//! libs/codec → libs/export → services/streamer
//!     ↑             ↓               ↓
//! Fields        Registry        Host binary
//! Serializers   Tuple/Record    CLI + config
//! Encoders      Stream/UseCase  Event intake
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Format registries and hooks (belong in libs/export)
//! - Network transport (beanstalk client lives in libs/export)
//! - Configuration loading (belongs in libs/config)
//!
//! Encoders and serializers are plain configuration holders: construct once,
//! call many times. Invalid construction parameters never fail, they fall
//! back to documented defaults through [`validation::or_default`].

pub mod encoder;
pub mod error;
pub mod fields;
pub mod serializer;
pub mod validation;

pub use encoder::{Base64Encoder, Encoder, EncoderFormat, HexEncoder, Utf8Encoder};
pub use error::{CodecError, CodecResult};
pub use fields::{Fields, Offset};
pub use serializer::{
    CsvSerializer, JsonFlags, JsonSerializer, LineDelimitedJsonSerializer, LineEnding, Serializer,
    SerializerFormat,
};
