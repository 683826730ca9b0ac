//! Field collection serializers
//!
//! A serializer turns one [`Fields`] collection into a wire payload. They
//! hold configuration only, so one instance can serialize any number of
//! collections, and a failure never leaves state behind.
//!
//! | Format | Name | Output |
//! |--------|------|--------|
//! | CSV | `ser_csv` | One row, `\n` terminated |
//! | JSON | `ser_json` | One JSON value |
//! | NDJSON | `ser_ndjson` | One JSON value followed by a line delimiter |

pub mod csv;
pub mod json;
pub mod ndjson;

pub use self::csv::CsvSerializer;
pub use self::json::{JsonFlags, JsonSerializer};
pub use self::ndjson::{LineDelimitedJsonSerializer, LineEnding};

use crate::error::CodecResult;
use crate::fields::Fields;
use std::fmt::Debug;

/// Format group prefix shared by every serializer name
pub const FORMAT_GROUP: &str = "ser";

/// Serialize a field collection into bytes
pub trait Serializer: Send + Sync + Debug {
    /// Serialize `fields`
    fn serialize(&self, fields: &Fields) -> CodecResult<Vec<u8>>;

    /// Registry name of this serializer
    fn format_name(&self) -> &'static str;
}

/// Built-in serializer formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerializerFormat {
    Csv,
    Json,
    Ndjson,
}

impl SerializerFormat {
    pub const ALL: [SerializerFormat; 3] = [Self::Csv, Self::Json, Self::Ndjson];

    /// Registry name, e.g. `ser_csv`
    pub const fn name(self) -> &'static str {
        match self {
            Self::Csv => self::csv::FORMAT_NAME,
            Self::Json => self::json::FORMAT_NAME,
            Self::Ndjson => self::ndjson::FORMAT_NAME,
        }
    }

    /// Human readable label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Json => "JSON",
            Self::Ndjson => "NDJSON",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.name() == name)
    }
}
