//! Sequence tuple: an ordered list of fields, CSV by default

use super::Tuple;
use crate::error::{ExportError, ExportResult};
use codec::serializer::{CsvSerializer, Serializer};
use codec::{Fields, Offset};
use serde_json::Value;

pub const FORMAT_NAME: &str = "tpl_sequence";

#[derive(Debug)]
pub struct Sequence {
    fields: Fields,
    serializer: Box<dyn Serializer>,
}

impl Sequence {
    /// Create a sequence holding `fields`; without a serializer the default
    /// CSV dialect is used
    pub fn new(fields: Fields, serializer: Option<Box<dyn Serializer>>) -> Self {
        Self {
            fields,
            serializer: serializer.unwrap_or_else(|| Box::new(CsvSerializer::default())),
        }
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(Fields::new(), None)
    }
}

impl Tuple for Sequence {
    fn add(&mut self, value: Value, offset: Option<Offset>) -> &mut dyn Tuple {
        self.fields.insert(offset, value);
        self
    }

    fn add_range(&mut self, fields: Fields) -> &mut dyn Tuple {
        self.fields.extend(fields);
        self
    }

    fn clear(&mut self) -> &mut dyn Tuple {
        self.fields.clear();
        self
    }

    fn serialize(&self) -> ExportResult<Vec<u8>> {
        self.serializer
            .serialize(&self.fields)
            .map_err(ExportError::SerializationFailed)
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn serializer(&self) -> &dyn Serializer {
        self.serializer.as_ref()
    }

    fn set_serializer(&mut self, serializer: Box<dyn Serializer>) {
        self.serializer = serializer;
    }

    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }
}
