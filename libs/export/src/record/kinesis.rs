//! Kinesis-style record
//!
//! Envelope, in this order:
//!
//! | Key | Value |
//! |-----|-------|
//! | `Data` | encoded tuple payload, `null` until the first `update` |
//! | `StreamName` | target stream |
//! | `PartitionKey` | always `KinesisRecord` |
//!
//! The partition key never changes, so every record lands on the same shard.
//! That is only suitable for low-throughput, single-shard streams.

use super::Record;
use crate::error::{ExportError, ExportResult};
use crate::tuple::Tuple;
use codec::encoder::{Encoder, Utf8Encoder};
use codec::serializer::{JsonSerializer, Serializer};
use codec::validation::KINESIS_STREAM;
use codec::{Fields, Offset};
use serde_json::Value;

pub const FORMAT_NAME: &str = "rec_kinesis";

pub const DATA_KEY: &str = "Data";
pub const STREAM_NAME_KEY: &str = "StreamName";
pub const PARTITION_KEY_KEY: &str = "PartitionKey";

/// Fixed partition key
pub const PARTITION_KEY: &str = "KinesisRecord";

#[derive(Debug)]
pub struct KinesisRecord {
    envelope: Fields,
    encoder: Box<dyn Encoder>,
    serializer: Box<dyn Serializer>,
}

impl KinesisRecord {
    /// Create a record targeting `stream`.
    ///
    /// Defaults to the UTF-8 encoder and the JSON serializer. Fails when the
    /// stream name is not 1 to 128 characters of `[a-zA-Z0-9_.-]`.
    pub fn new(
        stream: &str,
        encoder: Option<Box<dyn Encoder>>,
        serializer: Option<Box<dyn Serializer>>,
    ) -> ExportResult<Self> {
        if KINESIS_STREAM.is_not_valid(stream) {
            return Err(ExportError::invalid_configuration(format!(
                "invalid Kinesis stream name {:?}",
                stream
            )));
        }

        let envelope = [
            (DATA_KEY, Value::Null),
            (STREAM_NAME_KEY, Value::from(stream)),
            (PARTITION_KEY_KEY, Value::from(PARTITION_KEY)),
        ]
        .into_iter()
        .collect();

        Ok(Self {
            envelope,
            encoder: encoder.unwrap_or_else(|| Box::new(Utf8Encoder::default())),
            serializer: serializer.unwrap_or_else(|| Box::new(JsonSerializer::default())),
        })
    }

    pub fn stream_name(&self) -> Option<&str> {
        self.envelope.get_key(STREAM_NAME_KEY).and_then(Value::as_str)
    }

    /// Encoded payload stored by the last `update`
    pub fn data(&self) -> Option<&str> {
        self.envelope.get_key(DATA_KEY).and_then(Value::as_str)
    }
}

impl Record for KinesisRecord {
    fn update(&mut self, tuple: &dyn Tuple) -> ExportResult<&dyn Record> {
        let payload = tuple.serialize()?;
        let data = self
            .encoder
            .encode(&payload)
            .map_err(ExportError::EncodingFailed)?;

        self.envelope.insert(Some(Offset::from(DATA_KEY)), data);
        Ok(self)
    }

    fn serialize(&self) -> ExportResult<Vec<u8>> {
        self.serializer
            .serialize(&self.envelope)
            .map_err(ExportError::SerializationFailed)
    }

    fn envelope(&self) -> &Fields {
        &self.envelope
    }

    fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    fn set_encoder(&mut self, encoder: Box<dyn Encoder>) {
        self.encoder = encoder;
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
