//! Records: transport envelopes around an encoded tuple payload
//!
//! `update` pulls the serialized tuple through the record's encoder into the
//! envelope; `serialize` writes the whole envelope with the record's own
//! serializer. The envelope layout is fixed per record format.

pub mod kinesis;

pub use kinesis::KinesisRecord;

use crate::error::ExportResult;
use crate::registry::{Format, FormatMap, FormatRegistry, HookContext, Hooks};
use crate::tuple::Tuple;
use codec::encoder::Encoder;
use codec::serializer::Serializer;
use codec::Fields;
use std::fmt::Debug;

/// Format group prefix shared by every record name
pub const FORMAT_GROUP: &str = "rec";

pub trait Record: Send + Sync + Debug {
    /// Serialize `tuple`, encode the payload and store it in the envelope
    fn update(&mut self, tuple: &dyn Tuple) -> ExportResult<&dyn Record>;

    /// Serialize the whole envelope
    fn serialize(&self) -> ExportResult<Vec<u8>>;

    /// Current envelope
    fn envelope(&self) -> &Fields;

    fn encoder(&self) -> &dyn Encoder;

    fn set_encoder(&mut self, encoder: Box<dyn Encoder>);

    fn serializer(&self) -> &dyn Serializer;

    fn set_serializer(&mut self, serializer: Box<dyn Serializer>);

    /// Registry name of this record
    fn format_name(&self) -> &'static str;
}

/// Record constructor options
#[derive(Debug, Default)]
pub struct RecordOptions {
    /// Target stream name
    pub stream: Option<String>,
    /// Payload encoder; each record format has its own default
    pub encoder: Option<Box<dyn Encoder>>,
    /// Envelope serializer; each record format has its own default
    pub serializer: Option<Box<dyn Serializer>>,
}

impl RecordOptions {
    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }
}

/// Built-in record formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFormat {
    Kinesis,
}

impl RecordFormat {
    pub const ALL: [RecordFormat; 1] = [Self::Kinesis];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Kinesis => kinesis::FORMAT_NAME,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Kinesis => "Kinesis",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.name() == name)
    }
}

pub type RecordFactory = FormatRegistry<dyn Record, RecordOptions>;

impl FormatRegistry<dyn Record, RecordOptions> {
    pub fn new(hooks: Hooks<dyn Record, RecordOptions>) -> Self {
        Self::bound_to(hooks, HookContext::unbound())
    }

    pub(crate) fn bound_to(hooks: Hooks<dyn Record, RecordOptions>, context: HookContext) -> Self {
        Self::with_seed("record", record_seed, hooks, context)
    }
}

fn record_seed() -> FormatMap<dyn Record, RecordOptions> {
    RecordFormat::ALL
        .into_iter()
        .map(|format| {
            let entry = Format::new(format.label(), move |options| build_record(format, options));
            (format.name().to_string(), entry)
        })
        .collect()
}

fn build_record(format: RecordFormat, options: RecordOptions) -> ExportResult<Box<dyn Record>> {
    let record: Box<dyn Record> = match format {
        RecordFormat::Kinesis => Box::new(KinesisRecord::new(
            options.stream.as_deref().unwrap_or_default(),
            options.encoder,
            options.serializer,
        )?),
    };
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;

    #[test]
    fn test_kinesis_registered() {
        let factory = RecordFactory::new(vec![]);
        assert_eq!(
            factory.formats().get("rec_kinesis").map(String::as_str),
            Some("Kinesis")
        );

        let record = factory
            .create("rec_kinesis", RecordOptions::default().with_stream("my-stream"))
            .unwrap();
        assert_eq!(record.format_name(), "rec_kinesis");
        assert_eq!(record.encoder().format_name(), "enc_utf8");
        assert_eq!(record.serializer().format_name(), "ser_json");
    }

    #[test]
    fn test_missing_stream_name_is_rejected() {
        let error = RecordFactory::new(vec![])
            .create("rec_kinesis", RecordOptions::default())
            .unwrap_err();
        assert!(matches!(error, ExportError::InvalidConfiguration(_)));
    }
}
