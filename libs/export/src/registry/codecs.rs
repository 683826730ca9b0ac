//! Serializer and encoder registries
//!
//! Seeds the codec crate's built-in formats into [`FormatRegistry`] so they
//! can be listed, extended and created by name like every other family.

use super::{Format, FormatMap, FormatRegistry, HookContext, Hooks};
use crate::error::ExportResult;
use codec::encoder::{Base64Encoder, Encoder, EncoderFormat, HexEncoder, Utf8Encoder};
use codec::serializer::{
    CsvSerializer, JsonFlags, JsonSerializer, LineDelimitedJsonSerializer, Serializer,
    SerializerFormat,
};

/// Serializer constructor options; `None` selects the format's default
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializerOptions {
    /// CSV field separator
    pub separator: Option<String>,
    /// CSV field enclosure
    pub enclosure: Option<String>,
    /// CSV escape character; blank disables escaping
    pub escape: Option<String>,
    /// CSV in-memory limit in bytes
    pub memory: Option<i64>,
    /// JSON / NDJSON flag mask
    pub flags: Option<i64>,
    /// JSON / NDJSON maximum depth
    pub depth: Option<i64>,
    /// NDJSON line delimiter
    pub delimiter: Option<String>,
}

impl SerializerOptions {
    pub fn with_flags(mut self, flags: JsonFlags) -> Self {
        self.flags = Some(i64::from(flags.bits()));
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }
}

/// Encoder constructor options; `None` selects the format's default
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Source character encoding of the UTF-8 encoder
    pub encoding: Option<String>,
}

pub type SerializerFactory = FormatRegistry<dyn Serializer, SerializerOptions>;
pub type EncoderFactory = FormatRegistry<dyn Encoder, EncoderOptions>;

impl FormatRegistry<dyn Serializer, SerializerOptions> {
    pub fn new(hooks: Hooks<dyn Serializer, SerializerOptions>) -> Self {
        Self::bound_to(hooks, HookContext::unbound())
    }

    pub(crate) fn bound_to(
        hooks: Hooks<dyn Serializer, SerializerOptions>,
        context: HookContext,
    ) -> Self {
        Self::with_seed("serializer", serializer_seed, hooks, context)
    }
}

impl FormatRegistry<dyn Encoder, EncoderOptions> {
    pub fn new(hooks: Hooks<dyn Encoder, EncoderOptions>) -> Self {
        Self::bound_to(hooks, HookContext::unbound())
    }

    pub(crate) fn bound_to(hooks: Hooks<dyn Encoder, EncoderOptions>, context: HookContext) -> Self {
        Self::with_seed("encoder", encoder_seed, hooks, context)
    }
}

fn serializer_seed() -> FormatMap<dyn Serializer, SerializerOptions> {
    SerializerFormat::ALL
        .into_iter()
        .map(|format| {
            let entry = Format::new(format.label(), move |options| build_serializer(format, options));
            (format.name().to_string(), entry)
        })
        .collect()
}

fn build_serializer(
    format: SerializerFormat,
    options: SerializerOptions,
) -> ExportResult<Box<dyn Serializer>> {
    let serializer: Box<dyn Serializer> = match format {
        SerializerFormat::Csv => Box::new(CsvSerializer::new(
            options.separator.as_deref(),
            options.enclosure.as_deref(),
            options.escape.as_deref(),
            options.memory,
        )),
        SerializerFormat::Json => Box::new(JsonSerializer::new(options.flags, options.depth)),
        SerializerFormat::Ndjson => Box::new(LineDelimitedJsonSerializer::new(
            options.delimiter.as_deref(),
            options.flags,
            options.depth,
        )),
    };
    Ok(serializer)
}

fn encoder_seed() -> FormatMap<dyn Encoder, EncoderOptions> {
    EncoderFormat::ALL
        .into_iter()
        .map(|format| {
            let entry = Format::new(format.label(), move |options| build_encoder(format, options));
            (format.name().to_string(), entry)
        })
        .collect()
}

fn build_encoder(format: EncoderFormat, options: EncoderOptions) -> ExportResult<Box<dyn Encoder>> {
    let encoder: Box<dyn Encoder> = match format {
        EncoderFormat::Utf8 => Box::new(Utf8Encoder::new(options.encoding.as_deref())),
        EncoderFormat::Hex => Box::new(HexEncoder::new()),
        EncoderFormat::Base64 => Box::new(Base64Encoder::new()),
    };
    Ok(encoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::hook;
    use codec::Fields;

    #[test]
    fn test_builtin_serializers() {
        let factory = SerializerFactory::new(vec![]);
        let formats = factory.formats();
        assert_eq!(formats.get("ser_csv").map(String::as_str), Some("CSV"));
        assert_eq!(formats.get("ser_json").map(String::as_str), Some("JSON"));
        assert_eq!(formats.get("ser_ndjson").map(String::as_str), Some("NDJSON"));

        for name in ["ser_csv", "ser_json", "ser_ndjson"] {
            let serializer = factory.create(name, SerializerOptions::default()).unwrap();
            assert_eq!(serializer.format_name(), name);
        }
    }

    #[test]
    fn test_builtin_encoders() {
        let factory = EncoderFactory::new(vec![]);
        let labels: Vec<String> = factory.formats().into_values().collect();
        assert_eq!(labels, vec!["UTF-8", "Base16", "Base64"]);

        let hex = factory.create("enc_hex", EncoderOptions::default()).unwrap();
        assert_eq!(hex.encode(b"HD1").unwrap(), "484431");
    }

    #[test]
    fn test_options_reach_constructor() {
        let factory = SerializerFactory::new(vec![]);
        let csv = factory
            .create("ser_csv", SerializerOptions::default().with_separator(";"))
            .unwrap();

        let mut fields = Fields::new();
        fields.push("a");
        fields.push("b");
        assert_eq!(csv.serialize(&fields).unwrap(), b"a;b\n");

        let utf8 = EncoderFactory::new(vec![])
            .create(
                "enc_utf8",
                EncoderOptions {
                    encoding: Some("latin1".to_string()),
                },
            )
            .unwrap();
        assert_eq!(utf8.encode(b"caf\xe9").unwrap(), "café");
    }

    #[test]
    fn test_hook_registered_serializer() {
        let tsv = hook(
            |formats: &mut FormatMap<dyn Serializer, SerializerOptions>, _: &HookContext| {
                formats.insert(
                    "ser_tsv".to_string(),
                    Format::new("TSV", |_options: SerializerOptions| {
                        let serializer: Box<dyn Serializer> =
                            Box::new(CsvSerializer::new(Some("\t"), None, None, None));
                        Ok(serializer)
                    }),
                );
            },
        );
        let factory = SerializerFactory::new(vec![tsv]);
        assert_eq!(factory.formats().get("ser_tsv").map(String::as_str), Some("TSV"));

        let mut fields = Fields::new();
        fields.push("x");
        fields.push("y");
        let tsv = factory.create("ser_tsv", SerializerOptions::default()).unwrap();
        assert_eq!(tsv.serialize(&fields).unwrap(), b"x\ty\n");
    }

    #[test]
    fn test_unknown_serializer() {
        let error = SerializerFactory::new(vec![])
            .create("ser_xml", SerializerOptions::default())
            .unwrap_err();
        assert!(error.is_configuration_error());
    }
}
