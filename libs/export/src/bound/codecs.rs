//! Bound serializer and encoder factories

use super::source::{ConfigKey, ConfigSource};
use super::{fill, nested, require_name};
use crate::error::ExportResult;
use crate::extensions::Extensions;
use crate::registry::{
    EncoderFactory, EncoderOptions, HookContext, SerializerFactory, SerializerOptions,
};
use codec::encoder::{Encoder, EncoderFormat};
use codec::serializer::{LineEnding, Serializer, SerializerFormat};
use indexmap::IndexMap;
use std::sync::Arc;

/// Serializers owned by `entity_format` inside use case `context`
#[derive(Debug)]
pub struct BoundSerializerFactory {
    registry: SerializerFactory,
    source: Arc<dyn ConfigSource>,
    context: String,
    format: String,
}

impl BoundSerializerFactory {
    pub fn new(
        context: &str,
        entity_format: &str,
        source: Arc<dyn ConfigSource>,
        extensions: &Extensions,
    ) -> ExportResult<Self> {
        let context = require_name("use case context", context)?;
        let format = require_name("entity format", entity_format)?;
        let registry = SerializerFactory::bound_to(
            extensions.serializers.clone(),
            HookContext::bound(Some(context.as_str()), Some(format.as_str())),
        );

        Ok(Self {
            registry,
            source,
            context,
            format,
        })
    }

    pub fn registry(&self) -> &SerializerFactory {
        &self.registry
    }

    pub fn formats(&self) -> IndexMap<String, String> {
        self.registry.formats()
    }

    pub fn create(
        &self,
        name: &str,
        mut options: SerializerOptions,
    ) -> ExportResult<Box<dyn Serializer>> {
        match SerializerFormat::from_name(name) {
            Some(SerializerFormat::Csv) => {
                fill(&mut options.separator, || self.lookup_str(name, "separator"));
                fill(&mut options.enclosure, || self.lookup_str(name, "enclosure"));
                fill(&mut options.escape, || self.lookup_str(name, "escape"));
                fill(&mut options.memory, || self.lookup_i64(name, "memory"));
            }
            Some(SerializerFormat::Json) => {
                fill(&mut options.flags, || self.lookup_flags(name));
                fill(&mut options.depth, || self.lookup_i64(name, "depth"));
            }
            Some(SerializerFormat::Ndjson) => {
                fill(&mut options.delimiter, || {
                    self.lookup_str(name, "delimiter").map(|delimiter| {
                        LineEnding::decode(&delimiter)
                            .map(|ending| ending.as_str().to_string())
                            .unwrap_or(delimiter)
                    })
                });
                fill(&mut options.flags, || self.lookup_flags(name));
                fill(&mut options.depth, || self.lookup_i64(name, "depth"));
            }
            None => {}
        }

        self.registry.create(name, options)
    }

    fn lookup_str(&self, name: &str, parameter: &str) -> Option<String> {
        let argument = nested(name, parameter);
        self.source.lookup_str(&self.key(&argument))
    }

    fn lookup_i64(&self, name: &str, parameter: &str) -> Option<i64> {
        let argument = nested(name, parameter);
        self.source.lookup_i64(&self.key(&argument))
    }

    fn lookup_flags(&self, name: &str) -> Option<i64> {
        let argument = nested(name, "flags");
        self.source.lookup_flags(&self.key(&argument))
    }

    fn key<'a>(&'a self, argument: &'a str) -> ConfigKey<'a> {
        ConfigKey::new(Some(self.context.as_str()), Some(self.format.as_str()), argument)
    }
}

/// Encoders owned by `entity_format` inside use case `context`
#[derive(Debug)]
pub struct BoundEncoderFactory {
    registry: EncoderFactory,
    source: Arc<dyn ConfigSource>,
    context: String,
    format: String,
}

impl BoundEncoderFactory {
    pub fn new(
        context: &str,
        entity_format: &str,
        source: Arc<dyn ConfigSource>,
        extensions: &Extensions,
    ) -> ExportResult<Self> {
        let context = require_name("use case context", context)?;
        let format = require_name("entity format", entity_format)?;
        let registry = EncoderFactory::bound_to(
            extensions.encoders.clone(),
            HookContext::bound(Some(context.as_str()), Some(format.as_str())),
        );

        Ok(Self {
            registry,
            source,
            context,
            format,
        })
    }

    pub fn registry(&self) -> &EncoderFactory {
        &self.registry
    }

    pub fn formats(&self) -> IndexMap<String, String> {
        self.registry.formats()
    }

    pub fn create(&self, name: &str, mut options: EncoderOptions) -> ExportResult<Box<dyn Encoder>> {
        if let Some(EncoderFormat::Utf8) = EncoderFormat::from_name(name) {
            fill(&mut options.encoding, || {
                let argument = nested(name, "encoding");
                self.source.lookup_str(&ConfigKey::new(
                    Some(self.context.as_str()),
                    Some(self.format.as_str()),
                    &argument,
                ))
            });
        }

        self.registry.create(name, options)
    }
}
