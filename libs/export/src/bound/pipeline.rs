//! Bound tuple, record and stream factories

use super::codecs::{BoundEncoderFactory, BoundSerializerFactory};
use super::source::{ConfigKey, ConfigSource};
use super::{fill, require_name};
use crate::error::ExportResult;
use crate::extensions::Extensions;
use crate::record::{Record, RecordFactory, RecordFormat, RecordOptions};
use crate::registry::{EncoderOptions, HookContext, SerializerOptions};
use crate::stream::{Stream, StreamFactory, StreamFormat, StreamOptions};
use crate::tuple::{Tuple, TupleFactory, TupleFormat, TupleOptions};
use indexmap::IndexMap;
use std::sync::Arc;

/// Tuples of use case `context`
#[derive(Debug)]
pub struct BoundTupleFactory {
    registry: TupleFactory,
    source: Arc<dyn ConfigSource>,
    extensions: Extensions,
    context: String,
}

impl BoundTupleFactory {
    pub fn new(
        context: &str,
        source: Arc<dyn ConfigSource>,
        extensions: &Extensions,
    ) -> ExportResult<Self> {
        let context = require_name("use case context", context)?;
        let registry = TupleFactory::bound_to(
            extensions.tuples.clone(),
            HookContext::bound(Some(context.as_str()), None),
        );

        Ok(Self {
            registry,
            source,
            extensions: extensions.clone(),
            context,
        })
    }

    pub fn formats(&self) -> IndexMap<String, String> {
        self.registry.formats()
    }

    pub fn create(&self, name: &str, mut options: TupleOptions) -> ExportResult<Box<dyn Tuple>> {
        if let Some(TupleFormat::Sequence) = TupleFormat::from_name(name) {
            if options.serializer.is_none() {
                let key = ConfigKey::new(Some(self.context.as_str()), Some(name), "serializer");
                if let Some(serializer) = self.source.lookup_str(&key) {
                    let factory = BoundSerializerFactory::new(
                        &self.context,
                        name,
                        Arc::clone(&self.source),
                        &self.extensions,
                    )?;
                    options.serializer =
                        Some(factory.create(&serializer, SerializerOptions::default())?);
                }
            }
        }

        self.registry.create(name, options)
    }
}

/// Records of use case `context`
#[derive(Debug)]
pub struct BoundRecordFactory {
    registry: RecordFactory,
    source: Arc<dyn ConfigSource>,
    extensions: Extensions,
    context: String,
}

impl BoundRecordFactory {
    pub fn new(
        context: &str,
        source: Arc<dyn ConfigSource>,
        extensions: &Extensions,
    ) -> ExportResult<Self> {
        let context = require_name("use case context", context)?;
        let registry = RecordFactory::bound_to(
            extensions.records.clone(),
            HookContext::bound(Some(context.as_str()), None),
        );

        Ok(Self {
            registry,
            source,
            extensions: extensions.clone(),
            context,
        })
    }

    pub fn formats(&self) -> IndexMap<String, String> {
        self.registry.formats()
    }

    pub fn create(&self, name: &str, mut options: RecordOptions) -> ExportResult<Box<dyn Record>> {
        if let Some(RecordFormat::Kinesis) = RecordFormat::from_name(name) {
            fill(&mut options.stream, || self.lookup_str(name, "stream"));

            if options.encoder.is_none() {
                if let Some(encoder) = self.lookup_str(name, "encoder") {
                    let factory = BoundEncoderFactory::new(
                        &self.context,
                        name,
                        Arc::clone(&self.source),
                        &self.extensions,
                    )?;
                    options.encoder = Some(factory.create(&encoder, EncoderOptions::default())?);
                }
            }

            if options.serializer.is_none() {
                if let Some(serializer) = self.lookup_str(name, "serializer") {
                    let factory = BoundSerializerFactory::new(
                        &self.context,
                        name,
                        Arc::clone(&self.source),
                        &self.extensions,
                    )?;
                    options.serializer =
                        Some(factory.create(&serializer, SerializerOptions::default())?);
                }
            }
        }

        self.registry.create(name, options)
    }

    fn lookup_str(&self, name: &str, argument: &str) -> Option<String> {
        self.source
            .lookup_str(&ConfigKey::new(Some(self.context.as_str()), Some(name), argument))
    }
}

/// Streams; their parameters are shared by every use case
#[derive(Debug)]
pub struct BoundStreamFactory {
    registry: StreamFactory,
    source: Arc<dyn ConfigSource>,
}

impl BoundStreamFactory {
    pub fn new(source: Arc<dyn ConfigSource>, extensions: &Extensions) -> Self {
        Self {
            registry: StreamFactory::new(extensions.streams.clone()),
            source,
        }
    }

    pub fn formats(&self) -> IndexMap<String, String> {
        self.registry.formats()
    }

    pub fn create(&self, name: &str, mut options: StreamOptions) -> ExportResult<Box<dyn Stream>> {
        if let Some(StreamFormat::Beanstalk) = StreamFormat::from_name(name) {
            let source = self.source.as_ref();
            fill(&mut options.host, || source.lookup_str(&ConfigKey::new(None, Some(name), "host")));
            fill(&mut options.port, || source.lookup_i64(&ConfigKey::new(None, Some(name), "port")));
            fill(&mut options.priority, || {
                source.lookup_i64(&ConfigKey::new(None, Some(name), "priority"))
            });
            fill(&mut options.delay, || source.lookup_i64(&ConfigKey::new(None, Some(name), "delay")));
            fill(&mut options.ttr, || source.lookup_i64(&ConfigKey::new(None, Some(name), "ttr")));
            fill(&mut options.tube, || {
                source
                    .lookup_str(&ConfigKey::new(None, Some(name), "tube"))
                    .filter(|tube| !tube.trim().is_empty())
            });
        }

        self.registry.create(name, options)
    }
}
