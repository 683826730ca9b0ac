//! Bound use case factory and bootstrap

use super::pipeline::{BoundRecordFactory, BoundStreamFactory, BoundTupleFactory};
use super::source::{ConfigKey, ConfigSource};
use crate::error::ExportResult;
use crate::extensions::Extensions;
use crate::record::{kinesis, RecordOptions};
use crate::stream::{beanstalk, StreamOptions};
use crate::tuple::{sequence, TupleOptions};
use crate::use_case::{Dispatcher, UseCase, UseCaseFactory, UseCaseFormat, UseCaseOptions};
use codec::validation::is_not_blank;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Global argument naming the stream every use case appends to
pub const STREAM_ARGUMENT: &str = "stream";
/// Global argument holding the helpdesk code
pub const HELPDESK_CODE_ARGUMENT: &str = "helpdesk_code";

#[derive(Debug)]
pub struct BoundUseCaseFactory {
    registry: UseCaseFactory,
    source: Arc<dyn ConfigSource>,
    extensions: Extensions,
}

impl BoundUseCaseFactory {
    pub fn new(source: Arc<dyn ConfigSource>, extensions: &Extensions) -> Self {
        Self {
            registry: UseCaseFactory::new(
                extensions.use_cases.clone(),
                extensions.ticket_fields.clone(),
            ),
            source,
            extensions: extensions.clone(),
        }
    }

    pub fn formats(&self) -> IndexMap<String, String> {
        self.registry.formats()
    }

    /// Whether use case `name` is flagged `enabled`; defaults to `false`
    pub fn is_enabled(&self, name: &str) -> bool {
        self.source
            .lookup_bool(&ConfigKey::new(Some(name), None, "enabled"))
            .unwrap_or(false)
    }

    pub fn create(&self, name: &str, mut options: UseCaseOptions) -> ExportResult<Box<dyn UseCase>> {
        if let Some(UseCaseFormat::TicketsCreation) = UseCaseFormat::from_name(name) {
            if options.tuple.is_none() {
                let format = self
                    .lookup_str(Some(name), "tuple")
                    .unwrap_or_else(|| sequence::FORMAT_NAME.to_string());
                let factory = BoundTupleFactory::new(name, Arc::clone(&self.source), &self.extensions)?;
                options.tuple = Some(factory.create(&format, TupleOptions::default())?);
            }

            if options.record.is_none() {
                let format = self
                    .lookup_str(Some(name), "record")
                    .unwrap_or_else(|| kinesis::FORMAT_NAME.to_string());
                let factory =
                    BoundRecordFactory::new(name, Arc::clone(&self.source), &self.extensions)?;
                options.record = Some(factory.create(&format, RecordOptions::default())?);
            }

            if options.stream.is_none() {
                let format = self
                    .lookup_str(None, STREAM_ARGUMENT)
                    .unwrap_or_else(|| beanstalk::FORMAT_NAME.to_string());
                let factory = BoundStreamFactory::new(Arc::clone(&self.source), &self.extensions);
                options.stream = Some(factory.create(&format, StreamOptions::default())?);
            }

            if options.queue.is_none() {
                let stream_format = options.stream.as_ref().map(|stream| stream.format_name());
                options.queue = self
                    .source
                    .lookup_str(&ConfigKey::new(Some(name), stream_format, "queue"))
                    .filter(|queue| is_not_blank(queue));
            }

            if options.helpdesk_code.is_none() {
                options.helpdesk_code = self
                    .lookup_str(None, HELPDESK_CODE_ARGUMENT)
                    .filter(|code| is_not_blank(code));
            }
        }

        self.registry.create(name, options)
    }

    /// Create every enabled use case and register it with a dispatcher.
    ///
    /// A use case that fails to build is logged and left out.
    pub fn bootstrap(&self) -> Dispatcher {
        let mut dispatcher = Dispatcher::new();

        for (name, label) in self.formats() {
            if !self.is_enabled(&name) {
                debug!(use_case = %name, "Use case disabled");
                continue;
            }

            match self.create(&name, UseCaseOptions::default()) {
                Ok(use_case) => {
                    info!(
                        use_case = %name,
                        label = %label,
                        stream = use_case.stream().format_name(),
                        queue = use_case.queue().unwrap_or_else(|| use_case.stream().default_queue()),
                        "Use case enabled"
                    );
                    dispatcher.register(use_case);
                }
                Err(e) => {
                    warn!(use_case = %name, "Failed to create use case: {}", e);
                }
            }
        }

        dispatcher
    }

    fn lookup_str(&self, context: Option<&str>, argument: &str) -> Option<String> {
        self.source
            .lookup_str(&ConfigKey::new(context, None, argument))
            .filter(|value| is_not_blank(value))
    }
}
