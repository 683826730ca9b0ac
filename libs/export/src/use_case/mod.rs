//! # Use Cases
//!
//! ## Purpose
//!
//! A use case is the orchestrator of one export pipeline. It owns a
//! [`Tuple`], a [`Record`] and a [`Stream`], reacts to host events and pushes
//! one job per event:
//!
//! ```text
//! HostEvent ─→ Fields ─→ field hooks ─→ Tuple ─→ Record::update ─→ Stream::append
//! ```
//!
//! ## Failure Boundary
//!
//! Everything below the use case propagates errors with `?`. The use case is
//! the single recovery point: a failed export is logged at `warn` level,
//! tagged with the use case name, and the host never sees it.

pub mod dispatcher;
pub mod event;
pub mod tickets_creation;

pub use dispatcher::Dispatcher;
pub use event::{HostEvent, Ticket, Trigger};
pub use tickets_creation::TicketsCreationUseCase;

use crate::error::{ExportError, ExportResult};
use crate::record::Record;
use crate::registry::{Format, FormatMap, FormatRegistry, HookContext, Hooks};
use crate::stream::{BeanstalkStream, Stream};
use crate::tuple::{Sequence, Tuple};
use async_trait::async_trait;
use codec::Fields;
use std::fmt::Debug;
use std::sync::Arc;

/// Alter hook run over the fields of every ticket before they reach the tuple
pub type FieldsHook = Arc<dyn Fn(&mut Fields, &Ticket) + Send + Sync>;

/// Wrap a closure as a [`FieldsHook`]
pub fn fields_hook(f: impl Fn(&mut Fields, &Ticket) + Send + Sync + 'static) -> FieldsHook {
    Arc::new(f)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCaseState {
    Idle,
    /// An export is in flight
    Resolving,
}

#[async_trait]
pub trait UseCase: Send + Sync + Debug {
    /// Events this use case reacts to
    fn triggers(&self) -> &'static [Trigger];

    /// React to `event`. Export failures are logged and swallowed.
    async fn handle(&mut self, event: &HostEvent);

    fn state(&self) -> UseCaseState;

    fn tuple(&self) -> &dyn Tuple;

    fn record(&self) -> &dyn Record;

    fn set_record(&mut self, record: Box<dyn Record>);

    fn stream(&self) -> &dyn Stream;

    fn set_stream(&mut self, stream: Box<dyn Stream>);

    /// Queue passed to every append, `None` for the stream default
    fn queue(&self) -> Option<&str>;

    /// Registry name of this use case
    fn format_name(&self) -> &'static str;
}

/// Pull `tuple` into `record` and append the record to `stream`
pub async fn resolve(
    tuple: &dyn Tuple,
    record: &mut dyn Record,
    stream: &dyn Stream,
    queue: Option<&str>,
) -> ExportResult<bool> {
    let record = record.update(tuple)?;
    stream.append(record, queue).await
}

/// Use case constructor options
#[derive(Debug, Default)]
pub struct UseCaseOptions {
    /// Tuple refilled on every event; defaults to a CSV sequence
    pub tuple: Option<Box<dyn Tuple>>,
    /// Record envelope; required
    pub record: Option<Box<dyn Record>>,
    /// Transport; defaults to a local beanstalkd
    pub stream: Option<Box<dyn Stream>>,
    pub queue: Option<String>,
    /// Code identifying this helpdesk in every exported row
    pub helpdesk_code: Option<String>,
}

/// Built-in use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseCaseFormat {
    TicketsCreation,
}

impl UseCaseFormat {
    pub const ALL: [UseCaseFormat; 1] = [Self::TicketsCreation];

    pub const fn name(self) -> &'static str {
        match self {
            Self::TicketsCreation => tickets_creation::FORMAT_NAME,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TicketsCreation => "Tickets creation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.name() == name)
    }
}

pub type UseCaseFactory = FormatRegistry<dyn UseCase, UseCaseOptions>;

impl FormatRegistry<dyn UseCase, UseCaseOptions> {
    /// `fields_hooks` are handed to every use case this factory builds
    pub fn new(hooks: Hooks<dyn UseCase, UseCaseOptions>, fields_hooks: Vec<FieldsHook>) -> Self {
        Self::with_seed(
            "use case",
            move || use_case_seed(&fields_hooks),
            hooks,
            HookContext::unbound(),
        )
    }
}

fn use_case_seed(fields_hooks: &[FieldsHook]) -> FormatMap<dyn UseCase, UseCaseOptions> {
    UseCaseFormat::ALL
        .into_iter()
        .map(|format| {
            let fields_hooks = fields_hooks.to_vec();
            let entry = Format::new(format.label(), move |options| {
                build_use_case(format, options, fields_hooks.clone())
            });
            (format.name().to_string(), entry)
        })
        .collect()
}

fn build_use_case(
    format: UseCaseFormat,
    options: UseCaseOptions,
    fields_hooks: Vec<FieldsHook>,
) -> ExportResult<Box<dyn UseCase>> {
    let use_case: Box<dyn UseCase> = match format {
        UseCaseFormat::TicketsCreation => {
            let record = options.record.ok_or_else(|| {
                ExportError::invalid_configuration(format!("{} requires a record", format.name()))
            })?;
            let tuple = options
                .tuple
                .unwrap_or_else(|| Box::new(Sequence::default()));
            let stream = options
                .stream
                .unwrap_or_else(|| Box::new(BeanstalkStream::default()));

            Box::new(
                TicketsCreationUseCase::new(tuple, record, stream, options.queue)
                    .with_helpdesk_code(options.helpdesk_code)
                    .with_fields_hooks(fields_hooks),
            )
        }
    };
    Ok(use_case)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KinesisRecord;

    fn record() -> Box<dyn Record> {
        Box::new(KinesisRecord::new("my-stream", None, None).unwrap())
    }

    #[test]
    fn test_tickets_creation_registered() {
        let factory = UseCaseFactory::new(vec![], vec![]);
        assert_eq!(
            factory.formats().get("tickets_creation").map(String::as_str),
            Some("Tickets creation")
        );
    }

    #[test]
    fn test_defaults_fill_tuple_and_stream() {
        let use_case = UseCaseFactory::new(vec![], vec![])
            .create(
                "tickets_creation",
                UseCaseOptions {
                    record: Some(record()),
                    queue: Some("tickets".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(use_case.format_name(), "tickets_creation");
        assert_eq!(use_case.state(), UseCaseState::Idle);
        assert_eq!(use_case.tuple().format_name(), "tpl_sequence");
        assert_eq!(use_case.stream().format_name(), "stm_beanstalk");
        assert_eq!(use_case.queue(), Some("tickets"));
        assert_eq!(use_case.triggers(), &[Trigger::TicketCreated]);
    }

    #[test]
    fn test_missing_record_is_rejected() {
        let error = UseCaseFactory::new(vec![], vec![])
            .create("tickets_creation", UseCaseOptions::default())
            .unwrap_err();
        assert!(error.is_configuration_error());
    }
}
