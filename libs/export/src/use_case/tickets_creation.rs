//! Ticket creation export
//!
//! Every `ticket.created` event becomes one row:
//!
//! | Field | Source |
//! |-------|--------|
//! | `helpdesk_code` | configured helpdesk code |
//! | `datetime_complete` | ticket creation timestamp |
//! | `department_id` | owning department |
//! | `department_name` | owning department |
//! | `helptopic_id` | help topic |
//! | `helptopic_label` | help topic |
//!
//! Missing values are exported as null. Field hooks run after the row is
//! built and may add, replace or drop entries.

use super::{resolve, FieldsHook, HostEvent, Ticket, Trigger, UseCase, UseCaseState};
use crate::record::Record;
use crate::stream::Stream;
use crate::tuple::Tuple;
use async_trait::async_trait;
use codec::Fields;
use std::fmt;
use tracing::{debug, warn};

pub const FORMAT_NAME: &str = "tickets_creation";

const TRIGGERS: &[Trigger] = &[Trigger::TicketCreated];

pub struct TicketsCreationUseCase {
    tuple: Box<dyn Tuple>,
    record: Box<dyn Record>,
    stream: Box<dyn Stream>,
    queue: Option<String>,
    helpdesk_code: Option<String>,
    fields_hooks: Vec<FieldsHook>,
    state: UseCaseState,
}

impl fmt::Debug for TicketsCreationUseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketsCreationUseCase")
            .field("tuple", &self.tuple)
            .field("record", &self.record)
            .field("stream", &self.stream)
            .field("queue", &self.queue)
            .field("helpdesk_code", &self.helpdesk_code)
            .field("fields_hooks", &self.fields_hooks.len())
            .field("state", &self.state)
            .finish()
    }
}

impl TicketsCreationUseCase {
    pub fn new(
        tuple: Box<dyn Tuple>,
        record: Box<dyn Record>,
        stream: Box<dyn Stream>,
        queue: Option<String>,
    ) -> Self {
        Self {
            tuple,
            record,
            stream,
            queue,
            helpdesk_code: None,
            fields_hooks: Vec::new(),
            state: UseCaseState::Idle,
        }
    }

    pub fn with_helpdesk_code(mut self, code: Option<String>) -> Self {
        self.helpdesk_code = code;
        self
    }

    pub fn with_fields_hooks(mut self, hooks: Vec<FieldsHook>) -> Self {
        self.fields_hooks = hooks;
        self
    }

    pub fn helpdesk_code(&self) -> Option<&str> {
        self.helpdesk_code.as_deref()
    }

    /// Row exported for `ticket`, before field hooks
    pub fn ticket_fields(&self, ticket: &Ticket) -> Fields {
        let mut fields = Fields::new();
        fields.insert(Some("helpdesk_code".into()), self.helpdesk_code.clone());
        fields.insert(Some("datetime_complete".into()), ticket.created.clone());
        fields.insert(Some("department_id".into()), ticket.department_id);
        fields.insert(Some("department_name".into()), ticket.department_name.clone());
        fields.insert(Some("helptopic_id".into()), ticket.help_topic_id);
        fields.insert(Some("helptopic_label".into()), ticket.help_topic.clone());
        fields
    }

    /// Export `ticket`.
    ///
    /// Returns whether the stream accepted the job, or `None` when the export
    /// failed. Failures are logged, never returned.
    pub async fn on_ticket_created(&mut self, ticket: &Ticket) -> Option<bool> {
        let mut fields = self.ticket_fields(ticket);
        for hook in &self.fields_hooks {
            hook(&mut fields, ticket);
        }
        self.tuple.clear().add_range(fields);

        self.state = UseCaseState::Resolving;
        let result = resolve(
            self.tuple.as_ref(),
            self.record.as_mut(),
            self.stream.as_ref(),
            self.queue.as_deref(),
        )
        .await;
        self.state = UseCaseState::Idle;

        match result {
            Ok(accepted) => {
                debug!(use_case = FORMAT_NAME, ticket = ?ticket.id, accepted, "Ticket exported");
                Some(accepted)
            }
            Err(e) => {
                warn!(use_case = FORMAT_NAME, ticket = ?ticket.id, "Ticket export failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl UseCase for TicketsCreationUseCase {
    fn triggers(&self) -> &'static [Trigger] {
        TRIGGERS
    }

    async fn handle(&mut self, event: &HostEvent) {
        match event {
            HostEvent::TicketCreated(ticket) => {
                self.on_ticket_created(ticket).await;
            }
        }
    }

    fn state(&self) -> UseCaseState {
        self.state
    }

    fn tuple(&self) -> &dyn Tuple {
        self.tuple.as_ref()
    }

    fn record(&self) -> &dyn Record {
        self.record.as_ref()
    }

    fn set_record(&mut self, record: Box<dyn Record>) {
        self.record = record;
    }

    fn stream(&self) -> &dyn Stream {
        self.stream.as_ref()
    }

    fn set_stream(&mut self, stream: Box<dyn Stream>) {
        self.stream = stream;
    }

    fn queue(&self) -> Option<&str> {
        self.queue.as_deref()
    }

    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KinesisRecord;
    use crate::stream::BeanstalkStream;
    use crate::test_utils::{FakeBeanstalkd, ReplyMode};
    use crate::tuple::Sequence;
    use crate::use_case::fields_hook;
    use codec::Offset;
    use serde_json::{json, Value};
    use tracing_test::traced_test;

    fn ticket() -> Ticket {
        Ticket {
            id: Some(17),
            number: Some("482913".to_string()),
            created: Some("2024-01-01 10:00:00".to_string()),
            department_id: Some(3),
            department_name: Some("Support".to_string()),
            help_topic_id: Some(7),
            help_topic: Some("Billing".to_string()),
        }
    }

    fn use_case(port: u16) -> TicketsCreationUseCase {
        TicketsCreationUseCase::new(
            Box::new(Sequence::default()),
            Box::new(KinesisRecord::new("my-stream", None, None).unwrap()),
            Box::new(BeanstalkStream::new(
                Some("127.0.0.1"),
                Some(i64::from(port)),
                None,
                None,
                None,
            )),
            Some("tickets".to_string()),
        )
        .with_helpdesk_code(Some("HD1".to_string()))
    }

    fn data(server: &FakeBeanstalkd) -> Vec<String> {
        server
            .jobs()
            .iter()
            .map(|job| {
                let envelope: Value = serde_json::from_slice(&job.body).unwrap();
                envelope["Data"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[test]
    fn test_ticket_fields() {
        let fields = use_case(11300).ticket_fields(&ticket());
        let keys: Vec<String> = fields.iter().map(|(offset, _)| offset.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "helpdesk_code",
                "datetime_complete",
                "department_id",
                "department_name",
                "helptopic_id",
                "helptopic_label"
            ]
        );
        assert_eq!(fields.get_key("department_id"), Some(&json!(3)));
        assert_eq!(fields.get_key("helpdesk_code"), Some(&json!("HD1")));
    }

    #[test]
    fn test_debug_reports_hook_count() {
        let hook = fields_hook(|_: &mut Fields, _: &Ticket| {});
        let use_case = use_case(11300).with_fields_hooks(vec![hook.clone(), hook]);

        let debug = format!("{:?}", use_case);
        assert!(debug.starts_with("TicketsCreationUseCase"));
        assert!(debug.contains("fields_hooks: 2"));
        assert!(debug.contains("HD1"));
    }

    #[test]
    fn test_missing_ticket_values_are_null() {
        let fields = use_case(11300).ticket_fields(&Ticket::default());
        assert_eq!(fields.get_key("department_name"), Some(&Value::Null));
        assert_eq!(fields.get_key("helptopic_id"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_ticket_exported_as_csv_row() {
        let server = FakeBeanstalkd::start().await.unwrap();
        let mut use_case = use_case(server.port());

        assert_eq!(use_case.on_ticket_created(&ticket()).await, Some(true));
        assert_eq!(use_case.state(), UseCaseState::Idle);

        let jobs = server.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].tube, "tickets");
        assert_eq!(
            data(&server),
            vec!["HD1,\"2024-01-01 10:00:00\",3,Support,7,Billing\n"]
        );
    }

    #[tokio::test]
    async fn test_tuple_is_refilled_per_event() {
        let server = FakeBeanstalkd::start().await.unwrap();
        let mut use_case = use_case(server.port());

        use_case.on_ticket_created(&ticket()).await;
        let second = Ticket {
            department_id: Some(4),
            ..Ticket::default()
        };
        use_case.on_ticket_created(&second).await;

        assert_eq!(use_case.tuple().fields().len(), 6);
        assert_eq!(data(&server)[1], "HD1,,4,,,\n");
    }

    #[tokio::test]
    async fn test_fields_hooks_alter_row_in_order() {
        let server = FakeBeanstalkd::start().await.unwrap();
        let keep = fields_hook(|fields: &mut Fields, _: &Ticket| {
            for key in ["datetime_complete", "department_name", "helptopic_id", "helptopic_label"] {
                fields.remove(&Offset::from(key));
            }
        });
        let append = fields_hook(|fields: &mut Fields, ticket: &Ticket| {
            fields.insert(Some("number".into()), ticket.number.clone());
        });
        let mut use_case = use_case(server.port()).with_fields_hooks(vec![keep, append]);

        assert_eq!(use_case.on_ticket_created(&ticket()).await, Some(true));
        assert_eq!(data(&server), vec!["HD1,3,482913\n"]);
    }

    #[tokio::test]
    async fn test_buried_job_reported_as_not_accepted() {
        let server = FakeBeanstalkd::start().await.unwrap();
        server.set_reply(ReplyMode::Bury);
        let mut use_case = use_case(server.port());

        assert_eq!(use_case.on_ticket_created(&ticket()).await, Some(false));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_transport_failure_is_logged_and_swallowed() {
        let server = FakeBeanstalkd::start().await.unwrap();
        server.set_reply(ReplyMode::Fail("OUT_OF_MEMORY".to_string()));
        let mut use_case = use_case(server.port());

        use_case.handle(&HostEvent::TicketCreated(ticket())).await;

        assert_eq!(use_case.state(), UseCaseState::Idle);
        assert!(logs_contain("tickets_creation"));
        assert!(logs_contain("Ticket export failed"));
        assert!(logs_contain("OUT_OF_MEMORY"));
    }
}
