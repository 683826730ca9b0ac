//! Test fixtures: configuration documents and tickets

use codec::{Fields, Offset};
use export::extensions::Extensions;
use export::use_case::Ticket;

/// Configuration with `tickets_creation` enabled against a local beanstalkd
/// on `port`
pub fn config_toml(port: u16) -> String {
    format!(
        r#"
helpdesk_code = "HD1"
stream = "stm_beanstalk"

[logging]
level = "debug"

[streams.stm_beanstalk]
host = "127.0.0.1"
port = {port}
priority = 1024
delay = 0
ttr = 60

[use_cases.tickets_creation]
enabled = true
tuple = "tpl_sequence"
record = "rec_kinesis"

[use_cases.tickets_creation.formats.tpl_sequence]
serializer = "ser_csv"

[use_cases.tickets_creation.formats.tpl_sequence.ser_csv]
separator = ","

[use_cases.tickets_creation.formats.rec_kinesis]
stream = "my-stream"
encoder = "enc_utf8"
serializer = "ser_json"

[use_cases.tickets_creation.formats.stm_beanstalk]
queue = "tickets"
"#
    )
}

/// Fully populated ticket
pub fn ticket(id: i64, department_id: i64) -> Ticket {
    Ticket {
        id: Some(id),
        number: Some(format!("{:06}", id)),
        created: Some("2024-01-01 10:00:00".to_string()),
        department_id: Some(department_id),
        department_name: Some("Support".to_string()),
        help_topic_id: Some(7),
        help_topic: Some("Billing".to_string()),
    }
}

/// Extensions keeping only the given ticket fields, in row order
pub fn keep_fields(keys: &'static [&'static str]) -> Extensions {
    let mut extensions = Extensions::new();
    extensions.on_ticket_fields(move |fields: &mut Fields, _: &Ticket| {
        let kept: Fields = fields
            .iter()
            .filter(|(offset, _)| matches!(offset, Offset::Key(key) if keys.contains(&key.as_str())))
            .map(|(offset, value)| (offset.clone(), value.clone()))
            .collect();
        *fields = kept;
    });
    extensions
}
