//! Configuration file to beanstalkd job, end to end

use export::extensions::Extensions;
use export::test_utils::ReplyMode;
use export::use_case::HostEvent;
use serde_json::{json, Value};
use streamer_e2e_tests::{config_toml, keep_fields, ticket, TestPipeline};

const HD1_FIELDS: &[&str] = &["helpdesk_code", "department_id"];

#[tokio::test]
async fn test_ticket_created_reaches_queue() {
    let pipeline = TestPipeline::start(config_toml).await.unwrap();
    let mut dispatcher = pipeline.dispatcher(None, &keep_fields(HD1_FIELDS)).unwrap();
    assert_eq!(dispatcher.len(), 1);

    let handled = dispatcher
        .dispatch(&HostEvent::TicketCreated(ticket(42, 3)))
        .await;
    assert_eq!(handled, 1);

    let jobs = pipeline.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].tube, "tickets");
    assert_eq!((jobs[0].priority, jobs[0].delay, jobs[0].ttr), (1024, 0, 60));
    assert!(!jobs[0].buried);

    assert_eq!(
        pipeline.envelopes().unwrap()[0],
        json!({"Data": "HD1,3\n", "StreamName": "my-stream", "PartitionKey": "KinesisRecord"})
    );
    dispatcher.shutdown().await;
}

#[tokio::test]
async fn test_full_ticket_row() {
    let pipeline = TestPipeline::start(config_toml).await.unwrap();
    let mut dispatcher = pipeline.dispatcher(None, &Extensions::new()).unwrap();

    dispatcher
        .dispatch(&HostEvent::TicketCreated(ticket(42, 3)))
        .await;

    let envelopes = pipeline.envelopes().unwrap();
    assert_eq!(
        envelopes[0]["Data"],
        Value::from("HD1,\"2024-01-01 10:00:00\",3,Support,7,Billing\n")
    );
}

#[tokio::test]
async fn test_environment_overlay_swaps_formats() {
    let pipeline = TestPipeline::start(config_toml).await.unwrap();
    pipeline
        .write_environment(
            "staging",
            r#"
[use_cases.tickets_creation.formats.tpl_sequence.ser_csv]
separator = ";"

[use_cases.tickets_creation.formats.rec_kinesis]
encoder = "enc_base64"
"#,
        )
        .unwrap();

    let mut dispatcher = pipeline
        .dispatcher(Some("staging"), &keep_fields(HD1_FIELDS))
        .unwrap();
    dispatcher
        .dispatch(&HostEvent::TicketCreated(ticket(42, 3)))
        .await;

    let envelope = &pipeline.envelopes().unwrap()[0];
    assert_eq!(envelope["Data"], Value::from("SEQxOzMK"));
    assert_eq!(envelope["StreamName"], Value::from("my-stream"));
}

#[tokio::test]
async fn test_disabled_use_case_sends_nothing() {
    let pipeline = TestPipeline::start(|port| {
        config_toml(port).replace("enabled = true", "enabled = false")
    })
    .await
    .unwrap();

    let mut dispatcher = pipeline.dispatcher(None, &Extensions::new()).unwrap();
    assert!(dispatcher.is_empty());

    let handled = dispatcher
        .dispatch(&HostEvent::TicketCreated(ticket(42, 3)))
        .await;
    assert_eq!(handled, 0);
    assert!(pipeline.jobs().is_empty());
    assert_eq!(pipeline.server().connections(), 0);
}

#[tokio::test]
async fn test_buried_job_is_recorded() {
    let pipeline = TestPipeline::start(config_toml).await.unwrap();
    pipeline.server().set_reply(ReplyMode::Bury);
    let mut dispatcher = pipeline.dispatcher(None, &keep_fields(HD1_FIELDS)).unwrap();

    dispatcher
        .dispatch(&HostEvent::TicketCreated(ticket(42, 3)))
        .await;

    let jobs = pipeline.jobs();
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].buried);
}

#[tokio::test]
async fn test_failed_put_does_not_stop_dispatch() {
    let pipeline = TestPipeline::start(config_toml).await.unwrap();
    pipeline
        .server()
        .set_reply(ReplyMode::Fail("JOB_TOO_BIG".to_string()));
    let mut dispatcher = pipeline.dispatcher(None, &keep_fields(HD1_FIELDS)).unwrap();

    let handled = dispatcher
        .dispatch(&HostEvent::TicketCreated(ticket(42, 3)))
        .await;
    assert_eq!(handled, 1);
    assert!(pipeline.jobs().is_empty());

    pipeline.server().set_reply(ReplyMode::Insert);
    dispatcher
        .dispatch(&HostEvent::TicketCreated(ticket(43, 5)))
        .await;

    let envelopes = pipeline.envelopes().unwrap();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0]["Data"], Value::from("HD1,5\n"));
}

#[tokio::test]
async fn test_intake_from_json_lines() {
    let pipeline = TestPipeline::start(config_toml).await.unwrap();
    let mut dispatcher = pipeline.dispatcher(None, &keep_fields(HD1_FIELDS)).unwrap();

    let input = concat!(
        r#"{"id": 1, "department_id": 3}"#,
        "\n",
        "not a ticket\n",
        "\n",
        r#"{"id": 2, "department_id": 4}"#,
        "\n",
    );
    let stats = ticket_streamer::intake::run(input.as_bytes(), &mut dispatcher)
        .await
        .unwrap();
    assert_eq!(stats.events, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.handled, 2);

    let data: Vec<Value> = pipeline
        .envelopes()
        .unwrap()
        .into_iter()
        .map(|envelope| envelope["Data"].clone())
        .collect();
    assert_eq!(data, vec![Value::from("HD1,3\n"), Value::from("HD1,4\n")]);
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected() {
    let pipeline = TestPipeline::start(|port| {
        config_toml(port).replace("record = \"rec_kinesis\"", "record = \"\"")
    })
    .await
    .unwrap();

    assert!(pipeline.load(None).is_err());
}
