//! Ticket event intake
//!
//! Reads one JSON ticket per line and dispatches a `ticket.created` event for
//! each. Blank lines are ignored; lines that do not parse are logged and
//! skipped.

use anyhow::{Context, Result};
use export::use_case::{Dispatcher, HostEvent, Ticket};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeStats {
    /// Events dispatched
    pub events: usize,
    /// Lines that were not valid tickets
    pub skipped: usize,
    /// Use case invocations across all events
    pub handled: usize,
}

/// Dispatch every ticket read from `reader` until end of input
pub async fn run<R>(reader: R, dispatcher: &mut Dispatcher) -> Result<IntakeStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = IntakeStats::default();
    let mut number = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read ticket input")? {
        number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let ticket: Ticket = match serde_json::from_str(&line) {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(line = number, "Skipping invalid ticket: {}", e);
                stats.skipped += 1;
                continue;
            }
        };

        debug!(line = number, ticket = ?ticket.id, "Ticket received");
        stats.handled += dispatcher.dispatch(&HostEvent::TicketCreated(ticket)).await;
        stats.events += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use export::record::KinesisRecord;
    use export::stream::BeanstalkStream;
    use export::test_utils::FakeBeanstalkd;
    use export::tuple::Sequence;
    use export::use_case::TicketsCreationUseCase;
    use tracing_test::traced_test;

    fn dispatcher(port: u16) -> Dispatcher {
        let use_case = TicketsCreationUseCase::new(
            Box::new(Sequence::default()),
            Box::new(KinesisRecord::new("my-stream", None, None).unwrap()),
            Box::new(BeanstalkStream::new(
                Some("127.0.0.1"),
                Some(i64::from(port)),
                None,
                None,
                None,
            )),
            None,
        );
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Box::new(use_case));
        dispatcher
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispatches_each_ticket_line() {
        let server = FakeBeanstalkd::start().await.unwrap();
        let mut dispatcher = dispatcher(server.port());

        let input = b"{\"id\": 1, \"department_id\": 3}\n\n{not json}\n{\"id\": 2}\n";
        let stats = run(&input[..], &mut dispatcher).await.unwrap();

        assert_eq!(
            stats,
            IntakeStats {
                events: 2,
                skipped: 1,
                handled: 2
            }
        );
        assert_eq!(server.jobs().len(), 2);
        assert!(logs_contain("Skipping invalid ticket"));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let mut dispatcher = Dispatcher::new();
        let stats = run(&b""[..], &mut dispatcher).await.unwrap();
        assert_eq!(stats, IntakeStats::default());
    }
}
