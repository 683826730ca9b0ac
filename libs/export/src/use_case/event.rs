//! Host events delivered to use cases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Helpdesk ticket as seen at creation time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticket {
    pub id: Option<i64>,
    pub number: Option<String>,
    /// Creation timestamp as reported by the helpdesk
    pub created: Option<String>,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub help_topic_id: Option<i64>,
    pub help_topic: Option<String>,
}

/// Event name a use case subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    TicketCreated,
}

impl Trigger {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TicketCreated => "ticket.created",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    TicketCreated(Ticket),
}

impl HostEvent {
    pub fn trigger(&self) -> Trigger {
        match self {
            Self::TicketCreated(_) => Trigger::TicketCreated,
        }
    }
}
