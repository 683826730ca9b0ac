//! Beanstalk text protocol: the two producer commands and their replies
//!
//! ```text
//! use <tube>\r\n                          -> USING <tube>\r\n
//! put <pri> <delay> <ttr> <bytes>\r\n
//! <data>\r\n                              -> INSERTED <id>\r\n | BURIED <id>\r\n
//! ```
//!
//! Any other reply (`EXPECTED_CRLF`, `JOB_TOO_BIG`, `DRAINING`,
//! `OUT_OF_MEMORY`, `BAD_FORMAT`, ...) is an error.

use std::fmt;

pub const CRLF: &[u8] = b"\r\n";

/// Producer command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Use {
        tube: &'a str,
    },
    Put {
        priority: u32,
        delay: u32,
        ttr: u32,
        body: &'a [u8],
    },
}

impl Command<'_> {
    /// Wire form including the trailing `\r\n`
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::Use { tube } => format!("use {}\r\n", tube).into_bytes(),
            Command::Put {
                priority,
                delay,
                ttr,
                body,
            } => {
                let mut frame =
                    format!("put {} {} {} {}\r\n", priority, delay, ttr, body.len()).into_bytes();
                frame.reserve(body.len() + CRLF.len());
                frame.extend_from_slice(body);
                frame.extend_from_slice(CRLF);
                frame
            }
        }
    }
}

/// Server reply line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Using(String),
    Inserted(u64),
    Buried(u64),
    /// Error or unexpected reply, verbatim
    Other(String),
}

impl Reply {
    /// Parse one reply line, with or without its `\r\n`
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));

        match word {
            "USING" if !rest.is_empty() => Reply::Using(rest.to_string()),
            "INSERTED" => rest
                .parse()
                .map(Reply::Inserted)
                .unwrap_or_else(|_| Reply::Other(line.to_string())),
            "BURIED" => rest
                .parse()
                .map(Reply::Buried)
                .unwrap_or_else(|_| Reply::Other(line.to_string())),
            _ => Reply::Other(line.to_string()),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Using(tube) => write!(f, "USING {}", tube),
            Reply::Inserted(id) => write!(f, "INSERTED {}", id),
            Reply::Buried(id) => write!(f, "BURIED {}", id),
            Reply::Other(line) => f.write_str(line),
        }
    }
}
