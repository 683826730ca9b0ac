//! Streams: transports that accept serialized records
//!
//! A stream holds delivery parameters only. Each [`Stream::append`] is
//! independent: it serializes the record, picks the queue and submits the
//! payload once. There is no retry; a failed append is reported as
//! [`ExportError::Transport`](crate::error::ExportError::Transport) and the
//! next call starts from scratch.

pub mod beanstalk;
pub mod protocol;

pub use beanstalk::BeanstalkStream;

use crate::error::ExportResult;
use crate::record::Record;
use crate::registry::{Format, FormatMap, FormatRegistry, HookContext, Hooks};
use async_trait::async_trait;
use std::fmt::Debug;

/// Format group prefix shared by every stream name
pub const FORMAT_GROUP: &str = "stm";

#[async_trait]
pub trait Stream: Send + Sync + Debug {
    /// Submit `record` to `queue`, or to the stream's default queue.
    ///
    /// Returns `true` when the transport accepted the job for processing.
    async fn append(&self, record: &dyn Record, queue: Option<&str>) -> ExportResult<bool>;

    /// Drop any open connection
    async fn disconnect(&self);

    /// Queue used when `append` gets none
    fn default_queue(&self) -> &str;

    /// Registry name of this stream
    fn format_name(&self) -> &'static str;
}

/// Stream constructor options; invalid values fall back to defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOptions {
    pub host: Option<String>,
    pub port: Option<i64>,
    pub priority: Option<i64>,
    pub delay: Option<i64>,
    /// Time to run, in seconds
    pub ttr: Option<i64>,
    /// Queue used when `append` gets none
    pub tube: Option<String>,
}

impl StreamOptions {
    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(i64::from(port));
        self
    }
}

/// Built-in stream formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamFormat {
    Beanstalk,
}

impl StreamFormat {
    pub const ALL: [StreamFormat; 1] = [Self::Beanstalk];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Beanstalk => beanstalk::FORMAT_NAME,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Beanstalk => "Beanstalk",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.name() == name)
    }
}

pub type StreamFactory = FormatRegistry<dyn Stream, StreamOptions>;

impl FormatRegistry<dyn Stream, StreamOptions> {
    pub fn new(hooks: Hooks<dyn Stream, StreamOptions>) -> Self {
        Self::with_seed("stream", stream_seed, hooks, HookContext::unbound())
    }
}

fn stream_seed() -> FormatMap<dyn Stream, StreamOptions> {
    StreamFormat::ALL
        .into_iter()
        .map(|format| {
            let entry = Format::new(format.label(), move |options| build_stream(format, options));
            (format.name().to_string(), entry)
        })
        .collect()
}

fn build_stream(format: StreamFormat, options: StreamOptions) -> ExportResult<Box<dyn Stream>> {
    let stream: Box<dyn Stream> = match format {
        StreamFormat::Beanstalk => Box::new(BeanstalkStream::new(
            options.host.as_deref(),
            options.port,
            options.priority,
            options.delay,
            options.ttr,
        )
        .with_tube(options.tube.as_deref())),
    };
    Ok(stream)
}
