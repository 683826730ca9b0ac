//! Beanstalk work-queue stream
//!
//! Producer-side client for beanstalkd. The TCP connection is opened on the
//! first `append` and reused afterwards; any failure drops it so the next
//! `append` reconnects.

use super::protocol::{Command, Reply};
use super::Stream;
use crate::error::{ExportError, ExportResult};
use crate::record::Record;
use async_trait::async_trait;
use codec::validation::{
    is_hostname, or_default, BEANSTALK_TUBE, NON_NEGATIVE_DOUBLE_WORD, POSITIVE_DOUBLE_WORD,
    POSITIVE_WORD,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const FORMAT_NAME: &str = "stm_beanstalk";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 11300;
pub const DEFAULT_PRIORITY: u32 = 1024;
pub const DEFAULT_DELAY: u32 = 0;
pub const DEFAULT_TTR: u32 = 60;
pub const DEFAULT_TUBE: &str = "default";

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest wait for a single server reply
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest reply line accepted, terminator included
pub const MAX_REPLY_LENGTH: u64 = 256;

type Connection = BufStream<TcpStream>;

#[derive(Debug)]
pub struct BeanstalkStream {
    host: String,
    port: u16,
    priority: u32,
    delay: u32,
    ttr: u32,
    tube: String,
    connection: Mutex<Option<Connection>>,
}

impl BeanstalkStream {
    /// Create a stream for the beanstalkd server at `host:port`.
    ///
    /// | Parameter | Default | Accepted |
    /// |-----------|---------|----------|
    /// | host | `127.0.0.1` | IP address or RFC 1123 host name |
    /// | port | 11300 | 1..=65535 |
    /// | priority | 1024 | 0..=4294967295 |
    /// | delay | 0 | 0..=4294967295 seconds |
    /// | ttr | 60 | 1..=4294967295 seconds |
    ///
    /// Rejected values are replaced by the default and logged.
    pub fn new(
        host: Option<&str>,
        port: Option<i64>,
        priority: Option<i64>,
        delay: Option<i64>,
        ttr: Option<i64>,
    ) -> Self {
        let host = or_default("host", host, |h| is_hostname(h), DEFAULT_HOST);
        let port = or_default("port", port, POSITIVE_WORD.check(), i64::from(DEFAULT_PORT));
        let priority = or_default(
            "priority",
            priority,
            NON_NEGATIVE_DOUBLE_WORD.check(),
            i64::from(DEFAULT_PRIORITY),
        );
        let delay = or_default(
            "delay",
            delay,
            NON_NEGATIVE_DOUBLE_WORD.check(),
            i64::from(DEFAULT_DELAY),
        );
        let ttr = or_default("ttr", ttr, POSITIVE_DOUBLE_WORD.check(), i64::from(DEFAULT_TTR));

        Self {
            host: host.to_string(),
            port: u16::try_from(port).unwrap_or(DEFAULT_PORT),
            priority: u32::try_from(priority).unwrap_or(DEFAULT_PRIORITY),
            delay: u32::try_from(delay).unwrap_or(DEFAULT_DELAY),
            ttr: u32::try_from(ttr).unwrap_or(DEFAULT_TTR),
            tube: DEFAULT_TUBE.to_string(),
            connection: Mutex::new(None),
        }
    }

    /// Tube used when `append` gets no queue. Names rejected by the tube
    /// pattern fall back to `default`.
    pub fn with_tube(mut self, tube: Option<&str>) -> Self {
        let tube = or_default("tube", tube, |t| BEANSTALK_TUBE.is_valid(t), DEFAULT_TUBE);
        self.tube = tube.to_string();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn ttr(&self) -> u32 {
        self.ttr
    }

    pub fn tube(&self) -> &str {
        &self.tube
    }

    async fn connect(&self) -> ExportResult<Connection> {
        let endpoint = format!("{}:{}", self.host, self.port);
        let socket = timeout(CONNECT_TIMEOUT, TcpStream::connect((self.host.as_str(), self.port)))
            .await
            .map_err(|_| {
                ExportError::transport(format!(
                    "connection to {} timed out after {:?}",
                    endpoint, CONNECT_TIMEOUT
                ))
            })?
            .map_err(|e| ExportError::from_io(&format!("connection to {} failed", endpoint), &e))?;

        debug!(endpoint = %endpoint, "Connected to beanstalkd");
        Ok(BufStream::new(socket))
    }

    async fn request(connection: &mut Connection, command: Command<'_>) -> ExportResult<Reply> {
        connection
            .write_all(&command.encode())
            .await
            .map_err(|e| ExportError::from_io("write failed", &e))?;
        connection
            .flush()
            .await
            .map_err(|e| ExportError::from_io("write failed", &e))?;

        let mut line = String::new();
        let read = timeout(
            REPLY_TIMEOUT,
            (&mut *connection).take(MAX_REPLY_LENGTH).read_line(&mut line),
        )
        .await
        .map_err(|_| {
            ExportError::transport(format!("no reply within {:?}", REPLY_TIMEOUT))
        })?
        .map_err(|e| ExportError::from_io("read failed", &e))?;
        if read == 0 {
            return Err(ExportError::transport("connection closed by server"));
        }
        if !line.ends_with('\n') {
            return Err(ExportError::transport(format!(
                "reply longer than {} bytes",
                MAX_REPLY_LENGTH
            )));
        }

        Ok(Reply::parse(&line))
    }

    /// `use` + `put` on an open connection
    async fn put(&self, connection: &mut Connection, tube: &str, body: &[u8]) -> ExportResult<bool> {
        match Self::request(connection, Command::Use { tube }).await? {
            Reply::Using(used) if used == tube => {}
            other => {
                return Err(ExportError::transport(format!(
                    "unexpected reply to use {}: {}",
                    tube, other
                )))
            }
        }

        let put = Command::Put {
            priority: self.priority,
            delay: self.delay,
            ttr: self.ttr,
            body,
        };

        match Self::request(connection, put).await? {
            Reply::Inserted(id) => {
                info!(tube, job = id, bytes = body.len(), "Job inserted");
                Ok(true)
            }
            Reply::Buried(id) => {
                warn!(tube, job = id, "Job buried by server");
                Ok(false)
            }
            other => Err(ExportError::transport(format!(
                "unexpected reply to put: {}",
                other
            ))),
        }
    }
}

impl Default for BeanstalkStream {
    fn default() -> Self {
        Self::new(None, None, None, None, None)
    }
}

#[async_trait]
impl Stream for BeanstalkStream {
    async fn append(&self, record: &dyn Record, queue: Option<&str>) -> ExportResult<bool> {
        let tube = queue.unwrap_or(&self.tube);
        if BEANSTALK_TUBE.is_not_valid(tube) {
            return Err(ExportError::transport(format!("invalid tube name {:?}", tube)));
        }

        let body = record.serialize()?;

        let mut slot = self.connection.lock().await;
        let connection = match slot.take() {
            Some(connection) => connection,
            None => self.connect().await?,
        };
        let connection = slot.insert(connection);

        let result = self.put(connection, tube, &body).await;
        if result.is_err() {
            *slot = None;
        }
        result
    }

    async fn disconnect(&self) {
        if self.connection.lock().await.take().is_some() {
            debug!(host = %self.host, port = self.port, "Disconnected from beanstalkd");
        }
    }

    fn default_queue(&self) -> &str {
        &self.tube
    }

    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KinesisRecord;
    use crate::test_utils::{FakeBeanstalkd, ReplyMode};
    use crate::tuple::{Sequence, Tuple};
    use serde_json::json;

    fn record() -> KinesisRecord {
        let tuple = Sequence::new(
            [("helpdesk_code", json!("HD1")), ("department_id", json!(3))]
                .into_iter()
                .collect(),
            None,
        );
        let mut record = KinesisRecord::new("my-stream", None, None).unwrap();
        record.update(&tuple as &dyn Tuple).unwrap();
        record
    }

    fn stream_for(server: &FakeBeanstalkd) -> BeanstalkStream {
        BeanstalkStream::new(Some("127.0.0.1"), Some(i64::from(server.port())), None, None, None)
    }

    #[test]
    fn test_defaults() {
        let stream = BeanstalkStream::default();
        assert_eq!(stream.host(), DEFAULT_HOST);
        assert_eq!(stream.port(), DEFAULT_PORT);
        assert_eq!(stream.priority(), DEFAULT_PRIORITY);
        assert_eq!(stream.delay(), DEFAULT_DELAY);
        assert_eq!(stream.ttr(), DEFAULT_TTR);
    }

    #[test]
    fn test_invalid_parameters_fall_back() {
        let stream = BeanstalkStream::new(
            Some("bad host!"),
            Some(70000),
            Some(-1),
            Some(u32::MAX as i64 + 1),
            Some(0),
        );
        assert_eq!(stream.host(), DEFAULT_HOST);
        assert_eq!(stream.port(), DEFAULT_PORT);
        assert_eq!(stream.priority(), DEFAULT_PRIORITY);
        assert_eq!(stream.delay(), DEFAULT_DELAY);
        assert_eq!(stream.ttr(), DEFAULT_TTR);

        let stream = BeanstalkStream::new(Some("queue.internal"), Some(1), Some(0), Some(10), Some(1));
        assert_eq!(stream.host(), "queue.internal");
        assert_eq!((stream.port(), stream.priority(), stream.delay(), stream.ttr()), (1, 0, 10, 1));
    }

    #[test]
    fn test_configured_tube() {
        let stream = BeanstalkStream::default().with_tube(Some("tickets.v2"));
        assert_eq!(stream.tube(), "tickets.v2");
        assert_eq!(stream.default_queue(), "tickets.v2");

        for tube in ["has space", "-leading", ""] {
            let stream = BeanstalkStream::default().with_tube(Some(tube));
            assert_eq!(stream.default_queue(), DEFAULT_TUBE);
        }
        assert_eq!(BeanstalkStream::default().with_tube(None).tube(), DEFAULT_TUBE);
    }

    #[tokio::test]
    async fn test_append_uses_configured_tube() {
        let server = FakeBeanstalkd::start().await.unwrap();
        let stream = stream_for(&server).with_tube(Some("exports"));

        assert!(stream.append(&record(), None).await.unwrap());
        assert!(stream.append(&record(), Some("tickets")).await.unwrap());

        let tubes: Vec<String> = server.jobs().into_iter().map(|job| job.tube).collect();
        assert_eq!(tubes, vec!["exports", "tickets"]);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let silent = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(REPLY_TIMEOUT * 3).await;
            drop(socket);
        });

        let stream = BeanstalkStream::new(Some("127.0.0.1"), Some(i64::from(port)), None, None, None);
        let error = stream.append(&record(), None).await.unwrap_err();
        assert!(matches!(&error, ExportError::Transport { message, .. } if message.contains("no reply")));
        silent.abort();
    }

    #[tokio::test]
    async fn test_oversized_reply_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let chatty = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = socket.write_all(&vec![b'X'; 4096]).await;
            tokio::time::sleep(Duration::from_secs(1)).await;
        });

        let stream = BeanstalkStream::new(Some("127.0.0.1"), Some(i64::from(port)), None, None, None);
        let error = stream.append(&record(), None).await.unwrap_err();
        assert!(matches!(&error, ExportError::Transport { message, .. } if message.contains("longer than")));
        chatty.abort();
    }

    #[tokio::test]
    async fn test_append_inserted() {
        let server = FakeBeanstalkd::start().await.unwrap();
        let stream = stream_for(&server);

        assert!(stream.append(&record(), Some("tickets")).await.unwrap());

        let jobs = server.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].tube, "tickets");
        assert_eq!((jobs[0].priority, jobs[0].delay, jobs[0].ttr), (1024, 0, 60));

        let body: serde_json::Value = serde_json::from_slice(&jobs[0].body).unwrap();
        assert_eq!(body["Data"], json!("HD1,3\n"));
    }

    #[tokio::test]
    async fn test_default_tube_and_connection_reuse() {
        let server = FakeBeanstalkd::start().await.unwrap();
        let stream = stream_for(&server);

        assert!(stream.append(&record(), None).await.unwrap());
        assert!(stream.append(&record(), None).await.unwrap());

        let jobs = server.jobs();
        assert!(jobs.iter().all(|job| job.tube == DEFAULT_TUBE));
        assert_eq!(jobs.len(), 2);
        assert_eq!(server.connections(), 1);
    }

    #[tokio::test]
    async fn test_buried_returns_false() {
        let server = FakeBeanstalkd::start().await.unwrap();
        server.set_reply(ReplyMode::Bury);

        assert!(!stream_for(&server).append(&record(), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_error_reply_drops_connection() {
        let server = FakeBeanstalkd::start().await.unwrap();
        let stream = stream_for(&server);

        server.set_reply(ReplyMode::Fail("JOB_TOO_BIG".to_string()));
        let error = stream.append(&record(), None).await.unwrap_err();
        assert!(matches!(&error, ExportError::Transport { message, .. } if message.contains("JOB_TOO_BIG")));

        server.set_reply(ReplyMode::Insert);
        assert!(stream.append(&record(), None).await.unwrap());
        assert_eq!(server.connections(), 2);
    }

    #[tokio::test]
    async fn test_invalid_tube_is_transport_error() {
        let stream = BeanstalkStream::default();
        for tube in ["", "has space", "-leading"] {
            let error = stream.append(&record(), Some(tube)).await.unwrap_err();
            assert!(matches!(error, ExportError::Transport { .. }));
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let stream = BeanstalkStream::new(Some("127.0.0.1"), Some(i64::from(port)), None, None, None);

        let error = stream.append(&record(), None).await.unwrap_err();
        assert!(matches!(error, ExportError::Transport { .. }));
    }
}
