//! In-process beanstalkd stand-in for tests
//!
//! Speaks the producer subset of the protocol (`use`, `put`) on an ephemeral
//! localhost port and records every job it receives.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A job received by [`FakeBeanstalkd`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    pub tube: String,
    pub priority: u32,
    pub delay: u32,
    pub ttr: u32,
    pub body: Vec<u8>,
    pub buried: bool,
}

impl Job {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// How the fake server answers `put`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMode {
    /// `INSERTED <id>`
    Insert,
    /// `BURIED <id>`
    Bury,
    /// The given error line, e.g. `JOB_TOO_BIG`
    Fail(String),
}

#[derive(Debug)]
struct State {
    jobs: Mutex<Vec<Job>>,
    reply: Mutex<ReplyMode>,
    next_id: AtomicU64,
    connections: AtomicUsize,
}

/// Fake beanstalkd listening on `127.0.0.1:<ephemeral>`
#[derive(Debug)]
pub struct FakeBeanstalkd {
    addr: SocketAddr,
    state: Arc<State>,
    accept_task: JoinHandle<()>,
}

impl FakeBeanstalkd {
    /// Bind and start accepting connections
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(State {
            jobs: Mutex::new(Vec::new()),
            reply: Mutex::new(ReplyMode::Insert),
            next_id: AtomicU64::new(1),
            connections: AtomicUsize::new(0),
        });

        let accept_state = Arc::clone(&state);
        let accept_task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                accept_state.connections.fetch_add(1, Ordering::SeqCst);
                let state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    if let Err(e) = serve(socket, state).await {
                        tracing::debug!("Fake beanstalkd connection ended: {}", e);
                    }
                });
            }
        });

        Ok(Self {
            addr,
            state,
            accept_task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every job received so far, buried ones included
    pub fn jobs(&self) -> Vec<Job> {
        self.state.jobs.lock().unwrap().clone()
    }

    /// Number of accepted TCP connections
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn set_reply(&self, mode: ReplyMode) {
        *self.state.reply.lock().unwrap() = mode;
    }
}

impl Drop for FakeBeanstalkd {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve(socket: TcpStream, state: Arc<State>) -> io::Result<()> {
    let mut connection = BufStream::new(socket);
    let mut tube = "default".to_string();

    loop {
        let mut line = String::new();
        if connection.read_line(&mut line).await? == 0 {
            return Ok(());
        }

        let words: Vec<&str> = line.trim_end().split(' ').collect();
        let reply = match words.as_slice() {
            ["use", name] => {
                tube = name.to_string();
                format!("USING {}", name)
            }
            ["put", priority, delay, ttr, bytes] => {
                let (Ok(priority), Ok(delay), Ok(ttr), Ok(bytes)) = (
                    priority.parse::<u32>(),
                    delay.parse::<u32>(),
                    ttr.parse::<u32>(),
                    bytes.parse::<usize>(),
                ) else {
                    connection.write_all(b"BAD_FORMAT\r\n").await?;
                    connection.flush().await?;
                    continue;
                };

                let mut body = vec![0u8; bytes + 2];
                connection.read_exact(&mut body).await?;
                if !body.ends_with(b"\r\n") {
                    connection.write_all(b"EXPECTED_CRLF\r\n").await?;
                    connection.flush().await?;
                    continue;
                }
                body.truncate(bytes);

                let mode = state.reply.lock().unwrap().clone();
                let id = state.next_id.fetch_add(1, Ordering::SeqCst);
                let mut job = Job {
                    id,
                    tube: tube.clone(),
                    priority,
                    delay,
                    ttr,
                    body,
                    buried: false,
                };

                match mode {
                    ReplyMode::Insert => {
                        state.jobs.lock().unwrap().push(job);
                        format!("INSERTED {}", id)
                    }
                    ReplyMode::Bury => {
                        job.buried = true;
                        state.jobs.lock().unwrap().push(job);
                        format!("BURIED {}", id)
                    }
                    ReplyMode::Fail(error) => error,
                }
            }
            _ => "UNKNOWN_COMMAND".to_string(),
        };

        connection.write_all(reply.as_bytes()).await?;
        connection.write_all(b"\r\n").await?;
        connection.flush().await?;
    }
}
