//! Scripted channel and connector for exercising the scraper without a device.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{Instant, sleep_until};

use crate::error::{ChannelError, Result, TransportError};
use crate::transport::{ConnectParams, Connector, ShellChannel};

/// Host names the scripted connector fails on.
pub(crate) const UNRESOLVABLE_HOST: &str = "unresolvable.invalid";
pub(crate) const REFUSING_HOST: &str = "refused.example";
pub(crate) const REJECTING_HOST: &str = "rejects-auth.example";

#[derive(Debug, Clone)]
enum Step {
    Chunk(Duration, Vec<u8>),
    Repeat(Duration, Vec<u8>),
    Eof,
    Fail,
}

/// What a scripted channel produces, in order. Delays are measured from the
/// moment the previous chunk was handed out.
#[derive(Debug, Clone, Default)]
pub(crate) struct Script {
    steps: VecDeque<Step>,
}

impl Script {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn chunk(mut self, delay: Duration, data: &[u8]) -> Self {
        self.steps.push_back(Step::Chunk(delay, data.to_vec()));
        self
    }

    /// Produce `data` every `interval`, forever.
    pub(crate) fn repeat(mut self, interval: Duration, data: &[u8]) -> Self {
        self.steps.push_back(Step::Repeat(interval, data.to_vec()));
        self
    }

    pub(crate) fn eof(mut self) -> Self {
        self.steps.push_back(Step::Eof);
        self
    }

    pub(crate) fn fail(mut self) -> Self {
        self.steps.push_back(Step::Fail);
        self
    }
}

/// Observations shared between a scripted channel and the test.
#[derive(Debug, Clone, Default)]
pub(crate) struct ChannelLog {
    sent: Arc<Mutex<Vec<(Instant, String)>>>,
    closed: Arc<AtomicBool>,
}

impl ChannelLog {
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub(crate) fn sent_at(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// In-memory [`ShellChannel`] replaying a [`Script`].
pub(crate) struct ScriptedChannel {
    steps: VecDeque<Step>,
    next_ready: Option<Instant>,
    fail_send_at: Option<usize>,
    log: ChannelLog,
}

impl ScriptedChannel {
    pub(crate) fn new(script: Script) -> Self {
        Self {
            steps: script.steps,
            next_ready: None,
            fail_send_at: None,
            log: ChannelLog::default(),
        }
    }

    /// Fail the `n`th send (zero-based).
    pub(crate) fn fail_send_at(mut self, n: usize) -> Self {
        self.fail_send_at = Some(n);
        self
    }

    pub(crate) fn log(&self) -> ChannelLog {
        self.log.clone()
    }
}

impl ShellChannel for ScriptedChannel {
    async fn send(&mut self, line: &str) -> Result<()> {
        let mut sent = self.log.sent.lock().unwrap();
        if self.fail_send_at == Some(sent.len()) {
            return Err(ChannelError::Closed.into());
        }
        sent.push((Instant::now(), line.to_string()));
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Bytes>> {
        let delay = match self.steps.front() {
            None => return std::future::pending().await,
            Some(Step::Eof) => return Ok(None),
            Some(Step::Fail) => return Err(ChannelError::Closed.into()),
            Some(Step::Chunk(delay, _) | Step::Repeat(delay, _)) => *delay,
        };

        if !delay.is_zero() {
            let ready = *self.next_ready.get_or_insert_with(|| Instant::now() + delay);
            sleep_until(ready).await;
        }
        self.next_ready = None;

        let data = match self.steps.front() {
            Some(Step::Repeat(_, data)) => data.clone(),
            _ => match self.steps.pop_front() {
                Some(Step::Chunk(_, data)) => data,
                _ => Vec::new(),
            },
        };
        Ok(Some(Bytes::from(data)))
    }

    async fn close(self) -> Result<()> {
        self.log.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// [`Connector`] handing out scripted channels by host name.
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    channels: Mutex<HashMap<String, VecDeque<ScriptedChannel>>>,
    opened: AtomicUsize,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_channel(self, host: &str, channel: ScriptedChannel) -> Self {
        self.channels
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_default()
            .push_back(channel);
        self
    }

    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Connector for ScriptedConnector {
    type Channel = ScriptedChannel;

    async fn open(&self, params: &ConnectParams) -> Result<ScriptedChannel> {
        let host = params.host().to_string();
        match host.as_str() {
            UNRESOLVABLE_HOST => {
                return Err(TransportError::Resolution {
                    host,
                    source: io::Error::new(io::ErrorKind::NotFound, "no such host"),
                }
                .into());
            }
            REFUSING_HOST => {
                return Err(TransportError::ConnectionFailed {
                    host,
                    port: params.port,
                    reason: "connection refused".into(),
                }
                .into());
            }
            REJECTING_HOST => {
                return Err(TransportError::AuthenticationFailed {
                    user: params.user.clone(),
                    host,
                }
                .into());
            }
            _ => {}
        }

        let channel = self
            .channels
            .lock()
            .unwrap()
            .get_mut(&host)
            .and_then(VecDeque::pop_front);
        match channel {
            Some(channel) => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                Ok(channel)
            }
            None => Err(TransportError::ConnectionFailed {
                host,
                port: params.port,
                reason: "no scripted channel".into(),
            }
            .into()),
        }
    }
}
