//! Session scraper: drives one interactive session to elicit a config dump.
//!
//! The device offers no request/response framing over the shell, so the
//! protocol is fire-and-wait:
//!
//! 1. open the channel (resolve, connect, authenticate, invoke shell)
//! 2. wait for the banner to settle, then discard it
//! 3. send each command with a fixed settle interval after it
//! 4. collect output until idle or until the overall budget runs out
//! 5. close the session, on every exit path
//!
//! # Example
//!
//! ```rust,no_run
//! use vyscrape::{ConnectParams, ScraperBuilder};
//!
//! # async fn example() -> Result<(), vyscrape::Error> {
//! let scraper = ScraperBuilder::new().build()?;
//! let transcript = scraper
//!     .scrape(&ConnectParams::new("192.168.1.1").secret("vyos"))
//!     .await?;
//! println!("{}", transcript.text());
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::ScraperBuilder;

use std::borrow::Cow;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, info, warn};
use tokio::time::{Instant, sleep};

use crate::channel::{Budget, OutputBuffer, StopReason, collect, drain_available};
use crate::error::Result;
use crate::transport::{ConnectParams, Connector, ShellChannel, SshConnector, resolve};

/// Commands that dump the running configuration as JSON.
pub const DEFAULT_COMMANDS: &[&str] = &["configure", "run show configuration | json", "exit"];

/// Lifecycle of the session behind one scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Resolving the host and establishing the transport.
    Connecting,
    /// Credentials accepted by the device.
    Authenticated,
    /// PTY allocated and an interactive shell running on the channel.
    ShellInvoked,
    /// Every command written, with its settle interval observed.
    CommandsSent,
    /// Collecting output until idle or out of budget.
    Draining,
    /// Channel and session torn down.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Authenticated => "authenticated",
            Self::ShellInvoked => "shell-invoked",
            Self::CommandsSent => "command-sequence-sent",
            Self::Draining => "draining",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Timing and command settings for the scrape protocol.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Wait before discarding the login banner.
    pub banner_settle: Duration,

    /// Wait after each command is sent.
    pub command_settle: Duration,

    /// Idle threshold and overall budget for collection.
    pub budget: Budget,

    /// Commands sent, in order.
    pub commands: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            banner_settle: Duration::from_millis(500),
            command_settle: Duration::from_millis(200),
            budget: Budget::default(),
            commands: DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Raw output of one scrape.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Collected output with terminal escapes removed. May still contain
    /// prompts, command echoes and trailing text around the payload.
    pub output: Bytes,

    /// Banner bytes read and dropped before the commands were sent.
    pub banner_discarded: usize,

    /// Why collection ended.
    pub stop: StopReason,

    /// Time from connect to close.
    pub elapsed: Duration,
}

impl Transcript {
    /// Output as text, replacing undecodable bytes.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

/// Scrapes running configuration over an interactive shell.
#[derive(Debug)]
pub struct Scraper<C: Connector = SshConnector> {
    connector: C,
    config: ScrapeConfig,
}

impl<C: Connector> Scraper<C> {
    /// Create a scraper over `connector`.
    ///
    /// Prefer [`ScraperBuilder`], which validates the settings.
    pub fn new(connector: C, config: ScrapeConfig) -> Self {
        Self { connector, config }
    }

    /// Get the scrape settings.
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Get the connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Run the dump protocol against one device and return what it printed.
    pub async fn scrape(&self, params: &ConnectParams) -> Result<Transcript> {
        params.validate()?;
        let target = params.target();
        let start = Instant::now();

        debug!("{}: {}", target, SessionState::Connecting);
        let mut channel = self.connector.open(params).await?;
        debug!("{}: {}", target, SessionState::ShellInvoked);

        let result = self.run(&mut channel, &target).await;

        if let Err(e) = channel.close().await {
            warn!("{}: failed to close session: {}", target, e);
        }
        debug!("{}: {}", target, SessionState::Closed);

        let (output, banner_discarded, stop) = result?;
        let transcript = Transcript {
            output,
            banner_discarded,
            stop,
            elapsed: start.elapsed(),
        };
        info!(
            "{}: collected {} bytes in {:?} (stopped: {})",
            target,
            transcript.output.len(),
            transcript.elapsed,
            transcript.stop
        );
        Ok(transcript)
    }

    /// Check that a session can be opened, without sending any command.
    ///
    /// Returns the addresses the host resolved to.
    pub async fn probe(&self, params: &ConnectParams) -> Result<Vec<SocketAddr>> {
        params.validate()?;
        let addrs = resolve(params.host(), params.port).await?;
        let channel = self.connector.open(params).await?;
        channel.close().await?;
        info!("{}: probe succeeded ({:?})", params.target(), addrs);
        Ok(addrs)
    }

    /// Banner drain, command sequence and collection on an open channel.
    async fn run(
        &self,
        channel: &mut C::Channel,
        target: &str,
    ) -> Result<(Bytes, usize, StopReason)> {
        sleep(self.config.banner_settle).await;
        let banner_discarded = drain_available(channel).await?;
        debug!("{}: discarded {} banner bytes", target, banner_discarded);

        for command in &self.config.commands {
            debug!("{}: sending {:?}", target, command);
            channel.send(command).await?;
            sleep(self.config.command_settle).await;
        }
        debug!("{}: {}", target, SessionState::CommandsSent);

        debug!("{}: {}", target, SessionState::Draining);
        let mut buffer = OutputBuffer::new();
        let stop = collect(channel, &mut buffer, self.config.budget).await?;

        Ok((buffer.freeze(), banner_discarded, stop))
    }
}
