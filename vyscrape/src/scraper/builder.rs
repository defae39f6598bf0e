//! Builder for creating scrapers.

use std::time::Duration;

use super::{ScrapeConfig, Scraper};
use crate::channel::Budget;
use crate::error::{Error, Result};
use crate::transport::{Connector, SshConnector, SshOptions};

/// Builder for constructing a [`Scraper`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use vyscrape::ScraperBuilder;
///
/// # fn example() -> Result<(), vyscrape::Error> {
/// let scraper = ScraperBuilder::new()
///     .connect_timeout(Duration::from_secs(10))
///     .idle_timeout(Duration::from_secs(3))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScraperBuilder {
    ssh: SshOptions,
    config: ScrapeConfig,
}

impl ScraperBuilder {
    /// Create a builder with the default timings and command sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bound on TCP connect plus SSH handshake (default: 5s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.ssh.connect_timeout = timeout;
        self
    }

    /// Set the SSH inactivity timeout (default: 60s).
    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.ssh.inactivity_timeout = timeout;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.ssh.terminal_width = width;
        self.ssh.terminal_height = height;
        self
    }

    /// Set the wait before the login banner is discarded (default: 500ms).
    pub fn banner_settle(mut self, settle: Duration) -> Self {
        self.config.banner_settle = settle;
        self
    }

    /// Set the wait after each command (default: 200ms).
    pub fn command_settle(mut self, settle: Duration) -> Self {
        self.config.command_settle = settle;
        self
    }

    /// Set the idle threshold that ends collection (default: 2s).
    pub fn idle_timeout(mut self, idle: Duration) -> Self {
        self.config.budget.idle = idle;
        self
    }

    /// Set the hard cap on collection time (default: 30s).
    pub fn overall_timeout(mut self, overall: Duration) -> Self {
        self.config.budget.overall = overall;
        self
    }

    /// Replace the command sequence.
    pub fn commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Build a scraper that connects over SSH.
    pub fn build(self) -> Result<Scraper<SshConnector>> {
        self.validate()?;
        Ok(Scraper::new(SshConnector::new(self.ssh), self.config))
    }

    /// Build a scraper over a custom connector. SSH options are ignored.
    pub fn build_with<C: Connector>(self, connector: C) -> Result<Scraper<C>> {
        self.validate()?;
        Ok(Scraper::new(connector, self.config))
    }

    fn validate(&self) -> Result<()> {
        let Budget { idle, overall } = self.config.budget;

        if self.ssh.connect_timeout.is_zero() {
            return Err(invalid("connect timeout must be non-zero"));
        }
        if idle.is_zero() || overall.is_zero() {
            return Err(invalid("idle and overall timeouts must be non-zero"));
        }
        if idle > overall {
            return Err(invalid(format!(
                "idle timeout {:?} exceeds overall timeout {:?}",
                idle, overall
            )));
        }
        if self.config.commands.is_empty() {
            return Err(invalid("at least one command is required"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfig {
        message: message.into(),
    }
}
