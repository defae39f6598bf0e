//! Connection parameters and SSH session options.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Service account used when no user is supplied.
pub const DEFAULT_USER: &str = "vyos";

/// Where and as whom to connect for one fetch.
///
/// Deserializes directly from a request body such as
/// `{"host": "fw1", "port": 22, "user": "vyos", "password": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectParams {
    /// Target host (hostname or IP address).
    #[serde(default)]
    pub host: String,

    /// SSH port (default: 22).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username for authentication (default: `vyos`).
    #[serde(default = "default_user")]
    pub user: String,

    /// Password. When absent, key-based authentication is attempted.
    #[serde(default, alias = "password", deserialize_with = "deserialize_secret")]
    pub secret: Option<SecretString>,

    /// Private key to use for key-based authentication instead of the
    /// default identities.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

impl ConnectParams {
    /// Parameters for `host` with the default port and user.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: default_user(),
            secret: None,
            key_path: None,
        }
    }

    /// Set the SSH port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Use password authentication.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Use this private key when no secret is given.
    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    /// The host with surrounding whitespace removed.
    pub fn host(&self) -> &str {
        self.host.trim()
    }

    /// Check that a host was supplied.
    pub fn validate(&self) -> Result<()> {
        if self.host().is_empty() {
            return Err(Error::MissingInput { what: "host" });
        }
        Ok(())
    }

    /// Get the `host:port` form used in log lines.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host(), self.port)
    }
}

/// SSH session options owned by the connector.
#[derive(Debug, Clone)]
pub struct SshOptions {
    /// Bound on TCP connect plus SSH handshake.
    pub connect_timeout: Duration,

    /// Session is dropped after this long without traffic.
    pub inactivity_timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            inactivity_timeout: Duration::from_secs(60),
            terminal_width: 511,
            terminal_height: 24,
        }
    }
}
