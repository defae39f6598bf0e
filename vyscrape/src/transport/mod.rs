//! SSH transport layer.
//!
//! The scraper only needs one capability from the outside world: "open an
//! interactive command channel given host, port, user and an optional
//! secret". That capability is the [`Connector`] trait, and the channel it
//! hands back is a [`ShellChannel`]. [`SshConnector`] implements both on top
//! of russh.

pub mod config;
mod ssh;

pub use config::{ConnectParams, DEFAULT_PORT, DEFAULT_USER, SshOptions};
pub use ssh::{SshConnector, SshShell, resolve};

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

/// An interactive shell with a shell already invoked on it.
pub trait ShellChannel: Send {
    /// Send one line of input. A trailing newline is appended.
    fn send(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next chunk of output.
    ///
    /// Returns `Ok(None)` once the remote side has closed the channel.
    /// Must be cancel-safe: dropping the future before it completes
    /// loses no data, so callers can race it against a deadline.
    fn read(&mut self) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Close the channel and the session behind it.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens authenticated interactive shells.
pub trait Connector: Send + Sync {
    /// Channel type produced by this connector.
    type Channel: ShellChannel;

    /// Resolve, connect, authenticate and invoke a shell.
    ///
    /// Resolution, connect and authentication failures must surface as
    /// their own [`TransportError`](crate::error::TransportError) variants.
    fn open(&self, params: &ConnectParams) -> impl Future<Output = Result<Self::Channel>> + Send;
}
