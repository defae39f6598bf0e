//! SSH transport implementation using russh.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use log::{debug, trace};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::config::{ConnectParams, SshOptions};
use super::{Connector, ShellChannel};
use crate::error::{ChannelError, Result, TransportError};
use crate::scraper::SessionState;

/// Identity files tried, in order, when neither a secret nor a key path is given.
const DEFAULT_IDENTITIES: &[&str] = &["id_ed25519", "id_ecdsa", "id_rsa"];

/// Resolve `host` to socket addresses before connecting.
///
/// Failure is reported as [`TransportError::Resolution`], never folded
/// into a connect error.
pub async fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolution {
            host: host.to_string(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(TransportError::Resolution {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        }
        .into());
    }

    Ok(addrs)
}

/// [`Connector`] backed by russh.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    options: SshOptions,
}

impl SshConnector {
    /// Create a connector with the given session options.
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }

    /// Get the session options.
    pub fn options(&self) -> &SshOptions {
        &self.options
    }

    /// Authenticate with a password if one was given, otherwise with keys.
    async fn authenticate(session: &mut Handle<SshHandler>, params: &ConnectParams) -> Result<()> {
        let user = params.user.as_str();

        let success = match &params.secret {
            Some(secret) => session
                .authenticate_password(user, secret.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            None => {
                let identities = match &params.key_path {
                    Some(path) => vec![path.clone()],
                    None => default_identities(),
                };
                Self::authenticate_with_keys(session, user, identities).await?
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: params.user.clone(),
                host: params.host().to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Offer each identity until one is accepted.
    async fn authenticate_with_keys(
        session: &mut Handle<SshHandler>,
        user: &str,
        identities: Vec<PathBuf>,
    ) -> Result<bool> {
        for path in identities {
            let key = match load_secret_key(&path, None) {
                Ok(key) => key,
                Err(e) => {
                    debug!("skipping identity {}: {}", path.display(), e);
                    continue;
                }
            };

            // Get the best RSA hash algorithm supported by the server
            let hash_alg = session
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();

            let accepted = session
                .authenticate_publickey(user, PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg))
                .await
                .map_err(TransportError::Ssh)?
                .success();

            if accepted {
                debug!("authenticated with identity {}", path.display());
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Open a session channel with a PTY and an interactive shell.
    async fn invoke_shell(&self, session: &Handle<SshHandler>) -> Result<Channel<Msg>> {
        let channel = session
            .channel_open_session()
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        channel
            .request_pty(
                true,
                "xterm",
                self.options.terminal_width,
                self.options.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        channel
            .request_shell(true)
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        Ok(channel)
    }
}

impl Connector for SshConnector {
    type Channel = SshShell;

    async fn open(&self, params: &ConnectParams) -> Result<SshShell> {
        let host = params.host();
        let port = params.port;

        let addrs = resolve(host, port).await?;
        debug!("resolved '{}' to {:?}", host, addrs);

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(self.options.inactivity_timeout),
            ..Default::default()
        });

        let handler = SshHandler {
            host: host.to_string(),
        };

        let mut session = tokio::time::timeout(
            self.options.connect_timeout,
            client::connect(ssh_config, addrs.as_slice(), handler),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout {
            host: host.to_string(),
            port,
            timeout: self.options.connect_timeout,
        })?
        .map_err(|e| TransportError::ConnectionFailed {
            host: host.to_string(),
            port,
            reason: e.to_string(),
        })?;

        Self::authenticate(&mut session, params).await?;
        debug!(
            "{}: {} as '{}'",
            params.target(),
            SessionState::Authenticated,
            params.user
        );

        let channel = self.invoke_shell(&session).await?;

        Ok(SshShell {
            session,
            channel,
            host: host.to_string(),
        })
    }
}

/// Interactive shell on an authenticated russh session.
pub struct SshShell {
    session: Handle<SshHandler>,
    channel: Channel<Msg>,
    host: String,
}

impl ShellChannel for SshShell {
    async fn send(&mut self, line: &str) -> Result<()> {
        let data = format!("{}\n", line);
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(|source| ChannelError::SendFailed {
                input: line.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    return Ok(Some(Bytes::copy_from_slice(&data[..])));
                }
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    return Ok(Some(Bytes::copy_from_slice(&data[..])));
                }
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => return Ok(None),
                Some(other) => trace!("{}: ignoring {:?}", self.host, other),
            }
        }
    }

    async fn close(self) -> Result<()> {
        if let Err(e) = self.channel.close().await {
            debug!("{}: channel close failed: {}", self.host, e);
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// `~/.ssh` identities that exist on disk.
fn default_identities() -> Vec<PathBuf> {
    let Some(home) = std::env::var_os("HOME") else {
        return Vec::new();
    };
    let ssh_dir = PathBuf::from(home).join(".ssh");
    DEFAULT_IDENTITIES
        .iter()
        .map(|name| ssh_dir.join(name))
        .filter(|path| path.is_file())
        .collect()
}

/// SSH client handler for russh.
///
/// Host keys are accepted as presented; trust policy belongs to whoever
/// deploys the scraper.
struct SshHandler {
    host: String,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        debug!(
            "accepting {} host key from {}",
            server_public_key.algorithm().as_str(),
            self.host
        );
        Ok(true)
    }
}
