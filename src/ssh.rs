//! Single-shot SSH command execution against the managed host.
//!
//! Every call opens a fresh session, runs one command, and tears the
//! session down before returning. No session reuse, no retries.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use ssh2::Session;
use thiserror::Error;

use crate::config::SshConfig;

const CONNECT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("could not resolve host {0}")]
    Resolve(String),

    #[error("SSH session error: {0}")]
    Session(#[from] ssh2::Error),

    #[error("SSH I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SSH authentication failed for user {0}")]
    Auth(String),

    /// Non-empty stderr from the remote command; stdout is discarded.
    #[error("{0}")]
    Remote(String),

    #[error("executor task failed")]
    TaskJoin,
}

/// Something that can run one shell command on the managed host.
///
/// The production implementation is [`RemoteExecutor`]; tests substitute
/// a recording double.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> Result<String, ExecError>;
}

#[derive(Clone)]
pub struct RemoteExecutor {
    config: SshConfig,
}

impl RemoteExecutor {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CommandRunner for RemoteExecutor {
    /// Run one command over a fresh SSH session.
    ///
    /// The blocking ssh2 work runs on the blocking thread pool; the
    /// session is closed on every path when it drops.
    async fn run(&self, command: &str) -> Result<String, ExecError> {
        let config = self.config.clone();
        let command = command.to_string();
        tokio::task::spawn_blocking(move || exec_blocking(&config, &command))
            .await
            .map_err(|_| ExecError::TaskJoin)?
    }
}

fn exec_blocking(config: &SshConfig, command: &str) -> Result<String, ExecError> {
    let addr = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|source| ExecError::Connect {
            addr: format!("{}:{}", config.host, config.port),
            source,
        })?
        .next()
        .ok_or_else(|| ExecError::Resolve(config.host.clone()))?;

    let tcp = TcpStream::connect_timeout(&addr, Duration::from_millis(CONNECT_TIMEOUT_MS))
        .map_err(|source| ExecError::Connect {
            addr: addr.to_string(),
            source,
        })?;

    let mut session = Session::new()?;
    session.set_tcp_stream(tcp);
    session.handshake()?;
    session.userauth_password(&config.username, &config.password)?;
    if !session.authenticated() {
        return Err(ExecError::Auth(config.username.clone()));
    }

    let mut channel = session.channel_session()?;
    channel.exec(command)?;

    let mut stdout = Vec::new();
    channel.read_to_end(&mut stdout)?;
    let mut stderr = Vec::new();
    channel.stderr().read_to_end(&mut stderr)?;
    channel.wait_close()?;

    // Non-empty stderr wins over stdout; the operator sees the error
    // text, never a partial result.
    if !stderr.is_empty() {
        return Err(ExecError::Remote(
            String::from_utf8_lossy(&stderr).into_owned(),
        ));
    }
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}
