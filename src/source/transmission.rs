//! `transmission-remote` backed sample source
//!
//! Runs `transmission-remote <host:port> [-n user:pass] -t <selector> -pi`
//! and returns its stdout split into lines.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{SampleError, SampleSource, TorrentSelector};

/// RPC credentials passed with `-n`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub user: String,
    pub password: String,
}

impl RemoteCredentials {
    fn as_arg(&self) -> String {
        format!("{}:{}", self.user, self.password)
    }
}

#[derive(Debug, Clone)]
pub struct TransmissionRemote {
    program: PathBuf,
    host: String,
    credentials: Option<RemoteCredentials>,
    timeout: Duration,
}

impl TransmissionRemote {
    pub fn new(program: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            host: host.into(),
            credentials: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_credentials(mut self, credentials: Option<RemoteCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments for one invocation, without the program name
    pub fn args(&self, selector: &TorrentSelector) -> Vec<String> {
        let mut args = vec![self.host.clone()];
        if let Some(credentials) = &self.credentials {
            args.push("-n".to_string());
            args.push(credentials.as_arg());
        }
        args.push("-t".to_string());
        args.push(selector.to_string());
        args.push("-pi".to_string());
        args
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl SampleSource for TransmissionRemote {
    async fn sample(&self, selector: &TorrentSelector) -> Result<Vec<String>, SampleError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(selector))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), %selector, host = %self.host, "sampling peers");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| SampleError::Spawn {
                program: self.program_name(),
                source,
            })?,
            Err(_) => {
                return Err(SampleError::Timeout {
                    program: self.program_name(),
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(SampleError::Exit {
                program: self.program_name(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();

        debug!(%selector, line_count = lines.len(), "sample received");

        Ok(lines)
    }
}
