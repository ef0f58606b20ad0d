pub mod transmission;

pub use transmission::{RemoteCredentials, TransmissionRemote};

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Which torrents a sample covers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TorrentSelector {
    All,
    Id(String),
}

impl TorrentSelector {
    pub const ALL: &'static str = "all";
}

impl fmt::Display for TorrentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TorrentSelector::All => f.write_str(Self::ALL),
            TorrentSelector::Id(id) => f.write_str(id),
        }
    }
}

impl FromStr for TorrentSelector {
    type Err = SampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SampleError::InvalidSelector(s.to_string()));
        }
        if s.eq_ignore_ascii_case(Self::ALL) {
            Ok(TorrentSelector::All)
        } else if s.chars().any(char::is_whitespace) {
            Err(SampleError::InvalidSelector(s.to_string()))
        } else {
            Ok(TorrentSelector::Id(s.to_string()))
        }
    }
}

#[derive(Error, Debug)]
pub enum SampleError {
    #[error("Invalid torrent selector: {0:?}")]
    InvalidSelector(String),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("{program} did not answer within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Source of raw peer status lines.
///
/// One call covers one selector. Failures are reported to the caller, which
/// decides whether to skip the selector for the current round.
pub trait SampleSource {
    fn sample(
        &self,
        selector: &TorrentSelector,
    ) -> impl Future<Output = Result<Vec<String>, SampleError>> + Send;
}
