use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::report::ReportFormat;
use crate::source::TorrentSelector;

/// Complete peerwatch configuration (loaded from TOML file)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PeerwatchConfig {
    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub geoip: GeoIpConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Transmission control interface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcConfig {
    /// Daemon RPC endpoint (host:port)
    #[serde(default = "default_rpc_host")]
    pub host: String,

    /// RPC user (from settings.json of the daemon)
    #[serde(default)]
    pub user: Option<String>,

    /// RPC password, may be blank
    #[serde(default)]
    pub password: Option<String>,

    /// transmission-remote binary, resolved on PATH when not absolute
    #[serde(default = "default_remote_path")]
    pub remote_path: String,

    /// Per-sample timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: default_rpc_host(),
            user: None,
            password: None,
            remote_path: default_remote_path(),
            timeout_secs: default_rpc_timeout(),
        }
    }
}

/// What to sample and how often
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Torrent ids to monitor, or ["all"]
    #[serde(default = "default_torrents")]
    pub torrents: Vec<String>,

    /// Seconds between samples
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            torrents: default_torrents(),
            interval_secs: default_interval(),
        }
    }
}

/// GeoLite2 database location
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GeoIpConfig {
    /// Path to GeoLite2-City.mmdb
    #[serde(default)]
    pub database: Option<String>,
}

/// Summary output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportConfig {
    /// terminal or json
    #[serde(default)]
    pub format: ReportFormat,

    /// Clear the terminal before each summary
    #[serde(default = "default_true")]
    pub clear_screen: bool,

    /// Number of most seen peers to list (0 = hidden)
    #[serde(default)]
    pub top_peers: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            clear_screen: true,
            top_peers: 0,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions
fn default_rpc_host() -> String {
    "127.0.0.1:9091".to_string()
}

fn default_remote_path() -> String {
    "transmission-remote".to_string()
}

fn default_rpc_timeout() -> u64 {
    10
}

fn default_torrents() -> Vec<String> {
    vec![TorrentSelector::ALL.to_string()]
}

fn default_interval() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl PeerwatchConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: PeerwatchConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Generate example configuration as TOML string
    pub fn example() -> Result<String> {
        let config = PeerwatchConfig {
            rpc: RpcConfig {
                user: Some("transmission".to_string()),
                password: Some(String::new()),
                ..Default::default()
            },
            geoip: GeoIpConfig {
                database: Some("/usr/share/GeoIP/GeoLite2-City.mmdb".to_string()),
            },
            ..Default::default()
        };

        Ok(toml::to_string_pretty(&config)?)
    }

    /// Parsed torrent selectors
    pub fn selectors(&self) -> Result<Vec<TorrentSelector>> {
        parse_selectors(&self.monitor.torrents)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_host(&self.rpc.host)?;

        if self.rpc.remote_path.trim().is_empty() {
            anyhow::bail!("rpc.remote_path must be set");
        }

        if self.rpc.timeout_secs == 0 {
            anyhow::bail!("rpc.timeout_secs must be a positive number of seconds");
        }

        if self.monitor.interval_secs == 0 {
            anyhow::bail!("monitor.interval_secs must be a positive number of seconds");
        }

        parse_selectors(&self.monitor.torrents)?;

        if let Some(database) = &self.geoip.database {
            if database.trim().is_empty() {
                anyhow::bail!("geoip.database must not be empty");
            }
        }

        validate_log_level(&self.observability.log_level)?;

        Ok(())
    }
}

/// Parse torrent ids; "all" cannot be mixed with explicit ids
pub fn parse_selectors<S: AsRef<str>>(ids: &[S]) -> Result<Vec<TorrentSelector>> {
    if ids.is_empty() {
        anyhow::bail!("monitor.torrents must list at least one torrent id or \"all\"");
    }

    let selectors = ids
        .iter()
        .map(|id| id.as_ref().parse::<TorrentSelector>())
        .collect::<Result<Vec<_>, _>>()?;

    if selectors.len() > 1 && selectors.contains(&TorrentSelector::All) {
        anyhow::bail!("monitor.torrents: \"all\" cannot be combined with explicit torrent ids");
    }

    Ok(selectors)
}

/// Check that `host` looks like host:port
pub fn validate_host(host: &str) -> Result<()> {
    let (name, port) = host
        .rsplit_once(':')
        .with_context(|| format!("rpc.host must be host:port, got {:?}", host))?;

    if name.is_empty() {
        anyhow::bail!("rpc.host is missing a host name: {:?}", host);
    }

    port.parse::<u16>()
        .with_context(|| format!("rpc.host has an invalid port: {:?}", host))?;

    Ok(())
}

/// Log levels accepted for `observability.log_level` and `--config-log-level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check that `level` is a plain log level.
///
/// Anything else would be read by the log filter as a target name and hide
/// every peerwatch event.
pub fn validate_log_level(level: &str) -> Result<()> {
    if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        anyhow::bail!(
            "log level must be one of: {}, got {:?}",
            LOG_LEVELS.join(", "),
            level
        );
    }

    Ok(())
}
