/// Configuration merger: CLI args > Env vars > Config file > Defaults
///
/// This module handles merging configuration from multiple sources:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Built-in defaults (lowest priority)
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use peerwatch::config::{parse_selectors, validate_host, validate_log_level, PeerwatchConfig};
use peerwatch::report::ReportFormat;
use peerwatch::source::{RemoteCredentials, TorrentSelector};

use crate::cli::WatchArgs;

/// Merged configuration for the watch command
#[derive(Debug, Clone, PartialEq)]
pub struct MergedWatchConfig {
    pub host: String,
    pub credentials: Option<RemoteCredentials>,
    pub remote_path: String,
    pub timeout: Duration,
    pub selectors: Vec<TorrentSelector>,
    pub interval: Duration,
    pub geoip_database: PathBuf,
    pub format: ReportFormat,
    pub clear_screen: bool,
    pub top_peers: usize,
    pub log_level: String,
    pub once: bool,
}

impl MergedWatchConfig {
    /// Merge configuration from CLI args and config file
    /// Precedence: CLI > env (already handled by clap) > config file > defaults
    pub fn merge(args: &WatchArgs, file_config: Option<PeerwatchConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let host = args
            .config_host
            .clone()
            .unwrap_or_else(|| file.rpc.host.clone());
        validate_host(&host)?;

        let user = args.config_user.clone().or_else(|| file.rpc.user.clone());
        let password = args
            .config_password
            .clone()
            .or_else(|| file.rpc.password.clone());
        // No user means no -n flag; a user without password sends "user:"
        let credentials = user
            .filter(|u| !u.is_empty())
            .map(|user| RemoteCredentials {
                user,
                password: password.unwrap_or_default(),
            });

        let timeout_secs = args.config_timeout.unwrap_or(file.rpc.timeout_secs);
        if timeout_secs == 0 {
            anyhow::bail!("timeout must be a positive number of seconds");
        }

        let interval_secs = args.config_interval.unwrap_or(file.monitor.interval_secs);
        if interval_secs == 0 {
            anyhow::bail!("interval must be a positive number of seconds");
        }

        let torrents = args
            .config_torrents
            .clone()
            .unwrap_or_else(|| file.monitor.torrents.clone());
        let selectors = parse_selectors(&torrents)?;

        let geoip_database = args
            .config_geoip_db
            .clone()
            .or_else(|| file.geoip.database.clone())
            .filter(|path| !path.trim().is_empty())
            .context(
                "No GeoIP database configured: pass --config-geoip-db or set geoip.database in peerwatch.toml",
            )?;

        let format = match &args.config_format {
            Some(format) => format.parse::<ReportFormat>().map_err(anyhow::Error::msg)?,
            None => file.report.format,
        };

        let log_level = args
            .config_log_level
            .clone()
            .unwrap_or_else(|| file.observability.log_level.clone())
            .to_lowercase();
        validate_log_level(&log_level)?;

        Ok(Self {
            host,
            credentials,
            remote_path: args
                .config_remote_path
                .clone()
                .unwrap_or_else(|| file.rpc.remote_path.clone()),
            timeout: Duration::from_secs(timeout_secs),
            selectors,
            interval: Duration::from_secs(interval_secs),
            geoip_database: PathBuf::from(geoip_database),
            format,
            clear_screen: file.report.clear_screen && !args.no_clear,
            top_peers: args.config_top_peers.unwrap_or(file.report.top_peers),
            log_level,
            once: args.once,
        })
    }
}
