use clap::{Parser, Subcommand};

/// peerwatch - geolocated peer statistics for Transmission
///
/// Periodically samples the peers connected to a Transmission daemon, resolves
/// them against a GeoLite2 database and keeps running totals per country and
/// per hour of day.
#[derive(Parser, Debug)]
#[command(name = "peerwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Geolocated peer statistics for Transmission", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample peers until interrupted, printing a summary after every round
    Watch(WatchArgs),

    /// Configuration management utilities
    Config(ConfigArgs),

    /// Check that the database and transmission-remote are usable
    Doctor(DoctorArgs),
}

#[derive(Parser, Debug, Default)]
pub struct WatchArgs {
    /// Config file path
    #[arg(short = 'c', long, env = "PEERWATCH_CONFIG")]
    pub config: Option<String>,

    // CONFIG-BACKED OPTIONS (can be set in config file)
    /// Transmission RPC endpoint (host:port)
    #[arg(long, env = "PEERWATCH_CONFIG_HOST")]
    pub config_host: Option<String>,

    /// RPC user
    #[arg(long, env = "PEERWATCH_CONFIG_USER")]
    pub config_user: Option<String>,

    /// RPC password (may be empty)
    #[arg(long, env = "PEERWATCH_CONFIG_PASSWORD", hide_env_values = true)]
    pub config_password: Option<String>,

    /// Path to the transmission-remote binary
    #[arg(long, env = "PEERWATCH_CONFIG_REMOTE_PATH")]
    pub config_remote_path: Option<String>,

    /// Per-sample timeout in seconds
    #[arg(long, env = "PEERWATCH_CONFIG_TIMEOUT")]
    pub config_timeout: Option<u64>,

    /// Torrent ids to monitor, comma-separated, or "all"
    #[arg(long, env = "PEERWATCH_CONFIG_TORRENTS", value_delimiter = ',')]
    pub config_torrents: Option<Vec<String>>,

    /// Seconds between samples
    #[arg(long, env = "PEERWATCH_CONFIG_INTERVAL")]
    pub config_interval: Option<u64>,

    /// Path to GeoLite2-City.mmdb
    #[arg(long, env = "PEERWATCH_CONFIG_GEOIP_DB")]
    pub config_geoip_db: Option<String>,

    /// Report format (terminal|json)
    #[arg(long, env = "PEERWATCH_CONFIG_FORMAT")]
    pub config_format: Option<String>,

    /// Number of most seen peers to list (0 = hidden)
    #[arg(long, env = "PEERWATCH_CONFIG_TOP_PEERS")]
    pub config_top_peers: Option<usize>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "PEERWATCH_CONFIG_LOG_LEVEL")]
    pub config_log_level: Option<String>,

    // RUNTIME-ONLY OPTIONS (not in config file)
    /// Do not clear the terminal between summaries
    #[arg(long)]
    pub no_clear: bool,

    /// Take a single sample, print the summary and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Validate {
        /// Path to config file
        path: String,
    },
    /// Print an example peerwatch.toml
    Generate,
    /// Show the discovered configuration file, with defaults filled in
    Show {
        /// Config file path
        #[arg(short = 'c', long, env = "PEERWATCH_CONFIG")]
        config: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct DoctorArgs {
    /// Config file path
    #[arg(short = 'c', long, env = "PEERWATCH_CONFIG")]
    pub config: Option<String>,

    /// Also run transmission-remote once against the configured daemon
    #[arg(long)]
    pub probe: bool,

    /// Verbose output
    #[arg(short, long, env = "PEERWATCH_VERBOSE")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch_flags() {
        let cli = Cli::try_parse_from([
            "peerwatch",
            "watch",
            "--config-host",
            "10.0.0.2:9091",
            "--config-torrents",
            "1,2,3",
            "--config-interval",
            "15",
            "--once",
        ])
        .unwrap();

        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.config_host.as_deref(), Some("10.0.0.2:9091"));
                assert_eq!(
                    args.config_torrents,
                    Some(vec!["1".to_string(), "2".to_string(), "3".to_string()])
                );
                assert_eq!(args.config_interval, Some(15));
                assert!(args.once);
                assert!(!args.no_clear);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_interval_must_be_numeric() {
        assert!(Cli::try_parse_from(["peerwatch", "watch", "--config-interval", "soon"]).is_err());
    }
}
