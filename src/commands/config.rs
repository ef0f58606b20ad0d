use anyhow::Result;
use tracing::info;

use peerwatch::config::PeerwatchConfig;
use peerwatch::config_discovery::load_config_with_discovery;
use peerwatch::logging;

use crate::cli::ConfigCommands;

pub fn run(command: ConfigCommands) -> Result<()> {
    logging::init("warn");

    match command {
        ConfigCommands::Validate { path } => validate(&path),
        ConfigCommands::Generate => generate(),
        ConfigCommands::Show { config } => show(config),
    }
}

fn validate(path: &str) -> Result<()> {
    info!("Validating config file: {}", path);

    let config = PeerwatchConfig::from_file(path)?;
    config.validate()?;

    println!("✓ Configuration file is valid: {}", path);
    println!("\nSummary:");
    println!("  - RPC host: {}", config.rpc.host);
    println!(
        "  - RPC user: {}",
        config.rpc.user.as_deref().unwrap_or("(none)")
    );
    println!("  - Torrents: {}", config.monitor.torrents.join(", "));
    println!("  - Interval: {}s", config.monitor.interval_secs);
    println!(
        "  - GeoIP database: {}",
        config.geoip.database.as_deref().unwrap_or("(not set)")
    );

    Ok(())
}

fn generate() -> Result<()> {
    println!("{}", PeerwatchConfig::example()?);
    Ok(())
}

fn show(config_path: Option<String>) -> Result<()> {
    info!("Showing discovered configuration");

    let mut config = load_config_with_discovery(config_path.as_deref())?.unwrap_or_default();

    if config.rpc.password.as_deref().is_some_and(|p| !p.is_empty()) {
        config.rpc.password = Some("********".to_string());
    }

    println!("Discovered configuration (CLI flags and PEERWATCH_CONFIG_* overrides not applied):\n");
    println!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}
