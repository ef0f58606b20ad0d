use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PeerwatchConfig;

pub const CONFIG_FILE_NAME: &str = "peerwatch.toml";

/// Discovers peerwatch configuration by traversing up the directory tree
pub fn discover_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Ok(Some(config_path));
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    // Fallback to global config
    if let Some(global_config) = global_config_path() {
        if global_config.is_file() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// `$XDG_CONFIG_HOME/peerwatch/config.toml` or the platform equivalent
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("peerwatch").join("config.toml"))
}

/// Loads configuration with auto-discovery support
///
/// If `explicit_path` is provided, loads config from that path.
/// Otherwise, auto-discovers config by traversing up directory tree from cwd.
///
/// Returns Ok(None) if no config is found (neither explicit nor discovered).
pub fn load_config_with_discovery(explicit_path: Option<&str>) -> Result<Option<PeerwatchConfig>> {
    if let Some(config_path) = explicit_path {
        return Ok(Some(PeerwatchConfig::from_file(config_path)?));
    }

    let current_dir =
        std::env::current_dir().context("Failed to get current directory for config discovery")?;

    match discover_config(&current_dir)? {
        Some(discovered_path) => {
            info!(config = %discovered_path.display(), "using discovered config");
            Ok(Some(PeerwatchConfig::from_file(&discovered_path)?))
        }
        None => Ok(None),
    }
}
