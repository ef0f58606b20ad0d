use anyhow::Result;
use std::env;
use std::time::Duration;

use peerwatch::cli_utils::status_mark;
use peerwatch::config::PeerwatchConfig;
use peerwatch::config_discovery::{discover_config, global_config_path};
use peerwatch::extract::extract_addresses;
use peerwatch::geo::{GeoResolver, MaxMindResolver};
use peerwatch::logging;
use peerwatch::source::{RemoteCredentials, SampleSource, TorrentSelector, TransmissionRemote};

use crate::cli::DoctorArgs;

/// Public address used to check that lookups return data
const PROBE_ADDRESS: &str = "8.8.8.8";

pub async fn run(args: DoctorArgs) -> Result<()> {
    logging::init("warn");

    println!("🔍 peerwatch doctor - configuration check\n");

    let mut all_ok = true;

    // Check 1: configuration
    let config = match &args.config {
        Some(path) => match PeerwatchConfig::from_file(path) {
            Ok(config) => {
                println!("{} Configuration loaded: {}", status_mark(true), path);
                config
            }
            Err(e) => {
                println!("{} Could not load {}: {:#}", status_mark(false), path, e);
                return Err(e);
            }
        },
        None => match discover_config(&env::current_dir()?)? {
            Some(path) => {
                println!("{} Configuration found: {}", status_mark(true), path.display());
                PeerwatchConfig::from_file(&path)?
            }
            None => {
                println!("ℹ️  No peerwatch.toml found, using defaults");
                if args.verbose {
                    if let Some(global) = global_config_path() {
                        println!("   Global config location: {}", global.display());
                    }
                    println!("   Run 'peerwatch config generate > peerwatch.toml' to create one");
                }
                PeerwatchConfig::default()
            }
        },
    };

    match config.validate() {
        Ok(()) => println!("{} Configuration is valid", status_mark(true)),
        Err(e) => {
            println!("{} Configuration is invalid: {}", status_mark(false), e);
            all_ok = false;
        }
    }

    // Check 2: GeoIP database
    match &config.geoip.database {
        Some(database) => match MaxMindResolver::open(database) {
            Ok(mut resolver) => {
                println!("{} GeoIP database opened: {}", status_mark(true), database);
                if args.verbose {
                    match resolver.resolve(PROBE_ADDRESS) {
                        Some(geo) => println!(
                            "   {} -> {} / {}",
                            PROBE_ADDRESS,
                            geo.country_name(),
                            geo.city_name()
                        ),
                        None => println!("   {} -> no record", PROBE_ADDRESS),
                    }
                }
                resolver.close();
            }
            Err(e) => {
                println!("{} {}", status_mark(false), e);
                all_ok = false;
            }
        },
        None => {
            println!("{} geoip.database is not set", status_mark(false));
            all_ok = false;
        }
    }

    // Check 3: transmission-remote
    let program = match which::which(&config.rpc.remote_path) {
        Ok(path) => {
            println!("{} transmission-remote found: {}", status_mark(true), path.display());
            Some(path)
        }
        Err(e) => {
            println!("{} {} not found: {}", status_mark(false), config.rpc.remote_path, e);
            all_ok = false;
            None
        }
    };

    // Check 4: live probe
    if args.probe {
        if let Some(program) = program {
            let credentials = config
                .rpc
                .user
                .clone()
                .filter(|u| !u.is_empty())
                .map(|user| RemoteCredentials {
                    user,
                    password: config.rpc.password.clone().unwrap_or_default(),
                });
            let remote = TransmissionRemote::new(program, config.rpc.host.clone())
                .with_credentials(credentials)
                .with_timeout(Duration::from_secs(config.rpc.timeout_secs.max(1)));

            match remote.sample(&TorrentSelector::All).await {
                Ok(lines) => {
                    let peers = extract_addresses(&lines).len();
                    println!(
                        "{} Daemon at {} answered ({} peers connected)",
                        status_mark(true),
                        config.rpc.host,
                        peers
                    );
                }
                Err(e) => {
                    println!("{} Daemon probe failed: {}", status_mark(false), e);
                    all_ok = false;
                }
            }
        }
    }

    println!();
    if all_ok {
        println!("{} All checks passed! peerwatch is ready to monitor.", status_mark(true));
        Ok(())
    } else {
        println!("⚠️  Some issues detected. Please fix the items marked with ❌ above.");
        anyhow::bail!("doctor found configuration problems")
    }
}
