use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, warn};

use peerwatch::cli_utils::peerwatch_prefix;
use peerwatch::config_discovery::load_config_with_discovery;
use peerwatch::geo::MaxMindResolver;
use peerwatch::logging;
use peerwatch::poll::PollLoop;
use peerwatch::report;
use peerwatch::source::TransmissionRemote;
use peerwatch::stats::AggregationStore;

use crate::cli::WatchArgs;
use crate::merger::MergedWatchConfig;

pub async fn run(args: WatchArgs) -> Result<()> {
    let file_config = load_config_with_discovery(args.config.as_deref())?;
    if let Some(file_config) = &file_config {
        file_config.validate()?;
    }

    let config = MergedWatchConfig::merge(&args, file_config)?;
    logging::init(&config.log_level);

    let program = which::which(&config.remote_path).unwrap_or_else(|e| {
        warn!(
            program = %config.remote_path,
            error = %e,
            "transmission-remote not found in PATH, trying as-is"
        );
        PathBuf::from(&config.remote_path)
    });

    let source = TransmissionRemote::new(program, config.host.clone())
        .with_credentials(config.credentials.clone())
        .with_timeout(config.timeout);
    let reporter = report::stdout_reporter(config.format, config.clear_screen);

    // Acquired last: nothing after this point can fail before the loop owns it
    let resolver = MaxMindResolver::open(&config.geoip_database)?;

    info!(
        host = %config.host,
        torrents = ?config.selectors.iter().map(ToString::to_string).collect::<Vec<_>>(),
        interval_secs = config.interval.as_secs(),
        "starting real-time peer monitoring"
    );

    let poll = PollLoop::new(
        source,
        AggregationStore::new(resolver),
        reporter,
        config.selectors.clone(),
        config.interval,
    )
    .with_top_peers(config.top_peers);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let store = if config.once {
        poll.run_once(shutdown_rx).await
    } else {
        eprintln!(
            "{} Monitoring peers on {} every {}s (Ctrl+C to stop)",
            peerwatch_prefix(),
            config.host,
            config.interval.as_secs()
        );
        poll.run(shutdown_rx).await
    };
    signal_task.abort();

    store.into_resolver().close();
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C will stop monitoring");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    return std::future::pending().await;
                }
                info!("Received Ctrl+C, stopping...");
                return;
            }
        };

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    sigterm.recv().await;
                    info!("Received SIGTERM, stopping...");
                    return;
                }
                info!("Received Ctrl+C, stopping...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, stopping...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, stopping..."),
            Err(e) => {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    }
}
