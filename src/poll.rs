//! Sampling loop
//!
//! Each round pulls peer lines for every configured selector, extracts the
//! addresses, folds them into the store in a single `observe` call and hands
//! the fresh summary to the reporter. The loop stops when the shutdown
//! channel flips to `true` (or its sender goes away), including while a
//! sample is in flight or while sleeping between rounds, and always renders
//! one final summary on the way out.

use chrono::Local;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::extract::extract_addresses;
use crate::geo::GeoResolver;
use crate::report::Reporter;
use crate::source::{SampleSource, TorrentSelector};
use crate::stats::AggregationStore;

/// What happened during one sampling round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundOutcome {
    pub addresses: usize,
    pub sampled_selectors: usize,
    pub failed_selectors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

pub struct PollLoop<S, R, P> {
    source: S,
    store: AggregationStore<R>,
    reporter: P,
    selectors: Vec<TorrentSelector>,
    interval: Duration,
    top_peers: usize,
    state: LoopState,
}

impl<S, R, P> PollLoop<S, R, P>
where
    S: SampleSource,
    R: GeoResolver,
    P: Reporter,
{
    pub fn new(
        source: S,
        store: AggregationStore<R>,
        reporter: P,
        selectors: Vec<TorrentSelector>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            reporter,
            selectors,
            interval,
            top_peers: 0,
            state: LoopState::Running,
        }
    }

    /// List the `count` most seen peers in every report
    pub fn with_top_peers(mut self, count: usize) -> Self {
        self.top_peers = count;
        self
    }

    pub fn store(&self) -> &AggregationStore<R> {
        &self.store
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run one full round: sample, observe, report
    pub async fn tick(&mut self) -> RoundOutcome {
        let (addresses, outcome) = self.gather().await;
        self.record(&addresses, outcome);
        outcome
    }

    /// Sample every selector; a failing selector contributes nothing
    async fn gather(&self) -> (Vec<String>, RoundOutcome) {
        let mut addresses = Vec::new();
        let mut outcome = RoundOutcome::default();

        for selector in &self.selectors {
            match self.source.sample(selector).await {
                Ok(lines) => {
                    let found = extract_addresses(&lines);
                    debug!(%selector, address_count = found.len(), "selector sampled");
                    addresses.extend(found);
                    outcome.sampled_selectors += 1;
                }
                Err(e) => {
                    warn!(%selector, error = %e, "sampling failed, skipping selector this round");
                    outcome.failed_selectors += 1;
                }
            }
        }

        outcome.addresses = addresses.len();
        (addresses, outcome)
    }

    fn record(&mut self, addresses: &[String], outcome: RoundOutcome) {
        self.store.observe(addresses, Local::now());

        info!(
            address_count = outcome.addresses,
            unique_addresses = self.store.len(),
            failed_selectors = outcome.failed_selectors,
            "round recorded"
        );

        self.render();
    }

    fn render(&mut self) {
        let view = self
            .store
            .summarize()
            .with_top_peers(self.store.top_peers(self.top_peers));

        if let Err(e) = self.reporter.render(&view) {
            warn!(error = %e, "failed to render summary");
        }
    }

    /// Sample until `shutdown` fires, then render a final summary.
    ///
    /// Returns the store so the caller can release the resolver.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> AggregationStore<R> {
        info!(
            selectors = self.selectors.len(),
            interval_secs = self.interval.as_secs(),
            "monitoring started"
        );

        loop {
            let (addresses, outcome) = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                gathered = self.gather() => gathered,
            };
            self.record(&addresses, outcome);

            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("shutdown requested, rendering final summary");
        self.stop()
    }

    /// Run a single round and stop.
    ///
    /// A shutdown while the round is being sampled skips it and renders the
    /// summary as it stands.
    pub async fn run_once(mut self, mut shutdown: watch::Receiver<bool>) -> AggregationStore<R> {
        let gathered = tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => None,
            gathered = self.gather() => Some(gathered),
        };

        match gathered {
            Some((addresses, outcome)) => {
                self.record(&addresses, outcome);
                self.state = LoopState::Stopped;
                self.store
            }
            None => {
                info!("shutdown requested, rendering final summary");
                self.stop()
            }
        }
    }

    fn stop(mut self) -> AggregationStore<R> {
        self.render();
        self.state = LoopState::Stopped;
        info!(
            total_connections = self.store.total_connections(),
            unique_addresses = self.store.len(),
            "monitoring stopped"
        );
        self.store
    }
}

/// Resolves once the flag is set or every sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|&stop| stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::NullResolver;
    use crate::source::SampleError;
    use crate::stats::SummaryView;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Source answering from a fixed table; missing selectors fail
    #[derive(Default)]
    struct StubSource {
        responses: HashMap<String, Vec<String>>,
        delay: Option<Duration>,
    }

    impl StubSource {
        fn with(mut self, selector: &str, lines: &[&str]) -> Self {
            self.responses.insert(
                selector.to_string(),
                lines.iter().map(|l| l.to_string()).collect(),
            );
            self
        }
    }

    impl SampleSource for StubSource {
        async fn sample(&self, selector: &TorrentSelector) -> Result<Vec<String>, SampleError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .get(&selector.to_string())
                .cloned()
                .ok_or_else(|| SampleError::Spawn {
                    program: "stub".to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such torrent"),
                })
        }
    }

    #[derive(Clone, Default)]
    struct RecordingReporter {
        views: Arc<Mutex<Vec<SummaryView>>>,
    }

    impl RecordingReporter {
        fn count(&self) -> usize {
            self.views.lock().unwrap().len()
        }

        fn last(&self) -> SummaryView {
            self.views.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Reporter for RecordingReporter {
        fn render(&mut self, view: &SummaryView) -> io::Result<()> {
            self.views.lock().unwrap().push(view.clone());
            Ok(())
        }
    }

    struct BrokenReporter;

    impl Reporter for BrokenReporter {
        fn render(&mut self, _view: &SummaryView) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    fn selectors(ids: &[&str]) -> Vec<TorrentSelector> {
        ids.iter().map(|id| id.parse().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_failing_selector_does_not_block_others() {
        let source = StubSource::default().with("2", &["Address  Done", "203.0.113.9  40%"]);
        let reporter = RecordingReporter::default();
        let mut poll = PollLoop::new(
            source,
            AggregationStore::new(NullResolver),
            reporter.clone(),
            selectors(&["1", "2"]),
            Duration::from_secs(30),
        );

        let outcome = poll.tick().await;

        assert_eq!(outcome.failed_selectors, 1);
        assert_eq!(outcome.sampled_selectors, 1);
        assert_eq!(outcome.addresses, 1);
        assert_eq!(poll.store().total_connections(), 1);
        assert_eq!(reporter.count(), 1);
        assert_eq!(poll.state(), LoopState::Running);
    }

    #[tokio::test]
    async fn test_selectors_merge_into_one_round() {
        let source = StubSource::default()
            .with("1", &["10.0.0.1 x", "10.0.0.2 y"])
            .with("2", &["10.0.0.1 z"]);
        let reporter = RecordingReporter::default();
        let mut poll = PollLoop::new(
            source,
            AggregationStore::new(NullResolver),
            reporter.clone(),
            selectors(&["1", "2"]),
            Duration::from_secs(30),
        );

        poll.tick().await;

        let view = reporter.last();
        assert_eq!(view.rounds, 1);
        assert_eq!(view.total_connections, 3);
        assert_eq!(view.unique_addresses, 2);
    }

    #[tokio::test]
    async fn test_render_errors_are_not_fatal() {
        let source = StubSource::default().with("all", &["192.0.2.1 x"]);
        let mut poll = PollLoop::new(
            source,
            AggregationStore::new(NullResolver),
            BrokenReporter,
            selectors(&["all"]),
            Duration::from_secs(30),
        );

        poll.tick().await;
        poll.tick().await;

        assert_eq!(poll.store().total_connections(), 2);
    }

    #[tokio::test]
    async fn test_top_peers_are_attached_to_reports() {
        let source = StubSource::default().with("all", &["192.0.2.1 x", "192.0.2.1 y", "192.0.2.2 z"]);
        let reporter = RecordingReporter::default();
        let mut poll = PollLoop::new(
            source,
            AggregationStore::new(NullResolver),
            reporter.clone(),
            selectors(&["all"]),
            Duration::from_secs(30),
        )
        .with_top_peers(1);

        poll.tick().await;

        let view = reporter.last();
        assert_eq!(view.top_peers.len(), 1);
        assert_eq!(view.top_peers[0].address, "192.0.2.1");
    }

    #[tokio::test]
    async fn test_shutdown_during_sleep_renders_final_summary() {
        let source = StubSource::default().with("all", &["198.51.100.7 5%"]);
        let reporter = RecordingReporter::default();
        let poll = PollLoop::new(
            source,
            AggregationStore::new(NullResolver),
            reporter.clone(),
            selectors(&["all"]),
            Duration::from_secs(3600),
        );
        let (tx, rx) = watch::channel(false);

        let watcher = reporter.clone();
        let (store, _) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(poll.run(rx), async move {
                while watcher.count() < 1 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                tx.send(true).unwrap();
            })
        })
        .await
        .expect("loop should stop promptly");

        assert_eq!(store.total_connections(), 1);
        // One round plus the final summary
        assert_eq!(reporter.count(), 2);
        assert_eq!(reporter.last().total_connections, 1);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_slow_sample() {
        let source = StubSource {
            delay: Some(Duration::from_secs(3600)),
            ..Default::default()
        }
        .with("all", &["198.51.100.7 5%"]);
        let reporter = RecordingReporter::default();
        let poll = PollLoop::new(
            source,
            AggregationStore::new(NullResolver),
            reporter.clone(),
            selectors(&["all"]),
            Duration::from_secs(30),
        );
        let (tx, rx) = watch::channel(false);

        let (store, _) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(poll.run(rx), async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                tx.send(true).unwrap();
            })
        })
        .await
        .expect("loop should stop promptly");

        assert!(store.is_empty());
        assert_eq!(reporter.count(), 1);
        assert_eq!(reporter.last().rounds, 0);
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_loop() {
        let source = StubSource::default().with("all", &[]);
        let reporter = RecordingReporter::default();
        let poll = PollLoop::new(
            source,
            AggregationStore::new(NullResolver),
            reporter.clone(),
            selectors(&["all"]),
            Duration::from_secs(3600),
        );
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let store = tokio::time::timeout(Duration::from_secs(5), poll.run(rx))
            .await
            .expect("loop should stop promptly");

        assert!(store.is_empty());
        assert_eq!(reporter.count(), 1);
    }

    #[tokio::test]
    async fn test_run_once() {
        let source = StubSource::default().with("all", &["IP   Done", "203.0.113.10  10%"]);
        let reporter = RecordingReporter::default();
        let poll = PollLoop::new(
            source,
            AggregationStore::new(NullResolver),
            reporter.clone(),
            selectors(&["all"]),
            Duration::from_secs(30),
        );

        let (_tx, rx) = watch::channel(false);
        let store = poll.run_once(rx).await;

        assert_eq!(store.total_connections(), 1);
        assert_eq!(reporter.count(), 1);
        assert_eq!(reporter.last().rounds, 1);
    }

    #[tokio::test]
    async fn test_run_once_interrupted_during_sample() {
        let source = StubSource {
            delay: Some(Duration::from_secs(3600)),
            ..Default::default()
        }
        .with("all", &["198.51.100.7 5%"]);
        let reporter = RecordingReporter::default();
        let poll = PollLoop::new(
            source,
            AggregationStore::new(NullResolver),
            reporter.clone(),
            selectors(&["all"]),
            Duration::from_secs(30),
        );
        let (tx, rx) = watch::channel(false);

        let (store, _) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(poll.run_once(rx), async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                tx.send(true).unwrap();
            })
        })
        .await
        .expect("single round should stop promptly");

        assert!(store.is_empty());
        // The final summary is still rendered
        assert_eq!(reporter.count(), 1);
        assert_eq!(reporter.last().rounds, 0);
    }
}
