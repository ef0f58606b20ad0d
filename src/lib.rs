// Library interface for peerwatch
// The binary wires these modules to the CLI; tests and other tools can drive
// the sampling engine directly.

pub mod cli_utils;
pub mod config;
pub mod config_discovery;
pub mod extract;
pub mod geo;
pub mod logging;
pub mod poll;
pub mod report;
pub mod source;
pub mod stats;

// Re-export commonly used types
pub use config::PeerwatchConfig;
pub use config_discovery::{discover_config, load_config_with_discovery};
pub use extract::{extract_address, extract_addresses};
pub use geo::{GeoRecord, GeoResolver, MaxMindResolver};
pub use poll::PollLoop;
pub use report::{ReportFormat, Reporter};
pub use source::{SampleSource, TorrentSelector, TransmissionRemote};
pub use stats::{AggregationStore, SummaryView};
