use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fmt;

pub const HOURS_PER_DAY: usize = 24;

/// Grouping key for the per-country ranking
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CountryKey {
    Named(String),
    /// Peers whose address could not be resolved
    Unknown,
}

impl CountryKey {
    pub const UNKNOWN_LABEL: &'static str = "Unknown";
}

impl fmt::Display for CountryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountryKey::Named(name) => f.write_str(name),
            CountryKey::Unknown => f.write_str(Self::UNKNOWN_LABEL),
        }
    }
}

impl Serialize for CountryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: CountryKey,
    pub connections: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u8,
    pub connections: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerCount {
    pub address: String,
    pub country: CountryKey,
    pub sightings: u64,
    pub last_seen: DateTime<Local>,
}

/// Snapshot of the store, recomputed on every call to `summarize()`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    /// Timestamp of the most recent sample, if any
    pub last_sample: Option<DateTime<Local>>,
    /// Number of sampling rounds folded into the store
    pub rounds: u64,
    pub total_connections: u64,
    pub unique_addresses: usize,
    /// Sorted by connections, descending; ties keep first-encounter order
    pub countries: Vec<CountryCount>,
    /// Always 24 entries, hour 0 first
    pub hours: Vec<HourCount>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_peers: Vec<PeerCount>,
}

impl SummaryView {
    pub fn with_top_peers(mut self, peers: Vec<PeerCount>) -> Self {
        self.top_peers = peers;
        self
    }

    /// Connections recorded during `hour`, zero when out of range
    pub fn hour(&self, hour: u8) -> u64 {
        self.hours
            .get(hour as usize)
            .map(|h| h.connections)
            .unwrap_or(0)
    }

    pub fn country(&self, key: &CountryKey) -> Option<u64> {
        self.countries
            .iter()
            .find(|c| &c.country == key)
            .map(|c| c.connections)
    }
}
