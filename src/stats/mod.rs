//! Cumulative peer statistics
//!
//! [`AggregationStore`] folds every sampled address into per-peer and
//! per-hour counters; [`SummaryView`] is the read-only snapshot handed to
//! reporters.

pub mod store;
pub mod summary;

pub use store::{AggregationStore, PeerRecord};
pub use summary::{CountryCount, CountryKey, HourCount, PeerCount, SummaryView, HOURS_PER_DAY};
