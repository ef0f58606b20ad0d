use chrono::{DateTime, Local, Timelike};
use std::collections::HashMap;
use tracing::debug;

use super::summary::{CountryCount, CountryKey, HourCount, PeerCount, SummaryView, HOURS_PER_DAY};
use crate::geo::{GeoRecord, GeoResolver};

/// Everything known about one peer address
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    pub address: String,
    pub sighting_count: u64,
    /// Resolved once on first sighting and never refreshed
    pub geo: Option<GeoRecord>,
    pub first_seen: DateTime<Local>,
    pub last_seen: DateTime<Local>,
}

impl PeerRecord {
    pub fn country_key(&self) -> CountryKey {
        match &self.geo {
            Some(geo) => CountryKey::Named(geo.country_name().to_string()),
            None => CountryKey::Unknown,
        }
    }
}

/// Single-writer aggregate of every sighting made during the run.
///
/// Records are kept in first-encounter order so that rankings built from
/// them can break ties deterministically.
pub struct AggregationStore<R> {
    resolver: R,
    peers: Vec<PeerRecord>,
    index: HashMap<String, usize>,
    hours: [u64; HOURS_PER_DAY],
    rounds: u64,
    last_sample: Option<DateTime<Local>>,
}

impl<R: GeoResolver> AggregationStore<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            peers: Vec::new(),
            index: HashMap::new(),
            hours: [0; HOURS_PER_DAY],
            rounds: 0,
            last_sample: None,
        }
    }

    /// Fold one sampling round into the store.
    ///
    /// The hour bucket for `now` grows by the number of addresses, and every
    /// address bumps its own record, so the sum of peer counts always equals
    /// the sum of hour buckets. Unseen addresses are resolved exactly once.
    pub fn observe<S: AsRef<str>>(&mut self, addresses: &[S], now: DateTime<Local>) {
        self.hours[now.hour() as usize] += addresses.len() as u64;
        self.rounds += 1;
        self.last_sample = Some(now);

        for address in addresses {
            let address = address.as_ref();
            let slot = match self.index.get(address) {
                Some(&slot) => slot,
                None => self.insert(address, now),
            };

            let record = &mut self.peers[slot];
            record.sighting_count += 1;
            record.last_seen = now;
        }
    }

    fn insert(&mut self, address: &str, now: DateTime<Local>) -> usize {
        let geo = self.resolver.resolve(address);
        debug!(
            address,
            country = geo.as_ref().map(GeoRecord::country_name).unwrap_or("unknown"),
            "new peer"
        );

        let slot = self.peers.len();
        self.peers.push(PeerRecord {
            address: address.to_string(),
            sighting_count: 0,
            geo,
            first_seen: now,
            last_seen: now,
        });
        self.index.insert(address.to_string(), slot);
        slot
    }

    pub fn summarize(&self) -> SummaryView {
        let mut countries: Vec<CountryCount> = Vec::new();
        let mut positions: HashMap<CountryKey, usize> = HashMap::new();

        for record in &self.peers {
            let key = record.country_key();
            match positions.get(&key) {
                Some(&pos) => countries[pos].connections += record.sighting_count,
                None => {
                    positions.insert(key.clone(), countries.len());
                    countries.push(CountryCount {
                        country: key,
                        connections: record.sighting_count,
                    });
                }
            }
        }

        // sort_by is stable: equal counts stay in first-encounter order
        countries.sort_by(|a, b| b.connections.cmp(&a.connections));

        let hours = self
            .hours
            .iter()
            .enumerate()
            .map(|(hour, &connections)| HourCount {
                hour: hour as u8,
                connections,
            })
            .collect();

        SummaryView {
            last_sample: self.last_sample,
            rounds: self.rounds,
            total_connections: self.total_connections(),
            unique_addresses: self.peers.len(),
            countries,
            hours,
            top_peers: Vec::new(),
        }
    }

    /// The `limit` most frequently seen peers, ties in first-encounter order
    pub fn top_peers(&self, limit: usize) -> Vec<PeerCount> {
        let mut ranked: Vec<&PeerRecord> = self.peers.iter().collect();
        ranked.sort_by(|a, b| b.sighting_count.cmp(&a.sighting_count));

        ranked
            .into_iter()
            .take(limit)
            .map(|record| PeerCount {
                address: record.address.clone(),
                country: record.country_key(),
                sightings: record.sighting_count,
                last_seen: record.last_seen,
            })
            .collect()
    }

    pub fn total_connections(&self) -> u64 {
        self.peers.iter().map(|p| p.sighting_count).sum()
    }

    pub fn hour_count(&self, hour: u32) -> u64 {
        self.hours.get(hour as usize).copied().unwrap_or(0)
    }

    pub fn peer(&self, address: &str) -> Option<&PeerRecord> {
        self.index.get(address).map(|&slot| &self.peers[slot])
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerRecord> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Hand back the resolver so its resource can be released
    pub fn into_resolver(self) -> R {
        self.resolver
    }
}
