pub mod maxmind;

pub use maxmind::MaxMindResolver;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening a geolocation database.
///
/// Lookups never fail from the caller's point of view; only acquiring the
/// database at startup can.
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("GeoIP database not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to open GeoIP database {path}: {message}")]
    Open { path: PathBuf, message: String },
}

/// Approximate location of a peer address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoRecord {
    pub country: Option<String>,
    pub iso_code: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoRecord {
    /// Placeholder shown for fields the database does not carry
    pub const NOT_AVAILABLE: &'static str = "N/A";

    pub fn country_name(&self) -> &str {
        self.country.as_deref().unwrap_or(Self::NOT_AVAILABLE)
    }

    pub fn city_name(&self) -> &str {
        self.city.as_deref().unwrap_or(Self::NOT_AVAILABLE)
    }
}

/// Maps a peer address to a geographic record.
///
/// Implementations carry no caching obligation: the aggregation store calls
/// `resolve` at most once per distinct address. Every failure (address not in
/// the database, malformed address, closed reader) must surface as `None`.
pub trait GeoResolver {
    fn resolve(&self, address: &str) -> Option<GeoRecord>;
}

impl<R: GeoResolver + ?Sized> GeoResolver for Box<R> {
    fn resolve(&self, address: &str) -> Option<GeoRecord> {
        (**self).resolve(address)
    }
}

/// Resolver that knows nothing; every address is unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl GeoResolver for NullResolver {
    fn resolve(&self, _address: &str) -> Option<GeoRecord> {
        None
    }
}
