//! GeoLite2-City backed resolver
//!
//! The database is read fully into memory when opened and released when the
//! resolver is dropped or explicitly closed.

use maxminddb::{geoip2, Reader};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{GeoError, GeoRecord, GeoResolver};

/// Language used for country and city names
const NAME_LANGUAGE: &str = "en";

pub struct MaxMindResolver {
    reader: Option<Reader<Vec<u8>>>,
    path: PathBuf,
}

impl MaxMindResolver {
    /// Open a `.mmdb` database.
    ///
    /// Fails when the path does not reference a readable file or the file is
    /// not a valid MaxMind database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GeoError> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            return Err(GeoError::NotFound(path));
        }

        let reader = Reader::open_readfile(&path).map_err(|e| GeoError::Open {
            path: path.clone(),
            message: e.to_string(),
        })?;

        info!(
            database = %path.display(),
            database_type = %reader.metadata.database_type,
            "GeoIP database opened"
        );

        Ok(Self {
            reader: Some(reader),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Release the database; later lookups resolve to nothing
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            info!(database = %self.path.display(), "GeoIP database closed");
        }
    }

    fn lookup(&self, address: &str) -> Option<GeoRecord> {
        let reader = self.reader.as_ref()?;

        let ip: IpAddr = match address.parse() {
            Ok(ip) => ip,
            Err(e) => {
                debug!(address, error = %e, "not a valid IP address");
                return None;
            }
        };

        let city: geoip2::City = match reader.lookup(ip) {
            Ok(city) => city,
            Err(e) => {
                debug!(address, error = %e, "GeoIP lookup failed");
                return None;
            }
        };

        let country = city.country.as_ref();
        let location = city.location.as_ref();

        Some(GeoRecord {
            country: country
                .and_then(|c| c.names.as_ref())
                .and_then(|names| names.get(NAME_LANGUAGE))
                .map(|name| name.to_string()),
            iso_code: country
                .and_then(|c| c.iso_code)
                .map(|code| code.to_string()),
            city: city
                .city
                .as_ref()
                .and_then(|c| c.names.as_ref())
                .and_then(|names| names.get(NAME_LANGUAGE))
                .map(|name| name.to_string()),
            latitude: location.and_then(|l| l.latitude),
            longitude: location.and_then(|l| l.longitude),
        })
    }
}

impl GeoResolver for MaxMindResolver {
    fn resolve(&self, address: &str) -> Option<GeoRecord> {
        self.lookup(address)
    }
}

impl Drop for MaxMindResolver {
    fn drop(&mut self) {
        self.close();
    }
}
