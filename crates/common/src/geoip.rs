use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A point on the globe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum GeoIpError {
    #[error("failed to read geoip table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid geoip table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("geoip lookup failed for {0}: {1}")]
    Lookup(IpAddr, String),
}

/// Maps IP addresses to geographic locations
pub trait GeoLocator: Send + Sync {
    /// `Ok(None)` when the address is simply unknown
    fn locate(&self, ip: IpAddr) -> Result<Option<Location>, GeoIpError>;
}

/// Geo-IP table loaded from a JSON object of `"ip": {"latitude", "longitude"}`
#[derive(Debug, Clone, Default)]
pub struct IpTable {
    locations: HashMap<IpAddr, Location>,
}

impl IpTable {
    pub fn new(locations: HashMap<IpAddr, Location>) -> Self {
        Self { locations }
    }

    pub fn from_json(json: &str) -> Result<Self, GeoIpError> {
        let locations: HashMap<IpAddr, Location> = serde_json::from_str(json)?;
        Ok(Self { locations })
    }

    pub fn load(path: &Path) -> Result<Self, GeoIpError> {
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), entries = table.len(), "loaded geoip table");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl GeoLocator for IpTable {
    fn locate(&self, ip: IpAddr) -> Result<Option<Location>, GeoIpError> {
        Ok(self.locations.get(&ip).copied())
    }
}
