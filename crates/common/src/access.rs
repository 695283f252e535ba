use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Errors that can occur while parsing or serializing an access grant
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("missing access grant")]
    Missing,
    #[error("invalid access grant format")]
    InvalidFormat,
    #[error("access grant serialization failed: {0}")]
    Serialize(String),
}

/// Bearer credential granting read access to a storage project
///
/// The gateway treats an access grant as opaque: it is carried in sharing
/// links and TXT records as a URL-safe string and only ever handed to the
/// storage backend. Grants are never mutated once parsed.
///
/// # Examples
///
/// ```
/// use common::access::Access;
///
/// let access = Access::new("sat.example.com:7777", "api-key");
/// let serialized = access.serialize().unwrap();
/// let recovered = Access::parse(&serialized).unwrap();
/// assert_eq!(access, recovered);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Access {
    satellite: String,
    api_key: String,
}

impl Access {
    pub fn new(satellite: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            satellite: satellite.into(),
            api_key: api_key.into(),
        }
    }

    /// Address of the satellite that issued the grant
    pub fn satellite(&self) -> &str {
        &self.satellite
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Parse a serialized access grant
    pub fn parse(serialized: &str) -> Result<Self, AccessError> {
        if serialized.is_empty() {
            return Err(AccessError::Missing);
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(serialized)
            .map_err(|_| AccessError::InvalidFormat)?;
        let access: Access =
            serde_json::from_slice(&bytes).map_err(|_| AccessError::InvalidFormat)?;
        if access.api_key.is_empty() {
            return Err(AccessError::InvalidFormat);
        }
        Ok(access)
    }

    /// Serialize the grant into its URL-safe string form
    pub fn serialize(&self) -> Result<String, AccessError> {
        let json = serde_json::to_vec(self).map_err(|e| AccessError::Serialize(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

impl FromStr for Access {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// api keys stay out of logs
impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "access@{}", self.satellite)
    }
}
