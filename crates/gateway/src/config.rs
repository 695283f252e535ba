use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use common::prelude::ObjectStoreConfig;

use crate::http_server::UrlBaseError;

/// Gateway configuration, read from a TOML file.
///
/// ```toml
/// url_base = "https://link.example.com"
/// listen_addr = "0.0.0.0:8080"
/// txt_record_ttl_secs = 3600
/// nodes = ["10.0.0.1", "10.0.0.2"]
///
/// [storage]
/// type = "local"
/// path = "/var/lib/linkshare"
///
/// [projects]
/// "api-key" = "project-name"
///
/// [txt_records]
/// "www.example.com" = ["storj_grant-1:...", "storj_root:bucket/site"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Public base URL of the gateway; requests for any other host are
    ///  served in hosting mode
    #[serde(default = "default_url_base")]
    pub url_base: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// How long a resolved custom domain is trusted before DNS is asked again
    #[serde(default = "default_txt_record_ttl_secs")]
    pub txt_record_ttl_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // logging
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for log files (logs to stdout only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// JSON table of node address -> location
    #[serde(default)]
    pub geoip_path: Option<PathBuf>,
    /// Storage node addresses reported for stored objects
    #[serde(default)]
    pub nodes: Vec<IpAddr>,

    // storage
    #[serde(default)]
    pub storage: ObjectStoreConfig,
    /// api key -> project
    #[serde(default)]
    pub projects: HashMap<String, String>,
    /// Records served instead of DNS for the listed hostnames
    #[serde(default)]
    pub txt_records: HashMap<String, Vec<String>>,
}

fn default_url_base() -> String {
    "http://localhost:8080".to_string()
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_txt_record_ttl_secs() -> u64 {
    3600
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url_base: default_url_base(),
            listen_addr: default_listen_addr(),
            txt_record_ttl_secs: default_txt_record_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
            log_dir: None,
            geoip_path: None,
            nodes: Vec::new(),
            storage: ObjectStoreConfig::default(),
            projects: HashMap::new(),
            txt_records: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_toml = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_toml)?;
        Ok(config)
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn txt_record_ttl(&self) -> Duration {
        Duration::from_secs(self.txt_record_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error(transparent)]
    UrlBase(#[from] UrlBaseError),
}
