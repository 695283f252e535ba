use std::sync::Arc;

use url::Url;

use common::prelude::*;

use crate::config::{Config, ConfigError};
use crate::http_server::parse_url_base;

/// Shared gateway state, cloned into every request
#[derive(Clone)]
pub struct State {
    url_base: Url,
    base_host: String,
    backend: Arc<dyn StorageBackend>,
    resolver: HostResolver,
    geo: Arc<dyn GeoLocator>,
}

impl State {
    pub fn new(
        url_base: Url,
        backend: Arc<dyn StorageBackend>,
        resolver: HostResolver,
        geo: Arc<dyn GeoLocator>,
    ) -> Self {
        let base_host = url_base.host_str().unwrap_or_default().to_ascii_lowercase();
        Self {
            url_base,
            base_host,
            backend,
            resolver,
            geo,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Validate the base url
        let url_base = parse_url_base(&config.url_base).map_err(ConfigError::from)?;
        tracing::info!(url_base = %url_base, "serving traditional links");

        // 2. Setup storage
        let mut backend = ObjectStoreBackend::new(&config.storage)
            .await?
            .with_nodes(config.nodes.clone());
        for (api_key, project) in &config.projects {
            backend = backend.with_project(api_key, project);
        }
        tracing::info!(projects = config.projects.len(), "storage backend ready");

        // 3. Setup custom domain resolution, configured records shadow DNS
        let system = SystemTxtLookup::from_system_conf().unwrap_or_else(|e| {
            tracing::warn!("falling back to default name servers: {}", e);
            SystemTxtLookup::with_default_servers()
        });
        let lookup = config
            .txt_records
            .iter()
            .fold(StaticTxtLookup::new(), |lookup, (host, records)| {
                lookup.with_records(host, records.iter().cloned())
            })
            .with_fallback(Arc::new(system));
        let cache = Arc::new(CredentialCache::new(config.txt_record_ttl()));
        let resolver = HostResolver::new(cache, Arc::new(lookup));

        // 4. Setup geo-ip
        let geo = match &config.geoip_path {
            Some(path) => IpTable::load(path)?,
            None => IpTable::default(),
        };

        Ok(Self::new(url_base, Arc::new(backend), resolver, Arc::new(geo)))
    }

    pub fn url_base(&self) -> &Url {
        &self.url_base
    }

    /// Lowercased host of the base url, without port
    pub fn base_host(&self) -> &str {
        &self.base_host
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn resolver(&self) -> &HostResolver {
        &self.resolver
    }

    pub fn geo(&self) -> &dyn GeoLocator {
        self.geo.as_ref()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("storage backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("geoip error: {0}")]
    GeoIp(#[from] GeoIpError),
}
