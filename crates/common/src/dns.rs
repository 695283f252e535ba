use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no txt records found for {0}")]
    NotFound(String),
    #[error("txt lookup for {hostname} failed: {source}")]
    Resolver {
        hostname: String,
        #[source]
        source: hickory_resolver::error::ResolveError,
    },
}

/// DNS TXT lookups
#[async_trait]
pub trait TxtLookup: Send + Sync {
    /// Look up the TXT records of a hostname. Each record is returned as a
    /// single string; records made of several character strings are joined.
    async fn lookup_txt(&self, hostname: &str) -> Result<Vec<String>, LookupError>;
}

/// TXT lookups against the system's configured name servers
#[derive(Clone)]
pub struct SystemTxtLookup {
    resolver: Arc<TokioAsyncResolver>,
}

impl SystemTxtLookup {
    /// Use the name servers from the system configuration (`/etc/resolv.conf` on unix)
    pub fn from_system_conf() -> Result<Self, LookupError> {
        let resolver =
            TokioAsyncResolver::tokio_from_system_conf().map_err(|source| LookupError::Resolver {
                hostname: String::new(),
                source,
            })?;
        Ok(Self {
            resolver: Arc::new(resolver),
        })
    }

    /// Use the resolver library's default public name servers
    pub fn with_default_servers() -> Self {
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

#[async_trait]
impl TxtLookup for SystemTxtLookup {
    async fn lookup_txt(&self, hostname: &str) -> Result<Vec<String>, LookupError> {
        let lookup =
            self.resolver
                .txt_lookup(hostname)
                .await
                .map_err(|source| LookupError::Resolver {
                    hostname: hostname.to_string(),
                    source,
                })?;

        let records: Vec<String> = lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|data| String::from_utf8_lossy(data))
                    .collect::<String>()
            })
            .collect();

        if records.is_empty() {
            return Err(LookupError::NotFound(hostname.to_string()));
        }
        tracing::debug!(hostname, count = records.len(), "resolved txt records");
        Ok(records)
    }
}

/// Fixed TXT records for selected hostnames, optionally falling back to
/// another lookup for everything else
#[derive(Clone, Default)]
pub struct StaticTxtLookup {
    records: HashMap<String, Vec<String>>,
    fallback: Option<Arc<dyn TxtLookup>>,
}

impl StaticTxtLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I, S>(mut self, hostname: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.records.insert(
            hostname.into().to_ascii_lowercase(),
            records.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn TxtLookup>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TxtLookup for StaticTxtLookup {
    async fn lookup_txt(&self, hostname: &str) -> Result<Vec<String>, LookupError> {
        if let Some(records) = self.records.get(&hostname.to_ascii_lowercase()) {
            return Ok(records.clone());
        }
        match &self.fallback {
            Some(fallback) => fallback.lookup_txt(hostname).await,
            None => Err(LookupError::NotFound(hostname.to_string())),
        }
    }
}
