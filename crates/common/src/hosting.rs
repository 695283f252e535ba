use std::sync::Arc;

use crate::access::Access;
use crate::cache::CredentialCache;
use crate::dns::{LookupError, TxtLookup};
use crate::records::{parse_records, RecordError, RootPath};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("invalid txt records for {hostname}: {source}")]
    Records {
        hostname: String,
        #[source]
        source: RecordError,
    },
}

/// Resolves custom domains into the access grant and root they serve.
///
/// Fresh cache entries short-circuit DNS. On a miss the TXT records are
/// fetched and parsed without holding the cache lock, and only a complete
/// resolution is written back. Two requests racing on the same cold
/// hostname may both hit DNS; the later write wins.
#[derive(Clone)]
pub struct HostResolver {
    cache: Arc<CredentialCache>,
    lookup: Arc<dyn TxtLookup>,
}

impl HostResolver {
    pub fn new(cache: Arc<CredentialCache>, lookup: Arc<dyn TxtLookup>) -> Self {
        Self { cache, lookup }
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, hostname: &str) -> Result<(Access, RootPath), ResolveError> {
        if let Some(entry) = self.cache.get(hostname) {
            tracing::trace!("txt record cache hit");
            return Ok((entry.access, entry.root));
        }

        let records = self.lookup.lookup_txt(hostname).await?;
        let (access, root) = parse_records(&records).map_err(|source| ResolveError::Records {
            hostname: hostname.to_string(),
            source,
        })?;

        tracing::debug!(bucket = root.bucket(), "resolved txt records");
        self.cache.put(hostname, access.clone(), root.clone());
        Ok((access, root))
    }
}

impl std::fmt::Debug for HostResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
