//! Directory backend composition, decided once at startup.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{HttpLookupClient, LookupService};
use crate::config::ResponderConfig;
use crate::crypto::PublicKey;
use crate::error::{LookupError, TransportError};

/// Resolve through `primary`; names it does not know are retried on
/// `fallback`. Any other primary failure is returned as-is.
pub struct FallbackLookup {
    primary: Arc<dyn LookupService>,
    fallback: Arc<dyn LookupService>,
}

impl FallbackLookup {
    pub fn new(primary: Arc<dyn LookupService>, fallback: Arc<dyn LookupService>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl LookupService for FallbackLookup {
    async fn lookup_name(&self, name: &str) -> Result<PublicKey, LookupError> {
        match self.primary.lookup_name(name).await {
            Err(LookupError::NotFound { .. }) => {
                debug!(name = %name, "Name not in registry, trying legacy lookup");
                self.fallback.lookup_name(name).await
            }
            other => other,
        }
    }
}

/// Build the directory: legacy service only, or registry with legacy
/// fallback.
pub fn directory_from_config(
    config: &ResponderConfig,
) -> Result<Arc<dyn LookupService>, TransportError> {
    let legacy: Arc<dyn LookupService> =
        Arc::new(HttpLookupClient::new(&config.lookup_url, config.connect_timeout)?);

    if config.use_legacy_lookup {
        info!(url = %config.lookup_url, "Using legacy lookup service");
        return Ok(legacy);
    }

    info!(
        registry = %config.registry_url,
        legacy = %config.lookup_url,
        "Using registry lookup with legacy fallback"
    );
    let registry: Arc<dyn LookupService> =
        Arc::new(HttpLookupClient::new(&config.registry_url, config.connect_timeout)?);
    Ok(Arc::new(FallbackLookup::new(registry, legacy)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::crypto::PrivateKey;

    struct StubDirectory {
        keys: HashMap<String, PublicKey>,
        fail_with_request_error: bool,
        calls: AtomicUsize,
    }

    impl StubDirectory {
        fn new(entries: &[(&str, PublicKey)]) -> Self {
            Self {
                keys: entries.iter().map(|(n, k)| (n.to_string(), *k)).collect(),
                fail_with_request_error: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LookupService for StubDirectory {
        async fn lookup_name(&self, name: &str) -> Result<PublicKey, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_with_request_error {
                return Err(LookupError::Request {
                    name: name.into(),
                    reason: "connection refused".into(),
                });
            }
            self.keys.get(name).copied().ok_or(LookupError::NotFound {
                name: name.into(),
            })
        }
    }

    #[tokio::test]
    async fn primary_hit_skips_fallback() {
        let key = PrivateKey::generate().public_key();
        let primary = Arc::new(StubDirectory::new(&[("alice", key)]));
        let fallback = Arc::new(StubDirectory::new(&[]));
        let lookup = FallbackLookup::new(primary.clone(), fallback.clone());

        assert_eq!(lookup.lookup_name("alice").await.unwrap(), key);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn not_found_falls_back() {
        let key = PrivateKey::generate().public_key();
        let primary = Arc::new(StubDirectory::new(&[]));
        let fallback = Arc::new(StubDirectory::new(&[("gateway", key)]));
        let lookup = FallbackLookup::new(primary, fallback);

        assert_eq!(lookup.lookup_name("gateway").await.unwrap(), key);
        assert!(matches!(
            lookup.lookup_name("nobody").await,
            Err(LookupError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn request_error_does_not_fall_back() {
        let key = PrivateKey::generate().public_key();
        let mut primary = StubDirectory::new(&[]);
        primary.fail_with_request_error = true;
        let fallback = Arc::new(StubDirectory::new(&[("alice", key)]));
        let lookup = FallbackLookup::new(Arc::new(primary), fallback.clone());

        assert!(matches!(
            lookup.lookup_name("alice").await,
            Err(LookupError::Request { .. })
        ));
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }
}
