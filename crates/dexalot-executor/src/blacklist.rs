//! Trader denylist check.
//!
//! Reads the shared deny set before any firm quote is requested. Members
//! are compared lowercased whatever case they were stored in.

use crate::error::{ExecutorError, ExecutorResult};
use dexalot_core::normalize_address;
use dexalot_registry::{CacheScope, DynCache};
use dexalot_telemetry::Metrics;
use tracing::warn;

pub struct BlacklistGuard {
    cache: DynCache,
    key: String,
}

impl BlacklistGuard {
    pub fn new(cache: DynCache, scope: &CacheScope) -> Self {
        Self {
            cache,
            key: scope.blacklist_key(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn is_blacklisted(&self, address: &str) -> ExecutorResult<bool> {
        let address = normalize_address(address);
        let members = self
            .cache
            .set_members(&self.key)
            .await
            .map_err(ExecutorError::Cache)?;
        Ok(members.iter().any(|m| normalize_address(m) == address))
    }

    /// Fail with `Blacklisted` when `address` is denied.
    pub async fn ensure_allowed(&self, address: &str) -> ExecutorResult<()> {
        if self.is_blacklisted(address).await? {
            Metrics::blacklist_rejected();
            warn!(user = %normalize_address(address), "Blacklisted user tried to build a transaction");
            return Err(ExecutorError::Blacklisted(normalize_address(address)));
        }
        Ok(())
    }

    /// Add `address` to the shared deny set.
    pub async fn add(&self, address: &str) -> ExecutorResult<()> {
        self.cache
            .set_add(&self.key, normalize_address(address))
            .await
            .map_err(ExecutorError::Cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexalot_registry::{CacheStore, MemoryCache};
    use std::sync::Arc;

    const TRADER: &str = "0x000000000000000000000000000000000000BEEF";

    fn guard() -> (Arc<MemoryCache>, BlacklistGuard) {
        let cache = Arc::new(MemoryCache::new());
        let guard = BlacklistGuard::new(cache.clone(), &CacheScope::new("dexalot", 43114));
        (cache, guard)
    }

    #[tokio::test]
    async fn test_mixed_case_member_rejects_lowercase_request() {
        let (cache, guard) = guard();
        cache.set_add(guard.key(), TRADER.to_string()).await.unwrap();

        let err = guard.ensure_allowed(&TRADER.to_lowercase()).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Blacklisted(ref a) if a == &TRADER.to_lowercase()));
    }

    #[tokio::test]
    async fn test_unlisted_user_allowed() {
        let (_cache, guard) = guard();
        assert!(guard.ensure_allowed(TRADER).await.is_ok());
    }

    #[tokio::test]
    async fn test_add_then_reject() {
        let (_cache, guard) = guard();
        guard.add(TRADER).await.unwrap();
        assert!(guard.is_blacklisted("0x000000000000000000000000000000000000beef").await.unwrap());
    }
}
