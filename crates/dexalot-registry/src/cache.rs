//! Shared key/value cache seam.
//!
//! Order-book sides and the blacklist live in a cache shared between
//! processes. Components receive it as an injected [`CacheStore`]; the
//! in-process [`MemoryCache`] backs tests and single-process deployments.

use crate::client::BoxFuture;
use crate::error::{RegistryError, RegistryResult};
use dashmap::DashMap;
use dexalot_core::{normalize_address, BookSide, OrderBook};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Namespaced key/value store with per-key expiry and set membership.
pub trait CacheStore: Send + Sync {
    /// Value under `key`, or None when absent or expired.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RegistryResult<Option<String>>>;

    /// Store `value` under `key` for `ttl`.
    fn set_with_expiry<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        value: String,
    ) -> BoxFuture<'a, RegistryResult<()>>;

    /// Add `member` to the set under `key`. Idempotent.
    fn set_add<'a>(&'a self, key: &'a str, member: String) -> BoxFuture<'a, RegistryResult<()>>;

    /// Members of the set under `key` (empty when absent).
    fn set_members<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RegistryResult<HashSet<String>>>;
}

/// Arc wrapper for cache trait objects.
pub type DynCache = Arc<dyn CacheStore>;

/// Key scope of one integration on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheScope {
    pub dex_key: String,
    pub network: u64,
}

impl CacheScope {
    pub fn new(dex_key: impl Into<String>, network: u64) -> Self {
        Self {
            dex_key: dex_key.into(),
            network,
        }
    }

    /// Namespace a raw key: `{dex_key}_{network}_{key}` (lowercased).
    pub fn key(&self, raw: &str) -> String {
        format!("{}_{}_{}", self.dex_key, self.network, raw).to_ascii_lowercase()
    }

    /// Key of one order-book side for the pair `base/quote`.
    pub fn book_key(&self, base_address: &str, quote_address: &str, side: BookSide) -> String {
        self.key(&side.cache_key(
            &normalize_address(base_address),
            &normalize_address(quote_address),
        ))
    }

    /// Key of the denylist set: `{network}_{dex_key}_blacklist`.
    pub fn blacklist_key(&self) -> String {
        format!("{}_{}_blacklist", self.network, self.dex_key).to_ascii_lowercase()
    }
}

/// Read one cached order-book side. Absent or expired means empty.
pub async fn read_order_book(
    cache: &dyn CacheStore,
    scope: &CacheScope,
    base_address: &str,
    quote_address: &str,
    side: BookSide,
) -> RegistryResult<OrderBook> {
    let key = scope.book_key(base_address, quote_address, side);
    match cache.get(&key).await? {
        Some(raw) => Ok(OrderBook::from_json(&raw)?),
        None => Ok(OrderBook::default()),
    }
}

/// Write one order-book side with `ttl`.
pub async fn write_order_book(
    cache: &dyn CacheStore,
    scope: &CacheScope,
    base_address: &str,
    quote_address: &str,
    side: BookSide,
    book: &OrderBook,
    ttl: Duration,
) -> RegistryResult<()> {
    let key = scope.book_key(base_address, quote_address, side);
    cache.set_with_expiry(&key, ttl, book.to_json()?).await
}

#[derive(Debug, Clone)]
enum Entry {
    Value(String),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Slot {
    entry: Entry,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-process cache with lazy expiry.
///
/// Uses `tokio::time::Instant` so paused-clock tests can advance past TTLs.
#[derive(Default)]
pub struct MemoryCache {
    slots: DashMap<String, Slot>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.slots.iter().filter(|s| s.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_entry(&self, key: &str) -> Option<Entry> {
        let now = Instant::now();
        let live = self
            .slots
            .get(key)
            .map(|slot| (slot.is_live(now), slot.entry.clone()));
        match live {
            Some((true, entry)) => Some(entry),
            Some((false, _)) => {
                self.slots.remove(key);
                None
            }
            None => None,
        }
    }
}

impl CacheStore for MemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RegistryResult<Option<String>>> {
        Box::pin(async move {
            match self.live_entry(key) {
                Some(Entry::Value(value)) => Ok(Some(value)),
                Some(Entry::Set(_)) => Err(RegistryError::Cache(format!(
                    "{key} holds a set, not a value"
                ))),
                None => Ok(None),
            }
        })
    }

    fn set_with_expiry<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        value: String,
    ) -> BoxFuture<'a, RegistryResult<()>> {
        Box::pin(async move {
            self.slots.insert(
                key.to_string(),
                Slot {
                    entry: Entry::Value(value),
                    expires_at: Some(Instant::now() + ttl),
                },
            );
            Ok(())
        })
    }

    fn set_add<'a>(&'a self, key: &'a str, member: String) -> BoxFuture<'a, RegistryResult<()>> {
        Box::pin(async move {
            let now = Instant::now();
            let mut slot = self.slots.entry(key.to_string()).or_insert_with(|| Slot {
                entry: Entry::Set(HashSet::new()),
                expires_at: None,
            });
            if !slot.is_live(now) {
                *slot = Slot {
                    entry: Entry::Set(HashSet::new()),
                    expires_at: None,
                };
            }
            match &mut slot.entry {
                Entry::Set(members) => {
                    members.insert(member);
                    Ok(())
                }
                Entry::Value(_) => Err(RegistryError::Cache(format!(
                    "{key} holds a value, not a set"
                ))),
            }
        })
    }

    fn set_members<'a>(&'a self, key: &'a str) -> BoxFuture<'a, RegistryResult<HashSet<String>>> {
        Box::pin(async move {
            match self.live_entry(key) {
                Some(Entry::Set(members)) => Ok(members),
                Some(Entry::Value(_)) => Err(RegistryError::Cache(format!(
                    "{key} holds a value, not a set"
                ))),
                None => Ok(HashSet::new()),
            }
        })
    }
}
