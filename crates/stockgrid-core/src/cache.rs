//! In-memory caching for upstream responses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::clock::{Clock, TokioClock};

/// Default time-to-live for listing queries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// How a façade call treats the shared cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a fresh entry when present; fetch and store otherwise.
    #[default]
    Use,
    /// Skip fresh entries but store the new response. Expired entries stay
    /// available as a rate-limit fallback.
    Refresh,
    /// No reads, no writes.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        !matches!(self, Self::Bypass)
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Fresh(String),
    /// The entry had expired. It has been evicted; the value is handed out
    /// once so callers can fall back to it.
    Expired(String),
    Miss,
}

impl Lookup {
    pub fn fresh(self) -> Option<String> {
        match self {
            Self::Fresh(body) => Some(body),
            Self::Expired(_) | Self::Miss => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl CacheInner {
    fn lookup(&mut self, key: &str, now: Instant) -> Lookup {
        let Some(entry) = self.map.get(key) else {
            return Lookup::Miss;
        };

        if now < entry.expires_at {
            return Lookup::Fresh(entry.body.clone());
        }

        match self.map.remove(key) {
            Some(entry) => Lookup::Expired(entry.body),
            None => Lookup::Miss,
        }
    }

    fn set(&mut self, key: String, body: String, ttl: Duration, now: Instant) {
        let expires_at = now + ttl;
        self.map.insert(key, CacheEntry { body, expires_at });
    }
}

/// Time-expiring key/value store shared by every data access operation.
///
/// No capacity bound; entries leave only by expiry (lazily, on lookup),
/// `remove`, or `clear`.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<RwLock<CacheInner>>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                map: HashMap::new(),
                default_ttl,
            })),
            clock,
        }
    }

    /// Create a cache store with a default TTL of 5 minutes on the tokio clock.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL, Arc::new(TokioClock))
    }

    /// Returns the value only while `now < expires_at`. An expired entry is
    /// deleted and reported as absent.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).await.fresh()
    }

    pub async fn lookup(&self, key: &str) -> Lookup {
        let now = self.clock.now();
        let mut store = self.inner.write().await;
        store.lookup(key, now)
    }

    /// Stores `body` under `key`, replacing any previous entry and resetting
    /// its expiry to `now + ttl` (default TTL when `ttl` is `None`).
    pub async fn set(
        &self,
        key: impl Into<String>,
        body: impl Into<String>,
        ttl: Option<Duration>,
    ) {
        let now = self.clock.now();
        let mut store = self.inner.write().await;
        let ttl = ttl.unwrap_or(store.default_ttl);
        store.set(key.into(), body.into(), ttl, now);
    }

    pub async fn remove(&self, key: &str) {
        let mut store = self.inner.write().await;
        store.map.remove(key);
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Number of entries held, including expired ones not yet looked up.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}
