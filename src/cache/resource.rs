//! TTL cache for forum data and rendered fragments.
//!
//! Expiry is lazy: an entry older than the TTL is treated as a miss when it
//! is read and stays in the map until it is overwritten or invalidated.
//! Concurrent misses may both recompute and store; the last write wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tracing::trace;

/// The kind of resource a cache entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Groups,
    Topics,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::Topics => "topics",
        }
    }
}

/// Cache key: resource kind plus the embed's optional instance id.
///
/// Renders as `groups`, `groups_{id}`, `topics` or `topics_{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: ResourceKind,
    instance: Option<String>,
}

impl CacheKey {
    #[must_use]
    pub fn new(kind: ResourceKind, instance: Option<&str>) -> Self {
        Self {
            kind,
            instance: instance
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ToString::to_string),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(id) => write!(f, "{}_{id}", self.kind.as_str()),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// A keyed cache whose entries all share one TTL.
#[derive(Debug)]
pub struct ResourceCache<V> {
    entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> ResourceCache<V> {
    /// Create an empty cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a clone of the value if present and younger than the TTL.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &CacheKey, now: Instant) -> Option<V> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl, now) => {
                trace!(key = %key, "Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                trace!(key = %key, "Cache entry expired");
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: CacheKey, value: V) {
        trace!(key = %key, "Cache store");
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove the entry for `key`, if any.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
