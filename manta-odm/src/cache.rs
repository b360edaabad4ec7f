//! Metadata caching.
//!
//! The cache holds parsed [`ClassMetadata`] keyed by class name. A shared
//! backend can serve several document managers as long as each wraps it in
//! a [`NamespacedCache`] with a distinct prefix.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::metadata::ClassMetadata;

/// A cache for parsed mapping metadata.
///
/// Implementations must tolerate concurrent access; no further
/// synchronization is imposed on shared instances.
pub trait MetadataCache: Send + Sync {
    /// Fetch a cached entry.
    fn get(&self, key: &str) -> Option<Arc<ClassMetadata>>;

    /// Store an entry.
    fn put(&self, key: &str, metadata: Arc<ClassMetadata>);

    /// Check whether an entry exists.
    fn contains(&self, key: &str) -> bool;

    /// Remove an entry.
    fn evict(&self, key: &str);

    /// Remove all entries.
    fn clear(&self);
}

/// Typed factory for cache implementations.
///
/// Replaces instantiating a cache from a configured class name with a
/// compile-time enum of the concrete implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataCacheKind {
    /// Process-local in-memory cache.
    #[default]
    InMemory,
    /// Cache that stores nothing.
    Null,
}

impl MetadataCacheKind {
    /// Build a cache of this kind.
    pub fn build(&self) -> Arc<dyn MetadataCache> {
        match self {
            Self::InMemory => Arc::new(InMemoryCache::new()),
            Self::Null => Arc::new(NullCache),
        }
    }
}

/// In-memory metadata cache.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Arc<ClassMetadata>>>,
}

impl InMemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl MetadataCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Arc<ClassMetadata>> {
        self.entries.read().get(key).cloned()
    }

    fn put(&self, key: &str, metadata: Arc<ClassMetadata>) {
        debug!(key = %key, "caching metadata");
        self.entries.write().insert(key.to_string(), metadata);
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn evict(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}

/// A cache that stores nothing.
#[derive(Debug, Default)]
pub struct NullCache;

impl MetadataCache for NullCache {
    fn get(&self, _key: &str) -> Option<Arc<ClassMetadata>> {
        None
    }

    fn put(&self, _key: &str, _metadata: Arc<ClassMetadata>) {}

    fn contains(&self, _key: &str) -> bool {
        false
    }

    fn evict(&self, _key: &str) {}

    fn clear(&self) {}
}

/// Wrapper applying a key prefix to an inner cache.
///
/// Keeps several document managers from colliding when they share one
/// backend.
pub struct NamespacedCache {
    inner: Arc<dyn MetadataCache>,
    prefix: String,
}

impl NamespacedCache {
    /// Wrap `inner`, prefixing every key with `prefix` and a dot.
    pub fn new(inner: Arc<dyn MetadataCache>, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}.{}", self.prefix, key)
    }
}

impl MetadataCache for NamespacedCache {
    fn get(&self, key: &str) -> Option<Arc<ClassMetadata>> {
        self.inner.get(&self.namespaced(key))
    }

    fn put(&self, key: &str, metadata: Arc<ClassMetadata>) {
        self.inner.put(&self.namespaced(key), metadata);
    }

    fn contains(&self, key: &str) -> bool {
        self.inner.contains(&self.namespaced(key))
    }

    fn evict(&self, key: &str) {
        self.inner.evict(&self.namespaced(key));
    }

    fn clear(&self) {
        // Clearing through a namespace clears the whole backend; callers
        // sharing a backend should evict per key instead.
        self.inner.clear();
    }
}
