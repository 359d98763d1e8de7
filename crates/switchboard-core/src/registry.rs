//! Connection registry.
//!
//! The registry maps connection ids to handles behind a single reader/writer
//! lock. Lookups, existence checks and snapshots share the lock; inserts and
//! removals are exclusive. Enumeration always returns a point-in-time copy so
//! callers never iterate under the lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::connection::Connection;
use crate::error::{HubError, HubResult};
use crate::id::ConnectionId;

/// The registry of live connections held by a [`Hub`](crate::Hub).
pub type ConnectionRegistry = Registry<Arc<Connection>>;

/// A lock-protected `id -> value` store.
#[derive(Debug)]
pub struct Registry<T> {
    entries: RwLock<HashMap<ConnectionId, T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> Registry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under `id`.
    ///
    /// Fails with [`HubError::IdentifierCollision`] if the id is present.
    pub fn insert(&self, id: ConnectionId, value: T) -> HubResult<()> {
        self.insert_bounded(id, value, usize::MAX)
    }

    /// Insert a value unless the registry already holds `max` entries.
    ///
    /// The capacity and collision checks happen under the same write lock as
    /// the insert.
    pub fn insert_bounded(&self, id: ConnectionId, value: T, max: usize) -> HubResult<()> {
        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return Err(HubError::collision(id));
        }
        if entries.len() >= max {
            return Err(HubError::connection_limit(max));
        }
        debug!(connection_id = %id, total = entries.len() + 1, "Connection registered");
        entries.insert(id, value);
        Ok(())
    }

    /// Look up a value. A missing id is an ordinary `None`.
    pub fn get(&self, id: &str) -> Option<T> {
        self.entries.read().get(id).cloned()
    }

    /// Check if an id is registered.
    pub fn exists(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Remove an id, returning its value if it was present.
    pub fn remove(&self, id: &str) -> Option<T> {
        let removed = self.entries.write().remove(id);
        if removed.is_some() {
            debug!(connection_id = %id, "Connection unregistered");
        }
        removed
    }

    /// A point-in-time copy of every registered value.
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.read().values().cloned().collect()
    }

    /// A point-in-time copy of every registered id.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry. Intended for test resets.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn id(s: &str) -> ConnectionId {
        ConnectionId::new(s)
    }

    #[test]
    fn test_insert_and_get() {
        let registry = Registry::new();
        registry.insert(id("a"), 1).unwrap();

        assert!(registry.exists("a"));
        assert_eq!(registry.get("a"), Some(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let registry: Registry<u32> = Registry::new();
        assert_eq!(registry.get("missing"), None);
        assert!(!registry.exists("missing"));
    }

    #[test]
    fn test_insert_collision() {
        let registry = Registry::new();
        registry.insert(id("a"), 1).unwrap();

        let err = registry.insert(id("a"), 2).unwrap_err();
        assert!(matches!(err, HubError::IdentifierCollision { .. }));
        assert_eq!(registry.get("a"), Some(1));
    }

    #[test]
    fn test_insert_bounded_limit() {
        let registry = Registry::new();
        registry.insert_bounded(id("a"), 1, 2).unwrap();
        registry.insert_bounded(id("b"), 2, 2).unwrap();

        let err = registry.insert_bounded(id("c"), 3, 2).unwrap_err();
        assert!(matches!(err, HubError::ConnectionLimitReached { max: 2 }));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove() {
        let registry = Registry::new();
        registry.insert(id("a"), 1).unwrap();

        assert_eq!(registry.remove("a"), Some(1));
        assert_eq!(registry.remove("a"), None);
        assert!(!registry.exists("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = Registry::new();
        registry.insert(id("a"), 1).unwrap();
        registry.insert(id("b"), 2).unwrap();

        let snapshot = registry.snapshot();
        registry.remove("a");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_and_clear() {
        let registry = Registry::new();
        registry.insert(id("a"), 1).unwrap();
        registry.insert(id("b"), 2).unwrap();

        let mut ids = registry.ids();
        ids.sort();
        assert_eq!(ids, vec![id("a"), id("b")]);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_inserts_are_unique() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..100 {
                        registry.insert(id(&format!("{t}-{i}")), i).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 800);
    }
}
