//! Read-through LRU cache for loaded tables.
//!
//! Entries are keyed by the table they came from plus the query parameters
//! used to load them. Nothing expires on its own: writers call one of the
//! invalidation hooks after changing a table.

use lru::LruCache;
use std::{
    hash::Hash,
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard},
};

use crate::cli::types::Week;
use crate::error::Result;

/// Identity of a cached query result.
pub trait CacheKey: Hash + Eq + Clone + Send + Sync {
    /// Name of the table the entry was loaded from.
    fn table(&self) -> &str;
}

/// Cache key for table loads, optionally scoped to a week.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableKey {
    pub table: &'static str,
    pub week: Option<Week>,
}

impl TableKey {
    pub fn new(table: &'static str) -> Self {
        Self { table, week: None }
    }

    pub fn for_week(table: &'static str, week: Week) -> Self {
        Self {
            table,
            week: Some(week),
        }
    }
}

impl CacheKey for TableKey {
    fn table(&self) -> &str {
        self.table
    }
}

/// In-memory LRU cache with read-through loading
pub struct TableCache<K, V>
where
    K: CacheKey,
    V: Clone,
{
    memory_cache: Mutex<LruCache<K, V>>,
    memory_capacity: usize,
}

impl<K, V> TableCache<K, V>
where
    K: CacheKey,
    V: Clone,
{
    /// Create a new cache holding at most `memory_capacity` entries
    pub fn new(memory_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(memory_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            memory_cache: Mutex::new(LruCache::new(capacity)),
            memory_capacity: capacity.get(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, V>> {
        self.memory_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn put(&self, key: K, value: V) {
        self.lock().put(key, value);
    }

    /// Return the cached value, or run `loader`, cache its result and return it.
    ///
    /// Loader errors are returned as-is and nothing is cached.
    pub fn get_or_load<F>(&self, key: &K, loader: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = loader()?;
        self.put(key.clone(), value.clone());
        Ok(value)
    }

    /// Drop a single entry
    pub fn invalidate(&self, key: &K) {
        self.lock().pop(key);
    }

    /// Drop every entry loaded from `table`
    pub fn invalidate_table(&self, table: &str) {
        let mut cache = self.lock();
        let stale: Vec<K> = cache
            .iter()
            .filter(|(k, _)| k.table() == table)
            .map(|(k, _)| k.clone())
            .collect();
        for key in stale {
            cache.pop(&key);
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// `(entries used, capacity)`
    pub fn stats(&self) -> (usize, usize) {
        (self.lock().len(), self.memory_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjError;
    use std::cell::Cell;

    #[test]
    fn test_read_through_loads_once() {
        let cache: TableCache<TableKey, Vec<u32>> = TableCache::new(4);
        let key = TableKey::for_week("player_weeks", Week::new(11));
        let calls = Cell::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_load(&key, || {
                    calls.set(calls.get() + 1);
                    Ok(vec![1, 2, 3])
                })
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_loader_error_is_not_cached() {
        let cache: TableCache<TableKey, u32> = TableCache::new(4);
        let key = TableKey::new("week_inputs");

        let result = cache.get_or_load(&key, || {
            Err(ProjError::InvalidConfig {
                message: "boom".to_string(),
            })
        });
        assert!(result.is_err());
        assert_eq!(cache.stats().0, 0);
    }

    #[test]
    fn test_invalidate_table_only_drops_matching_entries() {
        let cache: TableCache<TableKey, u32> = TableCache::new(8);
        cache.put(TableKey::for_week("player_weeks", Week::new(10)), 1);
        cache.put(TableKey::for_week("player_weeks", Week::new(11)), 2);
        cache.put(TableKey::new("defense_strength"), 3);

        cache.invalidate_table("player_weeks");

        assert_eq!(cache.stats().0, 1);
        assert_eq!(cache.get(&TableKey::new("defense_strength")), Some(3));
        assert_eq!(
            cache.get(&TableKey::for_week("player_weeks", Week::new(10))),
            None
        );
    }

    #[test]
    fn test_invalidate_single_key_and_clear() {
        let cache: TableCache<TableKey, u32> = TableCache::new(8);
        let key = TableKey::new("defense_strength");
        cache.put(key.clone(), 5);
        cache.invalidate(&key);
        assert_eq!(cache.get(&key), None);

        cache.put(key.clone(), 6);
        cache.clear();
        assert_eq!(cache.stats(), (0, 8));
    }

    #[test]
    fn test_lru_eviction_respects_capacity() {
        let cache: TableCache<TableKey, u32> = TableCache::new(2);
        cache.put(TableKey::for_week("projections", Week::new(1)), 1);
        cache.put(TableKey::for_week("projections", Week::new(2)), 2);
        cache.put(TableKey::for_week("projections", Week::new(3)), 3);

        assert_eq!(cache.stats(), (2, 2));
        assert_eq!(
            cache.get(&TableKey::for_week("projections", Week::new(1))),
            None
        );
    }
}
