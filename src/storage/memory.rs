use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe registry of shared values keyed by numeric id.
///
/// Values are held behind `Arc` so a lookup hands out a handle without keeping
/// the map shard locked. Iteration returns a snapshot; callers must not rely
/// on any ordering across entries.
pub struct MemoryStore<T> {
    entries: DashMap<u64, Arc<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Inserts or replaces the value stored under `id`.
    pub fn put(&self, id: u64, value: Arc<T>) {
        self.entries.insert(id, value);
    }

    pub fn get(&self, id: u64) -> Option<Arc<T>> {
        self.entries.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn delete(&self, id: u64) -> Option<Arc<T>> {
        self.entries.remove(&id).map(|(_, value)| value)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Snapshot of every stored value. No shard stays locked afterwards.
    pub fn all(&self) -> Vec<Arc<T>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Removes every entry for which `predicate` returns `true`.
    ///
    /// Returns the number of removed entries.
    pub fn remove_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        let mut removed = 0;
        self.entries.retain(|_, value| {
            let remove = predicate(&**value);
            if remove {
                removed += 1;
            }
            !remove
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
