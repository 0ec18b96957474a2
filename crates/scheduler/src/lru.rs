//! Bounded least-recently-used cache

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    last_used: u64,
}

/// Bounded LRU map used as the advisory marker-position cache.
///
/// Recency is tracked with a monotonic stamp per entry instead of an ordered
/// list: reads and writes bump a counter, and eviction scans for the
/// smallest stamp. Linear eviction is fine at the cache sizes involved, and
/// wholesale invalidation (on resize or orientation change) stays cheap.
/// Strictly a read-through convenience; every correctness-critical read
/// recomputes from live layout.
#[derive(Debug, Clone)]
pub struct LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    capacity: usize,
    clock: u64,
    entries: HashMap<K, Slot<V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// A zero capacity is treated as one so insertion never becomes a no-op.
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), clock: 0, entries: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Read without refreshing recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Read and mark the entry as most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let stamp = self.tick();
        self.entries.get_mut(key).map(|slot| {
            slot.last_used = stamp;
            &slot.value
        })
    }

    /// Insert or refresh an entry, evicting the least recently used one past
    /// capacity.
    pub fn insert(&mut self, key: K, value: V) {
        let stamp = self.tick();
        self.entries.insert(key, Slot { value, last_used: stamp });

        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|slot| slot.value)
    }

    /// Drop every entry. Used when the whole layout may have shifted.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.clock = 0;
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_the_oldest_entry_past_capacity() {
        let mut cache = LruCache::new(2);

        cache.insert(1_u32, "one");
        cache.insert(2_u32, "two");
        cache.insert(3_u32, "three");

        assert!(!cache.contains_key(&1));
        assert!(cache.contains_key(&2));
        assert!(cache.contains_key(&3));
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = LruCache::new(2);

        cache.insert(1_u32, "one");
        cache.insert(2_u32, "two");
        let _ = cache.get(&1);
        cache.insert(3_u32, "three");

        assert!(cache.contains_key(&1));
        assert!(!cache.contains_key(&2));
    }

    #[test]
    fn reinserting_refreshes_recency() {
        let mut cache = LruCache::new(2);

        cache.insert(1_u32, "one");
        cache.insert(2_u32, "two");
        cache.insert(1_u32, "uno");
        cache.insert(3_u32, "three");

        assert_eq!(cache.peek(&1), Some(&"uno"));
        assert!(!cache.contains_key(&2));
    }

    #[test]
    fn peek_does_not_refresh_recency() {
        let mut cache = LruCache::new(2);

        cache.insert(1_u32, "one");
        cache.insert(2_u32, "two");
        let _ = cache.peek(&1);
        cache.insert(3_u32, "three");

        assert!(!cache.contains_key(&1));
    }

    #[test]
    fn remove_and_invalidate_clear_entries() {
        let mut cache = LruCache::new(4);

        cache.insert(1_u32, "one");
        cache.insert(2_u32, "two");

        assert_eq!(cache.remove(&1), Some("one"));
        assert_eq!(cache.remove(&1), None);

        cache.invalidate_all();
        assert!(cache.is_empty());

        // Reinsertion after invalidation behaves like a fresh cache.
        cache.insert(5_u32, "five");
        assert_eq!(cache.len(), 1);
    }
}
