use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use parking_lot::RwLock;

use crate::comparator::Comparator;
use crate::error::ConstructionError;
use crate::hash_map::MapConfig;
use crate::hash_map::SwissMap;
use crate::oracle::ByteKey;
use crate::oracle::HashOracle;
use crate::oracle::SipOracle;

/// A [`SwissMap`] behind a single reader-writer lock.
///
/// Lookups, iteration and size queries take the shared lock; `insert`,
/// `remove`, `clear` and `set_comparator` take the exclusive lock. A
/// resize triggered by an insert holds the exclusive lock for its whole
/// duration.
///
/// References cannot outlive the lock guard, so reads either clone the
/// value out ([`get_cloned`](Self::get_cloned)) or run a closure while the
/// lock is held ([`with_value`](Self::with_value)).
///
/// Reads take the shared lock recursively: a closure passed to
/// [`for_each`](Self::for_each) or [`with_value`](Self::with_value) may
/// call other read methods on the same map even while a writer is
/// waiting. Calling a write method from such a closure deadlocks.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
///
/// use swiss_map::SyncSwissMap;
/// use swiss_map::comparator::natural_order;
///
/// let map = Arc::new(SyncSwissMap::new(natural_order::<u64>()).expect("os entropy"));
/// let workers: Vec<_> = (0..4u64)
///     .map(|t| {
///         let map = Arc::clone(&map);
///         thread::spawn(move || {
///             for i in 0..100 {
///                 map.insert(t * 100 + i, i);
///             }
///         })
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
/// assert_eq!(map.len(), 400);
/// assert_eq!(map.get_cloned(&250), Some(50));
/// ```
pub struct SyncSwissMap<K, V, O = SipOracle> {
    map: RwLock<SwissMap<K, V, O>>,
}

impl<K, V, O> Debug for SyncSwissMap<K, V, O>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&*self.map.read_recursive(), f)
    }
}

impl<K, V> SyncSwissMap<K, V, SipOracle>
where
    K: ByteKey,
{
    /// Creates an empty map seeded from the operating system's random
    /// source.
    pub fn new(comparator: Comparator<K>) -> Result<Self, ConstructionError> {
        Ok(Self::from_map(SwissMap::new(comparator)?))
    }
}

impl<K, V, O> From<SwissMap<K, V, O>> for SyncSwissMap<K, V, O> {
    fn from(map: SwissMap<K, V, O>) -> Self {
        Self::from_map(map)
    }
}

impl<K, V, O> SyncSwissMap<K, V, O> {
    /// Wraps an existing map.
    pub fn from_map(map: SwissMap<K, V, O>) -> Self {
        Self {
            map: RwLock::new(map),
        }
    }

    /// Consumes the lock and returns the inner map.
    pub fn into_inner(self) -> SwissMap<K, V, O> {
        self.map.into_inner()
    }
}

impl<K, V, O> SyncSwissMap<K, V, O>
where
    K: ByteKey,
    O: HashOracle,
{
    /// Creates an empty map with an explicit oracle.
    pub fn with_oracle(comparator: Comparator<K>, oracle: O) -> Self {
        Self::from_map(SwissMap::with_oracle(comparator, oracle))
    }

    /// Creates an empty map with an explicit oracle and tuning.
    pub fn with_config(
        comparator: Comparator<K>,
        oracle: O,
        config: MapConfig,
    ) -> Result<Self, ConstructionError> {
        Ok(Self::from_map(SwissMap::with_config(
            comparator, oracle, config,
        )?))
    }

    /// Inserts a key-value pair, returning the previous value if the key
    /// was present.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.map.write().insert(key, value)
    }

    /// Returns a clone of the value stored for `key`.
    pub fn get_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.read_recursive().get(key).cloned()
    }

    /// Runs `f` on the value stored for `key` while holding the shared
    /// lock. `f` may read from this map but must not mutate it.
    pub fn with_value<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.map.read_recursive().get(key).map(f)
    }

    /// Returns `true` if the map holds a value for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.read_recursive().contains_key(key)
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.map.write().remove(key)
    }

    /// Returns a snapshot of the keys.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.map.read_recursive().keys().cloned().collect()
    }

    /// Returns a snapshot of the values.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.map.read_recursive().values().cloned().collect()
    }

    /// Calls `f` on every pair while holding the shared lock. `f` may read
    /// from this map but must not call a mutating method on it.
    pub fn for_each(&self, f: impl FnMut(&K, &V)) {
        self.map.read_recursive().for_each(f);
    }

    /// Removes every element and returns the capacity to its minimum.
    pub fn clear(&self) {
        self.map.write().clear();
    }

    /// Replaces the key comparator.
    pub fn set_comparator(&self, comparator: Comparator<K>) {
        self.map.write().set_comparator(comparator);
    }

    /// Compares two keys with the current comparator.
    pub fn compare_keys(&self, a: &K, b: &K) -> Ordering {
        (self.map.read_recursive().comparator())(a, b)
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.map.read_recursive().len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.map.read_recursive().is_empty()
    }

    /// Returns the number of slots in the underlying table.
    pub fn capacity(&self) -> usize {
        self.map.read_recursive().capacity()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Barrier;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::comparator::natural_order;
    use crate::comparator::reverse;

    fn seeded<V>() -> SyncSwissMap<u64, V> {
        SyncSwissMap::with_oracle(natural_order(), SipOracle::with_keys(3, 4))
    }

    #[test]
    fn reads_and_writes() {
        let map = seeded();
        assert!(map.is_empty());
        assert_eq!(map.insert(1, "one".to_string()), None);
        assert_eq!(map.insert(1, "uno".to_string()), Some("one".to_string()));
        assert_eq!(map.get_cloned(&1), Some("uno".to_string()));
        assert_eq!(map.with_value(&1, |v| v.len()), Some(3));
        assert_eq!(map.with_value(&2, |v| v.len()), None);
        assert!(map.contains_key(&1));
        assert_eq!(map.len(), 1);

        assert_eq!(map.remove(&1), Some("uno".to_string()));
        assert_eq!(map.remove(&1), None);
        assert!(map.is_empty());
    }

    #[test]
    fn snapshots_and_clear() {
        let map = seeded();
        for k in 0..64u64 {
            map.insert(k, k * k);
        }

        let mut keys = map.keys();
        keys.sort_unstable();
        assert_eq!(keys, (0..64).collect::<Vec<_>>());

        let mut values = map.values();
        values.sort_unstable();
        assert_eq!(values, (0..64).map(|k| k * k).collect::<Vec<_>>());

        let mut total = 0;
        map.for_each(|_, v| total += *v);
        assert_eq!(total, (0..64u64).map(|k| k * k).sum::<u64>());

        assert_eq!(map.compare_keys(&1, &2), Ordering::Less);
        map.set_comparator(reverse(natural_order()));
        assert_eq!(map.compare_keys(&1, &2), Ordering::Greater);
        assert_eq!(map.get_cloned(&8), Some(64));

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 8);
    }

    #[test]
    fn into_inner_keeps_contents() {
        let map = seeded();
        map.insert(5, 'x');
        let inner = map.into_inner();
        assert_eq!(inner.get(&5), Some(&'x'));

        let map = SyncSwissMap::from(inner);
        assert_eq!(map.get_cloned(&5), Some('x'));
        assert_eq!(format!("{map:?}"), "{5: 'x'}");
    }

    #[test]
    fn nested_reads_do_not_wait_for_queued_writers() {
        let map = Arc::new(seeded());
        map.insert(1, 1);

        let (entered_tx, entered_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let reader = {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                map.for_each(|_, _| {
                    entered_tx.send(()).unwrap();
                    // Give the writer time to park on the lock.
                    thread::sleep(Duration::from_millis(200));
                    assert_eq!(map.get_cloned(&1), Some(1));
                    assert_eq!(map.with_value(&1, |v| *v + 1), Some(2));
                });
                done_tx.send(()).unwrap();
            })
        };

        entered_rx.recv().unwrap();
        let writer = {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                map.insert(2, 2);
            })
        };

        assert!(done_rx.recv_timeout(Duration::from_secs(10)).is_ok());
        reader.join().unwrap();
        writer.join().unwrap();
        assert_eq!(map.get_cloned(&2), Some(2));
    }

    #[test]
    fn concurrent_writers_and_readers() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 500;

        let map = Arc::new(seeded());
        let barrier = Arc::new(Barrier::new(THREADS as usize * 2));

        let writers: Vec<_> = (0..THREADS)
            .map(|t| {
                let map = Arc::clone(&map);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..PER_THREAD {
                        map.insert(t * PER_THREAD + i, t);
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..THREADS)
            .map(|t| {
                let map = Arc::clone(&map);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..PER_THREAD {
                        if let Some(owner) = map.get_cloned(&(t * PER_THREAD + i)) {
                            assert_eq!(owner, t);
                        }
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        assert_eq!(map.len(), (THREADS * PER_THREAD) as usize);
        for t in 0..THREADS {
            for i in 0..PER_THREAD {
                assert_eq!(map.get_cloned(&(t * PER_THREAD + i)), Some(t));
            }
        }
    }
}
