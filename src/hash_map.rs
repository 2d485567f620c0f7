use core::fmt::Debug;
use core::mem;

use crate::comparator::Comparator;
use crate::error::ConstructionError;
use crate::hash_table::DEFAULT_LOAD_FACTOR;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
use crate::oracle::ByteKey;
use crate::oracle::HashOracle;
use crate::oracle::SipOracle;

/// Per-map tuning applied at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Occupancy fraction that triggers doubling. Must lie in
    /// `[0.125, 0.9375]`.
    pub load_factor: f64,
    /// Number of elements to make room for up front.
    pub capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            load_factor: DEFAULT_LOAD_FACTOR,
            capacity: 0,
        }
    }
}

/// A hash map backed by a SwissTable-style [`HashTable`].
///
/// Keys are hashed through their [`ByteKey`] encoding by the oracle `O`
/// and compared with a caller-supplied [`Comparator`]; two keys are the
/// same key when the comparator returns `Ordering::Equal`.
///
/// Iteration order is the table's physical slot order. It is unspecified
/// and changes whenever the table is rebuilt.
///
/// # Examples
///
/// ```rust
/// use swiss_map::SwissMap;
/// use swiss_map::comparator::natural_order;
///
/// let mut map = SwissMap::new(natural_order::<String>()).expect("os entropy");
/// assert_eq!(map.insert("a".to_string(), 1), None);
/// assert_eq!(map.insert("a".to_string(), 2), Some(1));
/// assert_eq!(map.get(&"a".to_string()), Some(&2));
/// assert_eq!(map.len(), 1);
/// ```
pub struct SwissMap<K, V, O = SipOracle> {
    table: HashTable<(K, V)>,
    oracle: O,
    comparator: Comparator<K>,
}

impl<K, V, O> Debug for SwissMap<K, V, O>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.table.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V> SwissMap<K, V, SipOracle>
where
    K: ByteKey,
{
    /// Creates an empty map whose [`SipOracle`] is seeded from the
    /// operating system's random source.
    ///
    /// Fails with [`ConstructionError::ConstructionFailed`] if the random
    /// source is unavailable.
    pub fn new(comparator: Comparator<K>) -> Result<Self, ConstructionError> {
        Ok(Self::with_oracle(comparator, SipOracle::from_os_rng()?))
    }
}

impl<K, V, O> SwissMap<K, V, O>
where
    K: ByteKey,
    O: HashOracle,
{
    /// Creates an empty map with an explicit oracle, e.g. a
    /// [`SipOracle::with_keys`] oracle to make hashing reproducible.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swiss_map::SipOracle;
    /// use swiss_map::SwissMap;
    /// use swiss_map::comparator::natural_order;
    ///
    /// let map: SwissMap<u64, &str> =
    ///     SwissMap::with_oracle(natural_order(), SipOracle::with_keys(1, 2));
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 8);
    /// ```
    pub fn with_oracle(comparator: Comparator<K>, oracle: O) -> Self {
        Self {
            table: HashTable::new(),
            oracle,
            comparator,
        }
    }

    /// Creates an empty map with an explicit oracle and tuning.
    ///
    /// Fails with [`ConstructionError::InvalidLoadFactor`] if
    /// `config.load_factor` is out of range, and with
    /// [`ConstructionError::CapacityOverflow`] if `config.capacity` entries
    /// could never be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swiss_map::MapConfig;
    /// use swiss_map::SipOracle;
    /// use swiss_map::SwissMap;
    /// use swiss_map::comparator::natural_order;
    ///
    /// let config = MapConfig {
    ///     load_factor: 0.5,
    ///     capacity: 100,
    /// };
    /// let map: SwissMap<u32, u32> =
    ///     SwissMap::with_config(natural_order(), SipOracle::with_keys(1, 2), config).unwrap();
    /// assert_eq!(map.capacity(), 256);
    ///
    /// let config = MapConfig {
    ///     load_factor: 1.0,
    ///     ..MapConfig::default()
    /// };
    /// assert!(
    ///     SwissMap::<u32, u32>::with_config(natural_order(), SipOracle::with_keys(1, 2), config)
    ///         .is_err()
    /// );
    /// ```
    pub fn with_config(
        comparator: Comparator<K>,
        oracle: O,
        config: MapConfig,
    ) -> Result<Self, ConstructionError> {
        Ok(Self {
            table: HashTable::with_capacity_and_load_factor(config.capacity, config.load_factor)?,
            oracle,
            comparator,
        })
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots in the underlying table. Always a power
    /// of two, never below 8.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the load factor fixed at construction.
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// Returns the hashing oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Removes every element and returns the capacity to its minimum.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swiss_map::SipOracle;
    /// use swiss_map::SwissMap;
    /// use swiss_map::comparator::natural_order;
    ///
    /// let mut map = SwissMap::with_oracle(natural_order(), SipOracle::with_keys(1, 2));
    /// for i in 0..100u32 {
    ///     map.insert(i, i);
    /// }
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 8);
    /// assert_eq!(map.get(&5), None);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Reserves room for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        let oracle = &self.oracle;
        self.table
            .reserve(additional, |(k, _)| oracle.hash_key(k));
    }

    /// Replaces the key comparator.
    ///
    /// Stored entries are not rehashed, so the new comparator must agree
    /// with the old one on which keys are equal.
    pub fn set_comparator(&mut self, comparator: Comparator<K>) {
        self.comparator = comparator;
    }

    /// Returns the key comparator.
    pub fn comparator(&self) -> &Comparator<K> {
        &self.comparator
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was absent, `None` is returned and the map grows by one.
    /// Otherwise the stored value is replaced and the previous value is
    /// returned; the stored key is kept.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// Repeated calls return the same stored value, not a copy, until the
    /// entry is removed or the map is mutated.
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = self.oracle.hash_key(key);
        let comparator = &self.comparator;
        self.table
            .find(hash, |(k, _)| comparator(k, key).is_eq())
            .map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let hash = self.oracle.hash_key(key);
        let comparator = &self.comparator;
        self.table
            .find(hash, |(k, _)| comparator(k, key).is_eq())
            .map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.oracle.hash_key(key);
        let comparator = &self.comparator;
        self.table
            .find_mut(hash, |(k, _)| comparator(k, key).is_eq())
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map holds a value for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// Removing an absent key leaves the map unchanged.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value if present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.oracle.hash_key(key);
        let comparator = &self.comparator;
        self.table
            .remove(hash, |(k, _)| comparator(k, key).is_eq())
    }

    /// Gets the given key's entry for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swiss_map::SipOracle;
    /// use swiss_map::SwissMap;
    /// use swiss_map::comparator::natural_order;
    ///
    /// let mut counts = SwissMap::with_oracle(natural_order::<String>(), SipOracle::with_keys(1, 2));
    /// for word in "the cat saw the dog".split(' ') {
    ///     *counts.entry(word.to_string()).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts.get(&"the".to_string()), Some(&2));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.oracle.hash_key(&key);
        let comparator = &self.comparator;
        let oracle = &self.oracle;
        match self.table.entry(
            hash,
            |(k, _)| comparator(k, &key).is_eq(),
            |(k, _)| oracle.hash_key(k),
        ) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }

    /// Calls `f` on every key-value pair in slot order.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for (k, v) in self.table.iter() {
            f(k, v);
        }
    }

    /// Returns an iterator over the key-value pairs of the map.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Removes and yields every key-value pair. Capacity is kept.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Returns the occupancy statistics of the underlying table.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }

    /// Returns how many entries are found on each probe step.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> alloc::vec::Vec<usize> {
        let oracle = &self.oracle;
        self.table.probe_histogram(|(k, _)| oracle.hash_key(k))
    }
}

impl<K, V, O> Extend<(K, V)> for SwissMap<K, V, O>
where
    K: ByteKey,
    O: HashOracle,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, O> IntoIterator for &'a SwissMap<K, V, O>
where
    K: ByteKey,
    O: HashOracle,
{
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`SwissMap`].
///
/// [`entry`]: SwissMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Replaces the value and returns the old one.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a `SwissMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a `SwissMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `SwissMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a `SwissMap`.
pub struct ValuesMut<'a, K, V> {
    inner: crate::hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A draining iterator over the key-value pairs of a `SwissMap`.
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Drain<'a, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::cmp::Ordering;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;

    use super::*;
    use crate::comparator::natural_order;
    use crate::comparator::reverse;

    const SEEDED: SipOracle = SipOracle::with_keys(0x5157_4953_535f_6d61, 0x7020_7465_7374_7321);

    /// Sends every key to bucket 0, so all keys share one probe chain.
    struct CollidingOracle;

    impl HashOracle for CollidingOracle {
        fn hash_key<K: ByteKey + ?Sized>(&self, _key: &K) -> u64 {
            0
        }
    }

    fn dense_config() -> MapConfig {
        MapConfig {
            load_factor: 0.875,
            capacity: 0,
        }
    }

    fn seeded_map<K: ByteKey + Ord + 'static, V>() -> SwissMap<K, V> {
        SwissMap::with_config(natural_order(), SEEDED, dense_config()).unwrap()
    }

    #[test]
    fn test_new_uses_os_seed() {
        let map: SwissMap<String, i32> = SwissMap::new(natural_order()).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), 8);

        let other: SwissMap<String, i32> = SwissMap::new(natural_order()).unwrap();
        assert_ne!(map.oracle().keys(), other.oracle().keys());
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = seeded_map();

        assert_eq!(map.insert(1u32, "hello".to_string()), None);
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        assert_eq!(map.get(&1), Some(&"hello".to_string()));
        assert_eq!(map.get(&2), None);

        assert_eq!(
            map.insert(1, "world".to_string()),
            Some("hello".to_string())
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"world".to_string()));
    }

    #[test]
    fn overwrite_returns_previous_value() {
        let mut map = seeded_map();
        assert_eq!(map.insert("a".to_string(), 1), None);
        assert_eq!(map.insert("a".to_string(), 2), Some(1));
        assert_eq!(map.get(&"a".to_string()), Some(&2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn get_returns_the_stored_value() {
        let mut map = seeded_map();
        map.insert(7u64, String::from("bookkeeping"));

        let first = map.get(&7).unwrap();
        let second = map.get(&7).unwrap();
        assert!(core::ptr::eq(first, second));
    }

    #[test]
    fn test_get_mut() {
        let mut map = seeded_map();
        map.insert(1u8, "hello".to_string());

        if let Some(value) = map.get_mut(&1) {
            value.push_str(" world");
        }

        assert_eq!(map.get(&1), Some(&"hello world".to_string()));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_contains_key() {
        let mut map = seeded_map();
        assert!(!map.contains_key(&1i32));

        map.insert(1, "value".to_string());
        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_remove() {
        let mut map = seeded_map();
        map.insert(1i64, "hello".to_string());
        map.insert(2, "world".to_string());

        assert_eq!(map.remove(&1), Some("hello".to_string()));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));

        assert_eq!(map.remove(&1), None);
        assert_eq!(map.remove(&99), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_entry() {
        let mut map = seeded_map();
        map.insert(1u16, "hello".to_string());

        assert_eq!(map.remove_entry(&1), Some((1, "hello".to_string())));
        assert!(map.is_empty());
        assert_eq!(map.remove_entry(&1), None);
    }

    #[test]
    fn capacity_is_smallest_fitting_power_of_two() {
        let mut map = seeded_map();
        for n in 1..=2000u32 {
            map.insert(n, ());
            let mut expected = 8;
            while (expected as f64 * 0.875) < n as f64 {
                expected *= 2;
            }
            assert_eq!(map.len(), n as usize);
            assert_eq!(map.capacity(), expected, "after {n} inserts");
        }
    }

    #[test]
    fn eighth_insert_sees_doubled_capacity() {
        let mut map = seeded_map();
        for k in 0..7u32 {
            map.insert(k, k);
        }
        assert_eq!(map.capacity(), 8);

        map.insert(7, 7);
        assert_eq!(map.capacity(), 16);
        for k in 0..8u32 {
            assert_eq!(map.get(&k), Some(&k));
        }
    }

    #[test]
    fn test_clear() {
        let mut map = seeded_map();
        for k in 0..100u32 {
            map.insert(k, k * 2);
        }
        assert!(map.capacity() > 8);

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), 8);
        for k in 0..100u32 {
            assert_eq!(map.get(&k), None);
        }

        map.insert(3, 3);
        assert_eq!(map.get(&3), Some(&3));
    }

    #[test]
    fn test_reserve() {
        let mut map: SwissMap<u32, u32> = seeded_map();
        map.reserve(100);
        let capacity = map.capacity();
        assert_eq!(capacity, 128);

        for k in 0..100u32 {
            map.insert(k, k);
        }
        assert_eq!(map.capacity(), capacity);
    }

    #[test]
    fn with_config_validates_and_presizes() {
        let config = MapConfig {
            load_factor: 0.75,
            capacity: 24,
        };
        let map: SwissMap<u32, u32> =
            SwissMap::with_config(natural_order(), SEEDED, config).unwrap();
        assert_eq!(map.load_factor(), 0.75);
        assert_eq!(map.capacity(), 32);

        for load_factor in [0.0, 0.05, 0.95, 2.0] {
            let config = MapConfig {
                load_factor,
                capacity: 0,
            };
            let result = SwissMap::<u32, u32>::with_config(natural_order(), SEEDED, config);
            assert!(matches!(
                result,
                Err(ConstructionError::InvalidLoadFactor(lf)) if lf == load_factor
            ));
        }
    }

    #[test]
    fn with_config_rejects_unallocatable_capacity() {
        for capacity in [usize::MAX, 1 << 62] {
            let config = MapConfig {
                load_factor: 0.875,
                capacity,
            };
            let result = SwissMap::<u64, u64>::with_config(natural_order(), SEEDED, config);
            assert!(matches!(
                result,
                Err(ConstructionError::CapacityOverflow(n)) if n == capacity
            ));
        }
    }

    #[test]
    fn comparator_is_readable() {
        let mut map: SwissMap<u32, ()> = seeded_map();
        assert_eq!((map.comparator())(&1, &2), Ordering::Less);

        map.set_comparator(reverse(natural_order()));
        assert_eq!((map.comparator())(&1, &2), Ordering::Greater);
        assert_eq!((map.comparator())(&7, &7), Ordering::Equal);
    }

    #[test]
    fn test_entry_api() {
        let mut map = seeded_map();

        *map.entry(1u32).or_insert(10) += 5;
        assert_eq!(map.get(&1), Some(&15));

        *map.entry(1).or_insert(100) += 1;
        assert_eq!(map.get(&1), Some(&16));

        map.entry(2).and_modify(|v| *v = 0).or_insert_with(|| 42);
        assert_eq!(map.get(&2), Some(&42));

        map.entry(2).and_modify(|v| *v += 1).or_insert(0);
        assert_eq!(map.get(&2), Some(&43));

        *map.entry(3).or_default() += 9;
        assert_eq!(map.get(&3), Some(&9));
        assert_eq!(map.entry(3).key(), &3);
    }

    #[test]
    fn test_occupied_and_vacant_entry() {
        let mut map = seeded_map();
        map.insert("k".to_string(), 1);

        match map.entry("k".to_string()) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), "k");
                assert_eq!(entry.get(), &1);
                assert_eq!(entry.insert(2), 1);
                *entry.get_mut() += 1;
                assert_eq!(entry.remove_entry(), ("k".to_string(), 3));
            }
            Entry::Vacant(_) => panic!("expected occupied entry"),
        }
        assert!(map.is_empty());

        match map.entry("v".to_string()) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), "v");
                *entry.insert(5) += 1;
            }
            Entry::Occupied(_) => panic!("expected vacant entry"),
        }
        assert_eq!(map.get(&"v".to_string()), Some(&6));

        match map.entry("w".to_string()) {
            Entry::Vacant(entry) => assert_eq!(entry.into_key(), "w"),
            Entry::Occupied(_) => panic!("expected vacant entry"),
        }
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn keys_and_values_pair_up() {
        let mut map = seeded_map();
        for k in 0..50u32 {
            map.insert(k, k);
        }
        for k in 0..50u32 {
            map.insert(k, k * 10);
        }

        assert_eq!(map.keys().len(), map.len());
        assert_eq!(map.values().len(), map.len());

        let mut pairs: Vec<(u32, u32)> = map.keys().copied().zip(map.values().copied()).collect();
        pairs.sort_unstable();
        let expected: Vec<(u32, u32)> = (0..50).map(|k| (k, k * 10)).collect();
        assert_eq!(pairs, expected);

        let mut from_iter: Vec<(u32, u32)> = (&map).into_iter().map(|(k, v)| (*k, *v)).collect();
        from_iter.sort_unstable();
        assert_eq!(from_iter, expected);
    }

    #[test]
    fn for_each_visits_every_pair() {
        let mut map = seeded_map();
        for k in 0..20u64 {
            map.insert(k, k + 1);
        }

        let mut seen = 0;
        let mut sum = 0;
        map.for_each(|k, v| {
            assert_eq!(*v, *k + 1);
            seen += 1;
            sum += *v;
        });
        assert_eq!(seen, 20);
        assert_eq!(sum, (1..=20).sum::<u64>());
    }

    #[test]
    fn test_values_mut() {
        let mut map = seeded_map();
        for k in 0..10u32 {
            map.insert(k, k);
        }
        for v in map.values_mut() {
            *v *= 3;
        }
        for k in 0..10u32 {
            assert_eq!(map.get(&k), Some(&(k * 3)));
        }
    }

    #[test]
    fn test_drain() {
        let mut map = seeded_map();
        for k in 0..30u32 {
            map.insert(k, k.to_string());
        }
        let capacity = map.capacity();

        let mut drained: Vec<(u32, String)> = map.drain().collect();
        drained.sort_unstable();
        assert_eq!(drained.len(), 30);
        assert_eq!(drained[7], (7, "7".to_string()));
        assert!(map.is_empty());
        assert_eq!(map.capacity(), capacity);
        assert_eq!(map.get(&7), None);
    }

    #[test]
    fn test_extend() {
        let mut map = seeded_map();
        map.extend((0..40u32).map(|k| (k, k + 100)));
        assert_eq!(map.len(), 40);
        assert_eq!(map.get(&39), Some(&139));

        map.extend([(0, 0)]);
        assert_eq!(map.len(), 40);
        assert_eq!(map.get(&0), Some(&0));
    }

    #[test]
    fn removed_collision_keeps_later_keys_reachable() {
        let mut map = SwissMap::with_config(natural_order(), CollidingOracle, dense_config()).unwrap();
        map.insert("A".to_string(), 1);
        map.insert("B".to_string(), 2);

        assert_eq!(map.remove(&"A".to_string()), Some(1));
        assert_eq!(map.get(&"B".to_string()), Some(&2));
        assert!(!map.contains_key(&"A".to_string()));
    }

    #[test]
    fn removal_inside_full_probe_chain() {
        let mut map = SwissMap::with_config(natural_order(), CollidingOracle, dense_config()).unwrap();
        for k in 0..20u32 {
            map.insert(k, k);
        }

        for k in [0u32, 3, 15] {
            assert_eq!(map.remove(&k), Some(k));
        }
        for k in (0..20u32).filter(|k| ![0, 3, 15].contains(k)) {
            assert_eq!(map.get(&k), Some(&k), "lost {k}");
        }

        for k in 20..40u32 {
            map.insert(k, k);
        }
        assert_eq!(map.len(), 37);
        for k in 20..40u32 {
            assert_eq!(map.get(&k), Some(&k));
        }
    }

    #[test]
    fn shuffled_round_trip() {
        let mut rng = SmallRng::seed_from_u64(0x0dd_ba11);
        let mut keys: Vec<String> = (0..3000).map(|i| alloc::format!("key-{i}")).collect();
        keys.shuffle(&mut rng);

        let mut map = seeded_map();
        for (i, key) in keys.iter().enumerate() {
            map.insert(key.clone(), i);
        }
        assert_eq!(map.len(), keys.len());

        let mut lookup_order: Vec<usize> = (0..keys.len()).collect();
        lookup_order.shuffle(&mut rng);
        for i in lookup_order {
            assert_eq!(map.get(&keys[i]), Some(&i), "missing {}", keys[i]);
        }
    }

    #[test]
    fn comparator_defines_equality() {
        let mut map: SwissMap<u32, &str> = seeded_map();
        map.insert(1, "one");
        map.insert(2, "two");

        map.set_comparator(reverse(natural_order()));
        assert_eq!(map.get(&1), Some(&"one"));
        map.insert(3, "three");
        assert_eq!(map.len(), 3);
        assert_eq!(map.insert(2, "deux"), Some("two"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn byte_keys_of_different_shapes() {
        let mut map: SwissMap<Vec<u8>, u8> = seeded_map();
        map.insert(b"alpha".to_vec(), 1);
        map.insert(Vec::new(), 0);
        assert_eq!(map.get(&b"alpha".to_vec()), Some(&1));
        assert_eq!(map.get(&Vec::new()), Some(&0));

        let mut map: SwissMap<[u8; 4], char> = seeded_map();
        map.insert(*b"abcd", 'x');
        assert_eq!(map.get(b"abcd"), Some(&'x'));
    }

    #[test]
    fn test_debug() {
        let mut map = seeded_map();
        map.insert(1u8, "x");
        assert_eq!(alloc::format!("{map:?}"), r#"{1: "x"}"#);
    }

    #[test]
    fn test_complex_values() {
        #[derive(Debug, Clone, PartialEq)]
        struct ComplexValue {
            id: u32,
            name: String,
            data: Vec<i32>,
        }

        let mut map = seeded_map();
        let value = ComplexValue {
            id: 1,
            name: "test".to_string(),
            data: alloc::vec![1, 2, 3],
        };

        map.insert("key1".to_string(), value.clone());
        assert_eq!(map.get(&"key1".to_string()), Some(&value));

        if let Some(v) = map.get_mut(&"key1".to_string()) {
            v.data.push(4);
        }
        assert_eq!(map.get(&"key1".to_string()).unwrap().data, [1, 2, 3, 4]);
    }
}
