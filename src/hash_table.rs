use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::mem::MaybeUninit;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::error::ConstructionError;
use crate::group;
use crate::group::DELETED;
use crate::group::EMPTY;
use crate::group::GROUP_WIDTH;
use crate::group::Group;

/// Number of slots in a freshly built or cleared table.
pub const MIN_CAPACITY: usize = 8;

/// Number of probe steps a lookup or insert takes before giving up.
pub const MAX_PROBE_DISTANCE: usize = 128;

/// Smallest accepted load factor.
pub const MIN_LOAD_FACTOR: f64 = 0.125;

/// Largest accepted load factor. Keeps at least one slot free in every
/// table, so probing always has somewhere to stop.
pub const MAX_LOAD_FACTOR: f64 = 0.9375;

cfg_if::cfg_if! {
    if #[cfg(feature = "density-seventy-five")] {
        /// Occupancy fraction above which the table doubles.
        pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
    } else {
        /// Occupancy fraction above which the table doubles.
        pub const DEFAULT_LOAD_FACTOR: f64 = 0.875;
    }
}

#[inline(always)]
fn growth_limit(capacity: usize, load_factor: f64) -> usize {
    (capacity as f64 * load_factor) as usize
}

/// Smallest power-of-two capacity (at least `MIN_CAPACITY`) that holds
/// `items` without exceeding `load_factor`.
fn capacity_for(items: usize, load_factor: f64) -> usize {
    checked_capacity_for(items, load_factor).unwrap_or_else(|| capacity_overflow())
}

fn checked_capacity_for(items: usize, load_factor: f64) -> Option<usize> {
    let mut capacity = MIN_CAPACITY;
    while growth_limit(capacity, load_factor) < items {
        capacity = capacity.checked_mul(2)?;
    }
    Some(capacity)
}

/// Whether slot and control storage for `capacity` values of `T` stays
/// within the `isize::MAX` byte limit on allocations.
fn fits_allocation<T>(capacity: usize) -> bool {
    let slot_bytes = capacity.checked_mul(core::mem::size_of::<T>());
    let ctrl_bytes = capacity.checked_add(GROUP_WIDTH);
    matches!(
        (slot_bytes, ctrl_bytes),
        (Some(slots), Some(ctrl)) if slots <= isize::MAX as usize && ctrl <= isize::MAX as usize
    )
}

#[inline]
fn double(capacity: usize) -> usize {
    capacity
        .checked_mul(2)
        .unwrap_or_else(|| capacity_overflow())
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("hash table capacity overflow")
}

#[inline(always)]
fn load_group(ctrl: &[u8], pos: usize) -> Group {
    let bytes = &ctrl[pos..pos + GROUP_WIDTH];
    // SAFETY: `bytes` is exactly `GROUP_WIDTH` bytes long.
    unsafe { Group::load(bytes.as_ptr()) }
}

fn empty_ctrl(capacity: usize) -> Box<[u8]> {
    let len = capacity
        .checked_add(GROUP_WIDTH)
        .unwrap_or_else(|| capacity_overflow());
    alloc::vec![EMPTY; len].into_boxed_slice()
}

/// Quadratic probe sequence over group starts.
///
/// Step `i` advances the cursor by `i * i + i`, wrapping at the table's
/// capacity. The group scanned at each step is the cursor rounded down to
/// a multiple of `GROUP_WIDTH`.
struct ProbeSeq {
    index: usize,
    step: usize,
    bucket_mask: usize,
}

impl ProbeSeq {
    #[inline(always)]
    fn new(hash: u64, bucket_mask: usize) -> Self {
        Self {
            index: hash as usize & bucket_mask,
            step: 0,
            bucket_mask,
        }
    }

    #[inline(always)]
    fn group_start(&self) -> usize {
        self.index & !(GROUP_WIDTH - 1)
    }

    #[inline(always)]
    fn advance(&mut self) {
        self.index = (self.index + self.step * self.step + self.step) & self.bucket_mask;
        self.step += 1;
    }
}

/// First empty or deleted slot along `hash`'s probe sequence, if one is
/// reachable within the probe budget.
fn find_insert_slot(ctrl: &[u8], bucket_mask: usize, hash: u64) -> Option<usize> {
    let lanes = group::valid_lanes(bucket_mask + 1);
    let mut probe = ProbeSeq::new(hash, bucket_mask);
    for _ in 0..MAX_PROBE_DISTANCE {
        let pos = probe.group_start();
        if let Some(bit) = load_group(ctrl, pos)
            .match_empty_or_deleted()
            .and(lanes)
            .lowest_set_bit()
        {
            return Some(pos + bit);
        }
        probe.advance();
    }
    None
}

/// Lay out a fresh control array for `hashes` at `capacity`, replaying the
/// placements in order. Returns the slot chosen for each hash, or `None`
/// if some entry could not be placed within the probe budget.
fn plan_rebuild(capacity: usize, hashes: &[(usize, u64)]) -> Option<(Box<[u8]>, Vec<usize>)> {
    let mut ctrl = empty_ctrl(capacity);
    let mut placements = Vec::with_capacity(hashes.len());
    for &(_, hash) in hashes {
        let index = find_insert_slot(&ctrl, capacity - 1, hash)?;
        ctrl[index] = group::tag(hash);
        placements.push(index);
    }
    Some((ctrl, placements))
}

enum Probe {
    Found(usize),
    Vacant(usize),
    Exhausted,
}

/// Debug statistics for hash table analysis.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of live elements.
    pub populated: usize,
    /// Number of slots.
    pub capacity: usize,
    /// Number of deleted slots awaiting the next rebuild.
    pub tombstones: usize,
    /// Number of live elements that triggers the next doubling.
    pub growth_limit: usize,
    /// Configured load factor.
    pub load_factor: f64,
    /// Fraction of slots holding live elements.
    pub occupancy: f64,
    /// Fraction of slots that are tombstones.
    pub tombstone_ratio: f64,
}

#[cfg(feature = "stats")]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        std::println!("=== Hash Table Debug Statistics ===");
        std::println!(
            "Population: {}/{} slots ({:.2}% occupancy, limit {})",
            self.populated,
            self.capacity,
            self.occupancy * 100.0,
            self.growth_limit,
        );
        std::println!(
            "Tombstones: {} ({:.2}%)",
            self.tombstones,
            self.tombstone_ratio * 100.0
        );
        std::println!("Load factor: {:.4}", self.load_factor);
    }
}

/// An open-addressing hash table with 16-wide control-byte groups.
///
/// `HashTable<T>` stores values of type `T` and knows nothing about keys:
/// every operation takes the value's hash and an equality predicate, and
/// operations that may rebuild the table also take a `hasher` that
/// recomputes a stored value's hash.
///
/// Capacity is always a power of two and never shrinks, except through
/// [`clear`](HashTable::clear), which returns it to [`MIN_CAPACITY`].
///
/// ## Example
///
/// ```rust
/// use swiss_map::HashOracle;
/// use swiss_map::SipOracle;
/// use swiss_map::hash_table::Entry;
/// use swiss_map::hash_table::HashTable;
///
/// #[derive(Debug, PartialEq)]
/// struct Person {
///     id: u64,
///     name: String,
/// }
///
/// let oracle = SipOracle::with_keys(1, 2);
/// let mut table = HashTable::new();
/// let hash = oracle.hash_key(&123u64);
///
/// match table.entry(hash, |p: &Person| p.id == 123, |p| oracle.hash_key(&p.id)) {
///     Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(hash, |p| p.id == 123).map(|p| p.name.as_str()), Some("Alice"));
/// ```
pub struct HashTable<T> {
    ctrl: Box<[u8]>,
    slots: Box<[MaybeUninit<T>]>,
    bucket_mask: usize,

    populated: usize,
    tombstones: usize,
    growth_limit: usize,
    load_factor: f64,
}

impl<T> Debug for HashTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        let ctrl: Vec<String> = self.ctrl[..self.capacity()]
            .chunks(GROUP_WIDTH)
            .map(|group| {
                group
                    .iter()
                    .map(|&byte| match byte {
                        EMPTY => "..".to_string(),
                        DELETED => "xx".to_string(),
                        tag => format!("{tag:02x}"),
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        f.debug_struct("HashTable")
            .field("ctrl", &ctrl)
            .field("populated", &self.populated)
            .field("tombstones", &self.tombstones)
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl<T> Clone for HashTable<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let mut new_table = Self::allocate(self.capacity(), self.load_factor);

        for index in 0..self.capacity() {
            let ctrl = self.ctrl[index];
            if group::is_full(ctrl) {
                // SAFETY: A full control byte marks an initialized slot.
                let value = unsafe { self.slots.get_unchecked(index).assume_init_ref() }.clone();
                new_table.slots[index].write(value);
                new_table.ctrl[index] = ctrl;
                new_table.populated += 1;
            } else if ctrl == DELETED {
                // Tombstones keep later entries on the same chain reachable.
                new_table.ctrl[index] = DELETED;
                new_table.tombstones += 1;
            }
        }

        debug_assert_eq!(new_table.populated, self.populated);
        new_table
    }
}

impl<T> Drop for HashTable<T> {
    fn drop(&mut self) {
        if core::mem::needs_drop::<T>() && self.populated > 0 {
            for (ctrl, slot) in self.ctrl.iter().zip(self.slots.iter_mut()) {
                if group::is_full(*ctrl) {
                    // SAFETY: A full control byte marks an initialized slot, and
                    // each slot is dropped at most once here.
                    unsafe { slot.assume_init_drop() };
                }
            }
        }
    }
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HashTable<T> {
    /// Creates an empty table with [`MIN_CAPACITY`] slots and the default
    /// load factor.
    pub fn new() -> Self {
        Self::allocate(MIN_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty table with a custom load factor.
    ///
    /// Fails with [`ConstructionError::InvalidLoadFactor`] unless
    /// `load_factor` lies in `[MIN_LOAD_FACTOR, MAX_LOAD_FACTOR]`.
    pub fn with_load_factor(load_factor: f64) -> Result<Self, ConstructionError> {
        if !(MIN_LOAD_FACTOR..=MAX_LOAD_FACTOR).contains(&load_factor) {
            return Err(ConstructionError::InvalidLoadFactor(load_factor));
        }
        Ok(Self::allocate(MIN_CAPACITY, load_factor))
    }

    /// Creates an empty table with a custom load factor and room for
    /// `items` values before the first rebuild.
    ///
    /// Fails with [`ConstructionError::InvalidLoadFactor`] as
    /// [`with_load_factor`](Self::with_load_factor) does, and with
    /// [`ConstructionError::CapacityOverflow`] when the slot array for
    /// `items` values would not fit in the address space. A representable
    /// request larger than available memory still aborts in the allocator.
    pub fn with_capacity_and_load_factor(
        items: usize,
        load_factor: f64,
    ) -> Result<Self, ConstructionError> {
        if !(MIN_LOAD_FACTOR..=MAX_LOAD_FACTOR).contains(&load_factor) {
            return Err(ConstructionError::InvalidLoadFactor(load_factor));
        }
        match checked_capacity_for(items, load_factor) {
            Some(capacity) if fits_allocation::<T>(capacity) => {
                Ok(Self::allocate(capacity, load_factor))
            }
            _ => Err(ConstructionError::CapacityOverflow(items)),
        }
    }

    fn allocate(capacity: usize, load_factor: f64) -> Self {
        debug_assert!(capacity.is_power_of_two() && capacity >= MIN_CAPACITY);
        Self {
            ctrl: empty_ctrl(capacity),
            slots: Box::<[T]>::new_uninit_slice(capacity),
            bucket_mask: capacity - 1,
            populated: 0,
            tombstones: 0,
            growth_limit: growth_limit(capacity, load_factor),
            load_factor,
        }
    }

    /// Returns the number of slots. Always a power of two.
    pub fn capacity(&self) -> usize {
        self.bucket_mask + 1
    }

    /// Returns the number of elements in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the load factor fixed at construction.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    #[inline(always)]
    fn lanes(&self) -> u16 {
        group::valid_lanes(self.capacity())
    }

    /// Returns an iterator over all values in the table, in slot order.
    ///
    /// Slot order is unrelated to insertion order and changes whenever the
    /// table is rebuilt.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.ctrl.iter().zip(self.slots.iter()),
            remaining: self.populated,
        }
    }

    /// Returns an iterator yielding mutable references to all values.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            inner: self.ctrl.iter().zip(self.slots.iter_mut()),
            remaining: self.populated,
        }
    }

    /// Returns an iterator that removes and yields all values from the
    /// table. Capacity is kept.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain {
            table: self,
            index: 0,
        }
    }

    /// Removes all elements and returns the table to [`MIN_CAPACITY`].
    pub fn clear(&mut self) {
        debug!(
            capacity = self.capacity(),
            populated = self.populated,
            "clearing hash table"
        );
        let fresh = Self::allocate(MIN_CAPACITY, self.load_factor);
        drop(core::mem::replace(self, fresh));
    }

    /// Grows the table so that `additional` more elements fit without
    /// triggering a rebuild.
    ///
    /// Tombstones count against the load limit until a rebuild purges them,
    /// so a table holding too many is rebuilt here, at its current capacity
    /// if live entries allow.
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(&T) -> u64) {
        let required = self
            .populated
            .saturating_add(self.tombstones)
            .saturating_add(additional);
        if required > self.growth_limit {
            let live = self.populated.saturating_add(additional);
            let capacity = capacity_for(live, self.load_factor).max(self.capacity());
            self.resize(capacity, &hasher);
        }
    }

    /// Finds a value by hash and equality predicate.
    ///
    /// Returns the stored value itself, so repeated lookups of the same key
    /// observe the same object until it is removed or the table is
    /// mutated.
    #[inline]
    pub fn find(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&T> {
        let index = self.find_index(hash, eq)?;
        // SAFETY: `find_index` only returns slots with a full control byte.
        Some(unsafe { self.slots.get_unchecked(index).assume_init_ref() })
    }

    /// Finds a value by hash and equality predicate, returning a mutable
    /// reference.
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&mut T> {
        let index = self.find_index(hash, eq)?;
        // SAFETY: `find_index` only returns slots with a full control byte.
        Some(unsafe { self.slots.get_unchecked_mut(index).assume_init_mut() })
    }

    /// Removes and returns the value matching `eq`.
    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.find_index(hash, eq)?;
        // SAFETY: `find_index` only returns in-bounds slots with a full control
        // byte.
        Some(unsafe { self.take(index) })
    }

    /// Gets an entry for the given hash and equality predicate.
    ///
    /// If the table has reached its load limit it is rebuilt before probing
    /// starts, using `hasher` to recompute each stored value's hash. If the
    /// probe budget runs out without finding either the value or a
    /// terminating group, the table doubles and probing restarts.
    pub fn entry(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(&T) -> bool,
        hasher: impl Fn(&T) -> u64,
    ) -> Entry<'_, T> {
        self.maybe_resize_rehash(&hasher);

        loop {
            match self.probe_for_insert(hash, &mut eq) {
                Probe::Found(index) => {
                    return Entry::Occupied(OccupiedEntry { table: self, index });
                }
                Probe::Vacant(index) => {
                    return Entry::Vacant(VacantEntry {
                        table: self,
                        index,
                        tag: group::tag(hash),
                    });
                }
                Probe::Exhausted => {
                    warn!(
                        capacity = self.capacity(),
                        populated = self.populated,
                        "probe budget exhausted; doubling capacity"
                    );
                    self.resize(double(self.capacity()), &hasher);
                }
            }
        }
    }

    fn find_index(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        if self.populated == 0 {
            return None;
        }

        let tag = group::tag(hash);
        let lanes = self.lanes();
        let mut probe = ProbeSeq::new(hash, self.bucket_mask);
        for _ in 0..MAX_PROBE_DISTANCE {
            let pos = probe.group_start();
            let group = load_group(&self.ctrl, pos);

            for bit in group.match_byte(tag).and(lanes) {
                let index = pos + bit;
                // SAFETY: `index` is a valid lane of an in-bounds group and its
                // control byte equals an occupied tag, so the slot is
                // initialized.
                if eq(unsafe { self.slots.get_unchecked(index).assume_init_ref() }) {
                    return Some(index);
                }
            }

            if group.match_empty().and(lanes).any_bit_set() {
                return None;
            }
            probe.advance();
        }

        None
    }

    fn probe_for_insert(&self, hash: u64, eq: &mut impl FnMut(&T) -> bool) -> Probe {
        let tag = group::tag(hash);
        let lanes = self.lanes();
        let mut vacant = None;
        let mut probe = ProbeSeq::new(hash, self.bucket_mask);
        for _ in 0..MAX_PROBE_DISTANCE {
            let pos = probe.group_start();
            let group = load_group(&self.ctrl, pos);

            for bit in group.match_byte(tag).and(lanes) {
                let index = pos + bit;
                // SAFETY: `index` is a valid lane of an in-bounds group and its
                // control byte equals an occupied tag, so the slot is
                // initialized.
                if eq(unsafe { self.slots.get_unchecked(index).assume_init_ref() }) {
                    return Probe::Found(index);
                }
            }

            if vacant.is_none() {
                vacant = group
                    .match_empty_or_deleted()
                    .and(lanes)
                    .lowest_set_bit()
                    .map(|bit| pos + bit);
            }

            if let Some(bit) = group.match_empty().and(lanes).lowest_set_bit() {
                return Probe::Vacant(vacant.unwrap_or(pos + bit));
            }
            probe.advance();
        }

        Probe::Exhausted
    }

    /// Move the value out of `index` and mark the slot free.
    ///
    /// # Safety
    ///
    /// `index` must be below `capacity` and hold a full control byte.
    unsafe fn take(&mut self, index: usize) -> T {
        let pos = index & !(GROUP_WIDTH - 1);
        // A group that still has an empty slot has never sent a probe onward,
        // so no chain runs through it and the slot can go straight back to
        // empty.
        if load_group(&self.ctrl, pos)
            .match_empty()
            .and(self.lanes())
            .any_bit_set()
        {
            self.ctrl[index] = EMPTY;
        } else {
            self.ctrl[index] = DELETED;
            self.tombstones += 1;
        }
        self.populated -= 1;

        // SAFETY: Caller guarantees the slot was initialized; its control byte
        // no longer marks it full, so it will not be read again.
        unsafe { self.slots.get_unchecked(index).assume_init_read() }
    }

    fn maybe_resize_rehash(&mut self, hasher: &impl Fn(&T) -> u64) {
        if self.populated >= self.growth_limit {
            self.resize(double(self.capacity()), hasher);
        } else if self.populated + self.tombstones >= self.growth_limit {
            trace!(
                tombstones = self.tombstones,
                capacity = self.capacity(),
                "purging tombstones"
            );
            self.resize(self.capacity(), hasher);
        }
    }

    /// Rebuild the table at `capacity`, replaying every live value in slot
    /// order. Storage is only swapped in once every value has a slot, so a
    /// panicking `hasher` leaves the table untouched.
    #[cold]
    #[inline(never)]
    fn resize(&mut self, mut capacity: usize, hasher: &impl Fn(&T) -> u64) {
        let old_capacity = self.capacity();
        let hashes: Vec<(usize, u64)> = (0..old_capacity)
            .filter(|&index| group::is_full(self.ctrl[index]))
            .map(|index| {
                // SAFETY: A full control byte marks an initialized slot.
                let value = unsafe { self.slots.get_unchecked(index).assume_init_ref() };
                (index, hasher(value))
            })
            .collect();
        debug_assert_eq!(hashes.len(), self.populated);

        let (ctrl, placements) = loop {
            match plan_rebuild(capacity, &hashes) {
                Some(plan) => break plan,
                None => {
                    warn!(capacity, "probe budget exhausted during rebuild; doubling again");
                    capacity = double(capacity);
                }
            }
        };

        let mut slots = Box::<[T]>::new_uninit_slice(capacity);
        for (&(old, _), &new) in hashes.iter().zip(placements.iter()) {
            // SAFETY: `old` is a full slot of the old storage, and every old
            // slot appears exactly once in `hashes`, so each value is moved
            // out once. The old storage is discarded below without dropping.
            let value = unsafe { self.slots.get_unchecked(old).assume_init_read() };
            slots[new].write(value);
        }

        self.ctrl = ctrl;
        self.slots = slots;
        self.bucket_mask = capacity - 1;
        self.tombstones = 0;
        self.growth_limit = growth_limit(capacity, self.load_factor);

        debug!(
            old_capacity,
            new_capacity = capacity,
            populated = self.populated,
            "rebuilt hash table"
        );
    }

    /// Returns the number of tombstones currently in the table.
    #[cfg(feature = "stats")]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns a snapshot of occupancy statistics.
    #[cfg(feature = "stats")]
    pub fn debug_stats(&self) -> DebugStats {
        let capacity = self.capacity();
        DebugStats {
            populated: self.populated,
            capacity,
            tombstones: self.tombstones,
            growth_limit: self.growth_limit,
            load_factor: self.load_factor,
            occupancy: self.populated as f64 / capacity as f64,
            tombstone_ratio: self.tombstones as f64 / capacity as f64,
        }
    }

    /// Counts how many probe steps each live value needs to be found.
    ///
    /// Index `i` of the result holds the number of values found on step
    /// `i`.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self, hasher: impl Fn(&T) -> u64) -> Vec<usize> {
        let mut histogram = Vec::new();
        for (index, value) in self.iter_indexed() {
            let mut probe = ProbeSeq::new(hasher(value), self.bucket_mask);
            let mut steps = 0;
            while probe.group_start() != index & !(GROUP_WIDTH - 1) && steps < MAX_PROBE_DISTANCE
            {
                probe.advance();
                steps += 1;
            }
            if histogram.len() <= steps {
                histogram.resize(steps + 1, 0);
            }
            histogram[steps] += 1;
        }
        histogram
    }

    #[cfg(feature = "stats")]
    fn iter_indexed(&self) -> impl Iterator<Item = (usize, &T)> {
        (0..self.capacity())
            .filter(|&index| group::is_full(self.ctrl[index]))
            // SAFETY: A full control byte marks an initialized slot.
            .map(|index| (index, unsafe { self.slots.get_unchecked(index).assume_init_ref() }))
    }
}

/// A view into a single entry in the table, which may be vacant or
/// occupied.
///
/// Created by [`HashTable::entry`].
pub enum Entry<'a, T> {
    /// The value is present.
    Occupied(OccupiedEntry<'a, T>),
    /// The value is absent; a slot has been chosen for it.
    Vacant(VacantEntry<'a, T>),
}

impl<'a, T> Entry<'a, T> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the stored value.
    pub fn or_insert(self, default: T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the stored value.
    pub fn or_insert_with(self, default: impl FnOnce() -> T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, T> {
    table: &'a mut HashTable<T>,
    index: usize,
}

impl<'a, T> OccupiedEntry<'a, T> {
    /// Gets a reference to the stored value.
    pub fn get(&self) -> &T {
        // SAFETY: An occupied entry always points at an initialized slot.
        unsafe { self.table.slots.get_unchecked(self.index).assume_init_ref() }
    }

    /// Gets a mutable reference to the stored value.
    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: An occupied entry always points at an initialized slot.
        unsafe {
            self.table
                .slots
                .get_unchecked_mut(self.index)
                .assume_init_mut()
        }
    }

    /// Converts the entry into a mutable reference bound to the table.
    pub fn into_mut(self) -> &'a mut T {
        // SAFETY: An occupied entry always points at an initialized slot.
        unsafe {
            self.table
                .slots
                .get_unchecked_mut(self.index)
                .assume_init_mut()
        }
    }

    /// Removes the value from the table and returns it.
    pub fn remove(self) -> T {
        // SAFETY: An occupied entry always points at an in-bounds, initialized
        // slot.
        unsafe { self.table.take(self.index) }
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, T> {
    table: &'a mut HashTable<T>,
    index: usize,
    tag: u8,
}

impl<'a, T> VacantEntry<'a, T> {
    /// Writes `value` into the chosen slot and returns a mutable reference
    /// to it.
    pub fn insert(self, value: T) -> &'a mut T {
        let table = self.table;
        if table.ctrl[self.index] == DELETED {
            table.tombstones -= 1;
        }
        table.ctrl[self.index] = self.tag;
        table.populated += 1;
        table.slots[self.index].write(value)
    }
}

/// An iterator over the values of a [`HashTable`].
pub struct Iter<'a, T> {
    inner: core::iter::Zip<core::slice::Iter<'a, u8>, core::slice::Iter<'a, MaybeUninit<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for (ctrl, slot) in self.inner.by_ref() {
            if group::is_full(*ctrl) {
                self.remaining -= 1;
                // SAFETY: A full control byte marks an initialized slot.
                return Some(unsafe { slot.assume_init_ref() });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// A mutable iterator over the values of a [`HashTable`].
pub struct IterMut<'a, T> {
    inner: core::iter::Zip<core::slice::Iter<'a, u8>, core::slice::IterMut<'a, MaybeUninit<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for (ctrl, slot) in self.inner.by_ref() {
            if group::is_full(*ctrl) {
                self.remaining -= 1;
                // SAFETY: A full control byte marks an initialized slot.
                return Some(unsafe { slot.assume_init_mut() });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

/// A draining iterator over the values in a [`HashTable`].
///
/// Created by [`HashTable::drain`]. Any values not consumed are dropped
/// when the iterator is.
pub struct Drain<'a, T> {
    table: &'a mut HashTable<T>,
    index: usize,
}

impl<T> Drop for Drain<'_, T> {
    fn drop(&mut self) {
        for _ in &mut *self {}
        self.table.ctrl.fill(EMPTY);
        self.table.tombstones = 0;
    }
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.table.capacity() {
            let index = self.index;
            self.index += 1;
            if group::is_full(self.table.ctrl[index]) {
                self.table.ctrl[index] = EMPTY;
                self.table.populated -= 1;
                // SAFETY: The slot was full and is now marked empty, so the
                // value is read exactly once.
                return Some(unsafe { self.table.slots.get_unchecked(index).assume_init_read() });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.populated, Some(self.table.populated))
    }
}
