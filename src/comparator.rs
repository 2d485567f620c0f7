use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// A type-erased three-way key comparator.
///
/// The map treats two keys as equal exactly when the comparator returns
/// [`Ordering::Equal`]. Keys the comparator considers equal must produce
/// the same [`ByteKey`](crate::ByteKey) encoding, or lookups will miss.
pub type Comparator<K> = Box<dyn Fn(&K, &K) -> Ordering + Send + Sync>;

/// Compares keys by their [`Ord`] implementation.
///
/// # Examples
///
/// ```rust
/// use core::cmp::Ordering;
///
/// use swiss_map::comparator::natural_order;
///
/// let cmp = natural_order::<u32>();
/// assert_eq!(cmp(&1, &2), Ordering::Less);
/// ```
pub fn natural_order<K: Ord + ?Sized + 'static>() -> Comparator<K> {
    Box::new(|a: &K, b: &K| a.cmp(b))
}

/// Inverts the ordering of `cmp`. Equality is unchanged.
pub fn reverse<K: ?Sized + 'static>(cmp: Comparator<K>) -> Comparator<K> {
    Box::new(move |a: &K, b: &K| cmp(b, a))
}

/// Tries each comparator in turn and returns the first non-equal result.
///
/// An empty chain considers every pair of keys equal.
pub fn chain<K: ?Sized + 'static>(comparators: Vec<Comparator<K>>) -> Comparator<K> {
    Box::new(move |a: &K, b: &K| {
        comparators
            .iter()
            .map(|cmp| cmp(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}
