#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Three-way key comparators and combinators for building them.
pub mod comparator;

mod error;
mod group;

/// A key-value map built on [`HashTable`].
///
/// [`SwissMap`] hashes keys through a [`HashOracle`] and decides key
/// equality with a caller-supplied [`Comparator`](comparator::Comparator).
pub mod hash_map;

/// The open-addressing table underneath [`SwissMap`].
///
/// [`HashTable`] stores bare values and takes hashes and equality
/// predicates from the caller, so it can back maps, sets, or indexes with
/// out-of-line keys.
pub mod hash_table;

mod oracle;

/// A [`SwissMap`] guarded by a single reader-writer lock.
#[cfg(feature = "sync")]
pub mod sync;

pub use error::ConstructionError;
pub use hash_map::Entry;
pub use hash_map::MapConfig;
pub use hash_map::SwissMap;
pub use hash_table::HashTable;
pub use oracle::ByteKey;
#[cfg(feature = "foldhash")]
pub use oracle::FoldOracle;
pub use oracle::HashOracle;
pub use oracle::SipOracle;
#[cfg(feature = "sync")]
pub use sync::SyncSwissMap;
