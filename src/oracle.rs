use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hasher;

use rand::TryCryptoRng;
use rand::rngs::OsRng;
use siphasher::sip::SipHasher13;

use crate::error::ConstructionError;

/// A key type with a stable, canonical byte encoding.
///
/// Hashing goes through this trait rather than through a type's in-memory
/// representation, so the encoding never depends on padding, pointer values
/// or platform endianness. Integers are written little-endian; `usize` and
/// `isize` are widened to 64 bits.
///
/// Two keys that the map's comparator considers equal must write the same
/// bytes.
///
/// # Examples
///
/// ```rust
/// use core::hash::Hasher;
///
/// use swiss_map::ByteKey;
///
/// struct UserId {
///     shard: u16,
///     local: u32,
/// }
///
/// impl ByteKey for UserId {
///     fn write_key<H: Hasher>(&self, state: &mut H) {
///         self.shard.write_key(state);
///         self.local.write_key(state);
///     }
/// }
/// ```
pub trait ByteKey {
    /// Feeds the canonical encoding of `self` into `state`.
    fn write_key<H: Hasher>(&self, state: &mut H);
}

macro_rules! impl_byte_key_le {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ByteKey for $ty {
                #[inline]
                fn write_key<H: Hasher>(&self, state: &mut H) {
                    state.write(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_byte_key_le!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

impl ByteKey for usize {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        state.write(&(*self as u64).to_le_bytes());
    }
}

impl ByteKey for isize {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        state.write(&(*self as i64).to_le_bytes());
    }
}

impl ByteKey for bool {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        state.write(&[*self as u8]);
    }
}

impl ByteKey for char {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        (*self as u32).write_key(state);
    }
}

impl ByteKey for str {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        state.write(self.as_bytes());
    }
}

impl ByteKey for String {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        self.as_str().write_key(state);
    }
}

impl ByteKey for [u8] {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        state.write(self);
    }
}

impl ByteKey for Vec<u8> {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        self.as_slice().write_key(state);
    }
}

impl<const N: usize> ByteKey for [u8; N] {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        state.write(self);
    }
}

impl<T: ByteKey + ?Sized> ByteKey for &T {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        (**self).write_key(state);
    }
}

impl<T: ByteKey + ?Sized> ByteKey for Box<T> {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        (**self).write_key(state);
    }
}

impl<T: ByteKey + ?Sized> ByteKey for Rc<T> {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        (**self).write_key(state);
    }
}

impl<T: ByteKey + ?Sized> ByteKey for Arc<T> {
    #[inline]
    fn write_key<H: Hasher>(&self, state: &mut H) {
        (**self).write_key(state);
    }
}

/// Turns keys into 64-bit hashes.
///
/// The low bits of the result pick a key's home bucket and the top seven
/// bits become its control-byte tag, so implementations should mix well
/// across the whole word.
pub trait HashOracle {
    /// Hashes the canonical encoding of `key`.
    fn hash_key<K: ByteKey + ?Sized>(&self, key: &K) -> u64;
}

fn draw_seed<R: TryCryptoRng + ?Sized>(rng: &mut R) -> Result<u64, ConstructionError> {
    rng.try_next_u64()
        .map_err(|err| ConstructionError::ConstructionFailed(err.to_string()))
}

/// Keyed SipHash-1-3, the default oracle.
///
/// Each instance carries its own pair of 64-bit keys, so two maps seeded
/// independently never share collision behavior.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SipOracle {
    k0: u64,
    k1: u64,
}

impl SipOracle {
    /// Creates an oracle with fixed keys. Useful for reproducible tests.
    pub const fn with_keys(k0: u64, k1: u64) -> Self {
        Self { k0, k1 }
    }

    /// Draws both keys from the given cryptographically secure generator.
    pub fn from_rng<R: TryCryptoRng + ?Sized>(rng: &mut R) -> Result<Self, ConstructionError> {
        let k0 = draw_seed(rng)?;
        let k1 = draw_seed(rng)?;
        Ok(Self { k0, k1 })
    }

    /// Draws both keys from the operating system's random source.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swiss_map::HashOracle;
    /// use swiss_map::SipOracle;
    ///
    /// let oracle = SipOracle::from_os_rng().expect("os entropy");
    /// assert_eq!(oracle.hash_key("key"), oracle.hash_key("key"));
    /// ```
    pub fn from_os_rng() -> Result<Self, ConstructionError> {
        Self::from_rng(&mut OsRng)
    }

    /// Returns the `(k0, k1)` key pair, e.g. to reproduce a failing run.
    pub fn keys(&self) -> (u64, u64) {
        (self.k0, self.k1)
    }
}

impl Debug for SipOracle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SipOracle").finish_non_exhaustive()
    }
}

impl HashOracle for SipOracle {
    #[inline]
    fn hash_key<K: ByteKey + ?Sized>(&self, key: &K) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(self.k0, self.k1);
        key.write_key(&mut hasher);
        hasher.finish()
    }
}

/// Seeded foldhash oracle.
///
/// Faster than [`SipOracle`] but not designed to resist deliberate collision
/// flooding; prefer it for keys that do not come from untrusted input.
#[cfg(feature = "foldhash")]
#[derive(Clone, Debug)]
pub struct FoldOracle {
    state: foldhash::quality::FixedState,
}

#[cfg(feature = "foldhash")]
impl FoldOracle {
    /// Creates an oracle from a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: foldhash::quality::FixedState::with_seed(seed),
        }
    }

    /// Seeds the oracle from the given cryptographically secure generator.
    pub fn from_rng<R: TryCryptoRng + ?Sized>(rng: &mut R) -> Result<Self, ConstructionError> {
        Ok(Self::with_seed(draw_seed(rng)?))
    }

    /// Seeds the oracle from the operating system's random source.
    pub fn from_os_rng() -> Result<Self, ConstructionError> {
        Self::from_rng(&mut OsRng)
    }
}

#[cfg(feature = "foldhash")]
impl HashOracle for FoldOracle {
    #[inline]
    fn hash_key<K: ByteKey + ?Sized>(&self, key: &K) -> u64 {
        use core::hash::BuildHasher;

        let mut hasher = self.state.build_hasher();
        key.write_key(&mut hasher);
        hasher.finish()
    }
}
