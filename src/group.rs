//! Control bytes and the 16-wide group matcher.
//!
//! Every slot in the table has one control byte:
//!
//! - `EMPTY` (`0xFF`): never occupied since the last rebuild. Terminates
//!   probing.
//! - `DELETED` (`0x00`): a tombstone. Skipped by lookups, reusable by
//!   inserts, dropped on the next rebuild.
//! - `0x80 | fragment`: occupied, where `fragment` is the top seven bits of
//!   the key's hash (with `0x7F` folded to `0x7E` so no tag aliases `EMPTY`).
//!
//! Masks returned from a [`Group`] always map bit `i` to byte `i` of the
//! group, regardless of target endianness.

/// Number of control bytes scanned together.
pub(crate) const GROUP_WIDTH: usize = 16;

/// Control byte for a slot that has never held a value.
pub(crate) const EMPTY: u8 = 0xFF;

/// Control byte for a slot whose value was removed.
pub(crate) const DELETED: u8 = 0x00;

const OCCUPIED_FLAG: u8 = 0x80;

const MAX_FRAGMENT: u8 = 0x7E;

/// Derive the control byte for `hash`.
///
/// The top seven bits of the hash are kept, except that `0x7F` is folded to
/// `0x7E` so no tag equals [`EMPTY`]. For those keys `tag & 0x7F` is not the
/// raw fragment; tags are only a pre-filter, so lookups are unaffected.
#[inline(always)]
pub(crate) fn tag(hash: u64) -> u8 {
    let fragment = (hash >> 57) as u8;
    OCCUPIED_FLAG | fragment.min(MAX_FRAGMENT)
}

#[inline(always)]
pub(crate) fn is_full(ctrl: u8) -> bool {
    ctrl & OCCUPIED_FLAG != 0 && ctrl != EMPTY
}

/// Lanes of a group that map to real slots. Tables smaller than a group
/// only own the low `capacity` lanes; the rest is padding.
#[inline(always)]
pub(crate) fn valid_lanes(capacity: usize) -> u16 {
    if capacity >= GROUP_WIDTH {
        u16::MAX
    } else {
        (1u16 << capacity) - 1
    }
}

/// A set of lanes within one group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BitMask(pub(crate) u16);

impl BitMask {
    #[inline(always)]
    pub(crate) fn and(self, lanes: u16) -> Self {
        BitMask(self.0 & lanes)
    }

    #[inline(always)]
    pub(crate) fn any_bit_set(self) -> bool {
        self.0 != 0
    }

    #[inline(always)]
    pub(crate) fn lowest_set_bit(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }
}

impl Iterator for BitMask {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        let bit = self.lowest_set_bit()?;
        self.0 &= self.0 - 1;
        Some(bit)
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "x86_64", target_feature = "sse2"))] {
        pub(crate) use sse2::Group;
    } else {
        pub(crate) use portable::Group;
    }
}

#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
mod sse2 {
    use core::arch::x86_64::*;

    use super::BitMask;
    use super::DELETED;
    use super::EMPTY;

    #[derive(Clone, Copy)]
    pub(crate) struct Group(__m128i);

    impl Group {
        /// Load 16 control bytes starting at `ptr`.
        ///
        /// # Safety
        ///
        /// `ptr` must be valid for reads of 16 bytes. No alignment is
        /// required.
        #[inline(always)]
        pub(crate) unsafe fn load(ptr: *const u8) -> Self {
            // SAFETY: Caller guarantees 16 readable bytes at `ptr`; the load is
            // unaligned.
            unsafe { Group(_mm_loadu_si128(ptr as *const __m128i)) }
        }

        #[inline(always)]
        pub(crate) fn match_byte(self, byte: u8) -> BitMask {
            // SAFETY: SSE2 is statically enabled for this module.
            unsafe {
                let cmp = _mm_cmpeq_epi8(self.0, _mm_set1_epi8(byte as i8));
                BitMask(_mm_movemask_epi8(cmp) as u16)
            }
        }

        #[inline(always)]
        pub(crate) fn match_empty(self) -> BitMask {
            self.match_byte(EMPTY)
        }

        #[inline(always)]
        pub(crate) fn match_empty_or_deleted(self) -> BitMask {
            // SAFETY: SSE2 is statically enabled for this module.
            unsafe {
                let empty = _mm_cmpeq_epi8(self.0, _mm_set1_epi8(EMPTY as i8));
                let deleted = _mm_cmpeq_epi8(self.0, _mm_set1_epi8(DELETED as i8));
                BitMask(_mm_movemask_epi8(_mm_or_si128(empty, deleted)) as u16)
            }
        }
    }
}

#[cfg_attr(
    all(target_arch = "x86_64", target_feature = "sse2", not(test)),
    allow(dead_code)
)]
mod portable {
    use super::BitMask;
    use super::DELETED;
    use super::EMPTY;
    use super::GROUP_WIDTH;

    #[derive(Clone, Copy)]
    pub(crate) struct Group([u8; GROUP_WIDTH]);

    impl Group {
        /// Load 16 control bytes starting at `ptr`.
        ///
        /// # Safety
        ///
        /// `ptr` must be valid for reads of 16 bytes. No alignment is
        /// required.
        #[inline(always)]
        pub(crate) unsafe fn load(ptr: *const u8) -> Self {
            // SAFETY: Caller guarantees 16 readable bytes at `ptr`.
            unsafe { Group(core::ptr::read_unaligned(ptr as *const [u8; GROUP_WIDTH])) }
        }

        #[inline(always)]
        pub(crate) fn match_byte(self, byte: u8) -> BitMask {
            let mut bits: u16 = 0;
            for i in 0..GROUP_WIDTH {
                bits |= ((self.0[i] == byte) as u16) << i;
            }
            BitMask(bits)
        }

        #[inline(always)]
        pub(crate) fn match_empty(self) -> BitMask {
            self.match_byte(EMPTY)
        }

        #[inline(always)]
        pub(crate) fn match_empty_or_deleted(self) -> BitMask {
            let mut bits: u16 = 0;
            for i in 0..GROUP_WIDTH {
                let byte = self.0[i];
                bits |= ((byte == EMPTY || byte == DELETED) as u16) << i;
            }
            BitMask(bits)
        }
    }
}
