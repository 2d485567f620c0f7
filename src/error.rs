use alloc::string::String;
use core::fmt;

/// Errors raised while building a map.
///
/// Construction is the only fallible step: once a map exists, every
/// operation on it is total and reports absence through `Option`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructionError {
    /// The random source used to seed the hashing oracle could not produce
    /// key material.
    ConstructionFailed(String),
    /// The requested load factor lies outside `[1/8, 15/16]`.
    InvalidLoadFactor(f64),
    /// The requested initial capacity needs more slots than can be
    /// allocated.
    CapacityOverflow(usize),
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionError::ConstructionFailed(reason) => {
                write!(f, "failed to seed hashing oracle: {reason}")
            }
            ConstructionError::InvalidLoadFactor(load_factor) => {
                write!(
                    f,
                    "load factor {load_factor} is outside the supported range [0.125, 0.9375]"
                )
            }
            ConstructionError::CapacityOverflow(items) => {
                write!(f, "cannot reserve room for {items} entries")
            }
        }
    }
}

impl core::error::Error for ConstructionError {}
