//! Ordered address pairs.

use std::fmt;

use crate::{Error, Result};

/// An ordered `(left, right)` pair with `left <= right`.
///
/// Used for address ranges and for the case range of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    left: u64,
    right: u64,
}

impl Bounds {
    /// Creates a new pair, rejecting a left side past the right side.
    pub fn new(left: u64, right: u64) -> Result<Self> {
        if left > right {
            return Err(Error::InvalidBounds { left, right });
        }
        Ok(Self { left, right })
    }

    /// Creates a pair from two points in either order.
    pub fn spanning(a: u64, b: u64) -> Self {
        Self {
            left: a.min(b),
            right: a.max(b),
        }
    }

    pub fn left(&self) -> u64 {
        self.left
    }

    pub fn right(&self) -> u64 {
        self.right
    }

    /// Returns the distance between both sides.
    pub fn size(&self) -> u64 {
        self.right - self.left
    }

    /// Returns true if `address` lies in `[left, right)`.
    pub fn contains(&self, address: u64) -> bool {
        self.left <= address && address < self.right
    }

    /// Returns true if the whole of `other` lies within `self`.
    pub fn encloses(&self, other: &Bounds) -> bool {
        self.left <= other.left && other.right <= self.right
    }

    /// Returns the pair as a tuple.
    pub fn as_tuple(&self) -> (u64, u64) {
        (self.left, self.right)
    }
}

impl TryFrom<(u64, u64)> for Bounds {
    type Error = Error;

    fn try_from((left, right): (u64, u64)) -> Result<Self> {
        Self::new(left, right)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}<>{:#x}", self.left, self.right)
    }
}
