//! Address validation.
//!
//! Scripting APIs accept arbitrary addresses. Before one reaches the host
//! it is checked against the database bounds, and addresses pointing into
//! the middle of an item (an instruction or a data item) are moved back to
//! the item's first byte.

use std::cmp::Ordering;

use hexlink_core::{Bounds, Database, BADADDR};
use tracing::{debug, warn};

use crate::{AnalysisError, Result};

/// What to do with an address that is not the head of its item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlignmentPolicy {
    /// Move it to the head and log a warning.
    #[default]
    Correct,
    /// Move it to the head and log at debug level.
    CorrectSilently,
    /// Fail with [`AnalysisError::Misaligned`].
    Reject,
}

/// Validates addresses against a database.
pub struct AddressValidator<'a> {
    database: &'a dyn Database,
    policy: AlignmentPolicy,
}

impl<'a> AddressValidator<'a> {
    pub fn new(database: &'a dyn Database) -> Self {
        Self {
            database,
            policy: AlignmentPolicy::default(),
        }
    }

    /// Sets the alignment policy.
    pub fn with_policy(mut self, policy: AlignmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> AlignmentPolicy {
        self.policy
    }

    /// Returns the database bounds.
    pub fn bounds(&self) -> Bounds {
        self.database.bounds()
    }

    /// Returns true if `address` is inside the database.
    pub fn contains(&self, address: u64) -> bool {
        self.bounds().contains(address)
    }

    /// Moves `address` to the head of its item.
    pub fn align_to_item_head(&self, address: u64) -> Result<u64> {
        self.align(address, self.policy)
    }

    /// Moves both ends of a range to the heads of their items.
    ///
    /// An end equal to the database's upper bound is already aligned.
    pub fn align_range(&self, start: u64, end: u64) -> Result<(u64, u64)> {
        self.align_pair(start, end, self.policy)
    }

    /// Checks that `address` is a valid address inside the database.
    pub fn ensure_within_database(&self, address: u64) -> Result<u64> {
        if address == BADADDR {
            return Err(AnalysisError::InvalidAddress(address));
        }
        let bounds = self.bounds();
        if !bounds.contains(address) {
            return Err(AnalysisError::OutOfBounds { address, bounds });
        }
        Ok(address)
    }

    /// Checks that the half-open range `[start, end)` is inside the database.
    ///
    /// An empty range is accepted when `start` is inside the database.
    pub fn validate_range(&self, start: u64, end: u64) -> Result<(u64, u64)> {
        if start == BADADDR {
            return Err(AnalysisError::InvalidAddress(start));
        }
        let bounds = self.bounds();
        let inside = match end.cmp(&start) {
            Ordering::Less => false,
            Ordering::Equal => bounds.contains(start),
            Ordering::Greater => bounds.contains(start) && bounds.contains(end - 1),
        };
        if !inside {
            return Err(AnalysisError::RangeOutOfBounds { start, end, bounds });
        }
        Ok((start, end))
    }

    /// Validates `address` and moves it to the head of its item.
    ///
    /// The correction is logged at debug level unless the policy rejects
    /// misaligned addresses.
    pub fn inside(&self, address: u64) -> Result<u64> {
        let address = self.ensure_within_database(address)?;
        self.align(address, self.quiet_policy())
    }

    /// Validates a range and moves both ends to the heads of their items.
    pub fn inside_range(&self, start: u64, end: u64) -> Result<(u64, u64)> {
        let (start, end) = self.validate_range(start, end)?;
        self.align_pair(start, end, self.quiet_policy())
    }

    fn quiet_policy(&self) -> AlignmentPolicy {
        match self.policy {
            AlignmentPolicy::Reject => AlignmentPolicy::Reject,
            _ => AlignmentPolicy::CorrectSilently,
        }
    }

    fn align_pair(&self, start: u64, end: u64, policy: AlignmentPolicy) -> Result<(u64, u64)> {
        let start = self.align(start, policy)?;
        let end = if end == self.bounds().right() {
            end
        } else {
            self.align(end, policy)?
        };
        Ok((start, end))
    }

    fn align(&self, address: u64, policy: AlignmentPolicy) -> Result<u64> {
        let head = self.database.item_head(address);
        if head == address {
            return Ok(address);
        }

        match policy {
            AlignmentPolicy::Correct => warn!(
                address = format_args!("{:#x}", address),
                head = format_args!("{:#x}", head),
                "address is not aligned to the beginning of an item, using the item head"
            ),
            AlignmentPolicy::CorrectSilently => debug!(
                address = format_args!("{:#x}", address),
                head = format_args!("{:#x}", head),
                "address is not aligned to the beginning of an item, using the item head"
            ),
            AlignmentPolicy::Reject => return Err(AnalysisError::Misaligned { address, head }),
        }
        Ok(head)
    }
}
