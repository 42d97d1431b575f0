//! Error types for analysis queries.

use hexlink_core::Bounds;
use thiserror::Error;

/// Error type for analysis queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// A query was built from unusable arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A register lookup failed.
    #[error(transparent)]
    Register(#[from] hexlink_core::Error),

    /// A switch case number outside the switch's cases.
    #[error("case {case:#x} is out of bounds ({low:#x}<>{high:#x})")]
    OutOfRange { case: i64, low: i64, high: i64 },

    /// A switch table refers past its own end.
    #[error("entry {index} of the table at {address:#x} is past its {len} entries")]
    MalformedTable { address: u64, index: u64, len: usize },

    /// The host could not read a table.
    #[error("unable to read {count} elements at {address:#x}")]
    HostRead { address: u64, count: usize },

    /// The invalid address marker was passed as an address.
    #[error("an invalid address ({0:#x}) was specified")]
    InvalidAddress(u64),

    /// An address outside the database.
    #[error("address {address:#x} is not within the bounds of the database ({bounds})")]
    OutOfBounds { address: u64, bounds: Bounds },

    /// An address range that leaves the database.
    #[error("range {start:#x}<>{end:#x} is not within the bounds of the database ({bounds})")]
    RangeOutOfBounds { start: u64, end: u64, bounds: Bounds },

    /// An address that is not the head of its item.
    #[error("address {address:#x} is not aligned to the beginning of its item at {head:#x}")]
    Misaligned { address: u64, head: u64 },
}

impl AnalysisError {
    /// Creates a new OutOfRange error.
    pub fn out_of_range(case: i64, low: i64, high: i64) -> Self {
        Self::OutOfRange { case, low, high }
    }
}

/// Result type for analysis queries.
pub type Result<T> = std::result::Result<T, AnalysisError>;
