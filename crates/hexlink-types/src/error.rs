//! Error types for type translation.

use thiserror::Error;

/// Error type for type translation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// The symbolic type has no host encoding.
    #[error("no host encoding for type {0}")]
    UnknownType(String),

    /// The host encoding has no symbolic form.
    #[error("unable to decode flag {flag:#x} (type id {type_id:#x}, size {size})")]
    UnknownEncoding { flag: u32, type_id: u64, size: u32 },

    /// A structure identifier the host does not know.
    #[error("unknown structure {0:#x}")]
    UnknownStructure(u64),

    /// An array whose total size does not fit the host's size field.
    #[error("array of {count} elements of {size} bytes overflows")]
    Overflow { count: u32, size: u32 },
}

impl TypeError {
    /// Creates a new UnknownEncoding error.
    pub fn unknown_encoding(flag: u32, type_id: u64, size: u32) -> Self {
        Self::UnknownEncoding {
            flag,
            type_id,
            size,
        }
    }
}

/// Result type for type translation.
pub type Result<T> = std::result::Result<T, TypeError>;
