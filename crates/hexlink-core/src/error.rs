//! Error types for hexlink-core.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No entry of the reference table has exactly the requested permissions.
    #[error("no reference type matches the state {0:?}")]
    UnknownReferenceState(String),

    /// A register name has no definition in the architecture.
    #[error("unknown register {0:?}")]
    UnknownRegister(String),

    /// A host register index is outside the processor's register table.
    #[error("register index {0} is not known to the processor")]
    UnknownRegisterIndex(u16),

    /// No register is cached for a host register name and dtype.
    #[error("no register is defined for {name:?} with dtype {dtype:?}")]
    UnknownRegisterView { name: String, dtype: crate::Dtype },

    /// A register with this name is already defined.
    #[error("register {0:?} is already defined")]
    RegisterExists(String),

    /// A child register does not fit inside its parent.
    #[error("register {name:?} at bit {offset} with {bits} bits exceeds its {parent_bits}-bit parent")]
    RegisterOutOfBounds {
        name: String,
        offset: u32,
        bits: u32,
        parent_bits: u32,
    },

    /// A child register overlaps one of its siblings.
    #[error("register {name:?} overlaps its sibling {sibling:?}")]
    RegisterOverlap { name: String, sibling: String },

    /// There is no host dtype for a register of this width.
    #[error("no dtype describes a {0}-byte register")]
    UnsupportedRegisterSize(u32),

    /// A promotion or demotion ran off the end of the register family.
    #[error("unable to {direction} register {register}{}", size_suffix(.size))]
    NotFound {
        direction: &'static str,
        register: String,
        size: Option<u32>,
    },

    /// A bounds pair whose left side is past its right side.
    #[error("invalid bounds {left:#x}<>{right:#x}")]
    InvalidBounds { left: u64, right: u64 },
}

impl Error {
    /// Creates a new RegisterOutOfBounds error.
    pub fn out_of_bounds(name: impl Into<String>, offset: u32, bits: u32, parent_bits: u32) -> Self {
        Self::RegisterOutOfBounds {
            name: name.into(),
            offset,
            bits,
            parent_bits,
        }
    }

    /// Creates a new NotFound error.
    pub fn not_found(direction: &'static str, register: impl Into<String>, size: Option<u32>) -> Self {
        Self::NotFound {
            direction,
            register: register.into(),
            size,
        }
    }
}

fn size_suffix(size: &Option<u32>) -> String {
    match size {
        Some(bits) => format!(" to {bits} bits"),
        None => String::new(),
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
