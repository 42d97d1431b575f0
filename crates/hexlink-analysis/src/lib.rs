//! # hexlink-analysis
//!
//! Queries layered on the host capabilities and the register model:
//!
//! - [`RegisterMatcher`]: does an instruction read or write one of a set of registers
//! - [`SwitchDescriptor`]: case numbers and handlers of a host switch table
//! - [`AddressValidator`]: bounds checks and item-head alignment of addresses

pub mod address;
pub mod error;
pub mod regmatch;
pub mod switch;

pub use address::{AddressValidator, AlignmentPolicy};
pub use error::{AnalysisError, Result};
pub use regmatch::{AccessFilter, RegisterMatcher, RegisterSpec};
pub use switch::{RawSwitch, SwitchDescriptor};
