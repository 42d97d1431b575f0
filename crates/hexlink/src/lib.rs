//! # hexlink
//!
//! Translation layer between a disassembler's scripting API and a symbolic
//! model of its types, registers, cross-references and lifecycle events.
//!
//! The individual pieces live in their own crates and are re-exported here:
//!
//! - [`hexlink_core`]: host encodings, register families and reference kinds
//! - [`types`]: symbolic types and their host flag encodings
//! - [`hooks`]: priority-ordered dispatch of host events
//! - [`analysis`]: register matching, switch tables and address validation
//!
//! [`Interface`] ties them together for one database: it owns the event
//! dispatcher, the type tables and the register model of the current
//! processor, and rebuilds the latter two whenever the host switches
//! processors.
//!
//! ## Example
//!
//! ```ignore
//! use hexlink::{Interface, InterfaceConfig};
//!
//! let config = InterfaceConfig::from_path("hexlink.json")?;
//! let interface = Interface::new(host_hooks, target, config)?;
//! let arch = interface.architecture().expect("known processor");
//! println!("{}", arch.by_name("eax")?);
//! ```

pub mod config;
pub mod error;
pub mod session;

pub use hexlink_core;

pub use hexlink_analysis as analysis;
pub use hexlink_hooks as hooks;
pub use hexlink_types as types;

pub use hexlink_core::{
    builtin, Architecture, Bitness, Bounds, Dtype, ReferenceKind, ReferenceTable, Register,
    RegisterId,
};

pub use config::{ArchitectureSpec, HostVersion, InterfaceConfig, RegisterNode};
pub use error::{ConfigError, Error, Result};
pub use session::{Interface, NEW_PROCESSOR_EVENT, REBUILD_PRIORITY};
