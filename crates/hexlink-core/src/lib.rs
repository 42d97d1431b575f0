//! # hexlink-core
//!
//! Core abstractions for the hexlink translation layer. This crate defines
//! the host disassembler's raw encodings (flags, dtypes, reference codes),
//! the capability traits through which the host is reached, and the
//! symbolic models built on top of them: register hierarchies, reference
//! kinds and operands.

pub mod arch;
pub mod bounds;
pub mod builtin;
pub mod error;
pub mod flags;
pub mod host;
pub mod operand;
pub mod reference;
pub mod register;

pub use arch::{Bitness, Dtype};
pub use bounds::Bounds;
pub use error::{Error, Result};
pub use flags::BADADDR;
pub use host::{
    Database, InstructionSource, MemorySource, Processor, StructureInfo, StructureSource,
    TargetInfo,
};
pub use operand::Operand;
pub use reference::{OperandReference, ReferenceKind, ReferenceTable, WILDCARD_CODE};
pub use register::{Architecture, Register, RegisterDef, RegisterId};
