//! Capabilities the host disassembler provides.
//!
//! The translation layer never talks to the host directly; every query it
//! needs goes through one of these narrow traits so the rest of the toolkit
//! (or a test) can stand in for the host.

use crate::{Bitness, Bounds, Operand};

/// The host's processor module.
pub trait Processor {
    /// Returns the processor's register name table, indexed by host register number.
    fn register_names(&self) -> &[String];

    /// Returns the name of the register with the given host index.
    fn register_name(&self, index: u16) -> Option<&str> {
        self.register_names()
            .get(usize::from(index))
            .map(String::as_str)
    }

    /// Returns the host index of a register name.
    fn register_index(&self, name: &str) -> Option<u16> {
        self.register_names()
            .iter()
            .position(|n| n == name)
            .and_then(|i| u16::try_from(i).ok())
    }
}

/// Information about the database's current target.
pub trait TargetInfo {
    /// Returns the name of the active processor module.
    fn processor_name(&self) -> String;

    /// Returns the target bitness, or `None` for targets that are neither
    /// 32-bit nor 64-bit.
    fn bitness(&self) -> Option<Bitness>;
}

/// A structure (aggregate type) known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructureInfo {
    /// The structure's identifier.
    pub id: u64,
    /// The structure's name.
    pub name: String,
    /// Size of the structure in bytes.
    pub size: u32,
}

/// Lookup of structures by identifier.
pub trait StructureSource {
    /// Returns the structure with the given identifier.
    fn by_identifier(&self, id: u64) -> Option<StructureInfo>;
}

/// Typed reads from the database.
pub trait MemorySource {
    /// Reads `count` elements of the array defined at `address`.
    ///
    /// The element width is whatever type the host has applied at the
    /// address. Returns `None` if the read is not possible.
    fn read_array(&self, address: u64, count: usize) -> Option<Vec<u64>>;
}

/// Per-instruction operand queries.
pub trait InstructionSource {
    /// Returns the number of operands of the instruction at `address`.
    fn operand_count(&self, address: u64) -> usize;

    /// Returns the indices of the operands that are read.
    fn operands_read(&self, address: u64) -> Vec<usize>;

    /// Returns the indices of the operands that are written.
    fn operands_written(&self, address: u64) -> Vec<usize>;

    /// Decodes an operand into its symbolic form.
    fn operand(&self, address: u64, index: usize) -> Option<Operand>;

    /// Returns true if the instruction at `address` is an unconditional jump.
    fn is_unconditional_jump(&self, address: u64) -> bool;
}

/// The database's address space.
pub trait Database {
    /// Returns the `[min, max)` bounds of the database.
    fn bounds(&self) -> Bounds;

    /// Returns the address of the head of the item containing `address`.
    fn item_head(&self, address: u64) -> u64;
}
