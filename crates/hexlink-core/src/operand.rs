//! Symbolic instruction operands.

use crate::RegisterId;

/// A decoded instruction operand whose registers have been resolved
/// against an architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// Register operand.
    Register(RegisterId),
    /// Immediate value.
    Immediate(u64),
    /// Direct reference to an address (branch target, absolute memory).
    Address(u64),
    /// Memory reference.
    Memory(MemoryRef),
}

/// Memory reference operand.
///
/// Represents addressing like `[base + index*scale + displacement]`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryRef {
    /// Base register (if any).
    pub base: Option<RegisterId>,
    /// Index register (if any).
    pub index: Option<RegisterId>,
    /// Scale factor for index (1, 2, 4, or 8).
    pub scale: u8,
    /// Displacement/offset.
    pub displacement: i64,
}

impl MemoryRef {
    /// Creates a memory reference with base and displacement.
    pub fn base_disp(base: RegisterId, displacement: i64) -> Self {
        Self {
            base: Some(base),
            index: None,
            scale: 1,
            displacement,
        }
    }

    /// Creates a full SIB-style memory reference.
    pub fn sib(
        base: Option<RegisterId>,
        index: Option<RegisterId>,
        scale: u8,
        displacement: i64,
    ) -> Self {
        Self {
            base,
            index,
            scale,
            displacement,
        }
    }
}

impl Operand {
    /// Returns every register the operand mentions.
    pub fn symbols(&self) -> Vec<RegisterId> {
        match self {
            Self::Register(reg) => vec![*reg],
            Self::Memory(mem) => mem.base.into_iter().chain(mem.index).collect(),
            Self::Immediate(_) | Self::Address(_) => Vec::new(),
        }
    }

    /// Returns true if the operand mentions any register.
    pub fn is_symbolic(&self) -> bool {
        !self.symbols().is_empty()
    }

    /// Returns the address for an address operand.
    pub fn address(&self) -> Option<u64> {
        match self {
            Self::Address(ea) => Some(*ea),
            _ => None,
        }
    }
}
