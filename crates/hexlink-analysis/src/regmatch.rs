//! Register matching against instructions.
//!
//! A [`RegisterMatcher`] answers "does the instruction at this address use
//! any of these registers", optionally restricted to the operands the
//! instruction reads or writes. A register matches if it is related to a
//! selected register, so selecting `eax` also matches instructions using
//! `al` or `rax`.

use std::collections::BTreeSet;

use hexlink_core::{Architecture, InstructionSource, RegisterId};

use crate::{AnalysisError, Result};

/// A register named or already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterSpec {
    Name(String),
    Id(RegisterId),
}

impl From<&str> for RegisterSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for RegisterSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<RegisterId> for RegisterSpec {
    fn from(id: RegisterId) -> Self {
        Self::Id(id)
    }
}

/// Which operands of an instruction are examined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessFilter {
    /// Examine operands the instruction reads.
    pub read: bool,
    /// Examine operands the instruction writes.
    pub write: bool,
}

impl AccessFilter {
    /// Examine every operand.
    pub fn any() -> Self {
        Self::default()
    }

    /// Examine only operands that are read.
    pub fn read() -> Self {
        Self {
            read: true,
            write: false,
        }
    }

    /// Examine only operands that are written.
    pub fn write() -> Self {
        Self {
            read: false,
            write: true,
        }
    }
}

/// Matches instructions that use any of a set of registers.
#[derive(Debug, Clone)]
pub struct RegisterMatcher<'a> {
    arch: &'a Architecture,
    registers: Vec<RegisterId>,
    filter: AccessFilter,
}

impl<'a> RegisterMatcher<'a> {
    /// Builds a matcher for `registers`.
    ///
    /// Names are resolved through `arch`. At least one register is required.
    pub fn build(
        arch: &'a Architecture,
        registers: &[RegisterSpec],
        filter: AccessFilter,
    ) -> Result<Self> {
        if registers.is_empty() {
            return Err(AnalysisError::InvalidArgument("no registers to match"));
        }

        let mut resolved = Vec::with_capacity(registers.len());
        for spec in registers {
            let id = match spec {
                RegisterSpec::Name(name) => arch.by_name(name)?.id(),
                RegisterSpec::Id(id) => arch
                    .get(*id)
                    .ok_or_else(|| hexlink_core::Error::UnknownRegister(format!("#{}", id.index())))?
                    .id(),
            };
            if !resolved.contains(&id) {
                resolved.push(id);
            }
        }

        Ok(Self {
            arch,
            registers: resolved,
            filter,
        })
    }

    /// Returns the selected registers.
    pub fn registers(&self) -> &[RegisterId] {
        &self.registers
    }

    /// Returns the operand indices examined at `address`.
    ///
    /// With both `read` and `write` set only the written operands are
    /// examined.
    pub fn operands(&self, source: &dyn InstructionSource, address: u64) -> Vec<usize> {
        let AccessFilter { read, write } = self.filter;
        let operands: BTreeSet<usize> = if write {
            source.operands_written(address).into_iter().collect()
        } else if read {
            source.operands_read(address).into_iter().collect()
        } else {
            return (0..source.operand_count(address)).collect();
        };
        operands.into_iter().collect()
    }

    /// Returns true if operand `index` at `address` uses a selected register.
    pub fn uses(&self, source: &dyn InstructionSource, address: u64, index: usize) -> bool {
        let Some(operand) = source.operand(address, index) else {
            return false;
        };
        operand.symbols().into_iter().any(|symbol| {
            self.arch.get(symbol).map_or(false, |reg| {
                self.registers.iter().any(|selected| {
                    self.arch
                        .get(*selected)
                        .map_or(false, |selected| reg.is_related_to(&selected))
                })
            })
        })
    }

    /// Returns true if the instruction at `address` uses a selected register
    /// in one of the examined operands.
    pub fn matches(&self, source: &dyn InstructionSource, address: u64) -> bool {
        self.operands(source, address)
            .into_iter()
            .any(|index| self.uses(source, address, index))
    }
}
