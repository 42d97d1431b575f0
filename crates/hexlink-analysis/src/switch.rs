//! Switch tables.
//!
//! The host recognizes compiled `switch` statements and records them in a
//! descriptor. A direct switch has a branch table with one handler per
//! case. An indirect switch adds an index table: the case number selects an
//! entry in the index table, which selects the handler in the (usually
//! smaller) branch table.

use std::fmt;
use std::ops::Range;

use hexlink_core::{Architecture, Dtype, InstructionSource, MemorySource, Operand, Processor, Register};

use crate::{AnalysisError, Result};

/// A switch descriptor exactly as the host stores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSwitch {
    /// Address of the instruction that starts the switch.
    pub startea: u64,
    /// Address of the branch table.
    pub jumps: u64,
    /// Address of the index table for indirect switches.
    pub lowcase: u64,
    /// Address of the default handler.
    pub defjump: u64,
    /// Number of cases.
    pub ncases: u32,
    /// Number of branch table entries for indirect switches.
    pub jcases: u32,
    /// Host index of the switch register, negative when unknown.
    pub regnum: i32,
    /// Host dtype of the switch register.
    pub regdtyp: u8,
    /// Lowest case number of an indirect switch.
    pub ind_lowcase: i64,
    /// The switch uses an index table.
    pub indirect: bool,
    /// The switch subtracts the lowest case from its input.
    pub subtract: bool,
}

/// A read-only view of a host switch descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchDescriptor {
    raw: RawSwitch,
}

impl SwitchDescriptor {
    pub fn new(raw: RawSwitch) -> Self {
        Self { raw }
    }

    /// Returns the underlying descriptor.
    pub fn raw(&self) -> &RawSwitch {
        &self.raw
    }

    /// Address of the instruction that starts the switch.
    pub fn ea(&self) -> u64 {
        self.raw.startea
    }

    /// Address of the default handler.
    pub fn default(&self) -> u64 {
        self.raw.defjump
    }

    /// Address of the branch table.
    pub fn branch_ea(&self) -> u64 {
        self.raw.jumps
    }

    /// Address of the index table. Only meaningful for indirect switches.
    pub fn table_ea(&self) -> u64 {
        self.raw.lowcase
    }

    pub fn is_indirect(&self) -> bool {
        self.raw.indirect
    }

    pub fn is_subtract(&self) -> bool {
        self.raw.subtract
    }

    /// Lowest case number.
    pub fn base(&self) -> i64 {
        if self.raw.indirect {
            self.raw.ind_lowcase
        } else {
            0
        }
    }

    /// Number of cases.
    pub fn count(&self) -> u32 {
        self.raw.ncases
    }

    /// Every case number of the switch.
    ///
    /// The end saturates at `i64::MAX`, so a switch whose cases reach
    /// `i64::MAX` reports one case fewer here than [`count`](Self::count).
    pub fn range(&self) -> Range<i64> {
        self.base()..self.base().saturating_add(i64::from(self.count()))
    }

    pub fn len(&self) -> usize {
        self.raw.ncases as usize
    }

    pub fn is_empty(&self) -> bool {
        self.raw.ncases == 0
    }

    /// Reads the branch table.
    pub fn branch_table(&self, memory: &dyn MemorySource) -> Result<Vec<u64>> {
        let count = if self.raw.indirect {
            self.raw.jcases
        } else {
            self.raw.ncases
        };
        read(memory, self.raw.jumps, count as usize)
    }

    /// Reads the index table. Direct switches have none.
    pub fn index_table(&self, memory: &dyn MemorySource) -> Result<Vec<u64>> {
        if self.raw.indirect {
            read(memory, self.raw.lowcase, self.raw.ncases as usize)
        } else {
            Ok(Vec::new())
        }
    }

    /// Returns the address handling `case`.
    pub fn case_handler(&self, memory: &dyn MemorySource, case: i64) -> Result<u64> {
        self.check_case(case)?;
        let branch = self.branch_table(memory)?;
        let index = self.index_table(memory)?;
        self.lookup(&branch, &index, case)
    }

    /// Returns the address handling every case, in case order.
    pub fn handlers(&self, memory: &dyn MemorySource) -> Result<Vec<(i64, u64)>> {
        let branch = self.branch_table(memory)?;
        let index = self.index_table(memory)?;
        let base = self.base();
        (0..i64::from(self.count()))
            .map_while(|offset| base.checked_add(offset))
            .map(|case| Ok((case, self.lookup(&branch, &index, case)?)))
            .collect()
    }

    /// Returns the cases handled by `address`.
    pub fn handlers_for(&self, memory: &dyn MemorySource, address: u64) -> Result<Vec<i64>> {
        Ok(self
            .handlers(memory)?
            .into_iter()
            .filter(|(_, handler)| *handler == address)
            .map(|(case, _)| case)
            .collect())
    }

    /// Returns the cases that do not go to the default handler, either
    /// directly or through an unconditional jump to it.
    pub fn non_default_cases(
        &self,
        memory: &dyn MemorySource,
        instructions: &dyn InstructionSource,
    ) -> Result<Vec<i64>> {
        let default = self.default();
        let is_default = |handler: u64| {
            handler == default
                || (instructions.is_unconditional_jump(handler)
                    && instructions.operand(handler, 0) == Some(Operand::Address(default)))
        };
        Ok(self
            .handlers(memory)?
            .into_iter()
            .filter(|(_, handler)| !is_default(*handler))
            .map(|(case, _)| case)
            .collect())
    }

    /// Returns the register the switch is based on, if the host recorded one.
    pub fn register<'a>(
        &self,
        arch: &'a Architecture,
        processor: &dyn Processor,
    ) -> Result<Option<Register<'a>>> {
        let Ok(index) = u16::try_from(self.raw.regnum) else {
            return Ok(None);
        };
        let dtype = Dtype::from_raw(self.raw.regdtyp)
            .ok_or(AnalysisError::InvalidArgument("unknown switch register dtype"))?;
        Ok(Some(arch.by_index_and_dtype(processor, index, dtype)?))
    }

    /// Returns the position of `case` among the cases.
    fn check_case(&self, case: i64) -> Result<u64> {
        let base = self.base();
        let offset = i128::from(case) - i128::from(base);
        if offset < 0 || offset >= i128::from(self.count()) {
            let high = base
                .saturating_add(i64::from(self.count()))
                .saturating_sub(1);
            return Err(AnalysisError::out_of_range(case, base, high));
        }
        Ok(offset as u64)
    }

    fn lookup(&self, branch: &[u64], index: &[u64], case: i64) -> Result<u64> {
        let mut slot = self.check_case(case)?;
        if self.raw.indirect {
            slot = *index
                .get(slot as usize)
                .ok_or(AnalysisError::MalformedTable {
                    address: self.raw.lowcase,
                    index: slot,
                    len: index.len(),
                })?;
        }
        branch
            .get(slot as usize)
            .copied()
            .ok_or(AnalysisError::MalformedTable {
                address: self.raw.jumps,
                index: slot,
                len: branch.len(),
            })
    }
}

fn read(memory: &dyn MemorySource, address: u64, count: usize) -> Result<Vec<u64>> {
    memory
        .read_array(address, count)
        .ok_or(AnalysisError::HostRead { address, count })
}

impl fmt::Display for SwitchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<switch{{{}}} at {:#x}> default:*{:#x}",
            self.count(),
            self.ea(),
            self.default()
        )?;
        if self.raw.indirect {
            write!(
                f,
                " branch[{}]:*{:#x} index[{}]:*{:#x}",
                self.raw.jcases, self.raw.jumps, self.raw.ncases, self.raw.lowcase
            )?;
        } else {
            write!(f, " branch[{}]:*{:#x}", self.raw.ncases, self.raw.jumps)?;
        }
        if self.raw.regnum >= 0 {
            write!(f, " register:#{}", self.raw.regnum)?;
        }
        Ok(())
    }
}
