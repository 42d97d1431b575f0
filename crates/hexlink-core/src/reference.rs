//! Cross-reference classification.
//!
//! The host describes every cross-reference with a small numeric code
//! (near call, far jump, data read, offset, ...). This module folds those
//! codes into a permission set borrowed from POSIX file modes: `r` for
//! read, `w` for write and `x` for execute. Offsets are marked with `&` so
//! they are never confused with a plain data read, and the reserved
//! wildcard code is `*`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::{Error, Result};

/// Code reserved for the wildcard reference. The host never emits it.
pub const WILDCARD_CODE: u8 = 31;

/// Host reference codes.
pub mod code {
    pub const DATA_UNKNOWN: u8 = 0;
    pub const DATA_OFFSET: u8 = 1;
    pub const DATA_WRITE: u8 = 2;
    pub const DATA_READ: u8 = 3;
    pub const DATA_TEXT: u8 = 4;
    pub const DATA_INFORMATIONAL: u8 = 5;
    pub const CODE_FAR_CALL: u8 = 16;
    pub const CODE_NEAR_CALL: u8 = 17;
    pub const CODE_FAR_JUMP: u8 = 18;
    pub const CODE_NEAR_JUMP: u8 = 19;
    pub const CODE_USER: u8 = 20;
    pub const ORDINARY_FLOW: u8 = 21;
}

bitflags! {
    /// Permission set describing what a reference does to its target.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ReferenceKind: u8 {
        const READ = 0b0_0001;
        const WRITE = 0b0_0010;
        const EXECUTE = 0b0_0100;
        const OFFSET = 0b0_1000;
        const WILDCARD = 0b1_0000;
    }
}

// Sorted by letter so that display is the sorted concatenation.
const LETTERS: [(char, ReferenceKind); 5] = [
    ('&', ReferenceKind::OFFSET),
    ('*', ReferenceKind::WILDCARD),
    ('r', ReferenceKind::READ),
    ('w', ReferenceKind::WRITE),
    ('x', ReferenceKind::EXECUTE),
];

impl ReferenceKind {
    /// Returns true if the reference reads its target.
    pub fn is_read(&self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns true if the reference writes its target.
    pub fn is_write(&self) -> bool {
        self.contains(Self::WRITE)
    }

    /// Returns true if the reference transfers execution to its target.
    pub fn is_execute(&self) -> bool {
        self.contains(Self::EXECUTE)
    }

    /// Returns true if the reference takes the address of its target.
    pub fn is_offset(&self) -> bool {
        self.contains(Self::OFFSET)
    }

    /// Returns true if the letter is a member of the set.
    pub fn has(&self, letter: char) -> bool {
        LETTERS
            .iter()
            .any(|(l, kind)| *l == letter && self.contains(*kind))
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (letter, kind) in LETTERS {
            if self.contains(kind) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for ReferenceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.chars().try_fold(Self::empty(), |acc, ch| {
            LETTERS
                .iter()
                .find(|(letter, _)| *letter == ch)
                .map(|(_, kind)| acc | *kind)
                .ok_or_else(|| Error::UnknownReferenceState(s.to_string()))
        })
    }
}

/// Mapping between host reference codes and reference kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTable {
    entries: BTreeMap<u8, ReferenceKind>,
}

impl ReferenceTable {
    /// The table used by current hosts.
    pub fn modern() -> Self {
        let rx = ReferenceKind::READ | ReferenceKind::EXECUTE;
        let offset = ReferenceKind::OFFSET | ReferenceKind::READ;
        Self::from_entries([
            (code::CODE_FAR_CALL, rx),
            (code::CODE_NEAR_CALL, rx),
            (code::CODE_FAR_JUMP, rx),
            (code::CODE_NEAR_JUMP, rx),
            (code::ORDINARY_FLOW, rx),
            (code::DATA_OFFSET, offset),
            (code::DATA_INFORMATIONAL, offset),
            (code::DATA_READ, ReferenceKind::READ),
            (code::DATA_WRITE, ReferenceKind::WRITE),
        ])
    }

    /// The table used by hosts older than API version 7.0, which only
    /// classified data references.
    pub fn legacy() -> Self {
        Self::from_entries([
            (code::DATA_OFFSET, ReferenceKind::OFFSET | ReferenceKind::READ),
            (code::DATA_WRITE, ReferenceKind::WRITE),
            (code::DATA_READ, ReferenceKind::READ),
        ])
    }

    /// Selects the table for a host API version.
    pub fn for_version(major: u32, minor: u32) -> Self {
        if (major, minor) < (7, 0) {
            Self::legacy()
        } else {
            Self::modern()
        }
    }

    fn from_entries(entries: impl IntoIterator<Item = (u8, ReferenceKind)>) -> Self {
        let mut entries: BTreeMap<u8, ReferenceKind> = entries.into_iter().collect();
        entries.insert(WILDCARD_CODE, ReferenceKind::WILDCARD);
        Self { entries }
    }

    /// Converts a host reference code into a reference kind.
    ///
    /// Unknown codes map to the empty set.
    pub fn kind_of(&self, code: u8) -> ReferenceKind {
        self.entries.get(&code).copied().unwrap_or_default()
    }

    /// Converts a reference kind back into a host reference code.
    ///
    /// The lowest code whose set equals `kind` exactly wins.
    pub fn code_of(&self, kind: ReferenceKind) -> Result<u8> {
        if kind == ReferenceKind::WILDCARD {
            return Ok(WILDCARD_CODE);
        }
        self.entries
            .iter()
            .find(|(_, k)| **k == kind)
            .map(|(code, _)| *code)
            .ok_or_else(|| Error::UnknownReferenceState(kind.to_string()))
    }

    /// Iterates over every `(code, kind)` pair in code order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, ReferenceKind)> + '_ {
        self.entries.iter().map(|(c, k)| (*c, *k))
    }
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::modern()
    }
}

/// A reference from an address, optionally through one of its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperandReference {
    /// Address the reference originates from.
    pub address: u64,
    /// Operand number, when the host attributes the reference to one.
    pub operand: Option<usize>,
    /// What the reference does.
    pub kind: ReferenceKind,
}

impl OperandReference {
    pub fn new(address: u64, operand: Option<usize>, kind: ReferenceKind) -> Self {
        Self {
            address,
            operand,
            kind,
        }
    }
}

impl fmt::Display for OperandReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(op) => write!(f, "{:#x}:{} {}", self.address, op, self.kind),
            None => write!(f, "{:#x} {}", self.address, self.kind),
        }
    }
}
