//! Conversion between symbolic types and host encodings.
//!
//! The host tags each data item with a flag word, an optional type id
//! (structure id or string type) and a size in bytes. [`TypeMapper::resolve`]
//! produces that triple from a [`SymbolicType`] and [`TypeMapper::dissolve`]
//! reverses it.
//!
//! Several encodings describe more than one size. The host has a single
//! packed-real class for both 10 and 12 byte floats, and a dword flag over
//! 12 bytes means three dwords. When the size is not one the class natively
//! describes, dissolving picks the largest native size that divides it and
//! returns an array of that element.

use std::collections::HashMap;

use hexlink_core::flags::{
    self, CHAR_REPR, FF_0CHAR, FF_0OFF, FF_ALIGN, FF_BYTE, FF_DOUBLE, FF_DWORD, FF_FLOAT,
    FF_OWORD, FF_PACKREAL, FF_QWORD, FF_SIGN, FF_STRLIT, FF_STRUCT, FF_TBYTE, FF_WORD,
    FF_YWORD, FF_ZWORD, MS_0TYPE, OFFSET_REPR, STRTYPE_C, STRTYPE_C_16, STRTYPE_C_32,
};
use hexlink_core::{Bitness, StructureSource, BADADDR};
use tracing::{debug, warn};

use crate::{Result, ScalarKind, SymbolicType, TypeError};

/// A host type encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Encoding {
    /// Host flag word.
    pub flag: u32,
    /// Structure id or string type, `BADADDR` when neither applies.
    pub type_id: u64,
    /// Total size in bytes.
    pub size: u32,
}

impl Encoding {
    pub fn new(flag: u32, type_id: u64, size: u32) -> Self {
        Self {
            flag,
            type_id,
            size,
        }
    }

    pub fn as_tuple(&self) -> (u32, u64, u32) {
        (self.flag, self.type_id, self.size)
    }
}

const INTEGERS: [(u32, u32); 7] = [
    (1, FF_BYTE),
    (2, FF_WORD),
    (4, FF_DWORD),
    (8, FF_QWORD),
    (10, FF_TBYTE),
    (16, FF_OWORD),
    (32, FF_YWORD),
];

const FLOATS: [(u32, u32); 4] = [
    (4, FF_FLOAT),
    (8, FF_DOUBLE),
    (10, FF_PACKREAL),
    (12, FF_PACKREAL),
];

const POINTERS: [(u32, u32); 3] = [(2, FF_WORD), (4, FF_DWORD), (8, FF_QWORD)];

const CHARACTERS: [(u32, u32); 3] = [(1, FF_BYTE), (2, FF_WORD), (4, FF_DWORD)];

const STRINGS: [(u32, u64); 3] = [(1, STRTYPE_C), (2, STRTYPE_C_16), (4, STRTYPE_C_32)];

/// Lookup tables between symbolic types and host encodings.
#[derive(Debug, Clone)]
pub struct TypeMapper {
    bitness: Bitness,
    defaults: HashMap<ScalarKind, u32>,
    encodings: HashMap<(ScalarKind, u32), (u32, u64)>,
    natives: HashMap<(ScalarKind, u32), Vec<u32>>,
}

impl TypeMapper {
    /// Creates the tables for a database of the given bitness.
    pub fn new(bitness: Bitness) -> Self {
        let mut encodings = HashMap::new();
        let mut natives: HashMap<(ScalarKind, u32), Vec<u32>> = HashMap::new();

        let sized = [
            (ScalarKind::Integer, &INTEGERS[..], 0),
            (ScalarKind::Float, &FLOATS[..], 0),
            (ScalarKind::Pointer, &POINTERS[..], OFFSET_REPR),
            (ScalarKind::Character, &CHARACTERS[..], CHAR_REPR),
        ];
        for (kind, table, repr) in sized {
            for &(size, class) in table {
                encodings.insert((kind, size), (flags::data_flag(class) | repr, BADADDR));
                natives.entry((kind, class)).or_default().push(size);
            }
        }
        for (width, strtype) in STRINGS {
            encodings.insert(
                (ScalarKind::String, width),
                (flags::data_flag(FF_STRLIT), strtype),
            );
        }
        for sizes in natives.values_mut() {
            sizes.sort_unstable();
        }

        Self {
            bitness,
            defaults: defaults_for(bitness),
            encodings,
            natives,
        }
    }

    /// Returns the bitness the defaults were derived from.
    pub fn bitness(&self) -> Bitness {
        self.bitness
    }

    /// Returns the size an unsized scalar of `kind` takes.
    pub fn default_size(&self, kind: ScalarKind) -> u32 {
        self.defaults.get(&kind).copied().unwrap_or(1)
    }

    /// Re-derives the default sizes after the database's bitness changes.
    ///
    /// Targets that are neither 32-bit nor 64-bit keep the current defaults.
    pub fn on_bitness_changed(&mut self, bitness: Option<Bitness>) {
        match bitness {
            Some(bitness) => {
                if bitness != self.bitness {
                    debug!(
                        from = self.bitness.bits(),
                        to = bitness.bits(),
                        "rebuilding default type sizes"
                    );
                }
                self.bitness = bitness;
                self.defaults = defaults_for(bitness);
            }
            None => debug!(
                bits = self.bitness.bits(),
                "keeping default type sizes for unsupported bitness"
            ),
        }
    }

    /// Converts a symbolic type into its host encoding.
    pub fn resolve(
        &self,
        ty: &SymbolicType,
        structures: &dyn StructureSource,
    ) -> Result<Encoding> {
        match ty {
            SymbolicType::Scalar { kind, size } => self.resolve_scalar(*kind, *size),
            SymbolicType::Array { element, count } => {
                let inner = self.resolve(element, structures)?;
                let size = inner.size.checked_mul(*count).ok_or(TypeError::Overflow {
                    count: *count,
                    size: inner.size,
                })?;
                Ok(Encoding { size, ..inner })
            }
            SymbolicType::StructureRef(id) => {
                let info = structures
                    .by_identifier(*id)
                    .ok_or(TypeError::UnknownStructure(*id))?;
                Ok(Encoding::new(flags::data_flag(FF_STRUCT), *id, info.size))
            }
        }
    }

    fn resolve_scalar(&self, kind: ScalarKind, size: Option<i32>) -> Result<Encoding> {
        let unknown = || TypeError::UnknownType(SymbolicType::Scalar { kind, size }.to_string());

        let size = match size {
            Some(size) => size,
            None => i32::try_from(self.default_size(kind)).map_err(|_| unknown())?,
        };
        let signed = size < 0;
        let width = size.unsigned_abs();
        if width == 0 || (signed && !kind.is_signable()) {
            return Err(unknown());
        }

        if kind == ScalarKind::Alignment {
            return Ok(Encoding::new(flags::data_flag(FF_ALIGN), BADADDR, width));
        }

        let (flag, type_id) = self
            .encodings
            .get(&(kind, width))
            .copied()
            .ok_or_else(unknown)?;
        let flag = if signed { flag | FF_SIGN } else { flag };
        Ok(Encoding::new(flag, type_id, width))
    }

    /// Converts a host encoding into a symbolic type.
    pub fn dissolve(
        &self,
        flag: u32,
        type_id: u64,
        size: u32,
        structures: &dyn StructureSource,
    ) -> Result<SymbolicType> {
        let class = flags::size_class(flag);
        match class {
            FF_STRUCT => self.dissolve_structure(flag, type_id, size, structures),
            FF_STRLIT => dissolve_string(flag, type_id, size),
            FF_ALIGN => i32::try_from(size)
                .map(|size| SymbolicType::scalar(ScalarKind::Alignment, size))
                .map_err(|_| TypeError::unknown_encoding(flag, type_id, size)),
            _ => {
                let kind = match flag & MS_0TYPE {
                    FF_0OFF => ScalarKind::Pointer,
                    FF_0CHAR => ScalarKind::Character,
                    _ => match class {
                        FF_FLOAT | FF_DOUBLE | FF_PACKREAL => ScalarKind::Float,
                        _ => ScalarKind::Integer,
                    },
                };
                self.dissolve_native(kind, flag, type_id, size)
            }
        }
    }

    fn dissolve_native(
        &self,
        kind: ScalarKind,
        flag: u32,
        type_id: u64,
        size: u32,
    ) -> Result<SymbolicType> {
        let class = flags::size_class(flag);
        let Some(sizes) = self.natives.get(&(kind, class)) else {
            warn!(
                flag = format_args!("{:#x}", flag),
                class = flags::size_class_name(class),
                kind = kind.name(),
                "unable to decode flag"
            );
            return Err(TypeError::unknown_encoding(flag, type_id, size));
        };

        let sign = if flags::is_signed(flag) && kind.is_signable() { -1 } else { 1 };
        let element = |width: u32| SymbolicType::scalar(kind, sign * width as i32);

        if sizes.contains(&size) {
            return Ok(element(size));
        }

        let width = sizes
            .iter()
            .rev()
            .find(|width| size % **width == 0)
            .or_else(|| sizes.first())
            .copied()
            .ok_or_else(|| TypeError::unknown_encoding(flag, type_id, size))?;
        let count = size / width;
        if count == 0 {
            return Err(TypeError::unknown_encoding(flag, type_id, size));
        }
        if size % width != 0 {
            debug!(size, width, count, "size is not a multiple of any native size");
        }
        Ok(SymbolicType::array(element(width), count))
    }

    fn dissolve_structure(
        &self,
        flag: u32,
        type_id: u64,
        size: u32,
        structures: &dyn StructureSource,
    ) -> Result<SymbolicType> {
        if type_id == BADADDR {
            return self.dissolve_native(ScalarKind::Integer, flags::data_flag(FF_BYTE), type_id, size);
        }

        let info = structures
            .by_identifier(type_id)
            .ok_or(TypeError::UnknownStructure(type_id))?;
        if info.size == 0 {
            return Ok(SymbolicType::StructureRef(type_id));
        }
        if size % info.size != 0 {
            return Err(TypeError::unknown_encoding(flag, type_id, size));
        }

        match size / info.size {
            count if count > 1 => Ok(SymbolicType::array(SymbolicType::StructureRef(type_id), count)),
            _ => Ok(SymbolicType::StructureRef(type_id)),
        }
    }

    /// Returns the size of one element of data with the given encoding.
    pub fn element_size(
        &self,
        flag: u32,
        type_id: u64,
        structures: &dyn StructureSource,
    ) -> Result<u32> {
        let size = match flags::size_class(flag) {
            FF_BYTE => 1,
            FF_WORD => 2,
            FF_DWORD | FF_FLOAT => 4,
            FF_QWORD | FF_DOUBLE => 8,
            FF_TBYTE | FF_PACKREAL => 10,
            FF_OWORD => 16,
            FF_YWORD => 32,
            FF_ZWORD => 64,
            FF_ALIGN => 1,
            FF_STRLIT => string_width(type_id)
                .ok_or_else(|| TypeError::unknown_encoding(flag, type_id, 0))?,
            FF_STRUCT if type_id == BADADDR => 1,
            FF_STRUCT => {
                structures
                    .by_identifier(type_id)
                    .ok_or(TypeError::UnknownStructure(type_id))?
                    .size
            }
            _ => return Err(TypeError::unknown_encoding(flag, type_id, 0)),
        };
        Ok(size)
    }
}

fn defaults_for(bitness: Bitness) -> HashMap<ScalarKind, u32> {
    let word = bitness.word_size();
    HashMap::from([
        (ScalarKind::Integer, word),
        (ScalarKind::Float, word),
        (ScalarKind::Pointer, word),
        (ScalarKind::Character, 1),
        (ScalarKind::String, 1),
        (ScalarKind::Alignment, 1),
    ])
}

fn string_width(type_id: u64) -> Option<u32> {
    match type_id & 0x3 {
        STRTYPE_C => Some(1),
        STRTYPE_C_16 => Some(2),
        STRTYPE_C_32 => Some(4),
        _ => None,
    }
}

fn dissolve_string(flag: u32, type_id: u64, size: u32) -> Result<SymbolicType> {
    let width = string_width(type_id)
        .filter(|width| size % width == 0)
        .ok_or_else(|| TypeError::unknown_encoding(flag, type_id, size))?;
    let unit = SymbolicType::scalar(ScalarKind::String, width as i32);
    match size / width {
        count if count > 1 => Ok(SymbolicType::array(unit, count)),
        _ => Ok(unit),
    }
}
