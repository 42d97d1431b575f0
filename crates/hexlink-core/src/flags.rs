//! Host flag encoding.
//!
//! The host describes the data at an address with a packed 32-bit flag
//! word: the top nibble selects the size class, the next byte selects the
//! operand representation (number, character, offset, ...) and a handful
//! of low bits carry state such as signedness. These constants mirror the
//! host's values so flags can be passed through unchanged.

/// Invalid address marker, also used as the "no type id" marker.
pub const BADADDR: u64 = u64::MAX;

/// Selects the size class (`DT_TYPE`).
pub const MASK_SIZE: u32 = 0xf000_0000;
/// Selects the size class together with both operand representations.
pub const MASK_REPR: u32 = 0xfff0_0000;
/// Selects the first operand's representation.
pub const MS_0TYPE: u32 = 0x00f0_0000;
/// Selects the second operand's representation.
pub const MS_1TYPE: u32 = 0x0f00_0000;

/// The item is data.
pub const FF_DATA: u32 = 0x0000_0400;
/// The item is code.
pub const FF_CODE: u32 = 0x0000_0600;
/// Values are displayed as signed.
pub const FF_SIGN: u32 = 0x0002_0000;

// Size classes
pub const FF_BYTE: u32 = 0x0000_0000;
pub const FF_WORD: u32 = 0x1000_0000;
pub const FF_DWORD: u32 = 0x2000_0000;
pub const FF_QWORD: u32 = 0x3000_0000;
pub const FF_TBYTE: u32 = 0x4000_0000;
pub const FF_STRLIT: u32 = 0x5000_0000;
pub const FF_STRUCT: u32 = 0x6000_0000;
pub const FF_OWORD: u32 = 0x7000_0000;
pub const FF_FLOAT: u32 = 0x8000_0000;
pub const FF_DOUBLE: u32 = 0x9000_0000;
pub const FF_PACKREAL: u32 = 0xa000_0000;
pub const FF_ALIGN: u32 = 0xb000_0000;
pub const FF_CUSTOM: u32 = 0xd000_0000;
pub const FF_YWORD: u32 = 0xe000_0000;
pub const FF_ZWORD: u32 = 0xf000_0000;

// Operand representations
pub const FF_0CHAR: u32 = 0x0030_0000;
pub const FF_1CHAR: u32 = 0x0300_0000;
pub const FF_0OFF: u32 = 0x0050_0000;
pub const FF_1OFF: u32 = 0x0500_0000;

/// Representation bits for a data item shown as an offset (pointer).
pub const OFFSET_REPR: u32 = FF_0OFF | FF_1OFF;
/// Representation bits for a data item shown as a character.
pub const CHAR_REPR: u32 = FF_0CHAR | FF_1CHAR;

// String types carried in the type id of a string literal.
pub const STRTYPE_C: u64 = 0x00;
pub const STRTYPE_C_16: u64 = 0x01;
pub const STRTYPE_C_32: u64 = 0x02;

/// Returns the data flag for a size class.
pub const fn data_flag(size_class: u32) -> u32 {
    FF_DATA | size_class
}

/// Returns the size class of a flag word.
pub const fn size_class(flag: u32) -> u32 {
    flag & MASK_SIZE
}

/// Returns whether the flag word marks values as signed.
pub const fn is_signed(flag: u32) -> bool {
    flag & FF_SIGN == FF_SIGN
}

/// Returns the host's name for a size class.
pub fn size_class_name(class: u32) -> &'static str {
    match class & MASK_SIZE {
        FF_BYTE => "FF_BYTE",
        FF_WORD => "FF_WORD",
        FF_DWORD => "FF_DWORD",
        FF_QWORD => "FF_QWORD",
        FF_TBYTE => "FF_TBYTE",
        FF_STRLIT => "FF_STRLIT",
        FF_STRUCT => "FF_STRUCT",
        FF_OWORD => "FF_OWORD",
        FF_FLOAT => "FF_FLOAT",
        FF_DOUBLE => "FF_DOUBLE",
        FF_PACKREAL => "FF_PACKREAL",
        FF_ALIGN => "FF_ALIGN",
        FF_CUSTOM => "FF_CUSTOM",
        FF_YWORD => "FF_YWORD",
        FF_ZWORD => "FF_ZWORD",
        _ => "unknown",
    }
}
