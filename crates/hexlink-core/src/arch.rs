//! Target bitness and the host's register/data dtype enumeration.

/// Target bitness (32-bit or 64-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bitness {
    Bits32,
    Bits64,
}

impl Bitness {
    /// Converts a host bit count; anything other than 32 or 64 is unsupported.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            32 => Some(Self::Bits32),
            64 => Some(Self::Bits64),
            _ => None,
        }
    }

    /// Returns the machine word size in bytes.
    pub fn word_size(&self) -> u32 {
        match self {
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }

    /// Returns the number of bits.
    pub fn bits(&self) -> u32 {
        self.word_size() * 8
    }
}

/// The host's operand/register data type (`dt_*`).
///
/// Discriminants match the host's numbering so raw values can be passed
/// through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Dtype {
    Byte = 0,
    Word = 1,
    Dword = 2,
    Float = 3,
    Double = 4,
    Tbyte = 5,
    PackReal = 6,
    Qword = 7,
    Byte16 = 8,
    Code = 9,
    Void = 10,
    Fword = 11,
    Bitfield = 12,
    String = 13,
    Unicode = 14,
    LongDouble = 15,
    Byte32 = 16,
    Byte64 = 17,
    Half = 18,
}

impl Dtype {
    const ALL: [Dtype; 19] = [
        Self::Byte,
        Self::Word,
        Self::Dword,
        Self::Float,
        Self::Double,
        Self::Tbyte,
        Self::PackReal,
        Self::Qword,
        Self::Byte16,
        Self::Code,
        Self::Void,
        Self::Fword,
        Self::Bitfield,
        Self::String,
        Self::Unicode,
        Self::LongDouble,
        Self::Byte32,
        Self::Byte64,
        Self::Half,
    ];

    /// Returns the integral dtype the host uses for a value of `size` bytes.
    pub fn from_size(size: u32) -> Option<Self> {
        match size {
            1 => Some(Self::Byte),
            2 => Some(Self::Word),
            4 => Some(Self::Dword),
            6 => Some(Self::Fword),
            8 => Some(Self::Qword),
            10 => Some(Self::Tbyte),
            16 => Some(Self::Byte16),
            32 => Some(Self::Byte32),
            64 => Some(Self::Byte64),
            _ => None,
        }
    }

    /// Converts a raw host dtype value.
    pub fn from_raw(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }

    /// Returns the raw host value.
    pub fn raw(self) -> u8 {
        self as u8
    }

    /// Returns the host's `dt_*` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Byte => "dt_byte",
            Self::Word => "dt_word",
            Self::Dword => "dt_dword",
            Self::Float => "dt_float",
            Self::Double => "dt_double",
            Self::Tbyte => "dt_tbyte",
            Self::PackReal => "dt_packreal",
            Self::Qword => "dt_qword",
            Self::Byte16 => "dt_byte16",
            Self::Code => "dt_code",
            Self::Void => "dt_void",
            Self::Fword => "dt_fword",
            Self::Bitfield => "dt_bitfild",
            Self::String => "dt_string",
            Self::Unicode => "dt_unicode",
            Self::LongDouble => "dt_ldbl",
            Self::Byte32 => "dt_byte32",
            Self::Byte64 => "dt_byte64",
            Self::Half => "dt_half",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_by_size() {
        assert_eq!(Dtype::from_size(1), Some(Dtype::Byte));
        assert_eq!(Dtype::from_size(8), Some(Dtype::Qword));
        assert_eq!(Dtype::from_size(16), Some(Dtype::Byte16));
        assert_eq!(Dtype::from_size(3), None);
    }

    #[test]
    fn test_dtype_raw_roundtrip() {
        for dtype in Dtype::ALL {
            assert_eq!(Dtype::from_raw(dtype.raw()), Some(dtype));
        }
        assert_eq!(Dtype::from_raw(200), None);
    }

    #[test]
    fn test_bitness() {
        assert_eq!(Bitness::from_bits(64), Some(Bitness::Bits64));
        assert_eq!(Bitness::from_bits(16), None);
        assert_eq!(Bitness::Bits32.word_size(), 4);
        assert_eq!(Bitness::Bits64.bits(), 64);
    }
}
