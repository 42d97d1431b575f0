//! Symbolic type descriptions.

use std::fmt;

/// The kind of a scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScalarKind {
    /// Integer; a negative size marks it as signed.
    Integer,
    /// A single character of the given width.
    Character,
    /// One code unit of a string literal of the given width.
    String,
    /// Floating point; a negative size marks it as signed.
    Float,
    /// Pointer (offset) of the given width.
    Pointer,
    /// Alignment padding.
    Alignment,
}

impl ScalarKind {
    /// All scalar kinds.
    pub const ALL: [ScalarKind; 6] = [
        Self::Integer,
        Self::Character,
        Self::String,
        Self::Float,
        Self::Pointer,
        Self::Alignment,
    ];

    /// Returns true if the kind can carry a sign.
    pub fn is_signable(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Short name used when displaying types.
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "int",
            Self::Character => "chr",
            Self::String => "str",
            Self::Float => "float",
            Self::Pointer => "ptr",
            Self::Alignment => "align",
        }
    }
}

/// A host type described abstractly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SymbolicType {
    /// A scalar. `None` selects the architecture's default size.
    Scalar { kind: ScalarKind, size: Option<i32> },

    /// A fixed number of elements.
    Array {
        element: Box<SymbolicType>,
        count: u32,
    },

    /// A structure known to the host by identifier.
    StructureRef(u64),
}

impl SymbolicType {
    /// A scalar with an explicit size in bytes.
    pub fn scalar(kind: ScalarKind, size: i32) -> Self {
        Self::Scalar {
            kind,
            size: Some(size),
        }
    }

    /// A scalar using the architecture's default size.
    pub fn native(kind: ScalarKind) -> Self {
        Self::Scalar { kind, size: None }
    }

    /// An array of `count` elements.
    pub fn array(element: SymbolicType, count: u32) -> Self {
        Self::Array {
            element: Box::new(element),
            count,
        }
    }

    /// A reference to a structure.
    pub fn structure(id: u64) -> Self {
        Self::StructureRef(id)
    }

    /// Returns true for signed integers and floats.
    pub fn is_signed(&self) -> bool {
        match self {
            Self::Scalar { kind, size } => kind.is_signable() && size.map_or(false, |s| s < 0),
            _ => false,
        }
    }

    /// Returns true for arrays.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    /// Returns the innermost element type of nested arrays.
    pub fn base(&self) -> &SymbolicType {
        match self {
            Self::Array { element, .. } => element.base(),
            other => other,
        }
    }
}

impl fmt::Display for SymbolicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { kind, size: None } => write!(f, "{}", kind.name()),
            Self::Scalar {
                kind,
                size: Some(size),
            } => write!(f, "{}({})", kind.name(), size),
            Self::Array { element, count } => write!(f, "[{}; {}]", element, count),
            Self::StructureRef(id) => write!(f, "struct({:#x})", id),
        }
    }
}
