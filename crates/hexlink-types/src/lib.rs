//! # hexlink-types
//!
//! Translation between symbolic type descriptions and the host's packed
//! `(flag, type id, size)` encoding.
//!
//! A [`SymbolicType`] names what a value is (a signed 4-byte integer, an
//! array of 16 wide characters, a reference to structure `0xff00`) without
//! any of the host's bit packing. The [`TypeMapper`] owns the lookup
//! tables that convert between the two, and re-derives its defaults when
//! the database's bitness changes.
//!
//! # Example
//!
//! ```ignore
//! use hexlink_core::Bitness;
//! use hexlink_types::{ScalarKind, SymbolicType, TypeMapper};
//!
//! let mapper = TypeMapper::new(Bitness::Bits64);
//! let encoding = mapper.resolve(&SymbolicType::scalar(ScalarKind::Integer, -4), &structures)?;
//! assert_eq!(mapper.dissolve(encoding.flag, encoding.type_id, encoding.size, &structures)?,
//!            SymbolicType::scalar(ScalarKind::Integer, -4));
//! ```

pub mod error;
pub mod mapper;
pub mod symbolic;

pub use error::{Result, TypeError};
pub use mapper::{Encoding, TypeMapper};
pub use symbolic::{ScalarKind, SymbolicType};
