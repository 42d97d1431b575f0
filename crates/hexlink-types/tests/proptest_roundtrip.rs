//! Property-based tests for type translation.
//!
//! These tests verify that resolving a symbolic type and dissolving the
//! resulting encoding gives back the same type:
//! - Every sized scalar round trips
//! - Arrays of scalars round trip when the element size is not aliased
//! - Arrays of structures round trip
//! - Resolution never succeeds with a size other than element size times count

use proptest::prelude::*;

use hexlink_core::{Bitness, StructureInfo, StructureSource};
use hexlink_types::{ScalarKind, SymbolicType, TypeMapper};

struct Structures;

impl StructureSource for Structures {
    fn by_identifier(&self, id: u64) -> Option<StructureInfo> {
        (0x1000..0x1010).contains(&id).then(|| StructureInfo {
            id,
            name: format!("struct_{id:x}"),
            size: (id as u32 & 0xf) * 4 + 4,
        })
    }
}

// =============================================================================
// Type Generators
// =============================================================================

fn arb_bitness() -> impl Strategy<Value = Bitness> {
    prop_oneof![Just(Bitness::Bits32), Just(Bitness::Bits64)]
}

/// Generate scalars that have an exact host encoding.
fn arb_scalar() -> impl Strategy<Value = SymbolicType> {
    prop_oneof![
        (prop::sample::select(vec![1, 2, 4, 8, 10, 16, 32]), prop::bool::ANY)
            .prop_map(|(size, signed)| SymbolicType::scalar(
                ScalarKind::Integer,
                if signed { -size } else { size }
            )),
        (prop::sample::select(vec![4, 8, 10, 12]), prop::bool::ANY)
            .prop_map(|(size, signed)| SymbolicType::scalar(
                ScalarKind::Float,
                if signed { -size } else { size }
            )),
        prop::sample::select(vec![2, 4, 8])
            .prop_map(|size| SymbolicType::scalar(ScalarKind::Pointer, size)),
        prop::sample::select(vec![1, 2, 4])
            .prop_map(|size| SymbolicType::scalar(ScalarKind::Character, size)),
        prop::sample::select(vec![1, 2, 4])
            .prop_map(|size| SymbolicType::scalar(ScalarKind::String, size)),
        (1i32..4096).prop_map(|size| SymbolicType::scalar(ScalarKind::Alignment, size)),
    ]
}

/// Generate scalars usable as array elements. Packed reals are left out
/// because 10 and 12 byte floats share a flag, and alignment because
/// padding arrays collapse into a single run.
fn arb_element() -> impl Strategy<Value = SymbolicType> {
    arb_scalar().prop_filter("aliased element", |ty| match ty {
        SymbolicType::Scalar {
            kind: ScalarKind::Alignment,
            ..
        } => false,
        SymbolicType::Scalar {
            kind: ScalarKind::Float,
            size: Some(size),
        } => matches!(size.abs(), 4 | 8),
        _ => true,
    })
}

proptest! {
    #[test]
    fn scalars_round_trip(bitness in arb_bitness(), ty in arb_scalar()) {
        let mapper = TypeMapper::new(bitness);
        let enc = mapper.resolve(&ty, &Structures).unwrap();
        prop_assert_eq!(mapper.dissolve(enc.flag, enc.type_id, enc.size, &Structures).unwrap(), ty);
    }

    #[test]
    fn arrays_round_trip(ty in arb_element(), count in 2u32..512) {
        let mapper = TypeMapper::new(Bitness::Bits64);
        let array = SymbolicType::array(ty, count);
        let enc = mapper.resolve(&array, &Structures).unwrap();
        prop_assert_eq!(mapper.dissolve(enc.flag, enc.type_id, enc.size, &Structures).unwrap(), array);
    }

    #[test]
    fn structure_arrays_round_trip(id in 0x1000u64..0x1010, count in 1u32..64) {
        let mapper = TypeMapper::new(Bitness::Bits32);
        let ty = if count > 1 {
            SymbolicType::array(SymbolicType::structure(id), count)
        } else {
            SymbolicType::structure(id)
        };
        let enc = mapper.resolve(&ty, &Structures).unwrap();
        prop_assert_eq!(mapper.dissolve(enc.flag, enc.type_id, enc.size, &Structures).unwrap(), ty);
    }

    #[test]
    fn array_size_is_element_times_count(ty in arb_scalar(), count in 0u32..1024) {
        let mapper = TypeMapper::new(Bitness::Bits32);
        let element = mapper.resolve(&ty, &Structures).unwrap();
        let array = mapper.resolve(&SymbolicType::array(ty, count), &Structures).unwrap();
        prop_assert_eq!(array.size, element.size * count);
        prop_assert_eq!(array.flag, element.flag);
        prop_assert_eq!(array.type_id, element.type_id);
    }

    #[test]
    fn native_scalars_use_the_word_size(bitness in arb_bitness()) {
        let mapper = TypeMapper::new(bitness);
        for kind in [ScalarKind::Integer, ScalarKind::Pointer] {
            let enc = mapper.resolve(&SymbolicType::native(kind), &Structures).unwrap();
            prop_assert_eq!(enc.size, bitness.word_size());
        }
    }
}
