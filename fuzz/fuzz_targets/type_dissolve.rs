#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use hexlink_core::{Bitness, StructureInfo, StructureSource};
use hexlink_types::TypeMapper;

/// A host encoding as the scripting API would hand it over.
#[derive(Debug, Arbitrary)]
struct FuzzedEncoding {
    flag: u32,
    type_id: u64,
    size: u32,
    wide: bool,
    structure_size: u16,
}

struct Structures(u32);

impl StructureSource for Structures {
    fn by_identifier(&self, id: u64) -> Option<StructureInfo> {
        // Every even id names a structure.
        (id % 2 == 0).then(|| StructureInfo {
            id,
            name: format!("struc_{id:x}"),
            size: self.0,
        })
    }
}

fuzz_target!(|input: FuzzedEncoding| {
    let bitness = if input.wide {
        Bitness::Bits64
    } else {
        Bitness::Bits32
    };
    let mapper = TypeMapper::new(bitness);
    let structures = Structures(u32::from(input.structure_size));

    let Ok(ty) = mapper.dissolve(input.flag, input.type_id, input.size, &structures) else {
        return;
    };
    let _ = ty.to_string();
    let _ = mapper.element_size(input.flag, input.type_id, &structures);

    // Anything that dissolved must encode again.
    if let Ok(encoding) = mapper.resolve(&ty, &structures) {
        let _ = mapper.dissolve(encoding.flag, encoding.type_id, encoding.size, &structures);
    }
});
