#![no_main]

use libfuzzer_sys::fuzz_target;
use hexlink_core::{ReferenceKind, ReferenceTable};

fuzz_target!(|data: &[u8]| {
    let tables = [ReferenceTable::modern(), ReferenceTable::legacy()];

    for table in &tables {
        for &code in data {
            let kind = table.kind_of(code);
            if kind.is_empty() {
                continue;
            }
            // A classified code always maps back to a code of the same kind.
            let back = table.code_of(kind).expect("classified kinds have a code");
            assert_eq!(table.kind_of(back), kind);
            assert!(back <= code);
        }
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(kind) = text.parse::<ReferenceKind>() {
            assert_eq!(kind.to_string().parse::<ReferenceKind>().ok(), Some(kind));
        }
    }
});
