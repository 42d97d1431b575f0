//! Register families for the processors the toolkit knows out of the box.

use crate::{Architecture, Bitness, Dtype, RegisterDef, RegisterId, Result};

/// Returns the builtin architecture for a host processor module, if any.
pub fn for_processor(name: &str, bitness: Bitness) -> Result<Option<Architecture>> {
    match (name.to_ascii_lowercase().as_str(), bitness) {
        ("metapc" | "pc" | "x86" | "x86_64" | "intel", bits) => intel(bits).map(Some),
        ("arm" | "arm64" | "aarch64", Bitness::Bits64) => aarch64().map(Some),
        _ => Ok(None),
    }
}

const LEGACY: [(&str, bool); 8] = [
    ("a", true),
    ("c", true),
    ("d", true),
    ("b", true),
    ("sp", false),
    ("bp", false),
    ("si", false),
    ("di", false),
];

/// Builds the Intel register families for a 32-bit or 64-bit target.
pub fn intel(bitness: Bitness) -> Result<Architecture> {
    let mut arch = Architecture::new("intel").with_prefix("%");
    let wide = bitness == Bitness::Bits64;

    for (stem, has_high) in LEGACY {
        let word = if has_high { format!("{stem}x") } else { stem.to_string() };
        let dword = define_extended(&mut arch, wide, format!("r{word}"), format!("e{word}"), &word)?;
        let ax = arch.define_child(dword, 0, RegisterDef::new(word.clone(), 16))?;
        if has_high {
            arch.define_child(ax, 0, RegisterDef::new(format!("{stem}l"), 8))?;
            arch.define_child(ax, 8, RegisterDef::new(format!("{stem}h"), 8))?;
        } else if wide {
            arch.define_child(ax, 0, RegisterDef::new(format!("{stem}l"), 8))?;
        }
    }

    if wide {
        for n in 8..16 {
            let r = arch.define_root(RegisterDef::new(format!("r{n}"), 64))?;
            let d = arch.define_child(r, 0, RegisterDef::new(format!("r{n}d"), 32).host_name(format!("r{n}")))?;
            let w = arch.define_child(d, 0, RegisterDef::new(format!("r{n}w"), 16).host_name(format!("r{n}")))?;
            arch.define_child(w, 0, RegisterDef::new(format!("r{n}b"), 8).host_name(format!("r{n}")))?;
        }
    }

    let eip = define_extended(&mut arch, wide, "rip".into(), "eip".into(), "ip")?;
    arch.define_child(eip, 0, RegisterDef::new("ip", 16))?;

    let eflags = define_extended(&mut arch, wide, "rflags".into(), "eflags".into(), "efl")?;
    let flags = arch.define_child(eflags, 0, RegisterDef::new("flags", 16).host_name("efl"))?;
    for (bit, name) in [(0, "cf"), (2, "pf"), (4, "af"), (6, "zf"), (7, "sf"), (10, "df"), (11, "of")] {
        arch.define_child(flags, bit, RegisterDef::new(name, 1))?;
    }

    for name in ["es", "cs", "ss", "ds", "fs", "gs"] {
        arch.define_root(RegisterDef::new(name, 16))?;
    }

    for n in 0..8 {
        arch.define_root(RegisterDef::new(format!("st{n}"), 80).dtype(Dtype::Tbyte))?;
    }

    let vectors = if wide { 16 } else { 8 };
    for n in 0..vectors {
        let ymm = arch.define_root(RegisterDef::new(format!("ymm{n}"), 256))?;
        arch.define_child(ymm, 0, RegisterDef::new(format!("xmm{n}"), 128))?;
    }

    Ok(arch)
}

/// Defines the 32-bit view of a register, under its 64-bit parent when `wide`.
fn define_extended(
    arch: &mut Architecture,
    wide: bool,
    qword: String,
    dword: String,
    host: &str,
) -> Result<RegisterId> {
    if wide {
        let root = arch.define_root(RegisterDef::new(qword, 64).host_name(host))?;
        arch.define_child(root, 0, RegisterDef::new(dword, 32).host_name(host))
    } else {
        arch.define_root(RegisterDef::new(dword, 32).host_name(host))
    }
}

/// Builds the AArch64 register families.
pub fn aarch64() -> Result<Architecture> {
    let mut arch = Architecture::new("aarch64");

    for n in 0..31 {
        let mut x = RegisterDef::new(format!("x{n}"), 64);
        match n {
            29 => x = x.alias("fp"),
            30 => x = x.alias("lr"),
            _ => {}
        }
        let id = arch.define_root(x)?;
        arch.define_child(id, 0, RegisterDef::new(format!("w{n}"), 32))?;
    }
    arch.define_root(RegisterDef::new("fp", 64).alias("x29"))?;
    arch.define_root(RegisterDef::new("lr", 64).alias("x30"))?;

    let sp = arch.define_root(RegisterDef::new("sp", 64))?;
    arch.define_child(sp, 0, RegisterDef::new("wsp", 32))?;
    let xzr = arch.define_root(RegisterDef::new("xzr", 64))?;
    arch.define_child(xzr, 0, RegisterDef::new("wzr", 32))?;
    arch.define_root(RegisterDef::new("pc", 64))?;

    for n in 0..32 {
        let v = arch.define_root(RegisterDef::new(format!("v{n}"), 128).alias(format!("q{n}")))?;
        let d = arch.define_child(v, 0, RegisterDef::new(format!("d{n}"), 64).dtype(Dtype::Double))?;
        let s = arch.define_child(d, 0, RegisterDef::new(format!("s{n}"), 32).dtype(Dtype::Float))?;
        let h = arch.define_child(s, 0, RegisterDef::new(format!("h{n}"), 16).dtype(Dtype::Half))?;
        arch.define_child(h, 0, RegisterDef::new(format!("b{n}"), 8))?;
    }

    Ok(arch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intel_64() {
        let arch = intel(Bitness::Bits64).unwrap();
        let rax = arch.by_name("rax").unwrap();
        let al = arch.by_name("al").unwrap();
        let ah = arch.by_name("ah").unwrap();
        assert!(rax.is_subset_of(&al));
        assert_eq!(ah.position(), 8);
        assert_eq!(al.to_string(), "%al");
        assert_eq!(arch.by_name("r10d").unwrap().parent().unwrap().name(), "r10");
        assert_eq!(arch.by_name("dil").unwrap().size(), 8);
        assert_eq!(arch.by_name("zf").unwrap().dtype(), Dtype::Bitfield);
        assert_eq!(arch.by_name("st0").unwrap().dtype(), Dtype::Tbyte);
        assert!(arch.by_name("xmm15").is_ok());
    }

    #[test]
    fn test_intel_32() {
        let arch = intel(Bitness::Bits32).unwrap();
        assert!(arch.by_name("rax").is_err());
        assert!(arch.by_name("r8").is_err());
        assert!(arch.by_name("spl").is_err());
        let eax = arch.by_name("eax").unwrap();
        assert!(eax.parent().is_none());
        assert_eq!(arch.demote(eax.id(), Some(8)).unwrap().name(), "al");
        assert!(arch.by_name("xmm8").is_err());
    }

    #[test]
    fn test_aarch64() {
        let arch = aarch64().unwrap();
        let x29 = arch.by_name("x29").unwrap();
        let fp = arch.by_name("fp").unwrap();
        assert!(x29.is_related_to(&fp));
        assert_eq!(arch.by_name("w3").unwrap().parent().unwrap().name(), "x3");
        let v0 = arch.by_name("v0").unwrap();
        assert_eq!(arch.demote(v0.id(), Some(8)).unwrap().name(), "b0");
        assert_eq!(arch.by_name("s0").unwrap().dtype(), Dtype::Float);
    }

    #[test]
    fn test_for_processor() {
        assert_eq!(
            for_processor("metapc", Bitness::Bits64).unwrap().unwrap().name(),
            "intel"
        );
        assert_eq!(
            for_processor("ARM", Bitness::Bits64).unwrap().unwrap().name(),
            "aarch64"
        );
        assert!(for_processor("arm", Bitness::Bits32).unwrap().is_none());
        assert!(for_processor("mips", Bitness::Bits32).unwrap().is_none());
    }
}
