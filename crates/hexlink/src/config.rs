//! Interface configuration.
//!
//! Configuration is read from JSON. Every field is optional:
//!
//! ```json
//! {
//!   "host_version": { "major": 7, "minor": 4 },
//!   "default_priority": 50,
//!   "alignment": "correct_silently",
//!   "architectures": [
//!     {
//!       "name": "toy",
//!       "prefix": "$",
//!       "processors": ["toy"],
//!       "bitness": 32,
//!       "registers": [
//!         { "name": "r0", "bits": 32, "children": [
//!           { "name": "r0l", "bits": 16 },
//!           { "name": "r0h", "bits": 16, "position": 16 }
//!         ] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Custom architectures take precedence over the builtin ones for the
//! processors they name.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hexlink_analysis::AlignmentPolicy;
use hexlink_core::{builtin, Architecture, Bitness, Dtype, ReferenceTable, RegisterDef, RegisterId};
use hexlink_hooks::DEFAULT_PRIORITY;

use crate::ConfigError;

/// API version of the host disassembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostVersion {
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
}

impl Default for HostVersion {
    fn default() -> Self {
        Self { major: 7, minor: 0 }
    }
}

/// Settings for an [`Interface`](crate::Interface).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Selects the reference code table.
    pub host_version: HostVersion,
    /// Priority of hooks added without an explicit one.
    pub default_priority: i32,
    /// Handling of addresses that are not item heads.
    pub alignment: AlignmentPolicy,
    /// Register families for processors the builtins don't cover, or
    /// replacements for the builtins.
    pub architectures: Vec<ArchitectureSpec>,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            host_version: HostVersion::default(),
            default_priority: DEFAULT_PRIORITY,
            alignment: AlignmentPolicy::default(),
            architectures: Vec::new(),
        }
    }
}

impl InterfaceConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that every custom architecture can be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for spec in &self.architectures {
            spec.validate()?;
        }
        Ok(())
    }

    /// Returns the reference code table for the configured host version.
    pub fn references(&self) -> ReferenceTable {
        ReferenceTable::for_version(self.host_version.major, self.host_version.minor)
    }

    /// Builds the register model for a processor.
    ///
    /// The first custom architecture naming the processor wins; otherwise
    /// the builtin one is used. Returns `None` for unknown processors.
    pub fn architecture_for(
        &self,
        processor: &str,
        bitness: Bitness,
    ) -> Result<Option<Architecture>, ConfigError> {
        if let Some(spec) = self
            .architectures
            .iter()
            .find(|spec| spec.applies_to(processor, bitness))
        {
            return spec.build().map(Some);
        }
        builtin::for_processor(processor, bitness).map_err(|source| ConfigError::Architecture {
            name: processor.to_string(),
            source,
        })
    }
}

/// A custom register model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    pub name: String,
    /// Prefix used when displaying registers.
    #[serde(default)]
    pub prefix: String,
    /// Host processor module names the model applies to.
    pub processors: Vec<String>,
    /// Restricts the model to 32-bit or 64-bit targets.
    #[serde(default)]
    pub bitness: Option<u32>,
    /// Root register families.
    pub registers: Vec<RegisterNode>,
}

impl ArchitectureSpec {
    /// Returns true if the model applies to `processor` at `bitness`.
    pub fn applies_to(&self, processor: &str, bitness: Bitness) -> bool {
        self.bitness.map_or(true, |bits| bits == bitness.bits())
            && self
                .processors
                .iter()
                .any(|name| name.eq_ignore_ascii_case(processor))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::invalid("architecture without a name"));
        }
        if self.processors.is_empty() {
            return Err(ConfigError::invalid(format!(
                "architecture {} names no processors",
                self.name
            )));
        }
        if let Some(bits) = self.bitness {
            if Bitness::from_bits(bits).is_none() {
                return Err(ConfigError::invalid(format!(
                    "architecture {} has unsupported bitness {}",
                    self.name, bits
                )));
            }
        }
        self.build().map(|_| ())
    }

    /// Builds the register model.
    pub fn build(&self) -> Result<Architecture, ConfigError> {
        let mut arch = Architecture::new(&self.name).with_prefix(&self.prefix);
        for root in &self.registers {
            root.define(&mut arch, None)
                .map_err(|source| ConfigError::Architecture {
                    name: self.name.clone(),
                    source,
                })?;
        }
        Ok(arch)
    }
}

/// A register and its sub-registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterNode {
    pub name: String,
    pub bits: u32,
    /// Bit offset inside the parent. Ignored for roots.
    #[serde(default)]
    pub position: u32,
    /// Name used by the host's register table, when it differs.
    #[serde(default)]
    pub host_name: Option<String>,
    /// Overrides the dtype derived from the size.
    #[serde(default)]
    pub dtype: Option<Dtype>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub children: Vec<RegisterNode>,
}

impl RegisterNode {
    fn define(
        &self,
        arch: &mut Architecture,
        parent: Option<RegisterId>,
    ) -> hexlink_core::Result<RegisterId> {
        let mut def = RegisterDef::new(&self.name, self.bits).aliases(&self.aliases);
        if let Some(host_name) = &self.host_name {
            def = def.host_name(host_name);
        }
        if let Some(dtype) = self.dtype {
            def = def.dtype(dtype);
        }

        let id = match parent {
            Some(parent) => arch.define_child(parent, self.position, def)?,
            None => arch.define_root(def)?,
        };
        for child in &self.children {
            child.define(arch, Some(id))?;
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOY: &str = r#"{
        "host_version": { "major": 6, "minor": 95 },
        "default_priority": 10,
        "alignment": "reject",
        "architectures": [{
            "name": "toy",
            "prefix": "$",
            "processors": ["toy", "TOY2"],
            "bitness": 32,
            "registers": [
                { "name": "r0", "bits": 32, "aliases": ["acc"], "children": [
                    { "name": "r0l", "bits": 16 },
                    { "name": "r0h", "bits": 16, "position": 16 }
                ] },
                { "name": "f0", "bits": 32, "dtype": "Float" }
            ]
        }]
    }"#;

    #[test]
    fn test_defaults() {
        let config = InterfaceConfig::from_json("{}").unwrap();
        assert_eq!(config, InterfaceConfig::default());
        assert_eq!(config.default_priority, DEFAULT_PRIORITY);
        assert_eq!(config.alignment, AlignmentPolicy::Correct);
        assert_eq!(config.references(), ReferenceTable::modern());
    }

    #[test]
    fn test_parse() {
        let config = InterfaceConfig::from_json(TOY).unwrap();
        assert_eq!(config.host_version, HostVersion { major: 6, minor: 95 });
        assert_eq!(config.references(), ReferenceTable::legacy());
        assert_eq!(config.default_priority, 10);
        assert_eq!(config.alignment, AlignmentPolicy::Reject);

        let arch = config
            .architecture_for("toy2", Bitness::Bits32)
            .unwrap()
            .unwrap();
        assert_eq!(arch.name(), "toy");
        assert_eq!(arch.len(), 4);
        assert!(arch.by_name("r0").unwrap().aliases().any(|a| a == "acc"));
        assert_eq!(arch.by_name("r0h").unwrap().position(), 16);
        assert_eq!(arch.by_name("f0").unwrap().dtype(), Dtype::Float);
        assert_eq!(arch.by_name("r0l").unwrap().to_string(), "$r0l");
    }

    #[test]
    fn test_builtin_fallback() {
        let config = InterfaceConfig::from_json(TOY).unwrap();
        assert!(config
            .architecture_for("toy", Bitness::Bits64)
            .unwrap()
            .is_none());
        let intel = config
            .architecture_for("metapc", Bitness::Bits64)
            .unwrap()
            .unwrap();
        assert_eq!(intel.name(), "intel");
        assert!(config
            .architecture_for("z80", Bitness::Bits32)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_custom_overrides_builtin() {
        let config = InterfaceConfig {
            architectures: vec![ArchitectureSpec {
                name: "tiny-x86".to_string(),
                prefix: String::new(),
                processors: vec!["metapc".to_string()],
                bitness: None,
                registers: vec![RegisterNode {
                    name: "eax".to_string(),
                    bits: 32,
                    position: 0,
                    host_name: Some("ax".to_string()),
                    dtype: None,
                    aliases: Vec::new(),
                    children: Vec::new(),
                }],
            }],
            ..InterfaceConfig::default()
        };
        let arch = config
            .architecture_for("metapc", Bitness::Bits32)
            .unwrap()
            .unwrap();
        assert_eq!(arch.name(), "tiny-x86");
        assert_eq!(arch.by_name("eax").unwrap().host_name(), Some("ax"));
    }

    #[test]
    fn test_invalid_architectures() {
        let overlap = r#"{ "architectures": [{
            "name": "bad", "processors": ["bad"],
            "registers": [{ "name": "r0", "bits": 32, "children": [
                { "name": "lo", "bits": 16 },
                { "name": "mid", "bits": 16, "position": 8 }
            ] }]
        }] }"#;
        assert!(matches!(
            InterfaceConfig::from_json(overlap),
            Err(ConfigError::Architecture { .. })
        ));

        let duplicate = r#"{ "architectures": [{
            "name": "bad", "processors": ["bad"],
            "registers": [{ "name": "r0", "bits": 32 }, { "name": "R0", "bits": 32 }]
        }] }"#;
        assert!(matches!(
            InterfaceConfig::from_json(duplicate),
            Err(ConfigError::Architecture { .. })
        ));

        let nameless = r#"{ "architectures": [{ "name": "bad", "processors": [], "registers": [] }] }"#;
        assert!(matches!(
            InterfaceConfig::from_json(nameless),
            Err(ConfigError::Invalid(_))
        ));

        let bits = r#"{ "architectures": [{
            "name": "bad", "processors": ["bad"], "bitness": 16, "registers": []
        }] }"#;
        assert!(matches!(
            InterfaceConfig::from_json(bits),
            Err(ConfigError::Invalid(_))
        ));

        assert!(matches!(
            InterfaceConfig::from_json("{ \"default_priority\": \"high\" }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = InterfaceConfig::from_json(TOY).unwrap();
        let text = config.to_json().unwrap();
        assert_eq!(InterfaceConfig::from_json(&text).unwrap(), config);
    }
}
