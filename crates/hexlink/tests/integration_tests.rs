//! Integration tests for the interface context.
//!
//! These drive an [`Interface`] through a simulated host: a hook object
//! that records what is installed, and a target whose processor can be
//! switched between firings of the new-processor event.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fs;
use std::rc::Rc;

use hexlink::analysis::{AlignmentPolicy, AnalysisError};
use hexlink::hooks::{Callback, EventArg, HookAction, HookResult, HookTable};
use hexlink::types::{ScalarKind, SymbolicType};
use hexlink::{
    Bitness, Bounds, ConfigError, Interface, InterfaceConfig, ReferenceKind, NEW_PROCESSOR_EVENT,
};
use hexlink_core::reference::code;
use hexlink_core::{Database, StructureInfo, StructureSource, TargetInfo};

// =============================================================================
// Simulated host
// =============================================================================

#[derive(Default)]
struct HostState {
    installed: BTreeSet<String>,
    hooked: bool,
    defaults: Vec<String>,
}

struct HostHooks {
    state: Rc<RefCell<HostState>>,
}

impl HostHooks {
    fn new() -> (Self, Rc<RefCell<HostState>>) {
        let state = Rc::new(RefCell::new(HostState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl HookTable for HostHooks {
    fn has_event(&self, event: &str) -> bool {
        event.starts_with("ev_")
    }

    fn install(&mut self, event: &str) -> bool {
        self.state.borrow_mut().installed.insert(event.to_string());
        true
    }

    fn uninstall(&mut self, event: &str) -> bool {
        self.state.borrow_mut().installed.remove(event)
    }

    fn hook(&mut self) -> bool {
        self.state.borrow_mut().hooked = true;
        true
    }

    fn unhook(&mut self) -> bool {
        std::mem::replace(&mut self.state.borrow_mut().hooked, false)
    }

    fn call_default(&self, event: &str, _args: &[EventArg]) -> i64 {
        self.state.borrow_mut().defaults.push(event.to_string());
        0
    }

    fn renew(&self) -> Self {
        Self::new().0
    }
}

struct Target {
    processor: RefCell<String>,
    bitness: Cell<Option<Bitness>>,
}

impl Target {
    fn new(processor: &str, bitness: Option<Bitness>) -> Rc<Self> {
        Rc::new(Self {
            processor: RefCell::new(processor.to_string()),
            bitness: Cell::new(bitness),
        })
    }

    fn switch(&self, processor: &str, bitness: Option<Bitness>) {
        *self.processor.borrow_mut() = processor.to_string();
        self.bitness.set(bitness);
    }
}

impl TargetInfo for Target {
    fn processor_name(&self) -> String {
        self.processor.borrow().clone()
    }

    fn bitness(&self) -> Option<Bitness> {
        self.bitness.get()
    }
}

struct NoStructures;

impl StructureSource for NoStructures {
    fn by_identifier(&self, _id: u64) -> Option<StructureInfo> {
        None
    }
}

/// 0x400000..0x401000 made of 4-byte items.
struct Image;

impl Database for Image {
    fn bounds(&self) -> Bounds {
        Bounds::new(0x400000, 0x401000).unwrap()
    }

    fn item_head(&self, address: u64) -> u64 {
        address & !0x3
    }
}

fn callback(f: impl Fn(&[EventArg]) -> HookResult + 'static) -> Callback {
    Rc::new(f)
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_initial_tables_follow_target() {
    let (hooks, host) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits64));
    let interface = Interface::new(hooks, target, InterfaceConfig::default()).unwrap();

    let arch = interface.architecture().unwrap();
    assert_eq!(arch.name(), "intel");
    assert_eq!(arch.by_name("eax").unwrap().parent().unwrap().name(), "rax");
    assert_eq!(interface.types().bitness(), Bitness::Bits64);
    assert_eq!(interface.types().default_size(ScalarKind::Pointer), 8);

    let state = host.borrow();
    assert!(state.hooked);
    assert!(state.installed.contains(NEW_PROCESSOR_EVENT));
}

#[test]
fn test_reference_classification_follows_host_version() {
    let (hooks, _) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits32));
    let interface = Interface::new(hooks, target, InterfaceConfig::default()).unwrap();
    assert_eq!(interface.classify(code::CODE_NEAR_CALL).to_string(), "rx");

    let legacy = InterfaceConfig::from_json(r#"{ "host_version": { "major": 6, "minor": 8 } }"#)
        .unwrap();
    let (hooks, _) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits32));
    let interface = Interface::new(hooks, target, legacy).unwrap();
    assert_eq!(interface.classify(code::CODE_NEAR_CALL), ReferenceKind::empty());
    assert_eq!(interface.classify(code::DATA_WRITE), ReferenceKind::WRITE);
}

#[test]
fn test_unknown_processor_has_no_register_model() {
    let (hooks, _) = HostHooks::new();
    let target = Target::new("z80", None);
    let interface = Interface::new(hooks, target, InterfaceConfig::default()).unwrap();
    assert!(interface.architecture().is_none());
    assert_eq!(interface.types().bitness(), Bitness::Bits32);
}

// =============================================================================
// Processor changes
// =============================================================================

#[test]
fn test_processor_change_rebuilds_tables() {
    let (hooks, host) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits32));
    let interface = Interface::new(hooks, target.clone(), InterfaceConfig::default()).unwrap();

    let before = interface.architecture().unwrap();
    let int = SymbolicType::native(ScalarKind::Integer);
    let encoding = interface.types().resolve(&int, &NoStructures).unwrap();
    assert_eq!(encoding.size, 4);

    target.switch("arm64", Some(Bitness::Bits64));
    interface.dispatch(NEW_PROCESSOR_EVENT, &[EventArg::Str("arm".to_string())]);

    let after = interface.architecture().unwrap();
    assert_eq!(after.name(), "aarch64");
    assert!(after.by_name("w0").is_ok());
    assert_eq!(interface.types().bitness(), Bitness::Bits64);
    let encoding = interface.types().resolve(&int, &NoStructures).unwrap();
    assert_eq!(encoding.size, 8);

    // Readers holding the previous model are unaffected.
    assert_eq!(before.name(), "intel");
    assert!(before.by_name("eax").is_ok());

    assert_eq!(host.borrow().defaults, vec![NEW_PROCESSOR_EVENT.to_string()]);
}

#[test]
fn test_unsupported_bitness_keeps_type_sizes() {
    let (hooks, _) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits64));
    let interface = Interface::new(hooks, target.clone(), InterfaceConfig::default()).unwrap();

    target.switch("metapc", None);
    interface.dispatch(NEW_PROCESSOR_EVENT, &[]);
    assert!(interface.architecture().is_none());
    assert_eq!(interface.types().bitness(), Bitness::Bits64);
}

#[test]
fn test_rebuild_runs_before_other_callbacks() {
    let (hooks, _) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits64));
    let interface = Interface::new(hooks, target.clone(), InterfaceConfig::default()).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let observer = {
        let seen = Rc::clone(&seen);
        let target = Rc::clone(&target);
        callback(move |_| {
            seen.borrow_mut().push(target.processor_name());
            Ok(HookAction::Continue)
        })
    };
    assert!(interface
        .add_with_priority(NEW_PROCESSOR_EVENT, Rc::clone(&observer), -10)
        .is_ok());

    let registered = interface.hooks().borrow().get(NEW_PROCESSOR_EVENT);
    assert_eq!(registered.len(), 2);
    assert!(Rc::ptr_eq(&registered[0], &observer));

    assert!(interface
        .add(NEW_PROCESSOR_EVENT, Rc::clone(&observer))
        .unwrap());
    let registered = interface.hooks().borrow().get(NEW_PROCESSOR_EVENT);
    assert!(Rc::ptr_eq(&registered[1], &observer));

    target.switch("aarch64", Some(Bitness::Bits64));
    interface.dispatch(NEW_PROCESSOR_EVENT, &[]);
    assert_eq!(*seen.borrow(), vec!["aarch64".to_string()]);
    assert_eq!(interface.architecture().unwrap().name(), "aarch64");
}

#[test]
fn test_failing_callback_does_not_break_dispatch() {
    let (hooks, host) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits64));
    let interface = Interface::new(hooks, target, InterfaceConfig::default()).unwrap();

    let failing = callback(|_| Err("database is locked".into()));
    interface.add("ev_undefine", failing).unwrap();
    assert_eq!(interface.dispatch("ev_undefine", &[EventArg::Address(0x401000)]), 0);
    assert_eq!(host.borrow().defaults, vec!["ev_undefine".to_string()]);

    assert!(interface.add("not_an_event", callback(|_| Ok(HookAction::Continue))).is_err());
}

#[test]
fn test_callbacks_may_register_callbacks() {
    let (hooks, _) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits64));
    let interface = Interface::new(hooks, target, InterfaceConfig::default()).unwrap();

    let fired = Rc::new(Cell::new(0));
    let late = {
        let fired = Rc::clone(&fired);
        callback(move |_| {
            fired.set(fired.get() + 1);
            Ok(HookAction::Continue)
        })
    };
    let registrar = {
        let dispatcher = Rc::clone(interface.hooks());
        let late = Rc::clone(&late);
        callback(move |_| {
            dispatcher.borrow_mut().add("ev_rename", Rc::clone(&late))?;
            Ok(HookAction::Continue)
        })
    };
    interface.add("ev_rename", registrar).unwrap();

    interface.dispatch("ev_rename", &[]);
    assert_eq!(fired.get(), 0);
    interface.dispatch("ev_rename", &[]);
    assert_eq!(fired.get(), 1);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_cycle_keeps_rebuild_hook() {
    let (hooks, _) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits32));
    let interface = Interface::new(hooks, target.clone(), InterfaceConfig::default()).unwrap();

    let (replacement, host) = HostHooks::new();
    interface.cycle(Some(replacement));
    assert!(host.borrow().hooked);
    assert!(host.borrow().installed.contains(NEW_PROCESSOR_EVENT));

    target.switch("arm64", Some(Bitness::Bits64));
    interface.dispatch(NEW_PROCESSOR_EVENT, &[]);
    assert_eq!(interface.architecture().unwrap().name(), "aarch64");
}

#[test]
fn test_drop_detaches_from_host() {
    let (hooks, host) = HostHooks::new();
    let target = Target::new("metapc", Some(Bitness::Bits64));
    let interface = Interface::new(hooks, target, InterfaceConfig::default()).unwrap();
    interface
        .add("ev_rename", callback(|_| Ok(HookAction::Continue)))
        .unwrap();
    drop(interface);

    let state = host.borrow();
    assert!(!state.hooked);
    assert!(state.installed.is_empty());
}

// =============================================================================
// Configuration
// =============================================================================

const TOY: &str = r#"{
    "default_priority": 5,
    "alignment": "reject",
    "architectures": [{
        "name": "toy",
        "prefix": "$",
        "processors": ["toy"],
        "registers": [
            { "name": "acc", "bits": 16, "children": [
                { "name": "lo", "bits": 8 },
                { "name": "hi", "bits": 8, "position": 8 }
            ] }
        ]
    }]
}"#;

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hexlink.json");
    fs::write(&path, TOY).unwrap();

    let config = InterfaceConfig::from_path(&path).unwrap();
    assert_eq!(config.default_priority, 5);

    let (hooks, _) = HostHooks::new();
    let target = Target::new("TOY", Some(Bitness::Bits32));
    let interface = Interface::new(hooks, target, config).unwrap();

    let arch = interface.architecture().unwrap();
    let hi = arch.by_name("$hi").unwrap();
    assert_eq!(hi.to_string(), "$hi");
    assert_eq!(arch.promote(hi.id(), None).unwrap().name(), "acc");

    let validator = interface.validator(&Image);
    assert_eq!(validator.policy(), AlignmentPolicy::Reject);
    assert!(matches!(
        validator.inside(0x400002),
        Err(AnalysisError::Misaligned { head: 0x400000, .. })
    ));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        InterfaceConfig::from_path(dir.path().join("missing.json")),
        Err(ConfigError::Io(_))
    ));
}
