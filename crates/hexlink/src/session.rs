//! The interface context for one database.
//!
//! An [`Interface`] owns the host event dispatcher, the type tables and the
//! register model of the current processor. It registers a single hook on
//! the host's "new processor" event, at the highest priority, that rebuilds
//! the register model and the type sizes before any other callback sees the
//! event. Rebuilt tables are constructed first and swapped in afterwards,
//! so readers holding the previous `Rc<Architecture>` keep a consistent view.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use hexlink_analysis::AddressValidator;
use hexlink_core::{Architecture, Bitness, Database, ReferenceKind, ReferenceTable, TargetInfo};
use hexlink_hooks::{Callback, EventArg, HookAction, HookResult, HookTable, PriorityHook};
use hexlink_types::TypeMapper;

use crate::{InterfaceConfig, Result};

/// Event the host fires after it loads a processor module.
pub const NEW_PROCESSOR_EVENT: &str = "ev_newprc";

/// Priority of the rebuild hook. It runs before every other callback.
pub const REBUILD_PRIORITY: i32 = 0;

/// Bitness assumed until the target reports a supported one.
const FALLBACK_BITNESS: Bitness = Bitness::Bits32;

/// Shared state the rebuild hook updates.
struct Tables {
    config: InterfaceConfig,
    target: Rc<dyn TargetInfo>,
    types: RefCell<TypeMapper>,
    architecture: RefCell<Option<Rc<Architecture>>>,
}

impl Tables {
    fn rebuild(&self) -> Result<()> {
        let processor = self.target.processor_name();
        let bitness = self.target.bitness();

        let architecture = match bitness {
            Some(bitness) => self.config.architecture_for(&processor, bitness)?,
            None => None,
        };
        match &architecture {
            Some(arch) => debug!(
                processor = %processor,
                architecture = arch.name(),
                registers = arch.len(),
                "rebuilt register model"
            ),
            None => debug!(processor = %processor, "no register model for processor"),
        }

        self.types.borrow_mut().on_bitness_changed(bitness);
        *self.architecture.borrow_mut() = architecture.map(Rc::new);
        Ok(())
    }
}

/// Translation context bound to one host database.
pub struct Interface<H: HookTable> {
    tables: Rc<Tables>,
    references: ReferenceTable,
    hooks: Rc<RefCell<PriorityHook<H>>>,
    rebuild: Callback,
}

impl<H: HookTable> Interface<H> {
    /// Attaches to the host through `table` and builds the initial tables
    /// for the current target.
    pub fn new(table: H, target: Rc<dyn TargetInfo>, config: InterfaceConfig) -> Result<Self> {
        config.validate()?;

        let bitness = target.bitness().unwrap_or(FALLBACK_BITNESS);
        let references = config.references();
        let hooks = PriorityHook::new(table).with_default_priority(config.default_priority);
        let tables = Rc::new(Tables {
            config,
            target,
            types: RefCell::new(TypeMapper::new(bitness)),
            architecture: RefCell::new(None),
        });
        tables.rebuild()?;

        let rebuild: Callback = {
            let tables = Rc::clone(&tables);
            Rc::new(move |_: &[EventArg]| -> HookResult {
                tables.rebuild()?;
                Ok(HookAction::Continue)
            })
        };

        let interface = Self {
            tables,
            references,
            hooks: Rc::new(RefCell::new(hooks)),
            rebuild,
        };
        interface.install()?;
        Ok(interface)
    }

    fn install(&self) -> Result<()> {
        let installed = self.hooks.borrow_mut().add_with_priority(
            NEW_PROCESSOR_EVENT,
            Rc::clone(&self.rebuild),
            REBUILD_PRIORITY,
        )?;
        if !installed {
            warn!(
                event = NEW_PROCESSOR_EVENT,
                "processor changes will not rebuild the register model"
            );
        }
        Ok(())
    }

    /// Returns the configuration the context was created with.
    pub fn config(&self) -> &InterfaceConfig {
        &self.tables.config
    }

    /// Returns the reference code table for the host version.
    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    /// Classifies a host reference code.
    pub fn classify(&self, code: u8) -> ReferenceKind {
        self.references.kind_of(code)
    }

    /// Returns the event dispatcher.
    ///
    /// Callbacks that register further callbacks should capture a clone of
    /// this handle and only borrow it while they run.
    pub fn hooks(&self) -> &Rc<RefCell<PriorityHook<H>>> {
        &self.hooks
    }

    /// Adds a callback for `event` at the configured default priority.
    #[track_caller]
    pub fn add(&self, event: &str, callback: Callback) -> Result<bool> {
        Ok(self.hooks.borrow_mut().add(event, callback)?)
    }

    /// Adds a callback for `event` at `priority`.
    #[track_caller]
    pub fn add_with_priority(&self, event: &str, callback: Callback, priority: i32) -> Result<bool> {
        Ok(self
            .hooks
            .borrow_mut()
            .add_with_priority(event, callback, priority)?)
    }

    /// Removes a callback from `event`.
    pub fn discard(&self, event: &str, callback: &Callback) -> Result<bool> {
        Ok(self.hooks.borrow_mut().discard(event, callback)?)
    }

    /// Fires `event` and returns the result of the host's default handler.
    ///
    /// The dispatcher is not borrowed while callbacks run, so they may add
    /// or remove callbacks; changes apply to the next firing.
    pub fn dispatch(&self, event: &str, args: &[EventArg]) -> i64 {
        let invocation = self.hooks.borrow().prepare(event);
        if invocation.run(args) == HookAction::Stop {
            debug!(event, "firing stopped before every callback ran");
        }
        self.hooks.borrow().finish(event, args)
    }

    /// Moves every registration onto a fresh hook object.
    pub fn cycle(&self, replacement: Option<H>) {
        self.hooks.borrow_mut().cycle(replacement);
    }

    /// Rebuilds the tables for the current target without waiting for the
    /// host to announce a processor change.
    pub fn refresh(&self) -> Result<()> {
        self.tables.rebuild()
    }

    /// Returns the type tables.
    pub fn types(&self) -> Ref<'_, TypeMapper> {
        self.tables.types.borrow()
    }

    /// Returns the register model of the current processor, if known.
    pub fn architecture(&self) -> Option<Rc<Architecture>> {
        self.tables.architecture.borrow().clone()
    }

    /// Returns an address validator for `database` using the configured
    /// alignment policy.
    pub fn validator<'a>(&self, database: &'a dyn Database) -> AddressValidator<'a> {
        AddressValidator::new(database).with_policy(self.tables.config.alignment)
    }
}

impl<H: HookTable> Drop for Interface<H> {
    fn drop(&mut self) {
        let Ok(mut hooks) = self.hooks.try_borrow_mut() else {
            warn!("dispatcher is in use, leaving the hook object attached");
            return;
        };
        if Rc::strong_count(&self.hooks) == 1 && !hooks.remove() {
            debug!("unable to detach the hook object");
        }
        if let Err(err) = hooks.discard(NEW_PROCESSOR_EVENT, &self.rebuild) {
            debug!(error = %err, "unable to discard the rebuild hook");
        }
    }
}
