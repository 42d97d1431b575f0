//! The priority hook dispatcher.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::panic::{self, AssertUnwindSafe, Location};
use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::{Callback, EventArg, HookAction, HookError, HookTable, Result};

/// Priority given to callbacks added without one.
pub const DEFAULT_PRIORITY: i32 = 50;

/// Where a callback was registered from.
struct Site {
    location: &'static Location<'static>,
    backtrace: Backtrace,
}

#[derive(Clone)]
struct Entry {
    priority: i32,
    sequence: u64,
    callback: Callback,
    site: Rc<Site>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.priority, self.sequence).cmp(&(other.priority, other.sequence))
    }
}

fn identity(callback: &Callback) -> *const () {
    Rc::as_ptr(callback) as *const ()
}

/// Fans host events out to prioritized callbacks.
///
/// Lower priorities run first and callbacks of equal priority run in the
/// order they were added.
pub struct PriorityHook<H: HookTable> {
    table: H,
    queues: BTreeMap<String, BinaryHeap<Reverse<Entry>>>,
    disabled: BTreeSet<String>,
    default_priority: i32,
    sequence: u64,
}

impl<H: HookTable> PriorityHook<H> {
    /// Creates a dispatcher and attaches the hook object to the host.
    pub fn new(mut table: H) -> Self {
        if !table.hook() {
            debug!("unable to attach the hook object");
        }
        Self {
            table,
            queues: BTreeMap::new(),
            disabled: BTreeSet::new(),
            default_priority: DEFAULT_PRIORITY,
            sequence: 0,
        }
    }

    /// Sets the priority used by [`PriorityHook::add`].
    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.default_priority = priority;
        self
    }

    /// Returns the active hook object.
    pub fn table(&self) -> &H {
        &self.table
    }

    /// Adds a callback for `event` at the default priority.
    #[track_caller]
    pub fn add(&mut self, event: &str, callback: Callback) -> Result<bool> {
        self.add_with_priority(event, callback, self.default_priority)
    }

    /// Adds a callback for `event`.
    ///
    /// Adding a callback that is already registered for the event replaces
    /// the earlier registration.
    #[track_caller]
    pub fn add_with_priority(
        &mut self,
        event: &str,
        callback: Callback,
        priority: i32,
    ) -> Result<bool> {
        let site = Rc::new(Site {
            location: Location::caller(),
            backtrace: Backtrace::force_capture(),
        });

        if !self.table.has_event(event) {
            return Err(HookError::UnknownEvent(event.to_string()));
        }
        if !self.queues.contains_key(event) && !self.table.install(event) {
            warn!(event, "unable to install the event trampoline");
            return Ok(false);
        }

        self.take(event, &callback);
        self.sequence += 1;
        self.queues
            .entry(event.to_string())
            .or_default()
            .push(Reverse(Entry {
                priority,
                sequence: self.sequence,
                callback,
                site,
            }));
        Ok(true)
    }

    /// Returns the callbacks for `event` in the order they run.
    pub fn get(&self, event: &str) -> Vec<Callback> {
        self.snapshot(event)
            .into_iter()
            .map(|entry| entry.callback)
            .collect()
    }

    /// Removes a callback from `event`, returning whether it was registered.
    ///
    /// Removing the last callback also clears the event's disabled flag.
    pub fn discard(&mut self, event: &str, callback: &Callback) -> Result<bool> {
        if !self.table.has_event(event) {
            return Err(HookError::UnknownEvent(event.to_string()));
        }
        let found = self.take(event, callback);
        if self.queues.get(event).is_some_and(BinaryHeap::is_empty) {
            self.queues.remove(event);
            self.disabled.remove(event);
        }
        Ok(found)
    }

    fn take(&mut self, event: &str, callback: &Callback) -> bool {
        let Some(queue) = self.queues.get_mut(event) else {
            return false;
        };
        let id = identity(callback);
        let before = queue.len();
        queue.retain(|Reverse(entry)| identity(&entry.callback) != id);
        queue.len() != before
    }

    /// Resumes running the callbacks of a disabled event.
    pub fn enable(&mut self, event: &str) -> bool {
        if !self.disabled.remove(event) {
            error!(
                event,
                disabled = ?self.disabled,
                "unable to enable an event that is not disabled"
            );
            return false;
        }
        true
    }

    /// Stops running the callbacks of `event` without removing them.
    pub fn disable(&mut self, event: &str) -> bool {
        if !self.queues.contains_key(event) {
            error!(
                event,
                registered = ?self.queues.keys().collect::<Vec<_>>(),
                "unable to disable an event with no callbacks"
            );
            return false;
        }
        if !self.disabled.insert(event.to_string()) {
            warn!(event, "event has already been disabled");
            return false;
        }
        true
    }

    /// Returns true if `event` has been disabled.
    pub fn is_disabled(&self, event: &str) -> bool {
        self.disabled.contains(event)
    }

    /// Iterates over the events that have callbacks.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.queues.keys().map(String::as_str)
    }

    /// Detaches the dispatcher from the host.
    ///
    /// Registrations are kept and are reinstalled by [`PriorityHook::cycle`].
    pub fn remove(&mut self) -> bool {
        for event in self.queues.keys() {
            if !self.table.uninstall(event) {
                debug!(event, "unable to uninstall the event trampoline");
            }
        }
        self.table.unhook()
    }

    /// Moves every registration onto a new hook object.
    ///
    /// Without a replacement the current hook object is renewed. Returns the
    /// newly installed object.
    pub fn cycle(&mut self, replacement: Option<H>) -> &H {
        if !self.table.unhook() {
            debug!("unable to detach the previous hook object");
        }

        let mut table = replacement.unwrap_or_else(|| self.table.renew());
        for event in self.queues.keys() {
            if !table.install(event) {
                warn!(event, "unable to install the event trampoline");
            }
        }
        if !table.hook() {
            debug!("unable to attach the hook object");
        }

        self.table = table;
        &self.table
    }

    fn snapshot(&self, event: &str) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .queues
            .get(event)
            .map(|queue| queue.iter().map(|Reverse(entry)| entry.clone()).collect())
            .unwrap_or_default();
        entries.sort();
        entries
    }

    /// Captures the callbacks that a firing of `event` runs.
    ///
    /// Changes made to the registrations after this call, including changes
    /// made by the callbacks themselves, apply to the next firing.
    pub fn prepare(&self, event: &str) -> Invocation {
        let entries = if self.is_disabled(event) {
            Vec::new()
        } else {
            self.snapshot(event)
        };
        Invocation {
            event: event.to_string(),
            entries,
        }
    }

    /// Runs the host's default handler for `event`.
    pub fn finish(&self, event: &str, args: &[EventArg]) -> i64 {
        self.table.call_default(event, args)
    }

    /// Fires `event`: runs its callbacks, then the host's default handler,
    /// whose result is returned.
    pub fn dispatch(&self, event: &str, args: &[EventArg]) -> i64 {
        self.prepare(event).run(args);
        self.finish(event, args)
    }
}

/// The callbacks captured for one firing of an event.
pub struct Invocation {
    event: String,
    entries: Vec<Entry>,
}

impl Invocation {
    /// Returns the event name.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Returns the number of captured callbacks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no callbacks were captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the captured callbacks in order.
    ///
    /// Returns [`HookAction::Stop`] if a callback stopped the firing, failed
    /// or panicked, and [`HookAction::Continue`] if every callback ran.
    pub fn run(&self, args: &[EventArg]) -> HookAction {
        for entry in &self.entries {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(args)));
            match outcome {
                Ok(Ok(HookAction::Continue)) => continue,
                Ok(Ok(HookAction::Stop)) => return HookAction::Stop,
                Ok(Err(err)) => {
                    self.report(entry, &err.to_string());
                    return HookAction::Stop;
                }
                Err(payload) => {
                    self.report(entry, &panic_message(&*payload));
                    return HookAction::Stop;
                }
            }
        }
        HookAction::Continue
    }

    fn report(&self, entry: &Entry, message: &str) {
        error!(
            event = %self.event,
            priority = entry.priority,
            error = message,
            "callback raised an error"
        );
        warn!(
            event = %self.event,
            "callback was registered at {}\n{}",
            entry.site.location,
            entry.site.backtrace
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "callback panicked".to_string())
}
