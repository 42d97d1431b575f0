//! # hexlink-hooks
//!
//! Lets several independent callbacks observe the host's lifecycle events.
//!
//! The host exposes its events through a hook object (see [`HookTable`])
//! with one default handler per event. A [`PriorityHook`] installs a single
//! trampoline per event on that object and fans each firing out to the
//! registered callbacks in priority order. A callback can end the fan-out
//! early by returning [`HookAction::Stop`]; a callback that fails or panics
//! is logged together with the place it was registered from and treated
//! as a stop, so it cannot break its siblings. The host's default handler
//! always runs last.

pub mod dispatcher;
pub mod error;
pub mod event;

pub use dispatcher::{Invocation, PriorityHook, DEFAULT_PRIORITY};
pub use error::{HookError, Result};
pub use event::{Callback, EventArg, HookAction, HookResult, HookTable};
