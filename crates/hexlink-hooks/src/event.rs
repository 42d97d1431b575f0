//! Events, callbacks and the host hook object.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

/// A positional argument of a host event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventArg {
    Int(i64),
    Address(u64),
    Bool(bool),
    Str(String),
    None,
}

impl EventArg {
    /// Returns the argument as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Address(v) => i64::try_from(*v).ok(),
            Self::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Returns the argument as an address, if it is one.
    pub fn as_address(&self) -> Option<u64> {
        match self {
            Self::Address(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the argument as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for EventArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Address(v) => write!(f, "{:#x}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::None => write!(f, "None"),
        }
    }
}

/// What a callback asks the dispatcher to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookAction {
    /// Run the next callback.
    Continue,
    /// Skip the remaining callbacks for this firing.
    Stop,
}

/// Result returned by a callback.
pub type HookResult = Result<HookAction, Box<dyn Error>>;

/// A registered callback. Identity is the `Rc` allocation.
pub type Callback = Rc<dyn Fn(&[EventArg]) -> HookResult>;

/// The host's hook object.
///
/// The host calls back into the toolkit only for the events whose
/// trampoline is installed, and provides a default handler for each event
/// that must run after the toolkit's callbacks.
pub trait HookTable {
    /// Returns true if the hook object knows the event.
    fn has_event(&self, event: &str) -> bool;

    /// Routes the event through the dispatcher.
    fn install(&mut self, event: &str) -> bool;

    /// Stops routing the event through the dispatcher.
    fn uninstall(&mut self, event: &str) -> bool;

    /// Attaches the hook object to the host.
    fn hook(&mut self) -> bool;

    /// Detaches the hook object from the host.
    fn unhook(&mut self) -> bool;

    /// Runs the host's own handling of the event.
    fn call_default(&self, event: &str, args: &[EventArg]) -> i64;

    /// Creates a fresh, unhooked hook object of the same kind.
    fn renew(&self) -> Self
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_conversions() {
        assert_eq!(EventArg::Int(5).as_int(), Some(5));
        assert_eq!(EventArg::Bool(true).as_int(), Some(1));
        assert_eq!(EventArg::Address(0x401000).as_address(), Some(0x401000));
        assert_eq!(EventArg::Int(-1).as_address(), None);
        assert_eq!(EventArg::Str("metapc".into()).as_str(), Some("metapc"));
        assert_eq!(EventArg::None.as_int(), None);
    }

    #[test]
    fn test_arg_display() {
        assert_eq!(EventArg::Address(0x10).to_string(), "0x10");
        assert_eq!(EventArg::Str("pc".into()).to_string(), "\"pc\"");
    }
}
