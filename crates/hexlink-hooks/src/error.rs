//! Error types for hook dispatch.

use thiserror::Error;

/// Error type for hook administration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The host hook object has no event with this name.
    #[error("the hook object has no event named {0:?}")]
    UnknownEvent(String),
}

/// Result type for hook administration.
pub type Result<T> = std::result::Result<T, HookError>;
