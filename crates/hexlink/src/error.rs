//! Error types for configuration loading and the interface context.

use std::io;

use thiserror::Error;

use hexlink_core::Error as RegisterError;
use hexlink_hooks::HookError;

/// Errors raised while loading or validating an [`InterfaceConfig`](crate::InterfaceConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("architecture {name} is invalid: {source}")]
    Architecture {
        name: String,
        #[source]
        source: RegisterError,
    },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Errors raised by the interface context.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Result type for the interface context.
pub type Result<T> = std::result::Result<T, Error>;
