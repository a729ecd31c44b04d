/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use thiserror::Error;

pub use super::config::ConfigError;
pub use super::lifecycle::LifecycleError;
pub use crate::control::ControlError;
pub use crate::memory::{ClaimError, MemoryError};

/// Unified error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum ScavengerError {
    #[error("Memory error: {0}")]
    #[diagnostic(transparent)]
    Memory(#[from] MemoryError),

    #[error("Control error: {0}")]
    #[diagnostic(transparent)]
    Control(#[from] ControlError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Lifecycle error: {0}")]
    #[diagnostic(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(scavenger::io_error),
        help("Socket or filesystem operation failed. Check paths and permissions.")
    )]
    Io(#[from] std::io::Error),
}

/// Common result type for subsystem-level operations
pub type ScavengerResult<T> = Result<T, ScavengerError>;
