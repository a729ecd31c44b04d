/*!
 * Core Module
 * Fundamental types, configuration and error handling
 */

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use config::{ConfigError, ConfigResult, ScavengerConfig};
pub use errors::*;
pub use lifecycle::{Lifecycle, LifecycleError};
pub use types::*;
