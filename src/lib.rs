/*!
 * memscav Library
 *
 * Finds physical RAM that firmware reports but the running kernel does not
 * manage, and hands it over on request.
 */

pub mod control;
pub mod core;
pub mod memory;
pub mod monitoring;
pub mod platform;

// Re-exports
pub use crate::core::{Lifecycle, ScavengerConfig, ScavengerError, ScavengerResult};
pub use control::{ControlSurface, Entry};
pub use memory::{BlockSize, MemoryError, MemoryResult, Scavenger, ScavengerBuilder};
pub use monitoring::init_tracing;
pub use platform::LinuxPlatform;
