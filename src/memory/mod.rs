/*!
 * Memory Module
 * Hidden memory discovery and scavenging
 */

pub mod builder;
pub mod latch;
pub mod manager;
pub mod ranges;
pub mod registry;
pub mod report;
pub mod scavenger;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use builder::ScavengerBuilder;
pub use latch::{LatchState, UnloadLatch};
pub use manager::Scavenger;
pub use ranges::RangeSet;
pub use registry::HiddenBlockRegistry;
pub use report::{coalesce, hidden_blocks_report, ranges_report, BoundedWriter, Hex, Run};
pub use scavenger::ScavengeEngine;
pub use traits::*;
pub use types::*;
