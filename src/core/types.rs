/*!
 * Core Types
 * Common types used across the scavenger
 */

/// Physical byte address
pub type PhysAddr = u64;

/// Size in bytes of a physical region
pub type Size = u64;

/// NUMA node identifier passed to the claim primitive as a placement hint
pub type NodeId = u32;

/// Node used when no affinity information is available
pub const DEFAULT_NODE: NodeId = 0;
