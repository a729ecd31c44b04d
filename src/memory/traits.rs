/*!
 * Memory Traits
 * Collaborators consumed by the scavenger core
 */

use super::types::*;
use crate::core::types::{NodeId, PhysAddr, Size};

/// Answers whether a physical region is already claimed by the owning
/// system's resource registry
pub trait OwnershipOracle: Send + Sync {
    /// True only when no part of `[addr, addr + size)` is claimed
    fn region_is_disjoint(&self, addr: PhysAddr, size: Size) -> bool;
}

impl<F> OwnershipOracle for F
where
    F: Fn(PhysAddr, Size) -> bool + Send + Sync,
{
    fn region_is_disjoint(&self, addr: PhysAddr, size: Size) -> bool {
        self(addr, size)
    }
}

/// Hands a block over to the owning system's memory management
pub trait ClaimPrimitive: Send + Sync {
    /// Request management of `[addr, addr + size)` on `node`, labelled
    /// `label` in the owning system's resource registry
    fn claim(&self, node: NodeId, addr: PhysAddr, size: Size, label: &str)
        -> Result<(), ClaimError>;
}

/// NUMA placement hint for a physical address
pub trait NodeAffinity: Send + Sync {
    fn node_for(&self, addr: PhysAddr) -> NodeId;
}

impl<F> NodeAffinity for F
where
    F: Fn(PhysAddr) -> NodeId + Send + Sync,
{
    fn node_for(&self, addr: PhysAddr) -> NodeId {
        self(addr)
    }
}

/// Reference that keeps the subsystem from being torn down
pub trait ModuleRef: Send + Sync {
    /// Acquire one reference; false if teardown can no longer be prevented
    fn try_get(&self) -> bool;
}

/// Firmware-provided memory map (EFI/e820 style)
pub trait FirmwareMemoryMap {
    /// Whether the running environment exposes a firmware map at all
    fn is_present(&self) -> bool;

    /// Every entry of the map, in firmware order
    fn entries(&self) -> MemoryResult<Vec<FirmwareEntry>>;
}

/// Hardware description tree memory nodes
pub trait HardwareTree {
    fn is_present(&self) -> bool;

    /// `(address, size)` register entries of every memory node
    fn memory_regs(&self) -> MemoryResult<Vec<(PhysAddr, Size)>>;
}
