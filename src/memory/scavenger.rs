/*!
 * Scavenge Engine
 *
 * Drains the hidden block registry on demand, handing every popped block to
 * the claim primitive. Blocks are consumed by the attempt, not by its
 * outcome: a failed claim leaves the block in an unknown state, so it is
 * dropped rather than re-queued.
 */

use super::latch::UnloadLatch;
use super::registry::HiddenBlockRegistry;
use super::report;
use super::traits::{ClaimPrimitive, NodeAffinity};
use super::types::{BlockSize, HiddenBlock, MemoryError, MemoryResult};
use crate::core::types::PhysAddr;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct ScavengeEngine {
    block_size: BlockSize,
    registry: Mutex<HiddenBlockRegistry>,
    claimer: Arc<dyn ClaimPrimitive>,
    nodes: Arc<dyn NodeAffinity>,
    latch: UnloadLatch,
    #[cfg_attr(not(feature = "debug-probe"), allow(dead_code))]
    probe_lock: Mutex<()>,
    label: String,
}

impl ScavengeEngine {
    pub fn new(
        block_size: BlockSize,
        registry: HiddenBlockRegistry,
        claimer: Arc<dyn ClaimPrimitive>,
        nodes: Arc<dyn NodeAffinity>,
        latch: UnloadLatch,
        label: impl Into<String>,
    ) -> Self {
        Self {
            block_size,
            registry: Mutex::new(registry),
            claimer,
            nodes,
            latch,
            probe_lock: Mutex::new(()),
            label: label.into(),
        }
    }

    /// Claim up to `requested` bytes worth of hidden blocks, lowest first
    ///
    /// Returns the bytes consumed by attempts. Claim failures are logged and
    /// absorbed; the caller learns nothing about individual outcomes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `requested` is zero or not a whole number of
    /// blocks. The registry is untouched in that case.
    #[instrument(skip(self), fields(block_size = self.block_size.get()))]
    pub fn scavenge(&self, requested: u64) -> MemoryResult<u64> {
        let size = self.block_size.get();

        // Only add entire memory blocks.
        if requested == 0 || !self.block_size.is_multiple(requested) {
            return Err(MemoryError::invalid_argument(format!(
                "{requested:#x} is not a non-zero multiple of the block size {size:#x}"
            )));
        }

        let mut remaining = requested;
        while remaining >= size {
            let Some(block) = self.pop_front() else {
                break;
            };
            self.claim_block(block);
            remaining -= size;
        }

        let consumed = requested - remaining;
        if consumed > 0 {
            // One way ticket.
            self.latch.pin();
        }

        info!(requested, consumed, "Scavenge complete");
        Ok(consumed)
    }

    fn pop_front(&self) -> Option<HiddenBlock> {
        self.registry.lock().pop_front()
    }

    fn claim_block(&self, block: HiddenBlock) {
        let node = self.nodes.node_for(block.addr);
        match self
            .claimer
            .claim(node, block.addr, self.block_size.get(), &self.label)
        {
            Ok(()) => info!(addr = block.addr, node, "Recovered hidden block"),
            Err(e) => warn!(
                error = %e,
                "Failed to recover {:#x}-{:#x}, removing.",
                block.addr,
                block.end(self.block_size)
            ),
        }
    }

    /// Claim one arbitrary aligned block, bypassing the registry
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a misaligned address; the claim primitive's
    /// own error otherwise.
    #[cfg(feature = "debug-probe")]
    #[instrument(skip(self), fields(block_size = self.block_size.get()))]
    pub fn probe(&self, addr: PhysAddr) -> MemoryResult<()> {
        if !self.block_size.is_aligned(addr) {
            return Err(MemoryError::invalid_argument(format!(
                "{addr:#x} is not aligned to the block size {:#x}",
                self.block_size.get()
            )));
        }

        let _guard = self.probe_lock.lock();
        let node = self.nodes.node_for(addr);
        self.claimer
            .claim(node, addr, self.block_size.get(), &self.label)?;

        info!(addr, node, "Probed block claimed");
        self.latch.pin();
        Ok(())
    }

    /// Coalesced listing of the remaining hidden blocks
    pub fn hidden_blocks_report(&self, capacity: usize) -> String {
        let registry = self.registry.lock();
        report::hidden_blocks_report(registry.iter(), self.block_size, capacity)
    }

    /// Snapshot of the remaining block addresses, lowest first
    pub fn hidden_blocks(&self) -> Vec<PhysAddr> {
        self.registry.lock().iter().map(|b| b.addr).collect()
    }

    pub fn hidden_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    pub fn latch(&self) -> &UnloadLatch {
        &self.latch
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Debug for ScavengeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScavengeEngine")
            .field("block_size", &self.block_size)
            .field("hidden_blocks", &self.hidden_count())
            .field("latch", &self.latch)
            .finish()
    }
}
