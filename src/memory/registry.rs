/*!
 * Hidden Block Registry
 *
 * Discovers block-aligned RAM that firmware reports but nothing claims, and
 * holds it in ascending address order until the scavenger drains it.
 *
 * ## Discovery
 *
 * For every range, candidates start at the first block boundary at or above
 * `range.start` and advance one block at a time while
 * `addr + block_size < range.end`. The bound is strict: a block ending
 * exactly on the last byte of a range is never a candidate. Each candidate is
 * classified independently by the ownership oracle.
 */

use super::ranges::RangeSet;
use super::traits::OwnershipOracle;
use super::types::{BlockSize, HiddenBlock, MemoryError, MemoryResult, Range};
use crate::core::limits::MAX_HIDDEN_BLOCKS;
use crate::core::types::PhysAddr;
use std::collections::VecDeque;
use tracing::{debug, error, info, warn};

/// Ordered hidden blocks, oldest (lowest address) first
#[derive(Debug)]
pub struct HiddenBlockRegistry {
    blocks: VecDeque<HiddenBlock>,
    // Tracked alongside `blocks`; compared at teardown.
    count: usize,
    limit: usize,
}

impl HiddenBlockRegistry {
    pub fn new() -> Self {
        Self::with_limit(MAX_HIDDEN_BLOCKS)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            blocks: VecDeque::new(),
            count: 0,
            limit,
        }
    }

    /// Walk `ranges` once and collect every unclaimed block
    ///
    /// # Errors
    ///
    /// `OutOfMemory` if registry storage cannot grow; the partial registry
    /// is purged before returning.
    pub fn discover(
        ranges: &RangeSet,
        block_size: BlockSize,
        oracle: &dyn OwnershipOracle,
        limit: usize,
    ) -> MemoryResult<Self> {
        let mut registry = Self::with_limit(limit);

        for range in ranges {
            if let Err(e) = registry.scan_range(range, block_size, oracle) {
                error!(error = %e, "Failed to search for hidden memory blocks");
                registry.purge();
                return Err(e);
            }
        }

        info!(
            hidden_blocks = registry.len(),
            block_size = block_size.get(),
            "Hidden block discovery complete"
        );
        Ok(registry)
    }

    fn scan_range(
        &mut self,
        range: &Range,
        block_size: BlockSize,
        oracle: &dyn OwnershipOracle,
    ) -> MemoryResult<()> {
        let size = block_size.get();
        let Some(mut addr) = block_size.align_up(range.start) else {
            return Ok(());
        };

        while let Some(next) = addr.checked_add(size) {
            if next >= range.end {
                break;
            }
            if oracle.region_is_disjoint(addr, size) {
                self.push(addr)?;
            } else {
                debug!(addr, "Block already claimed");
            }
            addr = next;
        }

        Ok(())
    }

    /// Append a block at the back
    pub fn push(&mut self, addr: PhysAddr) -> MemoryResult<()> {
        if self.blocks.len() >= self.limit || self.blocks.try_reserve(1).is_err() {
            return Err(MemoryError::OutOfMemory {
                what: "hidden block",
                len: self.blocks.len(),
            });
        }

        self.blocks.push_back(HiddenBlock::new(addr));
        self.count += 1;
        Ok(())
    }

    /// Remove and return the lowest-address block
    pub fn pop_front(&mut self) -> Option<HiddenBlock> {
        let block = self.blocks.pop_front()?;
        self.count -= 1;
        Some(block)
    }

    /// Drop every block
    pub fn purge(&mut self) {
        while self.pop_front().is_some() {}
        self.blocks = VecDeque::new();

        if self.count != 0 {
            warn!(count = self.count, "Hidden block count out of sync after purge");
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn front(&self) -> Option<&HiddenBlock> {
        self.blocks.front()
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, HiddenBlock> {
        self.blocks.iter()
    }
}

impl Default for HiddenBlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a HiddenBlockRegistry {
    type Item = &'a HiddenBlock;
    type IntoIter = std::collections::vec_deque::Iter<'a, HiddenBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl Drop for HiddenBlockRegistry {
    fn drop(&mut self) {
        if self.count != self.blocks.len() {
            warn!(
                count = self.count,
                len = self.blocks.len(),
                "Hidden block count does not match registry length"
            );
        }
    }
}
