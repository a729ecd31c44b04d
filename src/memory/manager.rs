/*!
 * Scavenger
 *
 * The one subsystem instance: the RAM range set, the scavenge engine with
 * its hidden block registry, and the unload latch. Built once at start-up by
 * [`ScavengerBuilder`](super::builder::ScavengerBuilder) and shared by
 * reference with the control surface afterwards.
 */

use super::builder::ScavengerBuilder;
use super::latch::LatchState;
use super::ranges::RangeSet;
use super::report;
use super::scavenger::ScavengeEngine;
use super::types::{BlockSize, MemoryResult, RangeSource, ScavengerStats};
use crate::core::types::PhysAddr;

#[derive(Debug)]
pub struct Scavenger {
    ranges: RangeSet,
    source: RangeSource,
    engine: ScavengeEngine,
}

impl Scavenger {
    pub fn builder() -> ScavengerBuilder {
        ScavengerBuilder::new()
    }

    pub(super) fn from_parts(ranges: RangeSet, source: RangeSource, engine: ScavengeEngine) -> Self {
        Self {
            ranges,
            source,
            engine,
        }
    }

    /// Raw RAM ranges, one line each
    pub fn ranges_report(&self, capacity: usize) -> String {
        report::ranges_report(&self.ranges, capacity)
    }

    /// Remaining hidden blocks, coalesced into runs
    pub fn hidden_blocks_report(&self, capacity: usize) -> String {
        self.engine.hidden_blocks_report(capacity)
    }

    /// See [`ScavengeEngine::scavenge`]
    pub fn scavenge(&self, requested: u64) -> MemoryResult<u64> {
        self.engine.scavenge(requested)
    }

    /// See [`ScavengeEngine::probe`]
    #[cfg(feature = "debug-probe")]
    pub fn probe(&self, addr: PhysAddr) -> MemoryResult<()> {
        self.engine.probe(addr)
    }

    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    pub fn source(&self) -> RangeSource {
        self.source
    }

    pub fn block_size(&self) -> BlockSize {
        self.engine.block_size()
    }

    pub fn hidden_blocks(&self) -> Vec<PhysAddr> {
        self.engine.hidden_blocks()
    }

    pub fn hidden_count(&self) -> usize {
        self.engine.hidden_count()
    }

    pub fn latch_state(&self) -> LatchState {
        self.engine.latch().state()
    }

    pub fn is_pinned(&self) -> bool {
        self.engine.latch().is_pinned()
    }

    pub fn stats(&self) -> ScavengerStats {
        ScavengerStats {
            block_size: self.block_size().get(),
            source: self.source,
            ranges: self.ranges.len(),
            hidden_blocks: self.hidden_count(),
            pinned: self.is_pinned(),
        }
    }
}
