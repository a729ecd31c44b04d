/*!
 * Scavenger Builder
 * Start-up sequencing: range set, then discovery, then the engine
 */

use super::latch::UnloadLatch;
use super::manager::Scavenger;
use super::ranges::RangeSet;
use super::registry::HiddenBlockRegistry;
use super::scavenger::ScavengeEngine;
use super::traits::{
    ClaimPrimitive, FirmwareMemoryMap, HardwareTree, ModuleRef, NodeAffinity, OwnershipOracle,
};
use super::types::{BlockSize, MemoryError, MemoryResult};
use crate::core::lifecycle::Lifecycle;
use crate::core::limits::{CLAIM_LABEL, MAX_HIDDEN_BLOCKS, MAX_RAM_RANGES};
use crate::core::types::{PhysAddr, DEFAULT_NODE};
use std::sync::Arc;
use tracing::{error, info};

/// Builder for [`Scavenger`]
pub struct ScavengerBuilder {
    firmware_map: Option<Box<dyn FirmwareMemoryMap>>,
    hardware_tree: Option<Box<dyn HardwareTree>>,
    oracle: Option<Arc<dyn OwnershipOracle>>,
    claimer: Option<Arc<dyn ClaimPrimitive>>,
    nodes: Option<Arc<dyn NodeAffinity>>,
    module: Option<Arc<dyn ModuleRef>>,
    block_size: Option<BlockSize>,
    max_ranges: usize,
    max_hidden_blocks: usize,
    label: String,
}

impl ScavengerBuilder {
    pub fn new() -> Self {
        Self {
            firmware_map: None,
            hardware_tree: None,
            oracle: None,
            claimer: None,
            nodes: None,
            module: None,
            block_size: None,
            max_ranges: MAX_RAM_RANGES,
            max_hidden_blocks: MAX_HIDDEN_BLOCKS,
            label: CLAIM_LABEL.to_string(),
        }
    }

    /// Firmware memory map, preferred whenever present
    pub fn with_firmware_map(mut self, map: impl FirmwareMemoryMap + 'static) -> Self {
        self.firmware_map = Some(Box::new(map));
        self
    }

    /// Device-tree fallback, consulted only without a firmware map
    pub fn with_hardware_tree(mut self, tree: impl HardwareTree + 'static) -> Self {
        self.hardware_tree = Some(Box::new(tree));
        self
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn OwnershipOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_claimer(mut self, claimer: Arc<dyn ClaimPrimitive>) -> Self {
        self.claimer = Some(claimer);
        self
    }

    /// NUMA lookup; every block goes to node 0 without one
    pub fn with_node_affinity(mut self, nodes: Arc<dyn NodeAffinity>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Reference taken by the unload latch; a private [`Lifecycle`] without one
    pub fn with_module_ref(mut self, module: Arc<dyn ModuleRef>) -> Self {
        self.module = Some(module);
        self
    }

    pub fn with_block_size(mut self, block_size: BlockSize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    /// Storage limits for the range set and the hidden block registry
    pub fn with_limits(mut self, max_ranges: usize, max_hidden_blocks: usize) -> Self {
        self.max_ranges = max_ranges;
        self.max_hidden_blocks = max_hidden_blocks;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Load RAM ranges, discover hidden blocks and assemble the subsystem
    ///
    /// Any failure discards everything built so far.
    pub fn build(self) -> MemoryResult<Scavenger> {
        let block_size = self
            .block_size
            .ok_or_else(|| MemoryError::invalid_argument("block size not set"))?;
        let oracle = self
            .oracle
            .ok_or_else(|| MemoryError::invalid_argument("ownership oracle not set"))?;
        let claimer = self
            .claimer
            .ok_or_else(|| MemoryError::invalid_argument("claim primitive not set"))?;
        let nodes: Arc<dyn NodeAffinity> = match self.nodes {
            Some(nodes) => nodes,
            None => Arc::new(|_: PhysAddr| DEFAULT_NODE),
        };
        let module: Arc<dyn ModuleRef> = match self.module {
            Some(module) => module,
            None => Arc::new(Lifecycle::new()),
        };

        let (ranges, source) = RangeSet::discover(
            self.firmware_map.as_deref(),
            self.hardware_tree.as_deref(),
            self.max_ranges,
        )?;

        let registry = HiddenBlockRegistry::discover(
            &ranges,
            block_size,
            oracle.as_ref(),
            self.max_hidden_blocks,
        )
        .map_err(|e| {
            error!(error = %e, "Start-up aborted, RAM ranges released");
            e
        })?;

        info!(
            source = %source,
            ranges = ranges.len(),
            hidden_blocks = registry.len(),
            "Scavenger ready"
        );

        let engine = ScavengeEngine::new(
            block_size,
            registry,
            claimer,
            nodes,
            UnloadLatch::new(module),
            self.label,
        );
        Ok(Scavenger::from_parts(ranges, source, engine))
    }
}

impl Default for ScavengerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
