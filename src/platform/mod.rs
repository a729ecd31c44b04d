/*!
 * Platform Module
 * Linux host implementations of the scavenger collaborators
 */

pub mod devicetree;
pub mod hotplug;
pub mod iomem;
pub mod memmap;

pub use devicetree::DeviceTree;
pub use hotplug::SysfsHotplug;
pub use iomem::IomemSnapshot;
pub use memmap::SysfsMemmap;

use crate::core::config::ScavengerConfig;
use crate::core::lifecycle::Lifecycle;
use crate::memory::{BlockSize, MemoryResult, ScavengerBuilder};
use std::sync::Arc;

/// Every collaborator the scavenger needs, read from the running host
#[derive(Debug)]
pub struct LinuxPlatform {
    pub memmap: SysfsMemmap,
    pub device_tree: DeviceTree,
    pub iomem: IomemSnapshot,
    pub hotplug: Arc<SysfsHotplug>,
}

impl LinuxPlatform {
    /// Locate every collaborator under the configured sysfs/procfs roots
    pub fn from_config(config: &ScavengerConfig) -> MemoryResult<Self> {
        let hotplug = match config.block_size {
            Some(bytes) => SysfsHotplug::with_block_size(
                config.memory_dir(),
                config.node_dir(),
                BlockSize::new(bytes)?,
            ),
            None => SysfsHotplug::open(config.memory_dir(), config.node_dir())?,
        };

        Ok(Self {
            memmap: SysfsMemmap::new(config.firmware_memmap_dir()),
            device_tree: DeviceTree::new(&config.device_tree_dir),
            iomem: IomemSnapshot::load(&config.iomem_path())?,
            hotplug: Arc::new(hotplug),
        })
    }

    pub fn block_size(&self) -> BlockSize {
        self.hotplug.block_size()
    }

    /// Builder wired to this host, pinning through `lifecycle`
    pub fn into_builder(self, config: &ScavengerConfig, lifecycle: Arc<Lifecycle>) -> ScavengerBuilder {
        let block_size = self.block_size();
        ScavengerBuilder::new()
            .with_firmware_map(self.memmap)
            .with_hardware_tree(self.device_tree)
            .with_oracle(Arc::new(self.iomem))
            .with_claimer(self.hotplug.clone())
            .with_node_affinity(self.hotplug)
            .with_module_ref(lifecycle)
            .with_block_size(block_size)
            .with_limits(config.max_ranges, config.max_hidden_blocks)
            .with_label(config.claim_label.clone())
    }
}
