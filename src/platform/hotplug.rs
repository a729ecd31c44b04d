/*!
 * Memory Hotplug
 *
 * Hands blocks to the kernel through `/sys/devices/system/memory`: the
 * address is written to `probe`, which creates the memory block device,
 * and the new block is then onlined through its `state` attribute.
 */

use crate::core::types::{NodeId, PhysAddr, Size, DEFAULT_NODE};
use crate::memory::{BlockSize, ClaimError, ClaimPrimitive, MemoryError, MemoryResult, NodeAffinity};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SysfsHotplug {
    memory_dir: PathBuf,
    node_dir: PathBuf,
    block_size: BlockSize,
}

impl SysfsHotplug {
    /// Use the block size the kernel reports in `block_size_bytes`
    pub fn open(memory_dir: impl Into<PathBuf>, node_dir: impl Into<PathBuf>) -> MemoryResult<Self> {
        let memory_dir = memory_dir.into();
        let path = memory_dir.join("block_size_bytes");
        let text = std::fs::read_to_string(&path).map_err(|e| MemoryError::platform(&path, e))?;
        // Printed as bare hex, without a 0x prefix.
        let bytes = u64::from_str_radix(text.trim(), 16).map_err(|e| MemoryError::platform(&path, e))?;
        let block_size = BlockSize::new(bytes)?;

        info!(block_size = bytes, "Memory block size");
        Ok(Self::with_block_size(memory_dir, node_dir, block_size))
    }

    pub fn with_block_size(
        memory_dir: impl Into<PathBuf>,
        node_dir: impl Into<PathBuf>,
        block_size: BlockSize,
    ) -> Self {
        Self {
            memory_dir: memory_dir.into(),
            node_dir: node_dir.into(),
            block_size,
        }
    }

    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    fn block_index(&self, addr: PhysAddr) -> u64 {
        addr / self.block_size.get()
    }

    fn state_path(&self, addr: PhysAddr) -> PathBuf {
        self.memory_dir
            .join(format!("memory{}", self.block_index(addr)))
            .join("state")
    }

    fn probe(&self, addr: PhysAddr) -> Result<(), ClaimError> {
        let path = self.memory_dir.join("probe");
        write_attr(&path, &format!("{addr:#x}")).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                ClaimError::Unsupported(format!("{} does not exist", path.display()))
            }
            io::ErrorKind::AlreadyExists => ClaimError::AlreadyManaged { addr },
            io::ErrorKind::InvalidInput => ClaimError::Rejected {
                addr,
                reason: e.to_string(),
            },
            _ => io_error(&path, &e),
        })
    }

    fn online(&self, addr: PhysAddr) -> Result<(), ClaimError> {
        let path = self.state_path(addr);

        if std::fs::read_to_string(&path).is_ok_and(|s| s.trim() == "online") {
            debug!(addr, "Block already online");
            return Ok(());
        }

        write_attr(&path, "online").map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ClaimError::Rejected {
                addr,
                reason: format!("no memory block device at {}", path.display()),
            },
            io::ErrorKind::InvalidInput => ClaimError::Rejected {
                addr,
                reason: e.to_string(),
            },
            _ => io_error(&path, &e),
        })
    }
}

impl ClaimPrimitive for SysfsHotplug {
    fn claim(&self, node: NodeId, addr: PhysAddr, size: Size, label: &str) -> Result<(), ClaimError> {
        if size != self.block_size.get() || !self.block_size.is_aligned(addr) {
            return Err(ClaimError::Rejected {
                addr,
                reason: format!("claims must be exactly one aligned {:#x} byte block", self.block_size.get()),
            });
        }

        // Placement and labelling are left to the kernel on this path.
        debug!(addr, node, label, "Probing memory block");
        self.probe(addr)?;
        self.online(addr)
    }
}

impl NodeAffinity for SysfsHotplug {
    /// Node owning the memory block, or the nearest lower block on any node
    fn node_for(&self, addr: PhysAddr) -> NodeId {
        let target = self.block_index(addr);
        let mut best: Option<(u64, NodeId)> = None;

        let Ok(nodes) = std::fs::read_dir(&self.node_dir) else {
            return DEFAULT_NODE;
        };
        for node in nodes.filter_map(Result::ok) {
            let Some(node_id) = node
                .file_name()
                .to_str()
                .and_then(|n| n.strip_prefix("node"))
                .and_then(|n| n.parse::<NodeId>().ok())
            else {
                continue;
            };
            let Ok(blocks) = std::fs::read_dir(node.path()) else {
                continue;
            };
            for block in blocks.filter_map(Result::ok) {
                let Some(index) = block
                    .file_name()
                    .to_str()
                    .and_then(|n| n.strip_prefix("memory"))
                    .and_then(|n| n.parse::<u64>().ok())
                else {
                    continue;
                };
                if index <= target && best.map_or(true, |(b, _)| index > b) {
                    best = Some((index, node_id));
                }
            }
        }

        best.map_or(DEFAULT_NODE, |(_, node)| node)
    }
}

fn write_attr(path: &Path, value: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    file.write_all(value.as_bytes())
}

fn io_error(path: &Path, e: &io::Error) -> ClaimError {
    ClaimError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
