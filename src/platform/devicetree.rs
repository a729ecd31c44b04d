/*!
 * Device-Tree Memory Nodes
 *
 * Reads the flattened device-tree exported as a directory hierarchy
 * (`/proc/device-tree`): every node whose `device_type` is `memory`
 * contributes its `reg` entries, decoded with the parent's
 * `#address-cells` and `#size-cells`.
 */

use crate::core::limits::{DT_DEFAULT_ADDRESS_CELLS, DT_DEFAULT_SIZE_CELLS};
use crate::core::types::{PhysAddr, Size};
use crate::memory::{HardwareTree, MemoryError, MemoryResult};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DeviceTree {
    root: PathBuf,
}

impl DeviceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn walk(&self, node: &Path, out: &mut Vec<(PhysAddr, Size)>) -> MemoryResult<()> {
        // Cell counts a node declares apply to its children.
        let address_cells = read_cells(&node.join("#address-cells"))?.unwrap_or(DT_DEFAULT_ADDRESS_CELLS);
        let size_cells = read_cells(&node.join("#size-cells"))?.unwrap_or(DT_DEFAULT_SIZE_CELLS);

        let read_dir = std::fs::read_dir(node).map_err(|e| MemoryError::platform(node, e))?;
        let mut children: Vec<PathBuf> = read_dir
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .map(|entry| entry.path())
            .collect();
        children.sort();

        for child in children {
            if is_memory_node(&child) {
                let reg_path = child.join("reg");
                match std::fs::read(&reg_path) {
                    Ok(data) => {
                        let regs = parse_reg(&data, address_cells, size_cells)
                            .map_err(|e| MemoryError::platform(&reg_path, e))?;
                        debug!(node = %child.display(), entries = regs.len(), "Memory node");
                        out.extend(regs);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(MemoryError::platform(&reg_path, e)),
                }
            }
            self.walk(&child, out)?;
        }

        Ok(())
    }
}

impl HardwareTree for DeviceTree {
    fn is_present(&self) -> bool {
        self.root.is_dir()
    }

    fn memory_regs(&self) -> MemoryResult<Vec<(PhysAddr, Size)>> {
        let mut regs = Vec::new();
        self.walk(&self.root, &mut regs)?;
        Ok(regs)
    }
}

fn is_memory_node(node: &Path) -> bool {
    std::fs::read(node.join("device_type"))
        .map(|data| trim_nul(&data) == b"memory")
        .unwrap_or(false)
}

fn trim_nul(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == 0) {
        Some(end) => &data[..end],
        None => data,
    }
}

fn read_cells(path: &Path) -> MemoryResult<Option<u32>> {
    match std::fs::read(path) {
        Ok(data) => {
            let bytes: [u8; 4] = data
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| MemoryError::platform(path, "cell count shorter than 4 bytes"))?;
            Ok(Some(u32::from_be_bytes(bytes)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MemoryError::platform(path, e)),
    }
}

/// Combine big-endian cells into one number
///
/// Cells above the low two must be zero.
fn read_number(cells: &[u8]) -> Result<u64, String> {
    let (high, low) = cells.split_at(cells.len().saturating_sub(8));
    if high.iter().any(|&b| b != 0) {
        return Err(format!("value {cells:02x?} does not fit in 64 bits"));
    }
    Ok(low
        .chunks_exact(4)
        .fold(0u64, |acc, c| (acc << 32) | u64::from(u32::from_be_bytes([c[0], c[1], c[2], c[3]]))))
}

/// Decode a `reg` property into `(address, size)` pairs
pub fn parse_reg(data: &[u8], address_cells: u32, size_cells: u32) -> Result<Vec<(PhysAddr, Size)>, String> {
    if address_cells == 0 {
        return Err("#address-cells is zero".to_string());
    }
    let addr_len = address_cells as usize * 4;
    let entry_len = addr_len + size_cells as usize * 4;
    if data.len() % entry_len != 0 {
        return Err(format!(
            "reg length {} is not a multiple of {} byte entries",
            data.len(),
            entry_len
        ));
    }

    data.chunks_exact(entry_len)
        .map(|entry| {
            let (addr, size) = entry.split_at(addr_len);
            Ok((read_number(addr)?, read_number(size)?))
        })
        .collect()
}
