/*!
 * RAM Range Set
 * Installed RAM as reported by exactly one firmware source
 */

use super::traits::{FirmwareMemoryMap, HardwareTree};
use super::types::{MemoryError, MemoryResult, Range, RangeSource};
use crate::core::limits::MAX_RAM_RANGES;
use crate::core::types::{PhysAddr, Size};
use tracing::{debug, error, info};

/// Ordered set of disjoint RAM ranges
///
/// Adjacent input ranges are kept as given; the set never merges them.
#[derive(Debug, Clone)]
pub struct RangeSet {
    ranges: Vec<Range>,
    limit: usize,
}

impl RangeSet {
    pub fn new() -> Self {
        Self::with_limit(MAX_RAM_RANGES)
    }

    /// Set whose storage cannot grow past `limit` entries
    pub fn with_limit(limit: usize) -> Self {
        Self {
            ranges: Vec::new(),
            limit,
        }
    }

    /// Append `[base, base + size - 1]`
    ///
    /// # Errors
    ///
    /// `OutOfMemory` when storage cannot grow, `InvalidArgument` for an
    /// empty or overflowing range. Either way the whole set is released.
    pub fn add(&mut self, base: PhysAddr, size: Size) -> MemoryResult<()> {
        let Some(range) = Range::from_base_size(base, size) else {
            self.clear();
            return Err(MemoryError::invalid_argument(format!(
                "range at {base:#x} with size {size:#x} is empty or overflows"
            )));
        };

        if self.ranges.len() >= self.limit || self.ranges.try_reserve(1).is_err() {
            let len = self.ranges.len();
            self.clear();
            return Err(MemoryError::OutOfMemory { what: "RAM range", len });
        }

        self.ranges.push(range);
        Ok(())
    }

    /// Order entries ascending by start address
    pub fn sort(&mut self) {
        self.ranges.sort_unstable_by_key(|r| r.start);
    }

    /// Release every entry
    pub fn clear(&mut self) {
        self.ranges = Vec::new();
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Range> {
        self.ranges.iter()
    }

    pub fn as_slice(&self) -> &[Range] {
        &self.ranges
    }

    /// Total bytes covered by all ranges
    pub fn total_bytes(&self) -> u64 {
        self.ranges.iter().map(Range::len).fold(0, u64::saturating_add)
    }

    /// Populate from the usable RAM entries of a firmware memory map
    pub fn from_firmware_map(map: &dyn FirmwareMemoryMap, limit: usize) -> MemoryResult<Self> {
        let mut set = Self::with_limit(limit);

        for entry in map.entries()? {
            if !entry.kind.is_usable() {
                continue;
            }
            if entry.size == 0 {
                debug!(base = entry.base, "Skipping empty firmware map entry");
                continue;
            }
            set.add(entry.base, entry.size)?;
        }

        // The firmware map has no ordering requirement.
        set.sort();
        Ok(set)
    }

    /// Populate from the `reg` entries of every device-tree memory node
    pub fn from_hardware_tree(tree: &dyn HardwareTree, limit: usize) -> MemoryResult<Self> {
        let mut set = Self::with_limit(limit);

        for (address, size) in tree.memory_regs()? {
            if size == 0 {
                debug!(address, "Skipping empty memory node reg entry");
                continue;
            }
            set.add(address, size)?;
        }

        // The device-tree has no ordering requirement either.
        set.sort();
        Ok(set)
    }

    /// Build from the highest-priority source available
    ///
    /// The firmware map wins whenever it is present; the device-tree is only
    /// consulted without one. The two are never merged.
    pub fn discover(
        firmware: Option<&dyn FirmwareMemoryMap>,
        tree: Option<&dyn HardwareTree>,
        limit: usize,
    ) -> MemoryResult<(Self, RangeSource)> {
        let (result, source) = match (firmware, tree) {
            (Some(map), _) if map.is_present() => (
                Self::from_firmware_map(map, limit),
                RangeSource::FirmwareMap,
            ),
            (_, Some(tree)) if tree.is_present() => (
                Self::from_hardware_tree(tree, limit),
                RangeSource::HardwareTree,
            ),
            _ => {
                error!("Neither a firmware memory map nor a device-tree is available");
                return Err(MemoryError::source_unavailable(
                    "no firmware memory map or device-tree present",
                ));
            }
        };

        let set = result.map_err(|e| {
            error!(source = %source, error = %e, "Failed to read RAM ranges");
            e
        })?;

        if set.is_empty() {
            error!(source = %source, "No usable RAM ranges reported");
            return Err(MemoryError::source_unavailable(format!(
                "{source} reported no usable RAM"
            )));
        }

        info!(
            source = %source,
            ranges = set.len(),
            bytes = set.total_bytes(),
            "RAM ranges loaded"
        );
        Ok((set, source))
    }
}

impl Default for RangeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a Range;
    type IntoIter = std::slice::Iter<'a, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
