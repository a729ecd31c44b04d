/*!
 * I/O Memory Resource Snapshot
 *
 * Top-level entries of `/proc/iomem`: everything the running kernel has
 * claimed in the physical address space. Nested entries are covered by
 * their parents and skipped.
 */

use crate::core::types::{PhysAddr, Size};
use crate::memory::{MemoryError, MemoryResult, OwnershipOracle, Range};
use std::path::Path;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IomemSnapshot {
    resources: Vec<(Range, String)>,
}

impl IomemSnapshot {
    /// Read and parse `path`
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, is malformed, or has its
    /// addresses hidden (every entry reads as zero for unprivileged readers).
    /// A redacted snapshot would report every block as free.
    pub fn load(path: &Path) -> MemoryResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| MemoryError::platform(path, e))?;
        let snapshot = Self::parse(&text).map_err(|e| MemoryError::platform(path, e))?;

        if snapshot.is_redacted() {
            error!(path = %path.display(), "Resource addresses are hidden, run with CAP_SYS_ADMIN");
            return Err(MemoryError::platform(path, "resource addresses are redacted"));
        }

        debug!(resources = snapshot.resources.len(), "Resource snapshot loaded");
        Ok(snapshot)
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let mut resources = Vec::new();

        for line in text.lines() {
            if line.is_empty() || line.starts_with(char::is_whitespace) {
                continue;
            }
            let (span, name) = line
                .split_once(" : ")
                .ok_or_else(|| format!("malformed line {line:?}"))?;
            let (start, end) = span
                .split_once('-')
                .ok_or_else(|| format!("malformed range {span:?}"))?;
            let start = u64::from_str_radix(start.trim(), 16).map_err(|e| format!("{start:?}: {e}"))?;
            let end = u64::from_str_radix(end.trim(), 16).map_err(|e| format!("{end:?}: {e}"))?;
            if end < start {
                return Err(format!("inverted range {span:?}"));
            }
            resources.push((Range::new(start, end), name.to_string()));
        }

        Ok(Self { resources })
    }

    pub fn resources(&self) -> impl Iterator<Item = (&Range, &str)> {
        self.resources.iter().map(|(r, name)| (r, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn is_redacted(&self) -> bool {
        !self.resources.is_empty() && self.resources.iter().all(|(r, _)| r.start == 0 && r.end == 0)
    }
}

impl OwnershipOracle for IomemSnapshot {
    fn region_is_disjoint(&self, addr: PhysAddr, size: Size) -> bool {
        !self.resources.iter().any(|(r, _)| r.overlaps(addr, size))
    }
}
