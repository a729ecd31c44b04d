/*!
 * Firmware Memory Map
 * The EFI/e820 map as exported under /sys/firmware/memmap
 */

use crate::control::parse_u64;
use crate::memory::{FirmwareEntry, FirmwareMemoryMap, MemoryError, MemoryKind, MemoryResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// `/sys/firmware/memmap/<n>/{start,end,type}`
#[derive(Debug, Clone)]
pub struct SysfsMemmap {
    dir: PathBuf,
}

impl SysfsMemmap {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Entry directories in numeric order
    fn entry_dirs(&self) -> MemoryResult<Vec<PathBuf>> {
        let read_dir = std::fs::read_dir(&self.dir).map_err(|e| MemoryError::platform(&self.dir, e))?;

        let mut dirs: Vec<(u64, PathBuf)> = read_dir
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let index = entry.file_name().to_str()?.parse::<u64>().ok()?;
                Some((index, entry.path()))
            })
            .collect();
        dirs.sort_unstable_by_key(|(index, _)| *index);

        Ok(dirs.into_iter().map(|(_, path)| path).collect())
    }
}

impl FirmwareMemoryMap for SysfsMemmap {
    fn is_present(&self) -> bool {
        self.entry_dirs().is_ok_and(|dirs| !dirs.is_empty())
    }

    fn entries(&self) -> MemoryResult<Vec<FirmwareEntry>> {
        let mut entries = Vec::new();

        for dir in self.entry_dirs()? {
            let start = read_number(&dir.join("start"))?;
            let end = read_number(&dir.join("end"))?;
            let kind = parse_kind(&read_text(&dir.join("type"))?);

            if end < start {
                return Err(MemoryError::platform(&dir, format!("end {end:#x} below start {start:#x}")));
            }
            let size = (end - start).saturating_add(1);

            debug!(start, end, kind = ?kind, "Firmware map entry");
            entries.push(FirmwareEntry {
                base: start,
                size,
                kind,
            });
        }

        Ok(entries)
    }
}

/// Map a firmware map type string to its classification
pub fn parse_kind(kind: &str) -> MemoryKind {
    match kind {
        "System RAM" => MemoryKind::Usable,
        "Reserved" | "Soft Reserved" => MemoryKind::Reserved,
        "ACPI Tables" => MemoryKind::AcpiReclaimable,
        "ACPI Non-volatile Storage" => MemoryKind::AcpiNvs,
        "Unusable memory" => MemoryKind::Unusable,
        "Persistent Memory" | "Persistent Memory (legacy)" => MemoryKind::Persistent,
        other => MemoryKind::Other(other.to_string()),
    }
}

fn read_text(path: &Path) -> MemoryResult<String> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| MemoryError::platform(path, e))
}

fn read_number(path: &Path) -> MemoryResult<u64> {
    let text = read_text(path)?;
    parse_u64(&text).map_err(|e| MemoryError::platform(path, e))
}
