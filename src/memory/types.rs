/*!
 * Memory Types
 * Ranges, hidden blocks and the errors of the scavenger subsystem
 */

use crate::core::types::{PhysAddr, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Scavenger errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum MemoryError {
    #[error("Out of memory: {what} storage cannot grow past {len} entries")]
    #[diagnostic(
        code(memory::out_of_memory),
        help("Construction state has been purged. The subsystem cannot start.")
    )]
    OutOfMemory { what: &'static str, len: usize },

    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(memory::invalid_argument),
        help("Values must be unsigned integers aligned to the memory block size.")
    )]
    InvalidArgument(String),

    #[error("No usable memory map source: {0}")]
    #[diagnostic(
        code(memory::source_unavailable),
        help("Neither a firmware memory map nor device-tree memory nodes were usable.")
    )]
    SourceUnavailable(String),

    #[error("Failed to read {path}: {message}")]
    #[diagnostic(code(memory::platform))]
    Platform { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Claim(#[from] ClaimError),
}

impl MemoryError {
    /// Create an invalid argument error
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a source unavailable error
    #[inline]
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a platform read error for `path`
    pub fn platform(path: &std::path::Path, message: impl fmt::Display) -> Self {
        Self::Platform {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}

/// Failure reported by the claim primitive for a single block
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ClaimError {
    #[error("Block {addr:#x} is already managed")]
    #[diagnostic(code(claim::already_managed))]
    AlreadyManaged { addr: PhysAddr },

    #[error("Claim of {addr:#x} rejected: {reason}")]
    #[diagnostic(code(claim::rejected))]
    Rejected { addr: PhysAddr, reason: String },

    #[error("Memory hotplug unsupported: {0}")]
    #[diagnostic(
        code(claim::unsupported),
        help("The host needs memory hotplug with a writable probe interface.")
    )]
    Unsupported(String),

    #[error("I/O error on {path}: {message}")]
    #[diagnostic(code(claim::io))]
    Io { path: String, message: String },
}

/// Inclusive physical address range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: PhysAddr,
    pub end: PhysAddr,
}

impl Range {
    pub fn new(start: PhysAddr, end: PhysAddr) -> Self {
        debug_assert!(end >= start, "range end below start");
        Self { start, end }
    }

    /// Range covering `size` bytes at `base`, or `None` for an empty or
    /// overflowing range
    pub fn from_base_size(base: PhysAddr, size: Size) -> Option<Self> {
        if size == 0 {
            return None;
        }
        let end = base.checked_add(size - 1)?;
        Some(Self { start: base, end })
    }

    /// Number of bytes covered (saturates for the full 64-bit space)
    pub fn len(&self) -> Size {
        (self.end - self.start).saturating_add(1)
    }

    pub fn contains(&self, addr: PhysAddr) -> bool {
        self.start <= addr && addr <= self.end
    }

    /// Whether any byte of `[start, start + size)` falls inside this range
    pub fn overlaps(&self, start: PhysAddr, size: Size) -> bool {
        if size == 0 {
            return false;
        }
        let last = start.saturating_add(size - 1);
        start <= self.end && last >= self.start
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}-{:#x}", self.start, self.end)
    }
}

/// Memory block size: the hotplug granularity of the owning system
///
/// Always a non-zero power of two, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct BlockSize(u64);

impl BlockSize {
    pub fn new(bytes: u64) -> MemoryResult<Self> {
        if !bytes.is_power_of_two() {
            return Err(MemoryError::invalid_argument(format!(
                "block size {bytes:#x} is not a power of two"
            )));
        }
        Ok(Self(bytes))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_aligned(self, addr: PhysAddr) -> bool {
        addr & (self.0 - 1) == 0
    }

    /// Round `addr` up to the next block boundary, `None` on overflow
    #[inline]
    pub fn align_up(self, addr: PhysAddr) -> Option<PhysAddr> {
        let mask = self.0 - 1;
        addr.checked_add(mask).map(|a| a & !mask)
    }

    #[inline]
    pub fn is_multiple(self, bytes: u64) -> bool {
        bytes % self.0 == 0
    }
}

impl TryFrom<u64> for BlockSize {
    type Error = MemoryError;

    fn try_from(bytes: u64) -> MemoryResult<Self> {
        Self::new(bytes)
    }
}

impl From<BlockSize> for u64 {
    fn from(size: BlockSize) -> u64 {
        size.0
    }
}

/// A block-aligned, unclaimed block of firmware-visible RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HiddenBlock {
    pub addr: PhysAddr,
}

impl HiddenBlock {
    pub fn new(addr: PhysAddr) -> Self {
        Self { addr }
    }

    /// Last byte of the block
    pub fn end(&self, block_size: BlockSize) -> PhysAddr {
        self.addr + (block_size.get() - 1)
    }
}

/// Which firmware source populated the range set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSource {
    FirmwareMap,
    HardwareTree,
}

impl fmt::Display for RangeSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RangeSource::FirmwareMap => write!(f, "firmware memory map"),
            RangeSource::HardwareTree => write!(f, "device-tree memory nodes"),
        }
    }
}

/// Classification of a firmware memory map entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Ordinary usable RAM
    Usable,
    Reserved,
    AcpiReclaimable,
    AcpiNvs,
    Unusable,
    Persistent,
    Other(String),
}

impl MemoryKind {
    pub fn is_usable(&self) -> bool {
        matches!(self, MemoryKind::Usable)
    }
}

/// One entry of a firmware memory map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareEntry {
    pub base: PhysAddr,
    pub size: Size,
    pub kind: MemoryKind,
}

/// Point-in-time summary of the subsystem
///
/// Deliberately carries no per-claim outcome: recovery is audited through
/// the owning system's resource registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScavengerStats {
    pub block_size: u64,
    pub source: RangeSource,
    pub ranges: usize,
    pub hidden_blocks: usize,
    pub pinned: bool,
}
