/*!
 * System Limits and Constants
 *
 * Centralized location for limits, defaults and magic numbers.
 */

// =============================================================================
// REPORTING
// =============================================================================

/// Capacity of a single control surface read (one 4KB page)
/// Reports stop at this many bytes rather than overflow
pub const REPORT_CAPACITY: usize = 4096;

/// Longest control request line accepted from a socket client
pub const MAX_REQUEST_BYTES: u64 = 256;

// =============================================================================
// STORAGE LIMITS
// =============================================================================

/// Maximum RAM ranges accepted from a firmware source
/// Exceeding it fails construction with OutOfMemory
pub const MAX_RAM_RANGES: usize = 64 * 1024;

/// Maximum hidden blocks tracked by the registry
/// 16M blocks of 128MB covers far more than any addressable machine
pub const MAX_HIDDEN_BLOCKS: usize = 16 * 1024 * 1024;

// =============================================================================
// CLAIMS
// =============================================================================

/// Resource label given to every claimed block
pub const CLAIM_LABEL: &str = "System RAM (memscav)";

// =============================================================================
// HOST PATHS
// =============================================================================

pub const DEFAULT_SYSFS_ROOT: &str = "/sys";
pub const DEFAULT_PROCFS_ROOT: &str = "/proc";
pub const DEFAULT_DEVICE_TREE_DIR: &str = "/proc/device-tree";
pub const DEFAULT_SOCKET_PATH: &str = "/run/memscav.sock";

/// Default `#address-cells` of a device-tree node without the property
pub const DT_DEFAULT_ADDRESS_CELLS: u32 = 2;

/// Default `#size-cells` of a device-tree node without the property
pub const DT_DEFAULT_SIZE_CELLS: u32 = 1;
