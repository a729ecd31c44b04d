/*!
 * Scavenger Configuration
 *
 * Defaults, an optional JSON file named by `MEMSCAV_CONFIG`, then
 * `MEMSCAV_*` environment overrides, in that order.
 */

use super::limits::*;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    #[diagnostic(code(config::parse), help("The config file must be a JSON object."))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value {value:?} for {var}")]
    #[diagnostic(code(config::invalid_env))]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScavengerConfig {
    /// Root of the sysfs mount
    pub sysfs_root: PathBuf,
    /// Root of the procfs mount
    pub procfs_root: PathBuf,
    /// Flattened device-tree directory
    pub device_tree_dir: PathBuf,
    /// Unix socket the control surface is served on
    pub socket_path: PathBuf,
    /// Byte capacity of every report read
    pub report_capacity: usize,
    /// Overrides the host memory block size when set
    pub block_size: Option<u64>,
    pub max_ranges: usize,
    pub max_hidden_blocks: usize,
    /// Resource label for claimed blocks
    pub claim_label: String,
    /// JSON log output
    pub trace_json: bool,
}

impl Default for ScavengerConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            procfs_root: PathBuf::from(DEFAULT_PROCFS_ROOT),
            device_tree_dir: PathBuf::from(DEFAULT_DEVICE_TREE_DIR),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            report_capacity: REPORT_CAPACITY,
            block_size: None,
            max_ranges: MAX_RAM_RANGES,
            max_hidden_blocks: MAX_HIDDEN_BLOCKS,
            claim_label: CLAIM_LABEL.to_string(),
            trace_json: false,
        }
    }
}

impl ScavengerConfig {
    /// Defaults, then `MEMSCAV_CONFIG`, then environment overrides
    pub fn load() -> ConfigResult<Self> {
        let mut config = match std::env::var_os("MEMSCAV_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let data = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env(&mut self) -> ConfigResult<()> {
        if let Some(v) = env_path("MEMSCAV_SYSFS_ROOT") {
            self.sysfs_root = v;
        }
        if let Some(v) = env_path("MEMSCAV_PROCFS_ROOT") {
            self.procfs_root = v;
        }
        if let Some(v) = env_path("MEMSCAV_DEVICE_TREE_DIR") {
            self.device_tree_dir = v;
        }
        if let Some(v) = env_path("MEMSCAV_SOCKET") {
            self.socket_path = v;
        }
        if let Some(v) = env_number("MEMSCAV_REPORT_CAPACITY")? {
            self.report_capacity = v as usize;
        }
        if let Some(v) = env_number("MEMSCAV_BLOCK_SIZE")? {
            self.block_size = Some(v);
        }
        if let Ok(v) = std::env::var("MEMSCAV_CLAIM_LABEL") {
            self.claim_label = v;
        }
        if let Ok(v) = std::env::var("MEMSCAV_TRACE_JSON") {
            self.trace_json = v == "1" || v == "true";
        }
        Ok(())
    }

    pub fn firmware_memmap_dir(&self) -> PathBuf {
        self.sysfs_root.join("firmware/memmap")
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.sysfs_root.join("devices/system/memory")
    }

    pub fn node_dir(&self) -> PathBuf {
        self.sysfs_root.join("devices/system/node")
    }

    pub fn iomem_path(&self) -> PathBuf {
        self.procfs_root.join("iomem")
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from)
}

fn env_number(var: &'static str) -> ConfigResult<Option<u64>> {
    match std::env::var(var) {
        Ok(value) => crate::control::parse_u64(&value)
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}
