//! Runtime configuration for array-device.
//!
//! Configuration can be loaded from a JSON file or constructed
//! programmatically. Device, splitter and profiler knobs live here.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::device::id::{Device, DeviceError};
use crate::split::chunk::SplitMode;

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "array-device", about = "Device report for host-array runtimes")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "device.json")]
    pub config: PathBuf,

    /// Use a stubbed dual-GPU inventory instead of detecting hardware.
    #[arg(long)]
    pub stub_inventory: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Device selection.
    pub device: DeviceSettings,

    /// Chunked-call splitter defaults.
    pub split: SplitSettings,

    /// Profiler output.
    pub profile: ProfileSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceSettings::default(),
            split: SplitSettings::default(),
            profile: ProfileSettings::default(),
        }
    }
}

/// Device selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Default device when the device stack is empty (canonical token).
    pub fallback_device: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            fallback_device: "cpu".to_string(),
        }
    }
}

impl DeviceSettings {
    /// Parse the configured fallback device.
    pub fn fallback(&self) -> Result<Device, DeviceError> {
        self.fallback_device.parse()
    }
}

/// Chunked-call splitter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSettings {
    /// Chunk size used when the caller does not pick one.
    pub default_chunk_size: usize,

    /// Recombination mode used when the caller does not pick one.
    pub default_mode: SplitMode,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            default_chunk_size: 1024,
            default_mode: SplitMode::Concat,
        }
    }
}

/// Profiler output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Directory profile summaries are written into.
    pub log_dir: PathBuf,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("/tmp/array-device/profile"),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            config.device.fallback()?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }
}
