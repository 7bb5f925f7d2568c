//! GPU discovery and inventory.
//!
//! Detects available GPUs and their VRAM capacity. When compiled without
//! the `cuda` feature, detection reports an empty inventory and the host
//! runs CPU-only. Stub rigs are provided for tests and demos.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::device::id::Device;

/// Information about a single GPU device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuInfo {
    /// Device index.
    pub index: usize,

    /// Device name (e.g., "NVIDIA GeForce GTX 1070").
    pub name: String,

    /// Total VRAM in bytes.
    pub total_vram: u64,

    /// Free VRAM in bytes (at detection time).
    pub free_vram: u64,

    /// Compute capability (major, minor).
    pub compute_capability: (u32, u32),
}

/// The set of accelerators visible to this process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceInventory {
    /// Detected GPUs, ordered by index.
    pub gpus: Vec<GpuInfo>,
}

impl DeviceInventory {
    /// Detect all available GPU devices.
    ///
    /// With the `cuda` feature enabled, enumerates devices through the
    /// CUDA driver. Without it, returns an empty inventory.
    pub fn detect() -> Self {
        #[cfg(feature = "cuda")]
        {
            Self::detect_cuda()
        }

        #[cfg(not(feature = "cuda"))]
        {
            info!("CUDA not enabled, running in CPU-only mode");
            Self::default()
        }
    }

    #[cfg(feature = "cuda")]
    fn detect_cuda() -> Self {
        // Enumeration through cudarc: device count, name, memory info and
        // compute capability per ordinal.
        todo!("enumerate devices through cudarc")
    }

    /// Whether at least one GPU is visible.
    pub fn gpu_is_available(&self) -> bool {
        !self.gpus.is_empty()
    }

    /// Number of visible GPUs.
    pub fn num_gpus(&self) -> usize {
        self.gpus.len()
    }

    /// Whether a TPU is visible. No TPU seam is wired, so always false.
    pub fn tpu_is_available(&self) -> bool {
        false
    }

    /// Look up a GPU entry by index.
    pub fn gpu(&self, index: usize) -> Option<&GpuInfo> {
        self.gpus.iter().find(|g| g.index == index)
    }

    /// Whether arrays can be placed on the given device.
    pub fn contains(&self, device: Device) -> bool {
        match device {
            Device::Cpu => true,
            Device::Gpu(i) => self.gpu(i).is_some(),
            Device::Tpu(_) => false,
        }
    }

    /// Stub inventory with a single 8 GB GPU.
    pub fn stub_single_gpu_rig() -> Self {
        Self {
            gpus: vec![GpuInfo {
                index: 0,
                name: "NVIDIA GeForce GTX 1070".to_string(),
                total_vram: 8 * 1024 * 1024 * 1024,
                free_vram: 7 * 1024 * 1024 * 1024,
                compute_capability: (6, 1),
            }],
        }
    }

    /// Stub inventory with two 24 GB GPUs.
    pub fn stub_dual_gpu_rig() -> Self {
        Self {
            gpus: vec![
                GpuInfo {
                    index: 0,
                    name: "NVIDIA Quadro M6000".to_string(),
                    total_vram: 24 * 1024 * 1024 * 1024,
                    free_vram: 22 * 1024 * 1024 * 1024,
                    compute_capability: (5, 2),
                },
                GpuInfo {
                    index: 1,
                    name: "NVIDIA Quadro M6000".to_string(),
                    total_vram: 24 * 1024 * 1024 * 1024,
                    free_vram: 22 * 1024 * 1024 * 1024,
                    compute_capability: (5, 2),
                },
            ],
        }
    }
}
