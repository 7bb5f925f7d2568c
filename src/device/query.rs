//! Memory, utilization and core-count queries.
//!
//! CPU answers come from the host (sysinfo); GPU answers come from the
//! [`DeviceInventory`] entry for the queried index. Querying a device the
//! inventory does not contain is an error.

use sysinfo::System;

use crate::device::id::{Device, DeviceError};
use crate::device::info::DeviceInventory;

/// Number of logical CPU cores on this host.
pub fn num_cpu_cores() -> usize {
    num_cpus::get()
}

/// Total memory of the given device, in bytes.
pub fn total_mem_on(inv: &DeviceInventory, device: Device) -> Result<u64, DeviceError> {
    match device {
        Device::Cpu => {
            let mut sys = System::new();
            sys.refresh_memory();
            Ok(sys.total_memory())
        }
        Device::Gpu(i) => inv
            .gpu(i)
            .map(|g| g.total_vram)
            .ok_or(DeviceError::UnknownDevice(device)),
        Device::Tpu(_) => Err(DeviceError::DeviceNotAvailable(device)),
    }
}

/// Memory of the given device currently in use, in bytes.
pub fn used_mem_on(inv: &DeviceInventory, device: Device) -> Result<u64, DeviceError> {
    match device {
        Device::Cpu => {
            let mut sys = System::new();
            sys.refresh_memory();
            Ok(sys.used_memory())
        }
        Device::Gpu(i) => inv
            .gpu(i)
            .map(|g| g.total_vram.saturating_sub(g.free_vram))
            .ok_or(DeviceError::UnknownDevice(device)),
        Device::Tpu(_) => Err(DeviceError::DeviceNotAvailable(device)),
    }
}

/// Memory of the given device currently in use, as a percentage of total.
pub fn percent_used_mem_on(inv: &DeviceInventory, device: Device) -> Result<f64, DeviceError> {
    let total = total_mem_on(inv, device)?;
    let used = used_mem_on(inv, device)?;
    if total == 0 {
        return Ok(0.0);
    }
    Ok(used as f64 / total as f64 * 100.0)
}

/// Current utilization of the given device, as a percentage.
///
/// For the CPU this is the mean busy fraction across all cores; for GPUs
/// the figure is derived from VRAM occupancy.
pub fn utilization_on(inv: &DeviceInventory, device: Device) -> Result<f64, DeviceError> {
    match device {
        Device::Cpu => {
            let mut sys = System::new();
            sys.refresh_cpu();

            let cpus = sys.cpus();
            if cpus.is_empty() {
                return Ok(0.0);
            }
            let total: f64 = cpus.iter().map(|c| f64::from(c.cpu_usage())).sum();
            Ok(total / cpus.len() as f64)
        }
        Device::Gpu(_) => percent_used_mem_on(inv, device),
        Device::Tpu(_) => Err(DeviceError::DeviceNotAvailable(device)),
    }
}
