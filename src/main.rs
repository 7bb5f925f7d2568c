//! array-device: device report binary.
//!
//! Prints a JSON report of the devices visible to this process: CPU
//! cores and memory, GPU inventory, and the configured default device.

use clap::Parser;
use serde::Serialize;
use tracing::info;

use array_device::config::{Cli, Config};
use array_device::device::id::Device;
use array_device::device::info::{DeviceInventory, GpuInfo};
use array_device::device::query;
use array_device::device::stack::DeviceContext;

/// CPU section of the device report.
#[derive(Debug, Serialize)]
struct CpuReport {
    cores: usize,
    total_mem: u64,
    used_mem: u64,
    percent_used_mem: f64,
    utilization: f64,
}

/// The full device report.
#[derive(Debug, Serialize)]
struct DeviceReport {
    default_device: Device,
    cpu: CpuReport,
    gpu_available: bool,
    num_gpus: usize,
    gpus: Vec<GpuInfo>,
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "array_device=debug"
    } else {
        "array_device=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("array-device v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?;
    let fallback = config.device.fallback()?;
    let ctx = DeviceContext::new(fallback);

    // Assemble the inventory.
    let inventory = if cli.stub_inventory {
        info!("Using stubbed dual-GPU inventory");
        DeviceInventory::stub_dual_gpu_rig()
    } else {
        DeviceInventory::detect()
    };

    info!(
        num_gpus = inventory.num_gpus(),
        default_device = %ctx.default_device(),
        "Inventory assembled"
    );

    let report = DeviceReport {
        default_device: ctx.default_device(),
        cpu: CpuReport {
            cores: query::num_cpu_cores(),
            total_mem: query::total_mem_on(&inventory, Device::Cpu)?,
            used_mem: query::used_mem_on(&inventory, Device::Cpu)?,
            percent_used_mem: query::percent_used_mem_on(&inventory, Device::Cpu)?,
            utilization: query::utilization_on(&inventory, Device::Cpu)?,
        },
        gpu_available: inventory.gpu_is_available(),
        num_gpus: inventory.num_gpus(),
        gpus: inventory.gpus.clone(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
