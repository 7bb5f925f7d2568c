//! Device-tagged arrays.
//!
//! A [`DeviceArray`] wraps a host-resident `ndarray` value together with
//! the device it is placed on and a unique id. Arrays may be registered
//! with an [`ArrayRegistry`](crate::device::registry::ArrayRegistry), in
//! which case they deregister themselves on drop.
//!
//! Data stays host-resident in the CPU-only build; placement on an
//! accelerator is validated against the [`DeviceInventory`] and physical
//! copies live behind the `cuda` feature seam.

use std::ops::{Add, Mul, Sub};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ndarray::ArrayD;
use tracing::debug;

use crate::device::id::{Device, DeviceError};
use crate::device::info::DeviceInventory;
use crate::device::registry::{ArrayMeta, SharedRegistry};

/// Unique identifier for an array.
pub type ArrayId = u64;

/// Global monotonic array ID counter.
static NEXT_ARRAY_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate a new unique array ID.
pub fn new_array_id() -> ArrayId {
    NEXT_ARRAY_ID.fetch_add(1, Ordering::Relaxed)
}

/// A host-resident `f32` array placed on a device.
#[derive(Debug)]
pub struct DeviceArray {
    /// Unique identifier for this array.
    id: ArrayId,

    /// Element storage.
    data: ArrayD<f32>,

    /// Device this array is placed on.
    device: Device,

    /// Registry tracking this array, if any.
    registry: Option<SharedRegistry>,
}

impl DeviceArray {
    /// Create an unregistered array on the CPU.
    pub fn from_ndarray(data: ArrayD<f32>) -> Self {
        Self::on_device(data, Device::Cpu)
    }

    /// Create an unregistered array on the given device.
    pub fn on_device(data: ArrayD<f32>, device: Device) -> Self {
        Self {
            id: new_array_id(),
            data,
            device,
            registry: None,
        }
    }

    /// Create an array on the given device, tracked by `registry`.
    pub fn registered(data: ArrayD<f32>, device: Device, registry: &SharedRegistry) -> Self {
        let mut array = Self::on_device(data, device);
        array.registry = Some(Arc::clone(registry));
        array.register_self();
        array
    }

    fn register_self(&self) {
        if let Some(registry) = &self.registry {
            if let Ok(mut reg) = registry.write() {
                reg.register(self.device, self.meta());
            }
        }
    }

    fn meta(&self) -> ArrayMeta {
        ArrayMeta {
            id: self.id,
            shape: self.shape().to_vec(),
            elements: self.data.len(),
            preview: self.preview(),
        }
    }

    /// Short rendering of the leading elements, e.g. `[0.5, 1, ...]`.
    fn preview(&self) -> String {
        const PREVIEW_LEN: usize = 6;
        let mut parts: Vec<String> = self
            .data
            .iter()
            .take(PREVIEW_LEN)
            .map(|x| format!("{x}"))
            .collect();
        if self.data.len() > PREVIEW_LEN {
            parts.push("...".to_string());
        }
        format!("[{}]", parts.join(", "))
    }

    /// Unique id of this array.
    pub fn id(&self) -> ArrayId {
        self.id
    }

    /// Device this array is placed on.
    pub fn dev(&self) -> Device {
        self.device
    }

    /// Shape of the array.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element storage.
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Move this array to `device`, yielding a new array on the target.
    ///
    /// The target must be present in the inventory; the new array joins
    /// the same registry as the source, on the target device.
    pub fn to_device(
        &self,
        device: Device,
        inv: &DeviceInventory,
    ) -> Result<Self, DeviceError> {
        if !inv.contains(device) {
            return Err(DeviceError::DeviceNotAvailable(device));
        }

        debug!(
            id = self.id,
            from = %self.device,
            to = %device,
            bytes = self.data.len() * std::mem::size_of::<f32>(),
            "Array transfer"
        );

        let mut moved = Self::on_device(self.data.clone(), device);
        if let Some(registry) = &self.registry {
            moved.registry = Some(Arc::clone(registry));
            moved.register_self();
        }
        Ok(moved)
    }

    /// Elementwise closeness against another array.
    pub fn allclose(&self, other: &Self, tol: f32) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Clone for DeviceArray {
    /// Clones get a fresh id and register as their own live array.
    fn clone(&self) -> Self {
        let mut cloned = Self::on_device(self.data.clone(), self.device);
        if let Some(registry) = &self.registry {
            cloned.registry = Some(Arc::clone(registry));
            cloned.register_self();
        }
        cloned
    }
}

impl Drop for DeviceArray {
    fn drop(&mut self) {
        if let Some(registry) = &self.registry {
            if let Ok(mut reg) = registry.write() {
                reg.unregister(self.device, self.id);
            }
        }
    }
}

fn assert_same_device(lhs: &DeviceArray, rhs: &DeviceArray) {
    assert!(
        lhs.device == rhs.device,
        "device mismatch: {} vs {}",
        lhs.device,
        rhs.device
    );
}

impl Add for &DeviceArray {
    type Output = DeviceArray;

    /// Panics when the operands' devices or shapes differ.
    fn add(self, rhs: Self) -> DeviceArray {
        assert_same_device(self, rhs);
        DeviceArray::on_device(&self.data + &rhs.data, self.device)
    }
}

impl Sub for &DeviceArray {
    type Output = DeviceArray;

    /// Panics when the operands' devices or shapes differ.
    fn sub(self, rhs: Self) -> DeviceArray {
        assert_same_device(self, rhs);
        DeviceArray::on_device(&self.data - &rhs.data, self.device)
    }
}

impl Mul for &DeviceArray {
    type Output = DeviceArray;

    /// Panics when the operands' devices or shapes differ.
    fn mul(self, rhs: Self) -> DeviceArray {
        assert_same_device(self, rhs);
        DeviceArray::on_device(&self.data * &rhs.data, self.device)
    }
}
