//! Live-array tracking per device.
//!
//! Arrays created against a [`SharedRegistry`] register themselves on
//! construction and deregister on drop, so the registry answers "how many
//! arrays live on this device, and what do they look like" at any point
//! in the program.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::array::tensor::ArrayId;
use crate::device::id::Device;

/// What the registry remembers about a live array.
#[derive(Debug, Clone)]
pub struct ArrayMeta {
    /// Unique id of the array.
    pub id: ArrayId,

    /// Shape at registration time.
    pub shape: Vec<usize>,

    /// Total element count.
    pub elements: usize,

    /// Short rendering of the leading elements.
    pub preview: String,
}

/// Per-device index of live arrays.
#[derive(Debug, Default)]
pub struct ArrayRegistry {
    by_device: HashMap<Device, BTreeMap<ArrayId, ArrayMeta>>,
}

impl ArrayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live array on `device`.
    pub fn register(&mut self, device: Device, meta: ArrayMeta) {
        self.by_device.entry(device).or_default().insert(meta.id, meta);
    }

    /// Forget an array. Returns whether it was present.
    pub fn unregister(&mut self, device: Device, id: ArrayId) -> bool {
        match self.by_device.get_mut(&device) {
            Some(arrays) => arrays.remove(&id).is_some(),
            None => false,
        }
    }

    /// Number of live arrays on `device`.
    pub fn num_arrays_on(&self, device: Device) -> usize {
        self.by_device.get(&device).map_or(0, BTreeMap::len)
    }

    /// Metadata of all live arrays on `device`, ordered by id.
    pub fn arrays_on(&self, device: Device) -> Vec<ArrayMeta> {
        self.by_device
            .get(&device)
            .map(|arrays| arrays.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total live arrays across all devices.
    pub fn total_arrays(&self) -> usize {
        self.by_device.values().map(BTreeMap::len).sum()
    }

    /// One line per live array on `device`.
    ///
    /// With `attr_only`, each line is the shape/dtype attribute form
    /// `([d0, d1, ...], f32)`; otherwise a value preview
    /// `array([x0, x1, ...])`.
    pub fn format_arrays_on(&self, device: Device, attr_only: bool) -> Vec<String> {
        self.arrays_on(device)
            .iter()
            .map(|meta| {
                if attr_only {
                    format!("({:?}, f32)", meta.shape)
                } else {
                    format!("array({})", meta.preview)
                }
            })
            .collect()
    }

    /// Log every live array on `device` at info level.
    pub fn log_arrays_on(&self, device: Device) {
        for line in self.format_arrays_on(device, false) {
            info!(%device, array = %line, "Live array");
        }
    }
}

/// Thread-safe wrapper around the registry.
pub type SharedRegistry = Arc<RwLock<ArrayRegistry>>;

/// Create a new thread-safe registry.
pub fn new_shared_registry() -> SharedRegistry {
    Arc::new(RwLock::new(ArrayRegistry::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: ArrayId, shape: &[usize]) -> ArrayMeta {
        ArrayMeta {
            id,
            shape: shape.to_vec(),
            elements: shape.iter().product(),
            preview: "[0, 0]".to_string(),
        }
    }

    #[test]
    fn test_register_and_count() {
        let mut reg = ArrayRegistry::new();
        reg.register(Device::Cpu, meta(0, &[2, 3]));
        reg.register(Device::Cpu, meta(1, &[4]));
        reg.register(Device::Gpu(0), meta(2, &[1]));

        assert_eq!(reg.num_arrays_on(Device::Cpu), 2);
        assert_eq!(reg.num_arrays_on(Device::Gpu(0)), 1);
        assert_eq!(reg.num_arrays_on(Device::Gpu(1)), 0);
        assert_eq!(reg.total_arrays(), 3);
    }

    #[test]
    fn test_unregister() {
        let mut reg = ArrayRegistry::new();
        reg.register(Device::Cpu, meta(7, &[2]));

        assert!(reg.unregister(Device::Cpu, 7));
        assert!(!reg.unregister(Device::Cpu, 7));
        assert_eq!(reg.num_arrays_on(Device::Cpu), 0);
    }

    #[test]
    fn test_format_lines() {
        let mut reg = ArrayRegistry::new();
        reg.register(Device::Cpu, meta(0, &[2, 3]));
        reg.register(Device::Cpu, meta(1, &[4]));

        let attrs = reg.format_arrays_on(Device::Cpu, true);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0], "([2, 3], f32)");

        let values = reg.format_arrays_on(Device::Cpu, false);
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|l| l.starts_with("array(")));
    }
}
