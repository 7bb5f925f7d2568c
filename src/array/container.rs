//! Flat, string-keyed grouping of arrays.
//!
//! An [`ArrayContainer`] groups named [`DeviceArray`] values so that
//! placement queries and the chunked splitter can operate on structured
//! inputs. Keys are ordered; iteration and leafwise operations follow key
//! order.

use std::collections::BTreeMap;
use std::ops::{Mul, Sub};

use crate::array::tensor::DeviceArray;
use crate::device::id::{Device, DeviceError};
use crate::device::info::DeviceInventory;

/// Ordered map of named arrays.
#[derive(Debug, Clone, Default)]
pub struct ArrayContainer {
    leaves: BTreeMap<String, DeviceArray>,
}

impl ArrayContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a named array.
    pub fn insert(&mut self, key: impl Into<String>, array: DeviceArray) {
        self.leaves.insert(key.into(), array);
    }

    /// Look up a named array.
    pub fn get(&self, key: &str) -> Option<&DeviceArray> {
        self.leaves.get(key)
    }

    /// Number of arrays in the container.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the container holds no arrays.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Iterate over `(key, array)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeviceArray)> {
        self.leaves.iter()
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.leaves.keys()
    }

    /// The device shared by every array in the container.
    ///
    /// Fails when the container is empty or its arrays live on different
    /// devices.
    pub fn dev(&self) -> Result<Device, DeviceError> {
        let mut devices = self.leaves.values().map(DeviceArray::dev);
        let first = devices.next().ok_or(DeviceError::EmptyContainer)?;
        for device in devices {
            if device != first {
                return Err(DeviceError::MixedDevices {
                    first,
                    other: device,
                });
            }
        }
        Ok(first)
    }

    /// Move every array in the container to `device`.
    pub fn to_device(
        &self,
        device: Device,
        inv: &DeviceInventory,
    ) -> Result<Self, DeviceError> {
        let mut moved = Self::new();
        for (key, array) in &self.leaves {
            moved.insert(key.clone(), array.to_device(device, inv)?);
        }
        Ok(moved)
    }

    /// Leafwise closeness against another container.
    ///
    /// False when the key sets differ.
    pub fn allclose(&self, other: &Self, tol: f32) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.leaves.iter().all(|(key, array)| {
            other
                .leaves
                .get(key)
                .is_some_and(|o| array.allclose(o, tol))
        })
    }

    /// Apply a binary operation leafwise against a container with the
    /// same key set.
    ///
    /// Panics when the key sets differ.
    fn zip_map(&self, other: &Self, op: impl Fn(&DeviceArray, &DeviceArray) -> DeviceArray) -> Self {
        assert_eq!(
            self.len(),
            other.len(),
            "container key sets differ in size"
        );
        let mut out = Self::new();
        for (key, array) in &self.leaves {
            let rhs = other
                .leaves
                .get(key)
                .unwrap_or_else(|| panic!("container key {key:?} missing from rhs"));
            out.insert(key.clone(), op(array, rhs));
        }
        out
    }
}

impl FromIterator<(String, DeviceArray)> for ArrayContainer {
    fn from_iter<I: IntoIterator<Item = (String, DeviceArray)>>(iter: I) -> Self {
        Self {
            leaves: iter.into_iter().collect(),
        }
    }
}

impl Mul for &ArrayContainer {
    type Output = ArrayContainer;

    /// Leafwise product. Panics when the key sets differ.
    fn mul(self, rhs: Self) -> ArrayContainer {
        self.zip_map(rhs, |a, b| a * b)
    }
}

impl Sub for &ArrayContainer {
    type Output = ArrayContainer;

    /// Leafwise difference. Panics when the key sets differ.
    fn sub(self, rhs: Self) -> ArrayContainer {
        self.zip_map(rhs, |a, b| a - b)
    }
}
