//! Canonical device identifiers.
//!
//! A device is named by a short token: `cpu`, `gpu:0`, `tpu:1`. Backends
//! spell the same device differently (`cuda:0`, `/device:GPU:0`);
//! [`Device::from_native`] normalizes those spellings and
//! [`Device::to_native`] renders them back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("default device stack is empty")]
    StackUnderflow,

    #[error("malformed device identifier: {0:?}")]
    Malformed(String),

    #[error("unknown device: {0}")]
    UnknownDevice(Device),

    #[error("device {0} is not available on this host")]
    DeviceNotAvailable(Device),

    #[error("container holds no arrays")]
    EmptyContainer,

    #[error("arrays are placed on different devices: {first} vs {other}")]
    MixedDevices { first: Device, other: Device },
}

/// A compute device an array can live on.
///
/// Serializes as the canonical token (`cpu`, `gpu:0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Device {
    /// Host CPU.
    Cpu,
    /// CUDA-class accelerator, by index.
    Gpu(usize),
    /// TPU-class accelerator, by index.
    Tpu(usize),
}

/// Rendering styles for [`Device::to_native`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeStyle {
    /// The crate's own canonical form (`cpu`, `gpu:0`).
    Canonical,
    /// Torch-style (`cpu`, `cuda:0`).
    Torch,
    /// TensorFlow-style (`/device:CPU:0`, `/device:GPU:0`).
    TensorFlow,
}

impl Device {
    /// Whether this device is an accelerator (anything but the CPU).
    pub fn is_accelerator(&self) -> bool {
        !matches!(self, Device::Cpu)
    }

    /// Accelerator index, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Device::Cpu => None,
            Device::Gpu(i) | Device::Tpu(i) => Some(*i),
        }
    }

    /// Render the identifier in a backend's native spelling.
    pub fn to_native(&self, style: NativeStyle) -> String {
        match style {
            NativeStyle::Canonical => self.to_string(),
            NativeStyle::Torch => match self {
                Device::Cpu => "cpu".to_string(),
                Device::Gpu(i) => format!("cuda:{i}"),
                Device::Tpu(i) => format!("tpu:{i}"),
            },
            NativeStyle::TensorFlow => match self {
                Device::Cpu => "/device:CPU:0".to_string(),
                Device::Gpu(i) => format!("/device:GPU:{i}"),
                Device::Tpu(i) => format!("/device:TPU:{i}"),
            },
        }
    }

    /// Normalize a native device spelling into a [`Device`].
    ///
    /// Accepts canonical tokens, torch spellings (`cuda`, `cuda:1`) and
    /// TensorFlow paths (`/device:GPU:0`, `/GPU:0`), case-insensitively.
    pub fn from_native(s: &str) -> Result<Self, DeviceError> {
        let token = s.trim().trim_start_matches('/');
        let token = token.strip_prefix("device:").unwrap_or(token);
        let lower = token.to_ascii_lowercase();

        let (kind, index) = match lower.split_once(':') {
            Some((kind, idx)) => {
                let index: usize = idx
                    .parse()
                    .map_err(|_| DeviceError::Malformed(s.to_string()))?;
                (kind.to_string(), index)
            }
            None => (lower, 0),
        };

        match kind.as_str() {
            "cpu" => Ok(Device::Cpu),
            "gpu" | "cuda" => Ok(Device::Gpu(index)),
            "tpu" => Ok(Device::Tpu(index)),
            _ => Err(DeviceError::Malformed(s.to_string())),
        }
    }
}

impl Default for Device {
    fn default() -> Self {
        Device::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu(i) => write!(f, "gpu:{i}"),
            Device::Tpu(i) => write!(f, "tpu:{i}"),
        }
    }
}

impl Serialize for Device {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Device {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Device {
    type Err = DeviceError;

    /// Parse the canonical form only: `cpu`, `gpu:N`, `tpu:N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Device::Cpu),
            _ => {
                let (kind, idx) = s
                    .split_once(':')
                    .ok_or_else(|| DeviceError::Malformed(s.to_string()))?;
                let index: usize = idx
                    .parse()
                    .map_err(|_| DeviceError::Malformed(s.to_string()))?;
                match kind {
                    "gpu" => Ok(Device::Gpu(index)),
                    "tpu" => Ok(Device::Tpu(index)),
                    _ => Err(DeviceError::Malformed(s.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_round_trip() {
        for d in [Device::Cpu, Device::Gpu(0), Device::Gpu(3), Device::Tpu(1)] {
            assert_eq!(d.to_string().parse::<Device>().unwrap(), d);
        }
    }

    #[test]
    fn test_native_spellings() {
        assert_eq!(Device::from_native("cuda:1").unwrap(), Device::Gpu(1));
        assert_eq!(Device::from_native("cuda").unwrap(), Device::Gpu(0));
        assert_eq!(Device::from_native("/device:GPU:2").unwrap(), Device::Gpu(2));
        assert_eq!(Device::from_native("/GPU:0").unwrap(), Device::Gpu(0));
        assert_eq!(Device::from_native("CPU:0").unwrap(), Device::Cpu);
        assert_eq!(Device::from_native("tpu:3").unwrap(), Device::Tpu(3));
    }

    #[test]
    fn test_native_round_trip() {
        let styles = [
            NativeStyle::Canonical,
            NativeStyle::Torch,
            NativeStyle::TensorFlow,
        ];
        for d in [Device::Cpu, Device::Gpu(1), Device::Tpu(0)] {
            for style in styles {
                assert_eq!(Device::from_native(&d.to_native(style)).unwrap(), d);
            }
        }
    }

    #[test]
    fn test_serde_uses_canonical_token() {
        let json = serde_json::to_string(&Device::Gpu(2)).unwrap();
        assert_eq!(json, "\"gpu:2\"");
        let back: Device = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Device::Gpu(2));
    }

    #[test]
    fn test_malformed() {
        assert!("gpu".parse::<Device>().is_err());
        assert!("gpu:x".parse::<Device>().is_err());
        assert!("disk:0".parse::<Device>().is_err());
        assert!(Device::from_native("npu:0").is_err());
    }
}
