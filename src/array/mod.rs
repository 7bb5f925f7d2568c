//! Device-tagged arrays and keyed groupings.
//!
//! - [`tensor`]: host-resident array tagged with its device
//! - [`container`]: flat, string-keyed grouping of arrays

pub mod container;
pub mod tensor;

pub use container::ArrayContainer;
pub use tensor::{ArrayId, DeviceArray};
