//! Default-device stack with scoped activation.
//!
//! A [`DeviceContext`] owns a LIFO stack of devices; the top entry is the
//! current default device, falling back to a configured device when the
//! stack is empty. [`DefaultDevice`] is the scoped form: it pushes on
//! construction and pops on drop, so nested scopes unwind in strict LIFO
//! order.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::device::id::{Device, DeviceError};

/// Explicit holder of the default-device stack.
///
/// The stack is mutated only by explicit push/pop (or guard) operations;
/// each operation changes the depth by exactly one.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    stack: Vec<Device>,
    fallback: Device,
}

impl DeviceContext {
    /// Create a context whose empty-stack default is `fallback`.
    pub fn new(fallback: Device) -> Self {
        Self {
            stack: Vec::new(),
            fallback,
        }
    }

    /// The current default device: top of stack, or the fallback.
    pub fn default_device(&self) -> Device {
        self.stack.last().copied().unwrap_or(self.fallback)
    }

    /// Push `device` onto the default-device stack.
    pub fn set_default_device(&mut self, device: Device) {
        debug!(%device, depth = self.stack.len() + 1, "Set default device");
        self.stack.push(device);
    }

    /// Pop and return the top of the default-device stack.
    ///
    /// Fails with [`DeviceError::StackUnderflow`] when the stack is empty.
    pub fn unset_default_device(&mut self) -> Result<Device, DeviceError> {
        let device = self.stack.pop().ok_or(DeviceError::StackUnderflow)?;
        debug!(%device, depth = self.stack.len(), "Unset default device");
        Ok(device)
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Activate `device` for the lifetime of the returned guard.
    pub fn scoped(&mut self, device: Device) -> DefaultDevice<'_> {
        DefaultDevice::new(self, device)
    }
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self::new(Device::Cpu)
    }
}

/// Scoped default-device activation.
///
/// Pushes on construction and pops on drop. Derefs to the underlying
/// [`DeviceContext`], so scopes nest through the guard itself.
#[derive(Debug)]
pub struct DefaultDevice<'a> {
    ctx: &'a mut DeviceContext,
}

impl<'a> DefaultDevice<'a> {
    /// Push `device` onto `ctx` for the guard's lifetime.
    pub fn new(ctx: &'a mut DeviceContext, device: Device) -> Self {
        ctx.set_default_device(device);
        Self { ctx }
    }
}

impl Deref for DefaultDevice<'_> {
    type Target = DeviceContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for DefaultDevice<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for DefaultDevice<'_> {
    fn drop(&mut self) {
        // The guard pushed exactly one entry, so the pop cannot underflow.
        let popped = self.ctx.stack.pop();
        debug_assert!(popped.is_some());
    }
}
