//! Integration tests for device identifiers, the default-device stack
//! and live-array tracking.

use proptest::prelude::*;

use array_device::array::tensor::DeviceArray;
use array_device::device::id::{Device, DeviceError, NativeStyle};
use array_device::device::info::DeviceInventory;
use array_device::device::registry::new_shared_registry;
use array_device::device::stack::{DefaultDevice, DeviceContext};
use ndarray::ArrayD;

fn arb_device() -> impl Strategy<Value = Device> {
    prop_oneof![
        Just(Device::Cpu),
        (0..4usize).prop_map(Device::Gpu),
        (0..2usize).prop_map(Device::Tpu),
    ]
}

proptest! {
    #[test]
    fn balanced_push_pop_preserves_depth_and_top(
        prior in arb_device(),
        devices in prop::collection::vec(arb_device(), 1..16),
    ) {
        let mut ctx = DeviceContext::default();
        ctx.set_default_device(prior);
        let depth_before = ctx.depth();
        let top_before = ctx.default_device();

        for d in &devices {
            ctx.set_default_device(*d);
        }
        prop_assert_eq!(ctx.depth(), depth_before + devices.len());

        let mut popped = Vec::new();
        for _ in &devices {
            popped.push(ctx.unset_default_device().unwrap());
        }

        // Pops come back in reverse push order.
        let mut expected = devices.clone();
        expected.reverse();
        prop_assert_eq!(popped, expected);

        prop_assert_eq!(ctx.depth(), depth_before);
        prop_assert_eq!(ctx.default_device(), top_before);
    }
}

proptest! {
    #[test]
    fn nested_scopes_restore_depth(devices in prop::collection::vec(arb_device(), 1..8)) {
        fn nest(ctx: &mut DeviceContext, devices: &[Device]) {
            if let Some((first, rest)) = devices.split_first() {
                let depth = ctx.depth();
                {
                    let mut guard = ctx.scoped(*first);
                    assert_eq!(guard.depth(), depth + 1);
                    assert_eq!(guard.default_device(), *first);
                    nest(&mut guard, rest);
                    assert_eq!(guard.depth(), depth + 1);
                }
                assert_eq!(ctx.depth(), depth);
            }
        }

        let mut ctx = DeviceContext::default();
        nest(&mut ctx, &devices);
        prop_assert_eq!(ctx.depth(), 0);
    }
}

#[test]
fn default_device_stack_sequencing() {
    let mut ctx = DeviceContext::default();

    // Setting and unsetting.
    let orig_depth = ctx.depth();
    ctx.set_default_device(Device::Cpu);
    assert_eq!(ctx.depth(), orig_depth + 1);
    ctx.set_default_device(Device::Cpu);
    assert_eq!(ctx.depth(), orig_depth + 2);
    ctx.unset_default_device().unwrap();
    assert_eq!(ctx.depth(), orig_depth + 1);
    ctx.unset_default_device().unwrap();
    assert_eq!(ctx.depth(), orig_depth);

    // Scoped guards.
    {
        let mut outer = DefaultDevice::new(&mut ctx, Device::Cpu);
        assert_eq!(outer.depth(), orig_depth + 1);
        {
            let inner = DefaultDevice::new(&mut outer, Device::Cpu);
            assert_eq!(inner.depth(), orig_depth + 2);
        }
        assert_eq!(outer.depth(), orig_depth + 1);
    }
    assert_eq!(ctx.depth(), orig_depth);
}

#[test]
fn pop_on_empty_stack_underflows() {
    let mut ctx = DeviceContext::default();
    assert!(matches!(
        ctx.unset_default_device(),
        Err(DeviceError::StackUnderflow)
    ));

    // The failed pop leaves the stack usable.
    ctx.set_default_device(Device::Gpu(0));
    assert_eq!(ctx.unset_default_device().unwrap(), Device::Gpu(0));
}

proptest! {
    #[test]
    fn canonical_form_round_trips(device in arb_device()) {
        let token = device.to_string();
        prop_assert_eq!(token.parse::<Device>().unwrap(), device);
    }

    #[test]
    fn native_forms_normalize_back(device in arb_device()) {
        for style in [NativeStyle::Canonical, NativeStyle::Torch, NativeStyle::TensorFlow] {
            let native = device.to_native(style);
            prop_assert_eq!(Device::from_native(&native).unwrap(), device);
        }
    }
}

proptest! {
    #[test]
    fn registry_counts_live_arrays(num in 0..5usize) {
        let registry = new_shared_registry();
        let arrays: Vec<DeviceArray> = (0..num)
            .map(|_| {
                DeviceArray::registered(
                    ArrayD::from_elem(vec![2], 0.5),
                    Device::Cpu,
                    &registry,
                )
            })
            .collect();

        prop_assert_eq!(registry.read().unwrap().num_arrays_on(Device::Cpu), num);

        let lines = registry.read().unwrap().format_arrays_on(Device::Cpu, true);
        prop_assert_eq!(lines.len(), num);
        prop_assert!(lines.iter().all(|l| l == "([2], f32)"));

        drop(arrays);
        prop_assert_eq!(registry.read().unwrap().num_arrays_on(Device::Cpu), 0);
    }
}

#[test]
fn registry_tracks_known_array_ids() {
    let registry = new_shared_registry();
    let arrays: Vec<DeviceArray> = (0..3)
        .map(|i| {
            DeviceArray::registered(
                ArrayD::from_elem(vec![2], i as f32),
                Device::Cpu,
                &registry,
            )
        })
        .collect();

    let tracked: Vec<u64> = registry
        .read()
        .unwrap()
        .arrays_on(Device::Cpu)
        .iter()
        .map(|m| m.id)
        .collect();
    for array in &arrays {
        assert!(tracked.contains(&array.id()));
    }
}

#[test]
fn arrays_move_between_inventory_devices() {
    let rig = DeviceInventory::stub_dual_gpu_rig();
    let registry = new_shared_registry();

    let x = DeviceArray::registered(ArrayD::from_elem(vec![3], 1.0), Device::Cpu, &registry);
    assert_eq!(x.dev(), Device::Cpu);

    let on_gpu = x.to_device(Device::Gpu(1), &rig).unwrap();
    assert_eq!(on_gpu.dev(), Device::Gpu(1));
    assert_eq!(registry.read().unwrap().num_arrays_on(Device::Gpu(1)), 1);

    // Round-trip back to the CPU preserves the data.
    let back = on_gpu.to_device(Device::Cpu, &rig).unwrap();
    assert!(back.allclose(&x, 0.0));

    // A device outside the inventory is rejected.
    assert!(matches!(
        x.to_device(Device::Gpu(7), &rig),
        Err(DeviceError::DeviceNotAvailable(Device::Gpu(7)))
    ));
}
