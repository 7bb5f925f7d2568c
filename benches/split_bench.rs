//! Benchmarks for the chunked call splitter.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use array_device::array::tensor::DeviceArray;
use array_device::split::{chunk_sizes, split_func_call, SplitMode};
use ndarray::ArrayD;

fn iota(shape: &[usize]) -> DeviceArray {
    let n: usize = shape.iter().product();
    DeviceArray::from_ndarray(
        ArrayD::from_shape_vec(shape.to_vec(), (0..n).map(|i| i as f32).collect()).unwrap(),
    )
}

fn mul(ins: &[DeviceArray]) -> Vec<DeviceArray> {
    vec![&ins[0] * &ins[1]]
}

fn bench_chunk_planning(c: &mut Criterion) {
    c.bench_function("chunk_sizes_1m_by_4096", |b| {
        b.iter(|| {
            let sizes = chunk_sizes(black_box(1_000_000), black_box(4096)).unwrap();
            black_box(sizes);
        })
    });
}

fn bench_split_call(c: &mut Criterion) {
    let x1 = iota(&[1024, 64]);
    let x2 = iota(&[1024, 64]);

    c.bench_function("split_call_1024x64_chunk128", |b| {
        b.iter(|| {
            let out = split_func_call(
                mul,
                black_box(&[x1.clone(), x2.clone()]),
                SplitMode::Concat,
                128,
                &[0],
                None,
            )
            .unwrap();
            black_box(out);
        })
    });
}

fn bench_direct_call(c: &mut Criterion) {
    let x1 = iota(&[1024, 64]);
    let x2 = iota(&[1024, 64]);

    c.bench_function("direct_call_1024x64", |b| {
        b.iter(|| {
            let out = mul(black_box(&[x1.clone(), x2.clone()]));
            black_box(out);
        })
    });
}

criterion_group!(benches, bench_chunk_planning, bench_split_call, bench_direct_call);
criterion_main!(benches);
