//! # Batch Performance Benchmark
//!
//! ARCHITECT'S REQUIREMENTS:
//! - Amortized O(1) instance pushes
//! - Tail-only upload planning
//! - Draw list emission proportional to mesh count, not instances
//!
//! Run with: `cargo bench --package tileforge_rendering`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tileforge_rendering::{AttributeFormat, InstanceSchema, MeshPacker, MultiBatch};

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BenchInstance {
    color: [f32; 3],
    transform: [[f32; 4]; 4],
}

const INSTANCE: BenchInstance = BenchInstance {
    color: [1.0, 0.5, 0.5],
    transform: [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ],
};

const MESH_COUNT: usize = 16;

fn build_batch() -> MultiBatch<[f32; 3], u16> {
    let mut packer: MeshPacker<[f32; 3], u16> = MeshPacker::new();
    for _ in 0..MESH_COUNT {
        packer
            .add_mesh(&[[0.0; 3]; 24], &[0u16; 36])
            .unwrap();
    }
    let schema =
        InstanceSchema::new(&[AttributeFormat::Float32x3, AttributeFormat::Mat4]).unwrap();
    packer.into_batch(schema)
}

/// Benchmark: push N instances spread over 16 meshes.
fn bench_push_instances(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_instances");

    for count in [1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut batch = build_batch();
                for i in 0..count {
                    batch.push_instance(i % MESH_COUNT, &INSTANCE).unwrap();
                }
                black_box(batch.instance_count())
            });
        });
    }
    group.finish();
}

/// Benchmark: plan a frame over a fully populated batch.
fn bench_prepare_frame(c: &mut Criterion) {
    let mut batch = build_batch();
    for i in 0..100_000 {
        batch.push_instance(i % MESH_COUNT, &INSTANCE).unwrap();
    }
    // Drain the initial upload so iterations measure the steady state.
    let _ = batch.prepare_frame();

    c.bench_function("prepare_frame_100k_steady", |b| {
        b.iter(|| {
            let frame = batch.prepare_frame();
            black_box(frame.draws.len())
        });
    });
}

/// Benchmark: pack geometry into the shared buffers.
fn bench_pack_meshes(c: &mut Criterion) {
    let vertices = vec![[0.0f32; 3]; 1024];
    let indices = vec![0u16; 4096];

    c.bench_function("pack_64_meshes", |b| {
        b.iter(|| {
            let mut packer: MeshPacker<[f32; 3], u16> = MeshPacker::new();
            for _ in 0..64 {
                packer.add_mesh(&vertices, &indices).unwrap();
            }
            black_box(packer.index_count())
        });
    });
}

criterion_group!(
    benches,
    bench_push_instances,
    bench_prepare_frame,
    bench_pack_meshes,
);

criterion_main!(benches);
