#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]
//! Benchmark for full ray-traced scene renders.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use softray::prelude::*;
use std::hint::black_box;

fn scene_context(size: u32, spheres: u32) -> Context {
    let mut ctx = Context::new(size, size).expect("context creation should succeed");

    ctx.set_matrix_mode(MatrixMode::ModelView);
    ctx.load_matrix(Mat4::from_array([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, -10.0, //
        0.0, 0.0, 0.0, 1.0,
    ]));
    ctx.set_matrix_mode(MatrixMode::Projection);
    ctx.ortho(-4.0, 4.0, -4.0, 4.0, 1.0, 20.0)
        .expect("ortho box should be valid");

    ctx.set_material(Material::new(Color::new(0.8, 0.2, 0.2), 0.7, 0.3, 16.0, 0.0, 1.0));
    for i in 0..spheres {
        let x = -3.0 + 6.0 * i as f32 / spheres.max(1) as f32;
        ctx.add_sphere(Vec3::new(x, 0.0, 0.0), 0.8);
    }
    ctx.add_light(PointLight::new(Vec3::new(0.0, 8.0, 2.0), Color::WHITE));
    ctx
}

fn render_scene_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_scene");
    group.sample_size(20);

    for size in [32u32, 64, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut ctx = scene_context(size, 4);
            b.iter(|| {
                ctx.render_scene().expect("render should succeed");
                black_box(ctx.color_data().len())
            });
        });
    }

    group.finish();
}

fn primitive_count_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_scene_primitives");
    group.sample_size(20);

    for spheres in [1u32, 8, 32] {
        group.bench_with_input(
            BenchmarkId::from_parameter(spheres),
            &spheres,
            |b, &spheres| {
                let mut ctx = scene_context(64, spheres);
                b.iter(|| {
                    ctx.render_scene().expect("render should succeed");
                    black_box(ctx.color_data().len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, render_scene_benchmark, primitive_count_benchmark);
criterion_main!(benches);
