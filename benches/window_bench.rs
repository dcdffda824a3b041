//! Benchmarks for window registry operations.
//!
//! These measure stacking-order mutation and hit-testing, the two
//! registry paths exercised on every click and every pointer motion.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cairn_backend_headless::HeadlessBackend;
use cairn_core::state::Geometry;
use cairn_core::window::{Window, WindowRegistry};
use cairn_core::EventQueue;

/// A registry of `count` mapped 100x100 windows in a diagonal
/// cascade, backed by real surface records for hit-testing.
fn cascade(count: u64) -> (WindowRegistry, HeadlessBackend) {
    let mut backend = HeadlessBackend::new(Arc::new(EventQueue::new()));
    let mut registry = WindowRegistry::new();
    for i in 0..count {
        let (id, surface) = backend.new_toplevel(Geometry::new(0, 0, 100, 100));
        let mut window = Window::new(id, surface);
        window.x = (i as i32) * 10;
        window.y = (i as i32) * 10;
        window.mapped = true;
        registry.insert(window);
    }
    (registry, backend)
}

fn stacking_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("stacking");

    for count in [4u64, 32, 256] {
        group.bench_with_input(BenchmarkId::new("raise_back", count), &count, |b, &n| {
            let (mut registry, _backend) = cascade(n);
            let back = *registry.stack().last().unwrap();
            let front = registry.stack()[0];
            b.iter(|| {
                // Raise the tail, then restore, so every iteration
                // pays the full reorder.
                registry.raise(black_box(back));
                registry.raise(front);
            });
        });

        group.bench_with_input(BenchmarkId::new("send_to_back", count), &count, |b, &n| {
            let (mut registry, _backend) = cascade(n);
            let front = registry.stack()[0];
            b.iter(|| {
                registry.send_to_back(black_box(front));
                registry.raise(front);
            });
        });
    }

    group.finish();
}

fn hit_test_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_test");

    for count in [4u64, 32, 256] {
        // The front window always wins: best case.
        group.bench_with_input(BenchmarkId::new("front", count), &count, |b, &n| {
            let (registry, backend) = cascade(n);
            let front = registry.get(registry.stack()[0]).unwrap();
            let (x, y) = (f64::from(front.x) + 50.0, f64::from(front.y) + 50.0);
            b.iter(|| registry.window_at(&backend, black_box(x), black_box(y)));
        });

        // Bare wallpaper: the whole stack is walked and missed.
        group.bench_with_input(BenchmarkId::new("miss", count), &count, |b, &n| {
            let (registry, backend) = cascade(n);
            b.iter(|| registry.window_at(&backend, black_box(-500.0), black_box(-500.0)));
        });
    }

    group.finish();
}

fn render_list_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_list");

    group.bench_function("paint_order_64", |b| {
        let (registry, _backend) = cascade(64);
        b.iter(|| black_box(registry.render_list()));
    });

    group.finish();
}

criterion_group!(
    benches,
    stacking_benchmark,
    hit_test_benchmark,
    render_list_benchmark
);
criterion_main!(benches);
