//! Benchmarks for the per-frame hot paths.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::DVec3;
use globe_view::canvas::Canvas;
use globe_view::data::builtin_world;
use globe_view::render::GlobeRenderer;
use globe_view::rotation::Orientation;
use globe_view::theme::builtin_themes;
use globe_view::tile::{NullFetcher, ProceduralTiles, TileCache};

/// Renderer backed by the in-memory tile generator, no assets needed.
fn build_renderer() -> GlobeRenderer {
    let themes = builtin_themes();
    let cache = TileCache::new(Box::new(ProceduralTiles), Box::new(NullFetcher), &themes[0])
        .expect("procedural tiles always validate");
    GlobeRenderer::new(cache, builtin_world())
}

fn bench_full_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_frame");

    for radius in [100.0, 500.0, 2000.0] {
        let mut renderer = build_renderer();
        let mut canvas = Canvas::new(320, 160);
        let orientation = Orientation::from_spherical(0.6, 0.4);
        // Warm the cache so we measure the steady state, not decode.
        renderer.render(&mut canvas, orientation, radius, false);

        group.bench_with_input(
            BenchmarkId::new("render", radius as u64),
            &radius,
            |b, &radius| {
                b.iter(|| {
                    let frame = renderer.render(
                        &mut canvas,
                        black_box(orientation),
                        black_box(radius),
                        false,
                    );
                    black_box(frame)
                });
            },
        );
    }

    group.finish();
}

fn bench_vector_overlay(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_overlay");

    for radius in [100.0, 2000.0] {
        let mut renderer = build_renderer();
        renderer.show_graticule = true;
        let mut canvas = Canvas::new(320, 160);
        let orientation = Orientation::from_spherical(-1.2, 0.7);
        renderer.render(&mut canvas, orientation, radius, false);

        group.bench_with_input(
            BenchmarkId::new("layers_and_grid", radius as u64),
            &radius,
            |b, &radius| {
                b.iter(|| {
                    let frame = renderer.render(
                        &mut canvas,
                        black_box(orientation),
                        black_box(radius),
                        false,
                    );
                    black_box(frame.pieces_drawn)
                });
            },
        );
    }

    group.finish();
}

fn bench_orientation(c: &mut Criterion) {
    let mut group = c.benchmark_group("orientation");

    let a = Orientation::from_euler(0.3, -0.7, 0.1);
    let b = Orientation::from_spherical(1.2, -0.4);
    group.bench_function("compose_normalize", |bencher| {
        bencher.iter(|| black_box(black_box(a).compose(black_box(b)).normalize()));
    });

    let matrix = a.to_matrix();
    let v = DVec3::new(0.36, -0.48, 0.8);
    group.bench_function("matrix_apply", |bencher| {
        bencher.iter(|| black_box(black_box(matrix) * black_box(v)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_full_frame,
    bench_vector_overlay,
    bench_orientation
);
criterion_main!(benches);
