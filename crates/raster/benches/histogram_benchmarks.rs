//! Benchmarks for the histogram primitives.
//!
//! Run with: cargo bench --package raster --bench histogram_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use raster::{
    adaptive_hist2d_weight, hist2d_data, hist2d_weight, hist2d_weight_enhanced,
    hist2d_weight_sparse, BinRange, Raster, SPARSE_THRESHOLD,
};

/// Random points spread uniformly over `1..=res` on both axes.
fn generate_points(n: usize, res: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rng = rand::thread_rng();
    let hi = res as f64 + 0.5;
    let x = (0..n).map(|_| rng.gen_range(0.5..hi)).collect();
    let y = (0..n).map(|_| rng.gen_range(0.5..hi)).collect();
    let w = (0..n).map(|_| rng.gen_range(0.0..10.0)).collect();
    (x, y, w)
}

/// Points clustered in a small disc, the typical shape of a refined region.
fn generate_clustered_points(n: usize, res: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rng = rand::thread_rng();
    let centre = res as f64 / 2.0;
    let spread = (res as f64 / 50.0).max(2.0);
    let x = (0..n).map(|_| centre + rng.gen_range(-spread..spread)).collect();
    let y = (0..n).map(|_| centre + rng.gen_range(-spread..spread)).collect();
    let w = (0..n).map(|_| rng.gen_range(0.0..10.0)).collect();
    (x, y, w)
}

// =============================================================================
// DENSE HISTOGRAM BENCHMARKS
// =============================================================================

fn bench_dense_weight(c: &mut Criterion) {
    let mut group = c.benchmark_group("hist2d_weight");
    let res = 512;
    let range = BinRange::unit(1, res as i64).unwrap();

    for n in [10_000usize, 100_000, 1_000_000] {
        let (x, y, w) = generate_points(n, res);
        let mut out = Raster::zeros(res, res);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("points", n), &n, |b, _| {
            b.iter(|| {
                out.fill(0.0);
                hist2d_weight(black_box(&x), black_box(&y), black_box(&w), &range, &range, &mut out)
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_dense_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("hist2d_data");
    let res = 512;
    let range = BinRange::unit(1, res as i64).unwrap();
    let n = 100_000;
    let (x, y, w) = generate_points(n, res);
    let d: Vec<f64> = w.iter().map(|v| v * 0.5 + 1.0).collect();
    let mut out = Raster::zeros(res, res);

    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("100k_points", |b| {
        b.iter(|| {
            out.fill(0.0);
            hist2d_data(black_box(&x), black_box(&y), &d, &w, &range, &range, &mut out).unwrap();
        });
    });

    group.finish();
}

// =============================================================================
// SPARSE VS DENSE
// =============================================================================

fn bench_sparse_vs_dense(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_vs_dense");
    group.sample_size(20);
    let n = 50_000;

    for res in [1024usize, SPARSE_THRESHOLD * 2] {
        let range = BinRange::unit(1, res as i64).unwrap();
        let (x, y, w) = generate_clustered_points(n, res);

        group.bench_with_input(BenchmarkId::new("dense", res), &res, |b, &res| {
            b.iter(|| {
                let mut out = Raster::zeros(res, res);
                hist2d_weight(&x, &y, &w, &range, &range, &mut out).unwrap();
                black_box(out)
            });
        });

        group.bench_with_input(BenchmarkId::new("sparse", res), &res, |b, _| {
            b.iter(|| black_box(hist2d_weight_sparse(&x, &y, &w, &range, &range).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("adaptive", res), &res, |b, &res| {
            b.iter(|| {
                let mut out = Raster::zeros(res, res);
                adaptive_hist2d_weight(&x, &y, &w, &range, &range, SPARSE_THRESHOLD, &mut out)
                    .unwrap();
                black_box(out)
            });
        });
    }

    group.finish();
}

// =============================================================================
// ENHANCED COVERAGE
// =============================================================================

fn bench_enhanced_coverage(c: &mut Criterion) {
    let mut group = c.benchmark_group("enhanced_coverage");
    let res = 256;
    let range = BinRange::unit(1, res as i64).unwrap();
    let (x, y, w) = generate_points(20_000, res);
    let mut out = Raster::zeros(res, res);

    for radius in [1.0f64, 2.83, 5.66] {
        group.bench_with_input(BenchmarkId::new("radius", radius), &radius, |b, &radius| {
            b.iter(|| {
                out.fill(0.0);
                hist2d_weight_enhanced(&x, &y, &w, &range, &range, black_box(radius), &mut out)
                    .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_dense_weight,
    bench_dense_data,
    bench_sparse_vs_dense,
    bench_enhanced_coverage,
);
criterion_main!(benches);
