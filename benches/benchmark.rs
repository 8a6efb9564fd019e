use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array3;
use pheno_calc::grid::{ChunkSpec, TimeAxis, TimeSeriesGrid};
use pheno_calc::processing::{compute_phenology, phenology, PhenologyConfig, ProcessingMode, WorkerPool};

/// Synthetic 16-day composites over one year with a few cloud gaps
fn synthetic_grid(rows: usize, cols: usize) -> TimeSeriesGrid {
    let len = 23;
    let t0 = NaiveDate::from_ymd_opt(2022, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    let time = TimeAxis::new((0..len).map(|i| t0 + Duration::days(16 * i as i64)).collect()).unwrap();

    let values = Array3::from_shape_fn((rows, cols, len), |(r, c, t)| {
        if (r * 31 + c * 17 + t) % 11 == 0 {
            return f32::NAN;
        }
        let peak = 9.0 + ((r + c) % 6) as f32;
        let d = t as f32 - peak;
        0.1 + 0.7 * (-d * d / 12.0).exp()
    });
    TimeSeriesGrid::new(values, time).unwrap()
}

/// Benchmark the in-memory computation of every statistic
fn benchmark_eager(c: &mut Criterion) {
    let grid = synthetic_grid(256, 256);
    let config = PhenologyConfig::default().with_verbose(false);

    c.bench_function("phenology_eager_256", |b| {
        b.iter(|| compute_phenology(black_box(&grid), black_box(&config)))
    });
}

/// Benchmark tiled runs with both schedulers
fn benchmark_deferred(c: &mut Criterion) {
    let grid = synthetic_grid(256, 256);
    let config = PhenologyConfig::default().with_verbose(false);

    c.bench_function("phenology_deferred_rayon_256", |b| {
        b.iter(|| {
            let chunked = grid
                .clone()
                .chunk(ChunkSpec::new(64, 64, 23))
                .unwrap()
                .with_scheduler(Arc::new(ProcessingMode::Parallel));
            phenology(chunked, black_box(&config)).and_then(|out| out.compute())
        })
    });

    c.bench_function("phenology_deferred_workers_256", |b| {
        b.iter(|| {
            let chunked = grid
                .clone()
                .chunk(ChunkSpec::new(64, 64, 23))
                .unwrap()
                .with_scheduler(Arc::new(WorkerPool::default()));
            phenology(chunked, black_box(&config)).and_then(|out| out.compute())
        })
    });
}

criterion_group!(benches, benchmark_eager, benchmark_deferred);
criterion_main!(benches);
