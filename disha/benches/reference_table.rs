//! Benchmark reference table construction and likelihood computation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use disha::likelihood::{LikelihoodBuilder, LikelihoodConfig};
use disha::map::{FieldSpec, MazeConfig, MazeGenerator};
use disha::sensor::{BuildOptions, CancelToken, NoiseGenerator, ReferenceScanTable, ScanOptions};
use disha::{GridLimits, OccupancyMap, Pose, cast_scan};

/// Default-sized maze: 224 × 224 px over 6 m, 11 × 11 grid.
fn maze() -> OccupancyMap {
    let spec = FieldSpec {
        rows: 224,
        cols: 224,
        x_limits: GridLimits::new(-3.0, 3.0),
        y_limits: GridLimits::new(-3.0, 3.0),
        grid_rows: 11,
        grid_cols: 11,
    };
    MazeGenerator::new(MazeConfig::default(), 42)
        .generate(spec)
        .unwrap()
}

fn bench_table_build(c: &mut Criterion) {
    let map = maze();
    let options = ScanOptions::default();
    let cancel = CancelToken::new();

    let mut group = c.benchmark_group("reference_table_build");
    group.sample_size(10);
    for workers in [1, 2, 4, 0].iter() {
        let build = BuildOptions {
            workers: *workers,
            seed: 1,
        };
        group.bench_with_input(BenchmarkId::from_parameter(workers), workers, |b, _| {
            b.iter(|| {
                let table =
                    ReferenceScanTable::build(black_box(&map), &options, build, &cancel).unwrap();
                black_box(table)
            })
        });
    }
    group.finish();
}

fn bench_cast_scan(c: &mut Criterion) {
    let map = maze();
    let options = ScanOptions::default();
    let mut noise = NoiseGenerator::new(7);
    let pose = Pose::new(0.3, -2.2, -2.2);

    c.bench_function("cast_scan_360", |b| {
        b.iter(|| {
            let scan = cast_scan(black_box(&pose), &map, &options, &mut noise);
            black_box(scan)
        })
    });
}

fn bench_likelihood(c: &mut Criterion) {
    let map = maze();
    let options = ScanOptions::default();
    let table = ReferenceScanTable::build(
        &map,
        &options,
        BuildOptions::default(),
        &CancelToken::new(),
    )
    .unwrap();
    let scan = cast_scan(
        &Pose::new(0.0, -2.2, -2.2),
        &map,
        &options,
        &mut NoiseGenerator::new(3),
    );

    let mut group = c.benchmark_group("likelihood_compute");
    for headings in [4, 8, 16].iter() {
        let builder = LikelihoodBuilder::new(LikelihoodConfig {
            headings: *headings,
            ..LikelihoodConfig::default()
        });
        group.bench_with_input(BenchmarkId::from_parameter(headings), headings, |b, _| {
            b.iter(|| {
                let field = builder
                    .compute(Some(&map), Some(&table), Some(black_box(&scan)))
                    .unwrap();
                black_box(field)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_table_build, bench_cast_scan, bench_likelihood);
criterion_main!(benches);
