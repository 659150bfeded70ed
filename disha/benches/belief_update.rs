//! Benchmark belief fusion, transitions and action selection.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use disha::filter::{Belief, MotionModelKind, TransitionConfig, TransitionModel};
use disha::likelihood::LikelihoodField;
use disha::sensor::{BuildOptions, CancelToken, NoiseGenerator, ReferenceScanTable, ScanOptions};
use disha::session::{LocalizationSession, SessionConfig};
use disha::{Action, GridLimits, GridPose, GridShape, OccupancyMap, Pose, cast_scan};
use std::sync::Arc;

fn bench_fuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("belief_fuse");
    for size in [11, 21, 41].iter() {
        let shape = GridShape::new(4, *size, *size);
        let likelihood =
            LikelihoodField::peaked(shape, GridPose::new(0, size / 2, size / 2), 1.0, 0.01)
                .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut belief = Belief::uniform(shape);
                belief.fuse(black_box(&likelihood)).unwrap();
                black_box(belief.entropy())
            })
        });
    }
    group.finish();
}

fn bench_transition(c: &mut Criterion) {
    let shape = GridShape::new(4, 21, 21);
    let mut group = c.benchmark_group("transition");
    for model in [
        MotionModelKind::Roll,
        MotionModelKind::Shift,
        MotionModelKind::StochasticShift,
    ] {
        let transition = TransitionModel::new(TransitionConfig {
            model,
            ..TransitionConfig::default()
        });
        let mut belief = Belief::uniform(shape);
        group.bench_function(format!("{:?}", model), |b| {
            b.iter(|| {
                transition.apply(&mut belief, black_box(Action::GoForward));
                transition.apply(&mut belief, black_box(Action::TurnLeft));
            })
        });
    }
    group.finish();
}

fn bench_decide(c: &mut Criterion) {
    let n = 110;
    let mut cells = vec![0.0f32; n * n];
    for i in 0..n {
        cells[i] = 1.0;
        cells[i * n] = 1.0;
        cells[(n - 1) * n + i] = 1.0;
        cells[i * n + n - 1] = 1.0;
    }
    let lim = GridLimits::new(-2.75, 2.75);
    let map = Arc::new(OccupancyMap::from_cells(n, n, lim, lim, cells, 5, 5).unwrap());
    let options = ScanOptions {
        step_jitter: 0.0,
        ..ScanOptions::default()
    };
    let table = Arc::new(
        ReferenceScanTable::build(&map, &options, BuildOptions::default(), &CancelToken::new())
            .unwrap(),
    );
    let truth = Pose::new(0.0, -1.1, -1.1);
    let config = SessionConfig {
        scan: options.clone(),
        seed: 1,
        ..SessionConfig::default()
    };
    let mut session = LocalizationSession::new(config, map.clone(), table, truth).unwrap();
    let scan = cast_scan(&truth, &map, &options, &mut NoiseGenerator::new(2));
    session.observe(&scan, None).unwrap();

    c.bench_function("entropy_lookahead_5x5", |b| {
        b.iter(|| {
            let decision = session.decide(black_box(&scan), None).unwrap();
            black_box(decision)
        })
    });
}

criterion_group!(benches, bench_fuse, bench_transition, bench_decide);
criterion_main!(benches);
