//! Invariants of the geometry, sensor, filter and selector.

mod common;

use std::f64::consts::PI;

use approx::assert_relative_eq;
use disha::core::{GridLimits, GridPose, GridShape, Pose, to_index, to_real, wrap};
use disha::filter::{Belief, MotionModelKind, TransitionConfig, TransitionModel};
use disha::likelihood::{
    LikelihoodBuilder, LikelihoodConfig, LikelihoodField, Normalization, Observation,
};
use disha::planning::{ActionSelector, SelectorConfig};
use disha::sensor::{NoiseGenerator, cast_scan};
use disha::session::{LocalizationSession, SessionConfig};
use disha::Action;

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn test_index_real_roundtrip() {
    let cases = [
        (GridLimits::new(-3.0, 3.0), 11),
        (GridLimits::new(0.0, 1.0), 1),
        (GridLimits::new(-0.7, 2.3), 224),
        (GridLimits::new(10.0, 10.5), 7),
    ];
    for (limits, size) in cases {
        for i in 0..size as i64 {
            let x = to_real(i, limits, size);
            assert_eq!(
                to_index(x, size, limits),
                i,
                "limits {:?} size {}",
                limits,
                size
            );
        }
    }
}

#[test]
fn test_wrap_range_and_idempotence() {
    let mut theta = -20.0;
    while theta < 20.0 {
        let w = wrap(theta);
        assert!(w > -PI && w <= PI, "wrap({}) = {}", theta, w);
        assert_eq!(wrap(w), w);
        theta += 0.037;
    }
    assert_eq!(wrap(PI), PI);
    assert_relative_eq!(wrap(-PI), PI, epsilon = 1e-12);
}

// ============================================================================
// Belief filter
// ============================================================================

fn random_likelihood(shape: GridShape, noise: &mut NoiseGenerator) -> LikelihoodField {
    let data = (0..shape.len()).map(|_| noise.uniform()).collect();
    let mut field = LikelihoodField::from_vec(shape, data).unwrap();
    field.normalize_sum().unwrap();
    field
}

#[test]
fn test_fuse_keeps_distribution() {
    let shape = GridShape::new(4, 6, 5);
    let mut noise = NoiseGenerator::new(3);
    let mut belief = Belief::uniform(shape);
    for _ in 0..20 {
        belief.fuse(&random_likelihood(shape, &mut noise)).unwrap();
        assert!((belief.sum() - 1.0).abs() < 1e-6);
        assert!(belief.min() >= 0.0);
    }
}

#[test]
fn test_every_transition_conserves_mass() {
    let shape = GridShape::new(4, 7, 6);
    let mut noise = NoiseGenerator::new(5);
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
        belief.fuse(&random_likelihood(shape, &mut noise)).unwrap();
        for action in [
            Action::TurnLeft,
            Action::GoForward,
            Action::TurnRight,
            Action::GoForward,
            Action::GoForward,
            Action::Hold,
        ] {
            transition.apply(&mut belief, action);
            assert!(
                (belief.sum() - 1.0).abs() < 1e-6,
                "{:?} after {} lost mass: {}",
                model,
                action,
                belief.sum()
            );
            assert!(belief.min() >= 0.0);
        }
    }
}

#[test]
fn test_single_corridor_cell_takes_all_mass() {
    common::init_logging();
    // Only the centre cell of a 5x5 grid is free
    let map = common::square_map(50, 2.5, 5, |r, c| {
        !((20..30).contains(&r) && (20..30).contains(&c))
    });
    let blocked = map.blocked_cells(0.0);
    assert_eq!(blocked.iter().filter(|b| !**b).count(), 1);

    let shape = GridShape::new(4, 5, 5);
    let raw: Vec<f64> = (0..shape.len())
        .map(|i| if blocked[i % shape.slice_len()] { 0.0 } else { 1.0 })
        .collect();
    let mut likelihood = LikelihoodField::from_vec(shape, raw).unwrap();
    likelihood
        .normalize(Normalization::Softmax { temperature: 1.0 })
        .unwrap();

    let corridor_mass =
        |b: &Belief| (0..4).map(|h| b.get(GridPose::new(h, 2, 2))).sum::<f64>();
    let mut belief = Belief::uniform(shape);
    let mut last = corridor_mass(&belief);
    for _ in 0..10 {
        belief.fuse(&likelihood).unwrap();
        let mass = corridor_mass(&belief);
        assert!(mass >= last);
        last = mass;
    }
    assert!(last > 0.99, "corridor mass {}", last);
    assert_eq!(
        (belief.map_estimate().row, belief.map_estimate().col),
        (2, 2)
    );
}

#[test]
fn test_one_hot_fusion_lowers_entropy() {
    let shape = GridShape::new(4, 5, 5);
    let mut belief = Belief::uniform(shape);
    let prior = belief.entropy();
    assert_relative_eq!(prior, 100f64.ln(), epsilon = 1e-9);

    let target = GridPose::new(0, 2, 2);
    let likelihood = LikelihoodField::peaked(shape, target, 1.0, 0.001).unwrap();
    belief.fuse(&likelihood).unwrap();

    assert!(belief.entropy() < prior);
    assert_eq!(belief.map_estimate(), target);
    assert!(belief.negentropy() > -prior);
}

// ============================================================================
// Synthetic sensor
// ============================================================================

#[test]
fn test_empty_map_reports_max_range() {
    let map = common::empty_map(80, 2.0, 4);
    let options = common::clean_scan(360, 1.5);
    let scan = cast_scan(
        &Pose::new(0.3, 0.0, 0.0),
        &map,
        &options,
        &mut NoiseGenerator::new(1),
    );
    let clamped = scan.clamped(options.min_range, options.max_range);
    assert!(clamped.ranges().iter().all(|&r| r == options.max_range));
}

#[test]
fn test_single_obstacle_ahead() {
    // 2x2 pixel block at x in [1.0, 1.1), y in [-0.05, 0.05)
    let map = common::square_map(80, 2.0, 4, |r, c| {
        (60..62).contains(&r) && (39..41).contains(&c)
    });
    let options = common::clean_scan(360, 1.5);
    let scan = cast_scan(
        &Pose::new(0.0, 0.0, 0.0),
        &map,
        &options,
        &mut NoiseGenerator::new(1),
    );
    let clamped = scan.clamped(options.min_range, options.max_range);

    let ahead = clamped.ranges()[0];
    assert!(ahead < options.max_range);
    assert!((ahead - 1.0).abs() < 0.03, "ahead {}", ahead);
    assert_eq!(clamped.ranges()[180], options.max_range);
    assert_eq!(clamped.ranges()[90], options.max_range);
}

// ============================================================================
// Action selection
// ============================================================================

#[test]
fn test_blocked_forward_is_never_chosen() {
    common::init_logging();
    let options = common::clean_scan(72, 3.0);
    let (map, table) = common::room_fixture(&options);
    let config = SessionConfig {
        scan: options.clone(),
        collision_radius: 0.1,
        seed: 3,
        ..SessionConfig::default()
    };

    // Facing the rim at each heading, close enough that one step collides
    let starts = [
        Pose::new(PI, -1.3, 0.0),
        Pose::new(0.0, 1.3, -0.9),
        Pose::new(PI / 2.0, 0.0, 1.3),
        Pose::new(-PI / 2.0, 0.0, -1.3),
    ];
    for truth in starts {
        let mut session =
            LocalizationSession::new(config.clone(), map.clone(), table.clone(), truth).unwrap();
        let scan = cast_scan(&truth, &map, &options, &mut NoiseGenerator::new(2));
        session.observe(&scan, None).unwrap();
        assert!(session.forward_blocked(&scan), "{:?} not blocked", truth);

        let decision = session.decide(&scan, None).unwrap();
        assert_ne!(decision.action, Action::GoForward);
        assert!(decision.score_of(Action::GoForward).is_none());
    }
}

#[test]
fn test_blocked_forward_loses_even_when_best() {
    common::init_logging();
    // Short range: (0, 0) and (0, 2) see nothing, only (1, 0) sees the block
    let map = common::square_map(60, 1.5, 3, |r, c| {
        (33..36).contains(&r) && (6..14).contains(&c)
    });
    let options = common::clean_scan(72, 0.4);
    let table = common::table_for(&map, &options);
    let observation = Observation::ground_truth(&map, &table);

    let shape = GridShape::new(4, 3, 3);
    let mut weights = vec![0.0; shape.len()];
    weights[shape.index(GridPose::new(0, 0, 0))] = 1.0;
    weights[shape.index(GridPose::new(0, 0, 2))] = 1.0;
    let belief = Belief::from_weights(shape, weights).unwrap();
    let believed = Pose::new(0.0, -1.0, -1.0);

    let selector = || {
        ActionSelector::new(
            SelectorConfig {
                forward_step_m: 1.0,
                ..SelectorConfig::default()
            },
            TransitionModel::new(TransitionConfig {
                model: MotionModelKind::Shift,
                ..TransitionConfig::default()
            }),
            LikelihoodBuilder::new(LikelihoodConfig {
                normalization: Normalization::Linear,
                ..LikelihoodConfig::default()
            }),
            &options,
            NoiseGenerator::new(9),
        )
    };

    let free = selector().select(&observation, &belief, &believed, false).unwrap();
    assert_eq!(free.action, Action::GoForward);
    let forward = free.score_of(Action::GoForward).unwrap();
    for turn in [Action::TurnLeft, Action::TurnRight] {
        assert!(forward > free.score_of(turn).unwrap());
    }

    let blocked = selector().select(&observation, &belief, &believed, true).unwrap();
    assert_ne!(blocked.action, Action::GoForward);
    assert!(blocked.score_of(Action::GoForward).is_none());
    assert_eq!(blocked.action, Action::TurnLeft);
}
