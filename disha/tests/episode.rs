//! End-to-end episode runs through the controller.

mod common;

use std::sync::Arc;

use disha::config::DishaConfig;
use disha::io::{ReferenceTableCache, load_map, save_map};
use disha::map::{FieldSpec, MapKind, MazeConfig, MazeGenerator};
use disha::sensor::{NoiseGenerator, cast_scan};
use disha::session::{
    Collaborators, ControllerConfig, ControllerState, EnvironmentSource, EpisodeConfig,
    EpisodeController, LocalizationSession, PlacementConfig, RecordingSink, SessionConfig,
    SimulatedRangeSensor, TeleportConfig, TeleportExecutor,
};
use disha::{GridLimits, LocalizationError, Pose};

fn controller_config(episodes: usize, steps: usize) -> ControllerConfig {
    ControllerConfig {
        session: SessionConfig {
            scan: common::clean_scan(72, 3.0),
            collision_radius: 0.1,
            seed: 11,
            ..SessionConfig::default()
        },
        budget: EpisodeConfig {
            environments: 1,
            episodes,
            steps,
        },
        placement: PlacementConfig {
            collision_radius: 0.1,
            ..PlacementConfig::default()
        },
        ..ControllerConfig::default()
    }
}

fn teleport() -> TeleportExecutor {
    TeleportExecutor::new(
        TeleportConfig {
            forward_step_m: 1.0,
            collision_radius: 0.1,
            ..TeleportConfig::default()
        },
        12,
    )
}

#[test]
fn test_episode_localizes_in_room() {
    common::init_logging();
    let map = Arc::new(common::room());
    let mut controller =
        EpisodeController::new(controller_config(3, 4), EnvironmentSource::Fixed(map));
    let mut sensor = SimulatedRangeSensor::new(common::clean_scan(72, 3.0), 13);
    let mut executor = teleport();
    let mut sink = RecordingSink::default();

    let totals = controller
        .run(&mut Collaborators {
            sensor: &mut sensor,
            executor: &mut executor,
            sink: &mut sink,
            provider: None,
        })
        .unwrap();

    assert_eq!(controller.state(), ControllerState::Terminal);
    assert_eq!(totals.episodes, 3);
    assert_eq!(totals.steps, 12);
    assert_eq!(sink.episodes.len(), 3);

    let uniform_entropy = 36f64.ln();
    for report in &sink.steps {
        assert!((report.belief.sum() - 1.0).abs() < 1e-6);
        assert!((report.likelihood.sum() - 1.0).abs() < 1e-6);
        assert!(report.entropy < uniform_entropy);
        assert!(report.truth_grid.is_some());
        assert!(report.euclidean_error.is_finite());
    }
    for summary in &sink.episodes {
        assert_eq!(summary.steps, 4);
        assert!(summary.poses_explored >= 1);
        assert!(summary.final_entropy < uniform_entropy);
    }
    // The first step of every episode sees a new pose
    for report in sink.steps.iter().filter(|r| r.step == 0) {
        assert!(report.new_pose && report.new_belief);
    }
}

#[test]
fn test_generated_environments_with_cache() {
    common::init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cache = ReferenceTableCache::new(dir.path());

    let generator = MazeGenerator::new(
        MazeConfig {
            kind: MapKind::Boxes,
            boxes: 2,
            box_sides: (0.2, 0.4),
            ..MazeConfig::default()
        },
        5,
    );
    let mut config = controller_config(2, 2);
    config.field = FieldSpec {
        rows: 60,
        cols: 60,
        x_limits: GridLimits::new(-1.5, 1.5),
        y_limits: GridLimits::new(-1.5, 1.5),
        grid_rows: 3,
        grid_cols: 3,
    };
    config.budget.environments = 2;

    let mut controller =
        EpisodeController::new(config, EnvironmentSource::Generated(generator)).with_cache(cache);
    let mut sensor = SimulatedRangeSensor::new(common::clean_scan(72, 3.0), 13);
    let mut executor = teleport();
    let mut sink = RecordingSink::default();
    let totals = controller
        .run(&mut Collaborators {
            sensor: &mut sensor,
            executor: &mut executor,
            sink: &mut sink,
            provider: None,
        })
        .unwrap();

    assert_eq!(totals.environments, 2);
    assert_eq!(totals.episodes, 4);
    let map = controller.map().unwrap();
    let cached = ReferenceTableCache::new(dir.path()).path_for(map.id());
    assert!(cached.exists());
}

#[test]
fn test_persisted_map_reproduces_likelihood() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("room.omap");
    let options = common::clean_scan(72, 3.0);
    let (map, table) = common::room_fixture(&options);
    save_map(&map, &path).unwrap();
    let loaded = Arc::new(load_map(&path).unwrap());
    assert_eq!(loaded.id(), map.id());

    let truth = Pose::new(0.0, -1.0, -1.0);
    let scan = cast_scan(&truth, &map, &options, &mut NoiseGenerator::new(1));
    let config = SessionConfig {
        scan: options.clone(),
        ..SessionConfig::default()
    };
    let mut original = LocalizationSession::new(config.clone(), map, table.clone(), truth).unwrap();
    let mut reloaded = LocalizationSession::new(config, loaded, table, truth).unwrap();

    let a = original.observe(&scan, None).unwrap();
    let b = reloaded.observe(&scan, None).unwrap();
    assert_eq!(a.likelihood, b.likelihood);
    assert_eq!(a.map_pose, b.map_pose);
}

#[test]
fn test_foreign_table_is_configuration_error() {
    let options = common::clean_scan(72, 3.0);
    let (_, table) = common::room_fixture(&options);
    let other = Arc::new(common::empty_map(60, 1.5, 3));
    let result = LocalizationSession::new(
        SessionConfig {
            scan: options,
            ..SessionConfig::default()
        },
        other,
        table,
        Pose::default(),
    );
    assert!(matches!(result, Err(LocalizationError::Configuration(_))));
}

#[test]
fn test_shipped_config_loads() {
    let config = DishaConfig::load_default().unwrap();
    assert!(config.validate().is_ok());
    let controller = config.to_controller_config();
    assert_eq!(controller.session.headings, config.grid.headings);
    assert_eq!(controller.field.grid_rows, config.grid.rows);
    assert_eq!(controller.session.scan.rays, config.sensor.rays);
}
