use std::fs;

use something::config::*;
use something::error::GameError;
use something::math::vec2;

#[test]
fn missing_fields_keep_defaults() {
    let config = Config::from_ron_str("(player_speed: 300.0)").unwrap();
    assert_eq!(config.player_speed, 300.0);
    assert_eq!(
        Config {
            player_speed: 300.0,
            ..Config::default()
        },
        config
    );
}

#[test]
fn nested_values_parse() {
    let text = r#"(
        gravity: (x: 0.0, y: 1000.0),
        step_fps: 30,
        animats: (plasma_pop: (name: "pop", frame_count: 6, frame_duration: 0.02, looping: false)),
    )"#;
    let config = Config::from_ron_str(text).unwrap();
    assert_eq!(config.gravity, vec2(0.0, 1000.0));
    assert_eq!(config.animats.plasma_pop.frame_count, 6);
    assert_eq!(config.animats.walking, AnimatSet::default().walking);
    assert!((config.step_dt() - 1.0 / 30.0).abs() < 1e-6);
}

#[test]
fn bad_ron_is_a_config_error() {
    let err = Config::from_ron_str("(player_speed: \"fast\")").unwrap_err();
    assert!(matches!(err, GameError::Config(_)));
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.ron");
    fs::write(&path, "(jump_cut: 0.25)").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.jump_cut, 0.25);

    let err = Config::load(&dir.path().join("missing.ron")).unwrap_err();
    assert!(matches!(err, GameError::FatalIo { .. }));
}

#[test]
fn zero_fps_does_not_divide_by_zero() {
    let config = Config {
        step_fps: 0,
        ..Config::default()
    };
    assert_eq!(config.step_dt(), 1.0);
}

#[test]
fn animation_without_frames_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.ron");
    fs::write(
        &path,
        r#"(animats: (idle: (name: "idle", frame_count: 0, frame_duration: 0.5, looping: true)))"#,
    )
    .unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, GameError::FatalResource(_)));
    assert!(Config::default().validate().is_ok());
}
