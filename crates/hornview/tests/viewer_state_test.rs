//! Options, viewer state, controls and redraw queue, without a GPU.

use hornview::*;
use winit::keyboard::KeyCode;

#[test]
fn options_round_trip_through_json_file() {
    let mut options = Options::default();
    options.mode = RenderMode::SideBySide;
    options.stereo.far = None;
    options.material.texture_scale = Vec2::new(2.0, 0.5);
    options.texture_path = Some("textures/checker.png".to_string());

    let path = std::env::temp_dir().join(format!("hornview_options_{}.json", std::process::id()));
    options.save(&path).expect("save failed");
    let loaded = Options::load(&path).expect("load failed");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.mode, RenderMode::SideBySide);
    assert_eq!(loaded.stereo, options.stereo);
    assert_eq!(loaded.material, options.material);
    assert_eq!(loaded.texture_path, options.texture_path);
}

#[test]
fn partial_json_takes_defaults() {
    let options = Options::from_json_str(r#"{ "mode": "Mono" }"#).expect("parse failed");
    assert_eq!(options.mode, RenderMode::Mono);
    assert_eq!(options.stereo, StereoParams::default());
    assert_eq!(options.surface, SurfaceParams::default());
}

#[test]
fn invalid_json_values_are_rejected() {
    let err = Options::from_json_str(r#"{ "stereo": { "near": 5.0, "far": 2.0 } }"#).unwrap_err();
    assert!(matches!(err, HornError::InvalidCamera { field: "far", .. }));

    let err = Options::from_json_str(r#"{ "stereo": { "convergence": 0.0 } }"#).unwrap_err();
    assert!(matches!(
        err,
        HornError::InvalidCamera {
            field: "convergence",
            ..
        }
    ));
}

#[test]
fn snapshot_carries_orbit_and_sensor() {
    let mut state = ViewerState::new(Options::default()).unwrap();
    let orbit = Mat4::from_rotation_x(0.3);
    let sensor = sensor_rotation_from_euler(10.0, 20.0, 30.0);
    state.set_sensor_rotation(Some(sensor));

    let frame = state.snapshot(orbit);
    assert_eq!(frame.orbit_view, orbit);
    assert_eq!(frame.sensor_rotation, Some(sensor));

    // Later edits do not reach a snapshot already taken.
    state.set_mode(RenderMode::Mono);
    assert_eq!(frame.mode, RenderMode::Anaglyph);
}

#[test]
fn keyboard_commands_drive_state() {
    let mut state = ViewerState::new(Options::default()).unwrap();
    let convergence = state.options().stereo.convergence;

    for code in [KeyCode::ArrowUp, KeyCode::ArrowUp, KeyCode::ArrowDown] {
        command_for_key(code).unwrap().apply(&mut state).unwrap();
    }
    assert!((state.options().stereo.convergence - convergence - 0.5).abs() < 1e-5);

    // Rejected edits leave the state unchanged.
    state.set_fov_degrees(179.5).unwrap();
    let result = command_for_key(KeyCode::BracketRight)
        .unwrap()
        .apply(&mut state);
    assert!(result.is_err());
    assert!((state.options().stereo.fov_degrees() - 179.5).abs() < 1e-3);
}

#[test]
fn every_trigger_yields_its_own_redraw() {
    let (tx, queue) = RedrawQueue::new();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let tx = tx.clone();
            std::thread::spawn(move || {
                tx.request(RedrawReason::SensorReading);
                tx.request(RedrawReason::TextureLoaded);
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    tx.request(RedrawReason::OrbitMoved);

    let drained = queue.drain();
    assert_eq!(drained.len(), 9);
    assert_eq!(drained.last(), Some(&RedrawReason::OrbitMoved));
    assert!(queue.drain().is_empty());
}

#[test]
fn trackball_feeds_view_matrix() {
    let mut orbit = TrackballController::new();
    let viewport = Vec2::new(640.0, 480.0);
    orbit.begin_drag(Vec2::new(320.0, 240.0), viewport);
    assert!(orbit.drag_to(Vec2::new(320.0, 140.0), viewport));
    orbit.end_drag();

    let state = ViewerState::new(Options::default()).unwrap();
    let frame = state.snapshot(orbit.view_matrix());
    assert_ne!(frame.orbit_view, Mat4::IDENTITY);
}
