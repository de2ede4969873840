//! Decoding of telemetry and toolpath payloads as they arrive on the wire

use glam::Vec3;
use scenesync_core::{
    ActiveState, MotionKind, TelemetryState, ToolpathDescription, ToolpathError, WorkPosition,
};

#[test]
fn test_decode_report_with_string_coordinates() {
    let raw = r#"{
        "status": {
            "activeState": "Run",
            "workPosition": { "x": "10.500", "y": "-2.000", "z": "3.250" }
        },
        "parserstate": { "modal": { "motion": "G1", "units": "G21" } }
    }"#;

    let state = TelemetryState::from_json(raw).expect("valid payload");
    assert_eq!(state.status.active_state, ActiveState::Run);
    assert_eq!(
        state.status.work_position.resolve(),
        Vec3::new(10.5, -2.0, 3.25)
    );
    assert_eq!(state.parser_state["modal"]["motion"], "G1");
}

#[test]
fn test_decode_partial_report() {
    let raw = r#"{ "status": { "workPosition": { "x": 4, "z": "bogus" } } }"#;

    let state = TelemetryState::from_json(raw).expect("valid payload");
    assert_eq!(state.status.active_state, ActiveState::Unknown);
    assert_eq!(state.status.work_position.resolve(), Vec3::new(4.0, 0.0, 0.0));
    assert!(state.parser_state.is_null());
}

#[test]
fn test_raw_positions_compare_by_value() {
    let a = WorkPosition::new(1.0, 2.0, 3.0);
    let b = WorkPosition::new(1.0, 2.0, 3.0);
    let c = WorkPosition::new(1.0, 2.0, 3.5);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_decode_toolpath_description() {
    let raw = r#"{
        "segments": [
            { "motion": "rapid", "points": [[0, 0, 5], [10, 10, 5]] },
            { "points": [[10, 10, 0], [20, 10, 0], [20, 20, 0]] }
        ]
    }"#;

    let desc = ToolpathDescription::from_json(raw).expect("valid toolpath");
    assert_eq!(desc.len(), 2);
    assert_eq!(desc.segments[0].motion, MotionKind::Rapid);
    assert_eq!(desc.segments[1].motion, MotionKind::Feed);
    assert_eq!(desc.segments[1].points[2], Vec3::new(20.0, 20.0, 0.0));
}

#[test]
fn test_malformed_toolpath_description() {
    let err = ToolpathDescription::from_json("{ \"segments\": 3 }").unwrap_err();
    assert!(matches!(err, ToolpathError::Malformed { .. }));
}
