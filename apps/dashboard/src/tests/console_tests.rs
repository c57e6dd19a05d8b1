use std::time::Duration;

use super::*;
use client_core::DashboardState;
use shared::domain::{ConnectionState, ImageRef};

fn event_of(line: &str) -> DashboardEvent {
    match parse_line(line).expect("parse") {
        Some(ConsoleCommand::Event(event)) => event,
        other => panic!("expected event for {line:?}, got {other:?}"),
    }
}

fn local_action(line: &str) -> Action {
    match event_of(line) {
        DashboardEvent::LocalAction(action) => action,
        other => panic!("expected local action, got {other:?}"),
    }
}

#[test]
fn blank_lines_are_skipped() {
    assert!(parse_line("   ").expect("parse").is_none());
}

#[test]
fn zoom_in_accepts_region_and_factor() {
    let action = local_action("zoom-in left 2");
    assert_eq!(action.intent, Intent::ZoomIn);
    assert_eq!(action.parameters.get("region"), Some(&json!("LEFT_REGION")));
    assert_eq!(action.factor(), Some(2.0));

    assert!(parse_line("zoom-in sideways").is_err());
    assert!(parse_line("zoom-out -1").is_err());
}

#[test]
fn navigation_and_raw_intents() {
    assert_eq!(local_action("NEXT").intent, Intent::NextImage);
    assert_eq!(local_action("prev").intent, Intent::PrevImage);
    assert_eq!(local_action("reset").intent, Intent::ResetView);
    assert_eq!(
        local_action("action open_patient_file").intent,
        Intent::Other("open_patient_file".into())
    );
}

#[test]
fn highlight_needs_two_numbers() {
    let action = local_action("highlight 0.25 0.75");
    assert_eq!(action.coordinates(), Some(&json!({"x": 0.25, "y": 0.75})));
    assert!(parse_line("highlight 1").is_err());
}

#[test]
fn select_and_upload_keep_spaces() {
    match event_of("select knee scan.png") {
        DashboardEvent::SelectImage(name) => assert_eq!(name, "knee scan.png"),
        other => panic!("unexpected {other:?}"),
    }
    match event_of("upload /data/new scans/x.png") {
        DashboardEvent::UploadRequested(path) => {
            assert_eq!(path, PathBuf::from("/data/new scans/x.png"))
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(parse_line("upload").is_err());
}

#[test]
fn keys_and_focus() {
    assert_eq!(parse_key("shift+tab").expect("key"), KeyInput::shifted(Key::Tab));
    assert_eq!(parse_key("ESC").expect("key"), KeyInput::new(Key::Escape));
    assert_eq!(parse_key("f").expect("key"), KeyInput::new(Key::Char('f')));
    assert!(parse_key("ctrl").is_err());

    match event_of("focus search text") {
        DashboardEvent::Focus(target) => assert!(target.text_entry),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn simulation_toggle_and_quit() {
    assert!(matches!(event_of("sim on"), DashboardEvent::SetSimulation(true)));
    assert!(matches!(event_of("sim OFF"), DashboardEvent::SetSimulation(false)));
    assert!(parse_line("sim maybe").is_err());
    assert!(matches!(parse_line("quit").expect("parse"), Some(ConsoleCommand::Quit)));
    assert!(parse_line("launch").is_err());
}

#[test]
fn describes_snapshot_and_connection() {
    let mut state = DashboardState::new(false);
    state.mount();
    state.handle(
        DashboardEvent::SamplesLoaded(vec![ImageRef::named("a.png"), ImageRef::named("b.png")]),
        std::time::Instant::now(),
    );
    let line = describe(&DashboardUpdate::Snapshot(Box::new(state.snapshot()))).expect("line");
    assert!(line.contains("image=a.png (1/2)"), "{line}");
    assert!(line.contains("scale=1.00"), "{line}");

    let line = describe(&DashboardUpdate::Connection {
        state: ConnectionState::Closed,
        retry_in: Some(Duration::from_millis(3000)),
    })
    .expect("line");
    assert_eq!(line, "channel closed, retrying in 3000 ms");
}
