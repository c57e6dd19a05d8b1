use super::*;
use crate::domain::{ImageRef, Intent, Region};
use serde_json::json;

#[test]
fn decodes_action_frame_with_parameters() {
    let frame = r#"{"type":"ACTION","intent":"ZOOM_IN","parameters":{"factor":1.3,"region":"LEFT_REGION"}}"#;
    let Some(ChannelMessage::Action(action)) = decode_frame(frame).expect("decode") else {
        panic!("expected action frame");
    };
    assert_eq!(action.intent, Intent::ZoomIn);
    assert_eq!(action.factor(), Some(1.3));
    assert_eq!(action.region(), Some(Region::Left));
}

#[test]
fn action_frame_without_parameters_defaults_to_empty_map() {
    let decoded = decode_frame(r#"{"type":"ACTION","intent":"RESET_VIEW"}"#).expect("decode");
    assert_eq!(
        decoded,
        Some(ChannelMessage::Action(Action::new(Intent::ResetView)))
    );
}

#[test]
fn decodes_message_frame() {
    let decoded = decode_frame(r#"{"type":"MESSAGE","text":"scan ready"}"#).expect("decode");
    assert_eq!(
        decoded,
        Some(ChannelMessage::Message {
            text: "scan ready".to_string()
        })
    );
}

#[test]
fn ignores_unrecognized_frame_types() {
    assert_eq!(
        decode_frame(r#"{"type":"HEARTBEAT","seq":4}"#).expect("decode"),
        None
    );
}

#[test]
fn rejects_malformed_frames() {
    assert!(matches!(
        decode_frame("not json"),
        Err(FrameError::InvalidJson(_))
    ));
    assert!(matches!(
        decode_frame(r#"{"intent":"ZOOM_IN"}"#),
        Err(FrameError::MissingType)
    ));
    assert!(matches!(
        decode_frame(r#"{"type":"MESSAGE"}"#),
        Err(FrameError::InvalidPayload {
            kind: "MESSAGE",
            ..
        })
    ));
    assert!(matches!(
        decode_frame(r#"{"type":"ACTION","parameters":{}}"#),
        Err(FrameError::InvalidPayload { kind: "ACTION", .. })
    ));
}

#[test]
fn unknown_intents_are_kept_verbatim() {
    let decoded = decode_frame(r#"{"type":"ACTION","intent":"OPEN_PATIENT_FILE"}"#)
        .expect("decode")
        .expect("action");
    let ChannelMessage::Action(action) = decoded else {
        panic!("expected action");
    };
    assert_eq!(
        action.intent,
        Intent::Other("OPEN_PATIENT_FILE".to_string())
    );
    assert!(!action.intent.is_recognized());
}

#[test]
fn encoded_frames_decode_back() {
    let action = Action::new(Intent::HighlightRegion).with_param("coordinates", json!([0.4, 0.6]));
    let message = ChannelMessage::Action(action);
    assert_eq!(
        decode_frame(&encode_frame(&message)).expect("decode"),
        Some(message)
    );
}

#[test]
fn invalid_factor_is_ignored() {
    let action = Action::new(Intent::ZoomIn).with_param("factor", -2.0);
    assert_eq!(action.factor(), None);
    let action = Action::new(Intent::ZoomIn).with_param("factor", "big");
    assert_eq!(action.factor(), None);
}

#[test]
fn sample_entries_normalize_to_image_refs() {
    let entries: Vec<SampleEntry> = serde_json::from_value(json!([
        "a.png",
        {"filename": "b.png", "uploaded_at": "2024-05-01T10:00:00", "size": 2048},
        {"name": "c.png"}
    ]))
    .expect("entries");
    let refs: Vec<ImageRef> = entries.into_iter().map(ImageRef::from).collect();
    assert_eq!(refs[0], ImageRef::named("a.png"));
    assert_eq!(refs[1].name, "b.png");
    assert_eq!(refs[1].size, Some(2048));
    assert_eq!(refs[1].uploaded_at.as_deref(), Some("2024-05-01T10:00:00"));
    assert_eq!(refs[2], ImageRef::named("c.png"));
}

#[test]
fn upload_response_accepts_bare_name_or_record() {
    let bare: UploadResponse =
        serde_json::from_str(r#"{"saved":"x.png","path":"/samples/x.png"}"#).expect("bare");
    assert_eq!(ImageRef::from(bare.saved), ImageRef::named("x.png"));

    let record: UploadResponse = serde_json::from_str(r#"{"saved":{"name":"x.png"}}"#).expect("record");
    assert_eq!(ImageRef::from(record.saved), ImageRef::named("x.png"));
}

#[test]
fn voice_snapshot_defaults_missing_fields() {
    let voice: VoiceSnapshot = serde_json::from_str(r#"{"confidence":0.7,"mode":"stub"}"#).expect("voice");
    assert_eq!(voice.intent, Intent::Unknown);
    assert_eq!(voice.transcript, "");
    assert_eq!(voice.extra.get("mode"), Some(&json!("stub")));
}

#[test]
fn vision_snapshot_reads_legacy_object_field() {
    let vision: VisionSnapshot =
        serde_json::from_str(r#"{"object_detected":"scalpel","confidence":0.8}"#).expect("vision");
    assert_eq!(vision.object_label(), Some("scalpel"));
}
