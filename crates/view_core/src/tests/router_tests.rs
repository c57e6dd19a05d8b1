use super::*;
use crate::transform::Transform;
use serde_json::json;
use shared::domain::ImageRef;

fn gallery(names: &[&str]) -> GalleryModel {
    GalleryModel::from_listing(names.iter().map(|name| ImageRef::named(*name)).collect())
}

fn view_with(names: &[&str], selected: &str) -> DashboardView {
    let mut gallery = gallery(names);
    assert!(gallery.select(selected));
    DashboardView {
        view: ViewState::new(),
        gallery,
    }
}

fn selected_name(state: &DashboardView) -> Option<&str> {
    state.gallery.selected().map(|image| image.name.as_str())
}

#[test]
fn zoom_in_toward_left_region_biases_viewport() {
    let action = Action::new(Intent::ZoomIn)
        .with_param("factor", 1.3)
        .with_param("region", "LEFT_REGION");
    let dispatch = apply(&action, DashboardView::default());
    assert_eq!(
        dispatch.state.view.transform(),
        Transform {
            scale: 1.3,
            x: 200.0,
            y: 0.0
        }
    );
    assert_eq!(dispatch.status.as_deref(), Some("ZOOM IN LEFT REGION"));
}

#[test]
fn zoom_in_toward_right_region_pans_negative() {
    let action = Action::new(Intent::ZoomIn).with_param("region", "RIGHT_REGION");
    let dispatch = apply(&action, DashboardView::default());
    assert_eq!(dispatch.state.view.transform().x, -200.0);
}

#[test]
fn zoom_in_without_region_keeps_pan() {
    let mut state = DashboardView::default();
    state
        .view
        .set_transform(TransformPatch::scale(2.0).with_x(35.0).with_y(-10.0));
    let dispatch = apply(&Action::new(Intent::ZoomIn), state);
    let transform = dispatch.state.view.transform();
    assert!((transform.scale - 2.6).abs() < 1e-9);
    assert_eq!((transform.x, transform.y), (35.0, -10.0));
}

#[test]
fn zoom_sequences_stay_within_bounds() {
    let mut state = DashboardView::default();
    let steps = [
        Intent::ZoomIn,
        Intent::ZoomIn,
        Intent::ZoomIn,
        Intent::ZoomIn,
        Intent::ZoomIn,
        Intent::ZoomIn,
        Intent::ZoomIn,
        Intent::ZoomOut,
        Intent::ZoomOut,
        Intent::ZoomOut,
        Intent::ZoomOut,
        Intent::ZoomOut,
        Intent::ZoomOut,
        Intent::ZoomOut,
        Intent::ZoomOut,
    ];
    for intent in steps {
        state = apply(&Action::new(intent).with_param("factor", 1.9), state).state;
        let scale = state.view.transform().scale;
        assert!((1.0..=5.0).contains(&scale), "scale out of range: {scale}");
    }
    assert!(state.view.transform().is_identity());
}

#[test]
fn zoom_in_clamps_to_maximum() {
    let action = Action::new(Intent::ZoomIn).with_param("factor", 100.0);
    let dispatch = apply(&action, DashboardView::default());
    assert_eq!(dispatch.state.view.transform().scale, 5.0);
}

#[test]
fn zoom_out_resets_pan() {
    let mut state = DashboardView::default();
    state
        .view
        .set_transform(TransformPatch::scale(4.0).with_x(200.0).with_y(20.0));
    let dispatch = apply(&Action::new(Intent::ZoomOut), state);
    let transform = dispatch.state.view.transform();
    assert!(transform.scale > 1.0);
    assert_eq!((transform.x, transform.y), (0.0, 0.0));
}

#[test]
fn reset_view_is_idempotent() {
    let mut state = DashboardView::default();
    state
        .view
        .set_transform(TransformPatch::scale(3.0).with_x(-200.0));
    let once = apply(&Action::new(Intent::ResetView), state).state;
    let twice = apply(&Action::new(Intent::ResetView), once.clone()).state;
    assert_eq!(once, twice);
    assert!(twice.view.transform().is_identity());
}

#[test]
fn next_image_wraps_at_the_end() {
    let state = view_with(&["a.png", "b.png", "c.png"], "b.png");
    let state = apply(&Action::new(Intent::NextImage), state).state;
    assert_eq!(selected_name(&state), Some("c.png"));
    let state = apply(&Action::new(Intent::NextImage), state).state;
    assert_eq!(selected_name(&state), Some("a.png"));
}

#[test]
fn next_then_prev_returns_to_original_selection() {
    for selected in ["a.png", "b.png", "c.png"] {
        let state = view_with(&["a.png", "b.png", "c.png"], selected);
        let state = apply(&Action::new(Intent::NextImage), state).state;
        let state = apply(&Action::new(Intent::PrevImage), state).state;
        assert_eq!(selected_name(&state), Some(selected));

        let state = apply(&Action::new(Intent::PrevImage), state).state;
        let state = apply(&Action::new(Intent::NextImage), state).state;
        assert_eq!(selected_name(&state), Some(selected));
    }
}

#[test]
fn navigation_on_single_image_gallery_stays_put() {
    let state = view_with(&["only.png"], "only.png");
    let state = apply(&Action::new(Intent::PrevImage), state).state;
    assert_eq!(selected_name(&state), Some("only.png"));
}

#[test]
fn navigation_resets_transform() {
    let mut state = view_with(&["a.png", "b.png"], "a.png");
    state.view.set_transform(TransformPatch::scale(2.5).with_x(200.0));
    let state = apply(&Action::new(Intent::NextImage), state).state;
    assert!(state.view.transform().is_identity());
}

#[test]
fn navigation_on_empty_gallery_is_a_noop() {
    let dispatch = apply(&Action::new(Intent::NextImage), DashboardView::default());
    assert!(dispatch.state.gallery.selected().is_none());
    let dispatch = apply(&Action::new(Intent::PrevImage), dispatch.state);
    assert!(dispatch.state.gallery.selected().is_none());
}

#[test]
fn highlight_leaves_view_untouched() {
    let state = view_with(&["a.png", "b.png"], "b.png");
    let before = state.clone();
    let action = Action::new(Intent::HighlightRegion).with_param("coordinates", json!({"x": 10, "y": 20}));
    let dispatch = apply(&action, state);
    assert_eq!(dispatch.state, before);
    assert_eq!(
        dispatch.highlight,
        Some(Highlight {
            coordinates: Some(json!({"x": 10, "y": 20}))
        })
    );
    assert_eq!(dispatch.status.as_deref(), Some("HIGHLIGHT REGION"));
}

#[test]
fn unrecognized_intents_change_nothing() {
    let state = view_with(&["a.png", "b.png"], "a.png");
    let before = state.clone();
    let dispatch = apply(&Action::new(Intent::Other("OPEN_PATIENT_FILE".into())), state);
    assert!(!dispatch.handled());
    assert_eq!(dispatch.state, before);

    let dispatch = apply(&Action::new(Intent::Unknown), dispatch.state);
    assert!(!dispatch.handled());
    assert_eq!(dispatch.state, before);
}
