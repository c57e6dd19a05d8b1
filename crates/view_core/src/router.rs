//! Maps recognized actions onto the dashboard view.

use serde_json::Value;
use shared::{
    domain::{Intent, Region},
    protocol::Action,
};
use tracing::{debug, info};

use crate::{
    gallery::GalleryModel,
    transform::{TransformPatch, ViewState},
};

pub const DEFAULT_ZOOM_FACTOR: f64 = 1.3;
pub const REGION_PAN_OFFSET: f64 = 200.0;

/// The part of the dashboard an action may mutate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub view: ViewState,
    pub gallery: GalleryModel,
}

/// Transient highlight request for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub coordinates: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub state: DashboardView,
    /// Summary for the status channel; `None` when the intent was not handled.
    pub status: Option<String>,
    pub highlight: Option<Highlight>,
}

impl Dispatch {
    pub fn handled(&self) -> bool {
        self.status.is_some()
    }
}

pub fn apply(action: &Action, mut state: DashboardView) -> Dispatch {
    let mut highlight = None;

    match &action.intent {
        Intent::ZoomIn => {
            let factor = action.factor().unwrap_or(DEFAULT_ZOOM_FACTOR);
            let current = state.view.transform();
            let mut patch = TransformPatch::scale(current.scale * factor);
            match action.region() {
                Some(Region::Left) => patch = patch.with_x(REGION_PAN_OFFSET),
                Some(Region::Right) => patch = patch.with_x(-REGION_PAN_OFFSET),
                None => {}
            }
            state.view.set_transform(patch);
        }
        Intent::ZoomOut => {
            let factor = action.factor().unwrap_or(DEFAULT_ZOOM_FACTOR);
            let current = state.view.transform();
            state
                .view
                .set_transform(TransformPatch::scale(current.scale / factor).with_x(0.0).with_y(0.0));
        }
        Intent::ResetView => state.view.reset(),
        Intent::NextImage => {
            if state.gallery.next() {
                state.view.reset();
            }
        }
        Intent::PrevImage => {
            if state.gallery.prev() {
                state.view.reset();
            }
        }
        Intent::HighlightRegion => {
            highlight = Some(Highlight {
                coordinates: action.coordinates().cloned(),
            });
        }
        Intent::Unknown => {
            debug!("router: no command recognized");
            return unhandled(state);
        }
        Intent::Other(raw) => {
            info!(intent = %raw, "router: unhandled intent");
            return unhandled(state);
        }
    }

    Dispatch {
        status: Some(summarize(action)),
        state,
        highlight,
    }
}

fn unhandled(state: DashboardView) -> Dispatch {
    Dispatch {
        state,
        status: None,
        highlight: None,
    }
}

fn summarize(action: &Action) -> String {
    match (&action.intent, action.region()) {
        (Intent::ZoomIn, Some(region)) => {
            format!("{} {}", action.intent.label(), region.as_str().replace('_', " "))
        }
        _ => action.intent.label(),
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
