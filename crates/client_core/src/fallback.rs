//! Deterministic stand-in data for when no live telemetry is available.

use serde_json::json;
use shared::{
    domain::Intent,
    protocol::{Action, FusionDecision},
};

struct CannedDecision {
    action: &'static str,
    status: Option<&'static str>,
    reason: &'static str,
    score: f64,
}

const DECISIONS: &[CannedDecision] = &[
    CannedDecision {
        action: "OPEN_PATIENT_FILE",
        status: Some("APPROVED"),
        reason: "Patient file requested",
        score: 0.92,
    },
    CannedDecision {
        action: "SHOW_CT_SCAN",
        status: Some("APPROVED"),
        reason: "CT scan requested",
        score: 0.9,
    },
    CannedDecision {
        action: "ZOOM_IN",
        status: Some("APPROVED"),
        reason: "Zoom command",
        score: 0.86,
    },
    CannedDecision {
        action: "HIGHLIGHT_ABNORMALITIES",
        status: Some("APPROVED"),
        reason: "Highlight command",
        score: 0.88,
    },
    CannedDecision {
        action: "NONE",
        status: Some("REJECTED"),
        reason: "No valid conditions",
        score: 0.45,
    },
    CannedDecision {
        action: "IGNORE",
        status: None,
        reason: "Out of sync",
        score: 0.0,
    },
];

/// Pure function of `now`: identical inputs give identical samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryFallback;

impl TelemetryFallback {
    pub fn new() -> Self {
        Self
    }

    /// Palette index derived from `|sin(now)|`.
    pub fn index(now: f64, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let spread = (now.sin().abs() * len as f64).floor();
        // NaN and negative values saturate to 0 in the cast.
        (spread as usize) % len
    }

    pub fn sample(&self, now: f64) -> FusionDecision {
        let pick = &DECISIONS[Self::index(now, DECISIONS.len())];
        FusionDecision {
            action: pick.action.to_string(),
            status: pick.status.map(str::to_string),
            reason: Some(pick.reason.to_string()),
            score: pick.score,
            timestamp: now,
        }
    }

    pub fn sample_action(&self, now: f64) -> Action {
        const PALETTE_LEN: usize = 7;
        match Self::index(now, PALETTE_LEN) {
            0 => Action::new(Intent::ZoomIn)
                .with_param("factor", 1.3)
                .with_param("region", "LEFT_REGION"),
            1 => Action::new(Intent::ZoomIn)
                .with_param("factor", 1.3)
                .with_param("region", "RIGHT_REGION"),
            2 => Action::new(Intent::ZoomOut).with_param("factor", 1.3),
            3 => Action::new(Intent::NextImage),
            4 => Action::new(Intent::PrevImage),
            5 => Action::new(Intent::HighlightRegion)
                .with_param("coordinates", json!({"x": 0.42, "y": 0.58})),
            _ => Action::new(Intent::ResetView),
        }
    }
}

#[cfg(test)]
#[path = "tests/fallback_tests.rs"]
mod tests;
