use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: f64,
    pub x: f64,
    pub y: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: MIN_SCALE,
        x: 0.0,
        y: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Partial update for [`ViewState::set_transform`]; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformPatch {
    pub scale: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl TransformPatch {
    pub fn scale(scale: f64) -> Self {
        Self {
            scale: Some(scale),
            ..Self::default()
        }
    }

    pub fn with_x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn with_y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }
}

/// Pan/zoom state of the displayed image. Every write is clamped here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewState {
    transform: Transform,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn reset(&mut self) {
        self.transform = Transform::IDENTITY;
    }

    pub fn set_transform(&mut self, patch: TransformPatch) {
        let scale = Self::clamped_scale(patch.scale.unwrap_or(self.transform.scale));
        if scale <= MIN_SCALE {
            // Back at minimum zoom there is nothing to pan.
            self.transform = Transform::IDENTITY;
            return;
        }
        self.transform = Transform {
            scale,
            x: finite_or(patch.x, self.transform.x),
            y: finite_or(patch.y, self.transform.y),
        };
    }

    pub fn clamped_scale(scale: f64) -> f64 {
        if scale.is_nan() {
            return MIN_SCALE;
        }
        scale.clamp(MIN_SCALE, MAX_SCALE)
    }
}

fn finite_or(value: Option<f64>, current: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(current)
}
