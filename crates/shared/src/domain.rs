use std::fmt;

use serde::{Deserialize, Serialize};

/// Recognized command vocabulary. Anything outside the closed set is kept
/// verbatim in [`Intent::Other`] so it can be logged as unhandled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intent {
    ZoomIn,
    ZoomOut,
    NextImage,
    PrevImage,
    ResetView,
    HighlightRegion,
    Unknown,
    Other(String),
}

impl Intent {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ZoomIn => "ZOOM_IN",
            Self::ZoomOut => "ZOOM_OUT",
            Self::NextImage => "NEXT_IMAGE",
            Self::PrevImage => "PREV_IMAGE",
            Self::ResetView => "RESET_VIEW",
            Self::HighlightRegion => "HIGHLIGHT_REGION",
            Self::Unknown => "UNKNOWN",
            Self::Other(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "ZOOM_IN" => Self::ZoomIn,
            "ZOOM_OUT" => Self::ZoomOut,
            "NEXT_IMAGE" => Self::NextImage,
            "PREV_IMAGE" => Self::PrevImage,
            "RESET_VIEW" => Self::ResetView,
            "HIGHLIGHT_REGION" => Self::HighlightRegion,
            "UNKNOWN" | "" => Self::Unknown,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unknown | Self::Other(_))
    }

    /// Operator-facing label, e.g. `ZOOM_IN` -> `ZOOM IN`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ").to_ascii_uppercase()
    }
}

impl Default for Intent {
    fn default() -> Self {
        Self::Unknown
    }
}

impl From<String> for Intent {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Intent> for String {
    fn from(value: Intent) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "LEFT_REGION")]
    Left,
    #[serde(rename = "RIGHT_REGION")]
    Right,
}

impl Region {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LEFT_REGION" => Some(Self::Left),
            "RIGHT_REGION" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "LEFT_REGION",
            Self::Right => "RIGHT_REGION",
        }
    }
}

/// Canonical image reference. Listing and upload responses arrive either as a
/// bare file name or as a metadata record; both normalize into this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ImageRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uploaded_at: None,
            size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Simulated,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Simulated => "simulated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Action,
    Chat,
}
