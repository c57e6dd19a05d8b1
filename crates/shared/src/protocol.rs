use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{ImageRef, Intent, Region};

pub type Parameters = Map<String, Value>;

/// A recognized command, either pushed by the channel or produced locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub intent: Intent,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Action {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            parameters: Parameters::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn factor(&self) -> Option<f64> {
        self.parameters
            .get("factor")
            .and_then(Value::as_f64)
            .filter(|factor| factor.is_finite() && *factor > 0.0)
    }

    pub fn region(&self) -> Option<Region> {
        self.parameters
            .get("region")
            .and_then(Value::as_str)
            .and_then(Region::parse)
    }

    pub fn coordinates(&self) -> Option<&Value> {
        self.parameters.get("coordinates").filter(|v| !v.is_null())
    }
}

/// Decoded channel frame. Frames with other `type` values decode to `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Action(Action),
    Message { text: String },
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid json: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("frame is missing a string `type` field")]
    MissingType,
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct MessageFrame {
    text: String,
}

pub fn decode_frame(text: &str) -> Result<Option<ChannelMessage>, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(FrameError::InvalidJson)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(FrameError::MissingType)?;

    match kind {
        "ACTION" => serde_json::from_value::<Action>(value)
            .map(|action| Some(ChannelMessage::Action(action)))
            .map_err(|source| FrameError::InvalidPayload {
                kind: "ACTION",
                source,
            }),
        "MESSAGE" => serde_json::from_value::<MessageFrame>(value)
            .map(|frame| Some(ChannelMessage::Message { text: frame.text }))
            .map_err(|source| FrameError::InvalidPayload {
                kind: "MESSAGE",
                source,
            }),
        _ => Ok(None),
    }
}

pub fn encode_frame(message: &ChannelMessage) -> String {
    let value = match message {
        ChannelMessage::Action(action) => serde_json::json!({
            "type": "ACTION",
            "intent": action.intent.as_str(),
            "parameters": action.parameters,
        }),
        ChannelMessage::Message { text } => serde_json::json!({
            "type": "MESSAGE",
            "text": text,
        }),
    };
    value.to_string()
}

/// Fused decision snapshot served by `GET /fusion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionDecision {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub timestamp: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionSnapshot {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceSnapshot {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub intent: Intent,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VisionSnapshot {
    /// Older vision packets report the label as `object_detected`.
    pub fn object_label(&self) -> Option<&str> {
        self.object
            .as_deref()
            .or_else(|| self.extra.get("object_detected").and_then(Value::as_str))
    }
}

/// One element of `GET /samples` or the `saved` field of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleEntry {
    Name(String),
    Record {
        #[serde(alias = "name")]
        filename: String,
        #[serde(default)]
        uploaded_at: Option<String>,
        #[serde(default)]
        size: Option<u64>,
    },
}

impl From<SampleEntry> for ImageRef {
    fn from(value: SampleEntry) -> Self {
        match value {
            SampleEntry::Name(name) => ImageRef::named(name),
            SampleEntry::Record {
                filename,
                uploaded_at,
                size,
            } => ImageRef {
                name: filename,
                uploaded_at,
                size,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub saved: SampleEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
