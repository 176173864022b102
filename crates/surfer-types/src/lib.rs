//! `surfer-types` – shared vocabulary of the Surfer client stack.
//!
//! Holds the value types handed to callers ([`Detection`], [`StatusSnapshot`],
//! [`Ident`]), the rosbridge wire shapes in [`messages`], and the single
//! [`SurferError`] taxonomy used by every other crate in the workspace.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod messages;

/// Identifier carried by status messages.
///
/// Agents in the field publish both numeric and textual ids, so both are
/// accepted on decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ident {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ident::Number(n) => write!(f, "{n}"),
            Ident::Text(s) => f.write_str(s),
        }
    }
}

/// Last-known mode and arming state of the agent.
///
/// `None` fields mean no status message has set them yet, which is distinct
/// from a received-but-empty value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub mode: String,
    pub group: Option<Ident>,
    pub armed: bool,
    pub behavior: Option<String>,
    pub id: Option<Ident>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            mode: "IDLE".to_string(),
            group: None,
            armed: false,
            behavior: None,
            id: None,
        }
    }
}

/// Axis-aligned box in source image units: centre coordinates plus size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One perceived object, built from the top hypothesis of a detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Estimated 3-D location of the object.
    pub position: (f64, f64, f64),
    /// Hypothesis score, nominally in `[0, 1]`. Not validated.
    pub confidence: f64,
    pub class_id: String,
}

impl Default for Detection {
    fn default() -> Self {
        Self {
            bbox: BoundingBox::default(),
            position: (0.0, 0.0, 0.0),
            confidence: 0.0,
            class_id: "unknown".to_string(),
        }
    }
}

/// Error type shared by the math, middleware, and client crates.
#[derive(Error, Debug, Clone)]
pub enum SurferError {
    #[error("not connected to rosbridge")]
    NotConnected,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("malformed message on {topic}: {details}")]
    MalformedMessage { topic: String, details: String },

    #[error("invalid orientation: {0}")]
    InvalidOrientation(String),

    #[error("service {service} timed out after {timeout_ms} ms")]
    ServiceTimeout { service: String, timeout_ms: u64 },

    #[error("service {service} failed: {details}")]
    ServiceFailed { service: String, details: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Decode a rosbridge `msg` payload received on `topic` into a typed message.
///
/// Missing or mistyped fields surface as [`SurferError::MalformedMessage`].
pub fn decode<T: DeserializeOwned>(topic: &str, msg: serde_json::Value) -> Result<T, SurferError> {
    serde_json::from_value(msg).map_err(|e| SurferError::MalformedMessage {
        topic: topic.to_string(),
        details: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ident_accepts_numbers_and_text() {
        let n: Ident = serde_json::from_value(json!(7)).unwrap();
        let t: Ident = serde_json::from_value(json!("alpha")).unwrap();
        assert_eq!(n, Ident::Number(7));
        assert_eq!(t, Ident::Text("alpha".to_string()));
        assert_eq!(n.to_string(), "7");
        assert_eq!(t.to_string(), "alpha");
    }

    #[test]
    fn default_status_is_idle_and_unset() {
        let status = StatusSnapshot::default();
        assert_eq!(status.mode, "IDLE");
        assert!(!status.armed);
        assert!(status.group.is_none());
        assert!(status.behavior.is_none());
        assert!(status.id.is_none());
    }

    #[test]
    fn default_detection_is_unknown_class() {
        let d = Detection::default();
        assert_eq!(d.class_id, "unknown");
        assert_eq!(d.position, (0.0, 0.0, 0.0));
        assert_eq!(d.confidence, 0.0);
    }

    #[test]
    fn decode_reports_topic_on_failure() {
        let err = decode::<StatusSnapshot>("/surfer/status", json!({"armed": "yes"})).unwrap_err();
        match err {
            SurferError::MalformedMessage { topic, .. } => assert_eq!(topic, "/surfer/status"),
            other => panic!("expected MalformedMessage, got {other:?}"),
        }
    }

    #[test]
    fn error_display() {
        let err = SurferError::ServiceTimeout {
            service: "/surfer/reset_imu".to_string(),
            timeout_ms: 250,
        };
        assert!(err.to_string().contains("/surfer/reset_imu"));
        assert!(err.to_string().contains("250"));
        assert_eq!(SurferError::NotConnected.to_string(), "not connected to rosbridge");
    }
}
