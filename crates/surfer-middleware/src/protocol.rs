//! rosbridge v2 wire frames.
//!
//! Every frame is a JSON object tagged by `op`. Only the operations a client
//! needs are modelled; anything else fails to decode and is skipped by the
//! reader.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use surfer_types::SurferError;
use uuid::Uuid;

/// A single rosbridge protocol operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RosbridgeOp {
    Subscribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
        #[serde(rename = "type")]
        msg_type: String,
    },
    Unsubscribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
    },
    Advertise {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
        #[serde(rename = "type")]
        msg_type: String,
    },
    Unadvertise {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
    },
    Publish {
        topic: String,
        msg: Value,
    },
    CallService {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        service: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        service_type: Option<String>,
        #[serde(default)]
        args: Value,
    },
    ServiceResponse {
        #[serde(default)]
        id: Option<String>,
        service: String,
        #[serde(default)]
        values: Value,
        #[serde(default = "default_result")]
        result: bool,
    },
    Status {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        level: String,
        #[serde(default)]
        msg: String,
    },
}

fn default_result() -> bool {
    true
}

impl RosbridgeOp {
    /// Serialise into the text payload of a WebSocket frame.
    pub fn encode(&self) -> Result<String, SurferError> {
        serde_json::to_string(self).map_err(|e| SurferError::Serialization(e.to_string()))
    }

    /// Parse the text payload of a WebSocket frame.
    pub fn decode(text: &str) -> Result<Self, SurferError> {
        serde_json::from_str(text).map_err(|e| SurferError::Serialization(e.to_string()))
    }
}

/// Unique frame id of the form `<op>:<target>:<uuid>`.
pub fn frame_id(op: &str, target: &str) -> String {
    format!("{op}:{target}:{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_encodes_op_and_type_keys() {
        let op = RosbridgeOp::Subscribe {
            id: Some("subscribe:/s/imu:1".to_string()),
            topic: "/s/imu".to_string(),
            msg_type: "sensor_msgs/Imu".to_string(),
        };
        let value: Value = serde_json::from_str(&op.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"op": "subscribe", "id": "subscribe:/s/imu:1", "topic": "/s/imu", "type": "sensor_msgs/Imu"})
        );
    }

    #[test]
    fn publish_round_trips_message_body() {
        let op = RosbridgeOp::Publish {
            topic: "/s/set_cmd_vel".to_string(),
            msg: json!({"linear": {"x": 1.0}}),
        };
        let back = RosbridgeOp::decode(&op.encode().unwrap()).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn call_service_omits_missing_type() {
        let op = RosbridgeOp::CallService {
            id: None,
            service: "/s/reset_imu".to_string(),
            service_type: None,
            args: json!({}),
        };
        let value: Value = serde_json::from_str(&op.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"op": "call_service", "service": "/s/reset_imu", "args": {}}));
    }

    #[test]
    fn service_response_defaults_result_to_true() {
        let op = RosbridgeOp::decode(
            r#"{"op":"service_response","id":"x","service":"/s/reset_imu","values":{"success":true}}"#,
        )
        .unwrap();
        match op {
            RosbridgeOp::ServiceResponse { id, values, result, .. } => {
                assert_eq!(id.as_deref(), Some("x"));
                assert_eq!(values["success"], json!(true));
                assert!(result);
            }
            other => panic!("expected ServiceResponse, got {other:?}"),
        }
    }

    #[test]
    fn unknown_op_is_rejected() {
        assert!(RosbridgeOp::decode(r#"{"op":"png","data":"..."}"#).is_err());
        assert!(RosbridgeOp::decode("not json").is_err());
    }

    #[test]
    fn frame_ids_are_unique_and_prefixed() {
        let a = frame_id("call_service", "/s/reset_imu");
        let b = frame_id("call_service", "/s/reset_imu");
        assert!(a.starts_with("call_service:/s/reset_imu:"));
        assert_ne!(a, b);
    }
}
