//! The bus seam.
//!
//! The relay never speaks WebSocket directly. It asks a [`BusConnector`] for a
//! live [`BusTransport`] and then only uses the primitives below. The
//! production implementation is [`RosbridgeClient`][crate::rosbridge::RosbridgeClient];
//! tests substitute an in-memory double.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use surfer_types::SurferError;

/// Service used to enumerate the topics known to the bridge.
pub const ROSAPI_TOPICS_SERVICE: &str = "/rosapi/topics";
/// Type of [`ROSAPI_TOPICS_SERVICE`].
pub const ROSAPI_TOPICS_TYPE: &str = "rosapi/Topics";

/// Callback invoked with the `msg` body of every frame published on a
/// subscribed topic.
///
/// Handlers run on the transport's dispatch task. They must return quickly and
/// must not block on other bus operations.
pub type MessageHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// A live connection to the message bus.
///
/// # Contract
///
/// * `subscribe`, `advertise`, `publish` and `terminate` only queue work and
///   return immediately.
/// * `call_service` resolves when the matching response arrives, the
///   connection drops, or the future is dropped by the caller (for example on
///   timeout). It has no timeout of its own.
/// * Every operation except `terminate` returns
///   [`SurferError::NotConnected`] once the connection is gone.
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Whether the underlying connection is still open.
    fn is_connected(&self) -> bool;

    /// Register `handler` for `topic`, carrying messages of `msg_type`.
    fn subscribe(
        &self,
        topic: &str,
        msg_type: &str,
        handler: MessageHandler,
    ) -> Result<(), SurferError>;

    /// Declare that this client will publish `msg_type` on `topic`.
    fn advertise(&self, topic: &str, msg_type: &str) -> Result<(), SurferError>;

    /// Send `msg` on `topic`. No acknowledgement is awaited.
    fn publish(&self, topic: &str, msg: Value) -> Result<(), SurferError>;

    /// Call `service` and return the response `values`.
    async fn call_service(
        &self,
        service: &str,
        service_type: &str,
        args: Value,
    ) -> Result<Value, SurferError>;

    /// Names of all topics the bridge currently knows about.
    async fn list_topics(&self) -> Result<Vec<String>, SurferError> {
        #[derive(Deserialize)]
        struct TopicsResponse {
            topics: Vec<String>,
        }

        let values = self
            .call_service(ROSAPI_TOPICS_SERVICE, ROSAPI_TOPICS_TYPE, json!({}))
            .await?;
        let response: TopicsResponse = serde_json::from_value(values)
            .map_err(|e| SurferError::Serialization(format!("topic list: {e}")))?;
        Ok(response.topics)
    }

    /// Close the connection. Idempotent.
    fn terminate(&self);
}

/// Opens [`BusTransport`] connections.
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Connect to the bridge at `host:port`.
    ///
    /// # Errors
    ///
    /// [`SurferError::Connection`] when the endpoint cannot be reached or the
    /// handshake fails.
    async fn connect(&self, host: &str, port: u16) -> Result<Arc<dyn BusTransport>, SurferError>;
}
