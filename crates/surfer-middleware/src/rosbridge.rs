//! WebSocket client for `rosbridge_server`.
//!
//! [`RosbridgeClient`] owns two Tokio tasks per connection:
//!
//! 1. a **writer** draining an unbounded queue of outbound frames, so that
//!    `publish`/`subscribe`/`advertise` never wait on the socket;
//! 2. a **reader** that decodes inbound frames, fans `publish` frames out to
//!    the registered [`MessageHandler`]s and completes pending service calls.
//!
//! When the socket closes, every pending service call fails and the client
//! reports itself disconnected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use surfer_types::SurferError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, trace, warn};

use crate::protocol::{frame_id, RosbridgeOp};
use crate::transport::{BusConnector, BusTransport, MessageHandler};

type ServiceReply = Result<Value, String>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Shared connection state
// ---------------------------------------------------------------------------

/// State touched by both the reader task and the caller.
#[derive(Default)]
struct Shared {
    connected: AtomicBool,
    handlers: Mutex<HashMap<String, Vec<MessageHandler>>>,
    pending: Mutex<HashMap<String, oneshot::Sender<ServiceReply>>>,
}

impl Shared {
    fn mark_closed(&self) {
        self.connected.store(false, Ordering::SeqCst);
        // Dropping the senders fails every in-flight call_service.
        lock(&self.pending).clear();
    }

    fn dispatch(&self, text: &str) {
        let op = match RosbridgeOp::decode(text) {
            Ok(op) => op,
            Err(e) => {
                debug!(error = %e, "skipping undecodable rosbridge frame");
                return;
            }
        };

        match op {
            RosbridgeOp::Publish { topic, msg } => {
                let handlers = lock(&self.handlers).get(&topic).cloned().unwrap_or_default();
                if handlers.is_empty() {
                    trace!(topic = %topic, "publish on topic without handlers");
                }
                for handler in handlers {
                    handler(msg.clone());
                }
            }
            RosbridgeOp::ServiceResponse {
                id,
                service,
                values,
                result,
            } => {
                let Some(id) = id else {
                    debug!(service = %service, "service response without id");
                    return;
                };
                match lock(&self.pending).remove(&id) {
                    Some(tx) => {
                        let reply = if result { Ok(values) } else { Err(values.to_string()) };
                        let _ = tx.send(reply);
                    }
                    None => debug!(service = %service, id = %id, "unmatched service response"),
                }
            }
            RosbridgeOp::Status { level, msg, .. } => {
                if level == "error" || level == "warning" {
                    warn!(level = %level, "rosbridge: {msg}");
                } else {
                    debug!(level = %level, "rosbridge: {msg}");
                }
            }
            other => debug!(?other, "ignoring rosbridge op"),
        }
    }
}

/// Removes a pending service entry when the waiting future goes away, whether
/// it completed, failed, or was cancelled by a timeout.
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(&self.shared.pending).remove(&self.id);
    }
}

// ---------------------------------------------------------------------------
// RosbridgeClient
// ---------------------------------------------------------------------------

/// A live connection to a `rosbridge_server` WebSocket endpoint.
pub struct RosbridgeClient {
    url: String,
    outbound: mpsc::UnboundedSender<Message>,
    shared: Arc<Shared>,
    /// topic → subscribe frame id, for unsubscribing on terminate.
    subscriptions: Mutex<HashMap<String, String>>,
    /// topic → advertise frame id.
    advertisements: Mutex<HashMap<String, String>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl RosbridgeClient {
    /// Open a WebSocket connection to `url` (e.g. `"ws://localhost:9090"`).
    ///
    /// # Errors
    ///
    /// Returns [`SurferError::Connection`] if the TCP connect or WebSocket
    /// handshake fails.
    pub async fn connect(url: &str) -> Result<Self, SurferError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| SurferError::Connection(format!("{url}: {e}")))?;
        let (mut ws_tx, mut ws_rx) = ws_stream.split();

        let shared = Arc::new(Shared::default());
        shared.connected.store(true, Ordering::SeqCst);

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

        let writer_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let closing = matches!(frame, Message::Close(_));
                if let Err(e) = ws_tx.send(frame).await {
                    warn!(error = %e, "rosbridge send failed");
                    break;
                }
                if closing {
                    break;
                }
            }
            writer_shared.mark_closed();
            let _ = ws_tx.close().await;
        });

        let reader_shared = Arc::clone(&shared);
        let reader_url = url.to_string();
        let reader = tokio::spawn(async move {
            while let Some(frame) = ws_rx.next().await {
                match frame {
                    Ok(Message::Text(text)) => reader_shared.dispatch(text.as_str()),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(url = %reader_url, error = %e, "rosbridge receive failed");
                        break;
                    }
                }
            }
            reader_shared.mark_closed();
            info!(url = %reader_url, "rosbridge connection closed");
        });

        info!(url = %url, "connected to rosbridge");

        Ok(Self {
            url: url.to_string(),
            outbound,
            shared,
            subscriptions: Mutex::new(HashMap::new()),
            advertisements: Mutex::new(HashMap::new()),
            reader: Mutex::new(Some(reader)),
        })
    }

    /// The URL this client connected to.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn send(&self, op: &RosbridgeOp) -> Result<(), SurferError> {
        if !self.is_connected() {
            return Err(SurferError::NotConnected);
        }
        let text = op.encode()?;
        self.outbound
            .send(Message::Text(text.into()))
            .map_err(|_| SurferError::NotConnected)
    }
}

#[async_trait]
impl BusTransport for RosbridgeClient {
    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    fn subscribe(
        &self,
        topic: &str,
        msg_type: &str,
        handler: MessageHandler,
    ) -> Result<(), SurferError> {
        if !self.is_connected() {
            return Err(SurferError::NotConnected);
        }
        let first = {
            let mut handlers = lock(&self.shared.handlers);
            let entry = handlers.entry(topic.to_string()).or_default();
            entry.push(handler);
            entry.len() == 1
        };
        if !first {
            return Ok(());
        }

        let id = frame_id("subscribe", topic);
        self.send(&RosbridgeOp::Subscribe {
            id: Some(id.clone()),
            topic: topic.to_string(),
            msg_type: msg_type.to_string(),
        })?;
        lock(&self.subscriptions).insert(topic.to_string(), id);
        debug!(topic = %topic, msg_type = %msg_type, "subscribed");
        Ok(())
    }

    fn advertise(&self, topic: &str, msg_type: &str) -> Result<(), SurferError> {
        let id = frame_id("advertise", topic);
        self.send(&RosbridgeOp::Advertise {
            id: Some(id.clone()),
            topic: topic.to_string(),
            msg_type: msg_type.to_string(),
        })?;
        lock(&self.advertisements).insert(topic.to_string(), id);
        debug!(topic = %topic, msg_type = %msg_type, "advertised");
        Ok(())
    }

    fn publish(&self, topic: &str, msg: Value) -> Result<(), SurferError> {
        self.send(&RosbridgeOp::Publish {
            topic: topic.to_string(),
            msg,
        })
    }

    async fn call_service(
        &self,
        service: &str,
        service_type: &str,
        args: Value,
    ) -> Result<Value, SurferError> {
        let id = frame_id("call_service", service);
        let (tx, rx) = oneshot::channel();
        lock(&self.shared.pending).insert(id.clone(), tx);
        let _guard = PendingGuard {
            shared: &self.shared,
            id: id.clone(),
        };

        self.send(&RosbridgeOp::CallService {
            id: Some(id),
            service: service.to_string(),
            service_type: Some(service_type.to_string()),
            args,
        })?;

        match rx.await {
            Ok(Ok(values)) => Ok(values),
            Ok(Err(details)) => Err(SurferError::ServiceFailed {
                service: service.to_string(),
                details,
            }),
            Err(_) => Err(SurferError::ServiceFailed {
                service: service.to_string(),
                details: "connection closed before a response arrived".to_string(),
            }),
        }
    }

    fn terminate(&self) {
        if self.shared.connected.load(Ordering::SeqCst) {
            // Best effort: the bridge cleans up on close anyway.
            for (topic, id) in lock(&self.subscriptions).drain() {
                let _ = self.send(&RosbridgeOp::Unsubscribe { id: Some(id), topic });
            }
            for (topic, id) in lock(&self.advertisements).drain() {
                let _ = self.send(&RosbridgeOp::Unadvertise { id: Some(id), topic });
            }
            let _ = self.outbound.send(Message::Close(None));
            info!(url = %self.url, "rosbridge connection terminated");
        }

        self.shared.mark_closed();
        lock(&self.shared.handlers).clear();
        if let Some(reader) = lock(&self.reader).take() {
            reader.abort();
        }
    }
}

impl Drop for RosbridgeClient {
    fn drop(&mut self) {
        self.terminate();
    }
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// [`BusConnector`] producing [`RosbridgeClient`]s for `ws://host:port`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RosbridgeConnector;

#[async_trait]
impl BusConnector for RosbridgeConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Arc<dyn BusTransport>, SurferError> {
        let url = format!("ws://{host}:{port}");
        let client = RosbridgeClient::connect(&url).await?;
        Ok(Arc::new(client))
    }
}
