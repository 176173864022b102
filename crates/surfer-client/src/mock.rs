//! In-memory bus used by the relay tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use surfer_middleware::{BusConnector, BusTransport, MessageHandler};
use surfer_types::SurferError;

use crate::state::lock;

/// Records every call and lets tests push inbound messages.
#[derive(Default)]
pub(crate) struct MockBus {
    pub connected: AtomicBool,
    pub handlers: Mutex<HashMap<String, MessageHandler>>,
    pub subscribed: Mutex<Vec<(String, String)>>,
    pub advertised: Mutex<Vec<(String, String)>>,
    pub published: Mutex<Vec<(String, Value)>>,
    pub service_calls: Mutex<Vec<String>>,
    /// `None` makes every service call hang forever.
    pub service_reply: Mutex<Option<Value>>,
    pub fail_advertise_on: Mutex<Option<String>>,
    pub topics: Mutex<Vec<String>>,
    pub terminations: AtomicUsize,
}

impl MockBus {
    /// Deliver `msg` to the handler registered for `topic`, if any.
    pub fn inject(&self, topic: &str, msg: Value) {
        let handler = lock(&self.handlers).get(topic).cloned();
        if let Some(handler) = handler {
            handler(msg);
        }
    }

    pub fn published(&self) -> Vec<(String, Value)> {
        lock(&self.published).clone()
    }

    /// Simulate the bridge going away underneath the relay.
    pub fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn ensure_connected(&self) -> Result<(), SurferError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SurferError::NotConnected)
        }
    }
}

#[async_trait]
impl BusTransport for MockBus {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe(
        &self,
        topic: &str,
        msg_type: &str,
        handler: MessageHandler,
    ) -> Result<(), SurferError> {
        self.ensure_connected()?;
        lock(&self.subscribed).push((topic.to_string(), msg_type.to_string()));
        lock(&self.handlers).insert(topic.to_string(), handler);
        Ok(())
    }

    fn advertise(&self, topic: &str, msg_type: &str) -> Result<(), SurferError> {
        self.ensure_connected()?;
        if lock(&self.fail_advertise_on).as_deref() == Some(topic) {
            return Err(SurferError::Connection(format!("advertise {topic} refused")));
        }
        lock(&self.advertised).push((topic.to_string(), msg_type.to_string()));
        Ok(())
    }

    fn publish(&self, topic: &str, msg: Value) -> Result<(), SurferError> {
        self.ensure_connected()?;
        lock(&self.published).push((topic.to_string(), msg));
        Ok(())
    }

    async fn call_service(
        &self,
        service: &str,
        _service_type: &str,
        _args: Value,
    ) -> Result<Value, SurferError> {
        self.ensure_connected()?;
        lock(&self.service_calls).push(service.to_string());
        let reply = lock(&self.service_reply).clone();
        match reply {
            Some(values) => Ok(values),
            None => std::future::pending::<Result<Value, SurferError>>().await,
        }
    }

    async fn list_topics(&self) -> Result<Vec<String>, SurferError> {
        self.ensure_connected()?;
        Ok(lock(&self.topics).clone())
    }

    fn terminate(&self) {
        self.connected.store(false, Ordering::SeqCst);
        lock(&self.handlers).clear();
        self.terminations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out the same [`MockBus`] on every connect.
#[derive(Default)]
pub(crate) struct MockConnector {
    pub bus: Arc<MockBus>,
    pub refuse: AtomicBool,
    pub connects: AtomicUsize,
}

#[async_trait]
impl BusConnector for MockConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Arc<dyn BusTransport>, SurferError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SurferError::Connection(format!(
                "ws://{host}:{port}: connection refused"
            )));
        }
        self.bus.connected.store(true, Ordering::SeqCst);
        Ok(Arc::clone(&self.bus) as Arc<dyn BusTransport>)
    }
}
