//! The Surfer relay: telemetry in, commands out.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::{json, Value};
use surfer_math::{quaternion_to_euler, saturate, EulerAngles};
use surfer_middleware::{BusConnector, BusTransport, MessageHandler, RosbridgeConnector};
use surfer_types::messages::{Float32MultiArrayMsg, TriggerResponse, TwistMsg};
use surfer_types::{Detection, StatusSnapshot, SurferError};
use tracing::{debug, info, warn};

use crate::config::{Channels, SurferConfig, TRIGGER_TYPE};
use crate::state::{self, lock, RelayState, TelemetrySnapshot};

/// Every command component is clamped to `[-COMMAND_LIMIT, COMMAND_LIMIT]`.
pub const COMMAND_LIMIT: f64 = 1.0;

type InboundHandler = fn(&Mutex<RelayState>, &str, Value);

/// Client-side endpoint for one Surfer instance.
///
/// Inbound telemetry is cached as it arrives and read back through the
/// accessors, which always return copies. Commands are saturated before they
/// leave. All methods take `&self`; share the relay behind an [`Arc`] when
/// several tasks or threads need it.
pub struct Surfer {
    config: SurferConfig,
    channels: Channels,
    connector: Arc<dyn BusConnector>,
    link: Mutex<Option<Arc<dyn BusTransport>>>,
    state: Arc<Mutex<RelayState>>,
}

impl Surfer {
    /// A relay that talks to a real rosbridge server.
    pub fn new(config: SurferConfig) -> Self {
        Self::with_connector(config, Arc::new(RosbridgeConnector))
    }

    pub fn with_connector(config: SurferConfig, connector: Arc<dyn BusConnector>) -> Self {
        let channels = Channels::new(&config.name);
        Self {
            config,
            channels,
            connector,
            link: Mutex::new(None),
            state: Arc::new(Mutex::new(RelayState::default())),
        }
    }

    pub fn config(&self) -> &SurferConfig {
        &self.config
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    // ── Connection ───────────────────────────────────────────────────────────

    /// Connect to the bridge and register every inbound and outbound channel.
    ///
    /// Setup is all-or-nothing: if any registration fails the fresh
    /// connection is terminated and the relay stays disconnected. Calling
    /// this while already connected does nothing.
    pub async fn connect(&self) -> Result<(), SurferError> {
        if self.is_connected() {
            debug!(url = %self.config.url(), "already connected");
            return Ok(());
        }
        let transport = self
            .connector
            .connect(&self.config.host, self.config.port)
            .await?;
        if let Err(e) = self.register(transport.as_ref()) {
            warn!(url = %self.config.url(), error = %e, "channel setup failed; closing connection");
            transport.terminate();
            return Err(e);
        }

        *lock(&self.link) = Some(transport);
        info!(url = %self.config.url(), name = %self.config.name, "connected to rosbridge");
        Ok(())
    }

    fn register(&self, transport: &dyn BusTransport) -> Result<(), SurferError> {
        let handlers: [InboundHandler; 3] =
            [state::on_imu, state::on_status, state::on_detections];
        for ((topic, msg_type), handle) in self.channels.inbound().into_iter().zip(handlers) {
            transport.subscribe(topic, msg_type, self.handler(topic, handle))?;
        }
        for (topic, msg_type) in self.channels.outbound() {
            transport.advertise(topic, msg_type)?;
        }
        Ok(())
    }

    fn handler(&self, topic: &str, handle: InboundHandler) -> MessageHandler {
        let state = Arc::clone(&self.state);
        let topic = topic.to_string();
        Arc::new(move |msg: Value| handle(&state, &topic, msg))
    }

    /// Tear down all subscriptions and advertisements and close the
    /// connection. Safe to call repeatedly.
    pub fn disconnect(&self) {
        match lock(&self.link).take() {
            Some(transport) => {
                transport.terminate();
                info!(url = %self.config.url(), "disconnected from rosbridge");
            }
            None => debug!("disconnect called while not connected"),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.live_link().is_some()
    }

    /// The current transport if it is still open. A transport that has gone
    /// away underneath the relay is terminated and released here.
    fn live_link(&self) -> Option<Arc<dyn BusTransport>> {
        let mut link = lock(&self.link);
        match link.as_ref() {
            Some(transport) if transport.is_connected() => Some(Arc::clone(transport)),
            Some(_) => {
                if let Some(lost) = link.take() {
                    lost.terminate();
                }
                warn!(url = %self.config.url(), "rosbridge connection lost");
                None
            }
            None => None,
        }
    }

    /// Topic names currently known to the bridge. Empty when disconnected or
    /// when the bridge cannot answer.
    pub async fn list_channels(&self) -> Vec<String> {
        let Some(link) = self.live_link() else {
            warn!("not connected to rosbridge; no channels to list");
            return Vec::new();
        };
        match tokio::time::timeout(self.config.service_timeout(), link.list_topics()).await {
            Ok(Ok(topics)) => topics,
            Ok(Err(e)) => {
                warn!(error = %e, "failed to list channels");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.service_timeout_ms,
                    "timed out listing channels"
                );
                Vec::new()
            }
        }
    }

    // ── Telemetry ────────────────────────────────────────────────────────────

    pub fn acceleration(&self) -> [f64; 3] {
        lock(&self.state).snapshot.acceleration
    }

    pub fn angular_velocity(&self) -> [f64; 3] {
        lock(&self.state).snapshot.angular_velocity
    }

    /// Last quaternion as `[x, y, z, w]`.
    pub fn quaternion(&self) -> [f64; 4] {
        lock(&self.state).snapshot.quaternion
    }

    /// Raw orientation `x, y, z` of the last inertial message.
    pub fn euler_angles(&self) -> [f64; 3] {
        lock(&self.state).snapshot.euler_angles
    }

    pub fn status(&self) -> StatusSnapshot {
        lock(&self.state).snapshot.status.clone()
    }

    /// Everything cached so far, taken under a single lock.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        lock(&self.state).snapshot.clone()
    }

    /// Roll, pitch and yaw derived from the last quaternion.
    ///
    /// # Errors
    ///
    /// [`SurferError::InvalidOrientation`] until a message carrying a usable
    /// quaternion has arrived.
    pub fn attitude(&self) -> Result<EulerAngles, SurferError> {
        quaternion_to_euler(self.quaternion())
    }

    /// Take every buffered detection, oldest first, leaving the buffer empty.
    pub fn drain_detections(&self) -> Vec<Detection> {
        std::mem::take(&mut lock(&self.state).detections)
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    /// Zero the agent's inertial reference.
    ///
    /// Waits at most `service_timeout_ms`. Returns `false` when not connected,
    /// on timeout, or when the agent reports failure.
    pub async fn reset_imu(&self) -> bool {
        let service = self.channels.reset_imu.as_str();
        let Some(link) = self.live_link() else {
            warn!(service = %service, "not connected to rosbridge; reset_imu skipped");
            return false;
        };

        let call = link.call_service(service, TRIGGER_TYPE, json!({}));
        let values = match tokio::time::timeout(self.config.service_timeout(), call).await {
            Ok(Ok(values)) => values,
            Ok(Err(e)) => {
                warn!(service = %service, error = %e, "reset_imu failed");
                return false;
            }
            Err(_) => {
                let e = SurferError::ServiceTimeout {
                    service: service.to_string(),
                    timeout_ms: self.config.service_timeout_ms,
                };
                warn!(error = %e, "reset_imu failed");
                return false;
            }
        };

        match serde_json::from_value::<TriggerResponse>(values) {
            Ok(response) => {
                if response.success {
                    info!(service = %service, "imu reset");
                } else {
                    warn!(service = %service, message = %response.message, "agent refused imu reset");
                }
                response.success
            }
            Err(e) => {
                warn!(service = %service, error = %e, "unreadable reset_imu response");
                false
            }
        }
    }

    /// Normalised velocity setpoint: surge `u`, sway `v`, yaw rate `r`.
    ///
    /// A command with a NaN component is dropped, not published.
    pub fn set_velocity_command(&self, u: f64, v: f64, r: f64) {
        if let Some([u, v, r]) = saturated(&self.channels.cmd_vel, [u, v, r]) {
            self.publish(&self.channels.cmd_vel, &TwistMsg::planar(u, v, r));
        }
    }

    /// Normalised force setpoint: surge `x`, sway `y`, yaw moment `n`.
    ///
    /// A command with a NaN component is dropped, not published.
    pub fn set_force_command(&self, x: f64, y: f64, n: f64) {
        if let Some([x, y, n]) = saturated(&self.channels.cmd_force, [x, y, n]) {
            self.publish(&self.channels.cmd_force, &TwistMsg::planar(x, y, n));
        }
    }

    /// Raw setpoints for the four thrusters.
    ///
    /// A command with a NaN component is dropped, not published.
    pub fn set_motor_command(&self, m1: f64, m2: f64, m3: f64, m4: f64) {
        if let Some(values) = saturated(&self.channels.cmd_motor, [m1, m2, m3, m4]) {
            let data = values.into_iter().map(|v| v as f32).collect();
            self.publish(&self.channels.cmd_motor, &Float32MultiArrayMsg::from_data(data));
        }
    }

    /// Command zero velocity.
    pub fn stop(&self) {
        self.set_velocity_command(0.0, 0.0, 0.0);
    }

    fn publish<T: Serialize>(&self, topic: &str, msg: &T) {
        let Some(link) = self.live_link() else {
            warn!(topic = %topic, "not connected to rosbridge; command dropped");
            return;
        };
        let payload = match serde_json::to_value(msg) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(topic = %topic, error = %e, "failed to encode command");
                return;
            }
        };
        if let Err(e) = link.publish(topic, payload) {
            warn!(topic = %topic, error = %e, "failed to publish command");
        }
    }
}

/// Clamp every component to `±COMMAND_LIMIT`, or `None` if any is NaN.
fn saturated<const N: usize>(topic: &str, values: [f64; N]) -> Option<[f64; N]> {
    if values.iter().any(|v| v.is_nan()) {
        warn!(topic = %topic, ?values, "command has a NaN component; dropped");
        return None;
    }
    Some(values.map(|v| saturate(v, -COMMAND_LIMIT, COMMAND_LIMIT)))
}
