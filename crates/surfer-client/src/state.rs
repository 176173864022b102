//! Relay state and the inbound handlers that mutate it.
//!
//! Everything mutable lives in one [`RelayState`] behind one mutex. Handlers
//! decode outside the lock and only hold it for plain assignment or append.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use surfer_types::messages::{Detection2DArrayMsg, ImuMsg, StatusMsg};
use surfer_types::{decode, Detection, StatusSnapshot, SurferError};
use tracing::{debug, trace, warn};

/// Latest telemetry received from the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub acceleration: [f64; 3],
    pub angular_velocity: [f64; 3],
    /// Raw `orientation.x/y/z` of the last inertial message.
    pub euler_angles: [f64; 3],
    /// `[x, y, z, w]`; all zeros until an inertial message carries `w`.
    pub quaternion: [f64; 4],
    pub status: StatusSnapshot,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            acceleration: [0.0; 3],
            angular_velocity: [0.0; 3],
            euler_angles: [0.0; 3],
            quaternion: [0.0; 4],
            status: StatusSnapshot::default(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RelayState {
    pub snapshot: TelemetrySnapshot,
    pub detections: Vec<Detection>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn drop_malformed(error: SurferError) {
    warn!(error = %error, "dropping inbound message");
}

pub(crate) fn on_imu(state: &Mutex<RelayState>, topic: &str, msg: Value) {
    let imu: ImuMsg = match decode(topic, msg) {
        Ok(imu) => imu,
        Err(e) => return drop_malformed(e),
    };
    let o = imu.orientation;

    let mut state = lock(state);
    let snapshot = &mut state.snapshot;
    snapshot.acceleration = imu.linear_acceleration.to_array();
    snapshot.angular_velocity = imu.angular_velocity.to_array();
    snapshot.euler_angles = [o.x, o.y, o.z];
    if let Some(w) = o.w {
        snapshot.quaternion = [o.x, o.y, o.z, w];
    }
    trace!(topic = %topic, "imu updated");
}

pub(crate) fn on_status(state: &Mutex<RelayState>, topic: &str, msg: Value) {
    let status: StatusMsg = match decode(topic, msg) {
        Ok(status) => status,
        Err(e) => return drop_malformed(e),
    };
    debug!(
        topic = %topic,
        mode = %status.mode,
        armed = status.armed,
        "status received"
    );

    lock(state).snapshot.status = StatusSnapshot {
        mode: status.mode,
        group: status.group,
        armed: status.armed,
        behavior: status.behavior,
        id: status.id,
    };
}

pub(crate) fn on_detections(state: &Mutex<RelayState>, topic: &str, msg: Value) {
    let detections = match decode::<Detection2DArrayMsg>(topic, msg).and_then(|array| {
        array
            .into_detections()
            .map_err(|details| SurferError::MalformedMessage {
                topic: topic.to_string(),
                details,
            })
    }) {
        Ok(detections) => detections,
        Err(e) => return drop_malformed(e),
    };
    if detections.is_empty() {
        return;
    }

    trace!(topic = %topic, count = detections.len(), "detections buffered");
    lock(state).detections.extend(detections);
}
