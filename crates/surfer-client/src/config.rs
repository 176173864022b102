//! Connection parameters and channel naming.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const IMU_TYPE: &str = "sensor_msgs/Imu";
pub const STATUS_TYPE: &str = "surfer_msgs/Status";
pub const DETECTIONS_TYPE: &str = "vision_msgs/Detection2DArray";
pub const TWIST_TYPE: &str = "geometry_msgs/Twist";
pub const MOTOR_TYPE: &str = "std_msgs/Float32MultiArray";
pub const TRIGGER_TYPE: &str = "std_srvs/Trigger";

/// Where the rosbridge server lives and which Surfer instance to talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurferConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Instance name; every channel is namespaced under `/<name>/`.
    #[serde(default = "default_name")]
    pub name: String,

    /// Upper bound on a blocking service call such as `reset_imu`.
    #[serde(default = "default_service_timeout_ms")]
    pub service_timeout_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    9090
}
fn default_name() -> String {
    "surfer".to_string()
}
fn default_service_timeout_ms() -> u64 {
    5_000
}

impl Default for SurferConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name: default_name(),
            service_timeout_ms: default_service_timeout_ms(),
        }
    }
}

impl SurferConfig {
    /// `ws://host:port` of the rosbridge endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    pub fn service_timeout(&self) -> Duration {
        Duration::from_millis(self.service_timeout_ms)
    }
}

/// Fully qualified channel names for one Surfer instance.
///
/// The layout is fixed by the agent software and must not change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channels {
    pub imu: String,
    pub status: String,
    pub detections: String,
    pub cmd_vel: String,
    pub cmd_force: String,
    pub cmd_motor: String,
    pub reset_imu: String,
}

impl Channels {
    pub fn new(name: &str) -> Self {
        let ns = |leaf: &str| format!("/{name}/{leaf}");
        Self {
            imu: ns("imu"),
            status: ns("status"),
            detections: ns("detections"),
            cmd_vel: ns("set_cmd_vel"),
            cmd_force: ns("set_cmd_force"),
            cmd_motor: ns("set_cmd_motor"),
            reset_imu: ns("reset_imu"),
        }
    }

    /// Inbound channels with their message types.
    pub fn inbound(&self) -> [(&str, &'static str); 3] {
        [
            (self.imu.as_str(), IMU_TYPE),
            (self.status.as_str(), STATUS_TYPE),
            (self.detections.as_str(), DETECTIONS_TYPE),
        ]
    }

    /// Outbound channels with their message types.
    pub fn outbound(&self) -> [(&str, &'static str); 3] {
        [
            (self.cmd_vel.as_str(), TWIST_TYPE),
            (self.cmd_force.as_str(), TWIST_TYPE),
            (self.cmd_motor.as_str(), MOTOR_TYPE),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_are_namespaced_by_instance() {
        let ch = Channels::new("grace");
        assert_eq!(ch.imu, "/grace/imu");
        assert_eq!(ch.status, "/grace/status");
        assert_eq!(ch.detections, "/grace/detections");
        assert_eq!(ch.cmd_vel, "/grace/set_cmd_vel");
        assert_eq!(ch.cmd_force, "/grace/set_cmd_force");
        assert_eq!(ch.cmd_motor, "/grace/set_cmd_motor");
        assert_eq!(ch.reset_imu, "/grace/reset_imu");
    }

    #[test]
    fn default_config_targets_local_bridge() {
        let cfg = SurferConfig::default();
        assert_eq!(cfg.url(), "ws://localhost:9090");
        assert_eq!(cfg.name, "surfer");
        assert_eq!(cfg.service_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: SurferConfig = serde_json::from_str(r#"{"host": "192.168.2.1"}"#).unwrap();
        assert_eq!(cfg.host, "192.168.2.1");
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.service_timeout_ms, 5_000);
    }
}
