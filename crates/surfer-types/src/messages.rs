//! rosbridge message shapes exchanged with the Surfer agent.
//!
//! Field names mirror the ROS message definitions exactly; serde ignores any
//! extra fields (headers, covariances) the agent sends along.

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, Detection, Ident};

// ────────────────────────────────────────────────────────────────────────────
// Geometry primitives
// ────────────────────────────────────────────────────────────────────────────

/// `geometry_msgs/Vector3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3Msg {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3Msg {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// `geometry_msgs/Quaternion`. `w` is optional so that agents publishing only
/// the vector part still decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuaternionMsg {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub w: Option<f64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Inbound
// ────────────────────────────────────────────────────────────────────────────

/// `sensor_msgs/Imu` (the fields the relay consumes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuMsg {
    pub linear_acceleration: Vector3Msg,
    pub angular_velocity: Vector3Msg,
    pub orientation: QuaternionMsg,
}

/// `surfer_msgs/Status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMsg {
    pub mode: String,
    pub group: Option<Ident>,
    pub armed: bool,
    pub behavior: Option<String>,
    pub id: Option<Ident>,
}

/// `vision_msgs/Detection2DArray`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection2DArrayMsg {
    pub detections: Vec<Detection2DMsg>,
}

/// `vision_msgs/Detection2D`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection2DMsg {
    pub bbox: BoundingBox2DMsg,
    pub results: Vec<ObjectHypothesisWithPoseMsg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2DMsg {
    pub center: Pose2DMsg,
    pub size_x: f64,
    pub size_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2DMsg {
    pub position: Point2DMsg,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2DMsg {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectHypothesisWithPoseMsg {
    pub hypothesis: ObjectHypothesisMsg,
    pub pose: PoseWithCovarianceMsg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectHypothesisMsg {
    pub class_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseWithCovarianceMsg {
    pub pose: PoseMsg,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseMsg {
    pub position: Vector3Msg,
}

impl TryFrom<Detection2DMsg> for Detection {
    type Error = String;

    /// Keep the first hypothesis only. The agent orders them itself; no
    /// re-ranking happens here.
    fn try_from(msg: Detection2DMsg) -> Result<Self, Self::Error> {
        let first = msg
            .results
            .into_iter()
            .next()
            .ok_or_else(|| "detection has no hypotheses".to_string())?;
        let p = first.pose.pose.position;
        Ok(Detection {
            bbox: BoundingBox {
                x: msg.bbox.center.position.x,
                y: msg.bbox.center.position.y,
                w: msg.bbox.size_x,
                h: msg.bbox.size_y,
            },
            position: (p.x, p.y, p.z),
            confidence: first.hypothesis.score,
            class_id: first.hypothesis.class_id,
        })
    }
}

impl Detection2DArrayMsg {
    /// Convert every detection, failing the whole array if any one of them
    /// is unusable.
    pub fn into_detections(self) -> Result<Vec<Detection>, String> {
        self.detections.into_iter().map(Detection::try_from).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outbound
// ────────────────────────────────────────────────────────────────────────────

/// `geometry_msgs/Twist`, used for both velocity and force commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TwistMsg {
    pub linear: Vector3Msg,
    pub angular: Vector3Msg,
}

impl TwistMsg {
    /// Planar command: surge `x`, sway `y`, yaw `r`. Every other axis is 0.
    pub fn planar(x: f64, y: f64, r: f64) -> Self {
        Self {
            linear: Vector3Msg::new(x, y, 0.0),
            angular: Vector3Msg::new(0.0, 0.0, r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiArrayDimensionMsg {
    pub label: String,
    pub size: u32,
    pub stride: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiArrayLayoutMsg {
    pub dim: Vec<MultiArrayDimensionMsg>,
    pub data_offset: u32,
}

/// `std_msgs/Float32MultiArray`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Float32MultiArrayMsg {
    #[serde(default)]
    pub layout: MultiArrayLayoutMsg,
    pub data: Vec<f32>,
}

impl Float32MultiArrayMsg {
    pub fn from_data(data: Vec<f32>) -> Self {
        Self {
            layout: MultiArrayLayoutMsg::default(),
            data,
        }
    }
}

/// Response half of `std_srvs/Trigger`. The request is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}
