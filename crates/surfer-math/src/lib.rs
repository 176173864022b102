//! `surfer-math` – numeric helpers for interpreting Surfer telemetry and
//! shaping commands.
//!
//! # Modules
//!
//! - [`orientation`] – [`Quaternion`][orientation::Quaternion] →
//!   [`RotationMatrix`][orientation::RotationMatrix] →
//!   [`EulerAngles`][orientation::EulerAngles] conversion with an explicit
//!   gimbal-lock branch.
//! - [`saturate`] – clamp a scalar into a closed range.

pub mod orientation;

pub use orientation::{
    quaternion_to_euler, quaternion_to_rotation_matrix, rotation_matrix_to_euler, EulerAngles,
    Quaternion, RotationMatrix,
};

/// Clamp `value` into `[min, max]`.
///
/// `max` if `value > max`, `min` if `value < min`, otherwise `value`. With
/// inverted bounds (`min > max`) the upper test wins first. NaN compares false
/// both ways and is returned unchanged; callers that publish the result must
/// reject it themselves.
pub fn saturate(value: f64, min: f64, max: f64) -> f64 {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}
