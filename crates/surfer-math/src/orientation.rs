//! Attitude conversions.
//!
//! Quaternions follow the ROS `[x, y, z, w]` component order. Euler angles are
//! roll/pitch/yaw about X/Y/Z, composed as `R = Rz(yaw) · Ry(pitch) · Rx(roll)`.
//!
//! # Example
//!
//! ```rust
//! use surfer_math::orientation::{quaternion_to_euler, Quaternion};
//!
//! let q = Quaternion::from_euler(0.1, -0.2, 1.2);
//! let e = quaternion_to_euler(q.to_array()).unwrap();
//! assert!((e.yaw - 1.2).abs() < 1e-9);
//! ```

use surfer_types::SurferError;

/// Below this value of `sqrt(R00² + R10²)` the matrix is treated as gimbal
/// locked (pitch at ±90°).
pub const SINGULARITY_THRESHOLD: f64 = 1e-6;

// ────────────────────────────────────────────────────────────────────────────
// Primitive types
// ────────────────────────────────────────────────────────────────────────────

/// A rotation quaternion. Not required to be unit length; conversions
/// normalise first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub fn from_xyzw(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Self::from_xyzw(0.0, 0.0, 0.0, 1.0)
    }

    /// Unit quaternion for the given roll/pitch/yaw (radians).
    pub fn from_euler(roll: f64, pitch: f64, yaw: f64) -> Self {
        let (sr, cr) = (roll * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sy, cy) = (yaw * 0.5).sin_cos();
        Self {
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
            w: cr * cp * cy + sr * sp * sy,
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Euclidean norm of the four components.
    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Scale to unit length.
    ///
    /// # Errors
    ///
    /// [`SurferError::InvalidOrientation`] when the norm is zero or not
    /// finite, since no rotation can be recovered from such input.
    pub fn normalized(self) -> Result<Self, SurferError> {
        let norm = self.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(SurferError::InvalidOrientation(format!(
                "quaternion [{}, {}, {}, {}] has norm {norm}",
                self.x, self.y, self.z, self.w
            )));
        }
        Ok(Self::from_xyzw(
            self.x / norm,
            self.y / norm,
            self.z / norm,
            self.w / norm,
        ))
    }

    /// Rotation matrix of the normalised quaternion.
    pub fn to_rotation_matrix(self) -> Result<RotationMatrix, SurferError> {
        let Quaternion { x, y, z, w } = self.normalized()?;

        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        Ok(RotationMatrix([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy)],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx)],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy)],
        ]))
    }
}

impl From<[f64; 4]> for Quaternion {
    fn from(q: [f64; 4]) -> Self {
        Self::from_xyzw(q[0], q[1], q[2], q[3])
    }
}

/// A 3×3 rotation matrix in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationMatrix(pub [[f64; 3]; 3]);

impl RotationMatrix {
    pub fn identity() -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Element at `row`, `col`.
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.0[row][col]
    }

    /// Roll/pitch/yaw of this matrix.
    ///
    /// Near gimbal lock (`sqrt(R00² + R10²) < 1e-6`) roll and yaw are not
    /// separable; yaw is then fixed at `0` and all rotation about the
    /// vertical is reported as roll.
    pub fn to_euler(&self) -> EulerAngles {
        let r = &self.0;
        let sy = (r[0][0] * r[0][0] + r[1][0] * r[1][0]).sqrt();

        if sy >= SINGULARITY_THRESHOLD {
            EulerAngles {
                roll: r[2][1].atan2(r[2][2]),
                pitch: (-r[2][0]).atan2(sy),
                yaw: r[1][0].atan2(r[0][0]),
            }
        } else {
            EulerAngles {
                roll: (-r[1][2]).atan2(r[1][1]),
                pitch: (-r[2][0]).atan2(sy),
                yaw: 0.0,
            }
        }
    }
}

/// Roll, pitch and yaw in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl EulerAngles {
    pub fn as_array(&self) -> [f64; 3] {
        [self.roll, self.pitch, self.yaw]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Free functions
// ────────────────────────────────────────────────────────────────────────────

/// Convert `[x, y, z, w]` into a rotation matrix.
pub fn quaternion_to_rotation_matrix(q: [f64; 4]) -> Result<RotationMatrix, SurferError> {
    Quaternion::from(q).to_rotation_matrix()
}

/// Convert a rotation matrix into roll/pitch/yaw. See
/// [`RotationMatrix::to_euler`] for the singular case.
pub fn rotation_matrix_to_euler(r: &RotationMatrix) -> EulerAngles {
    r.to_euler()
}

/// `quaternion_to_rotation_matrix` followed by `rotation_matrix_to_euler`.
pub fn quaternion_to_euler(q: [f64; 4]) -> Result<EulerAngles, SurferError> {
    Ok(quaternion_to_rotation_matrix(q)?.to_euler())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    const EPS: f64 = 1e-9;

    fn assert_matrix_close(actual: &RotationMatrix, expected: [[f64; 3]; 3]) {
        for (i, row) in expected.iter().enumerate() {
            for (j, want) in row.iter().enumerate() {
                let got = actual.at(i, j);
                assert!((got - want).abs() < EPS, "R[{i}][{j}] = {got}, expected {want}");
            }
        }
    }

    // ── Quaternion → matrix ─────────────────────────────────────────────────

    #[test]
    fn identity_quaternion_gives_identity_matrix() {
        let r = quaternion_to_rotation_matrix(Quaternion::identity().to_array()).unwrap();
        assert_matrix_close(&r, RotationMatrix::identity().0);
    }

    #[test]
    fn yaw_90_matrix_maps_x_to_y() {
        let r = quaternion_to_rotation_matrix([0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2]).unwrap();
        assert_matrix_close(&r, [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
    }

    #[test]
    fn non_unit_quaternion_is_normalised() {
        let unit = quaternion_to_rotation_matrix([0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2]).unwrap();
        let scaled = quaternion_to_rotation_matrix([0.0, 0.0, 3.0, 3.0]).unwrap();
        assert_matrix_close(&scaled, unit.0);
    }

    #[test]
    fn zero_quaternion_is_rejected() {
        let result = quaternion_to_rotation_matrix([0.0, 0.0, 0.0, 0.0]);
        assert!(matches!(result, Err(SurferError::InvalidOrientation(_))));
    }

    #[test]
    fn non_finite_quaternion_is_rejected() {
        let result = quaternion_to_rotation_matrix([f64::NAN, 0.0, 0.0, 1.0]);
        assert!(matches!(result, Err(SurferError::InvalidOrientation(_))));
    }

    // ── Matrix → Euler ──────────────────────────────────────────────────────

    #[test]
    fn euler_round_trip_for_unit_quaternions() {
        let cases = [
            (0.0, 0.0, 0.0),
            (0.3, -0.2, 1.1),
            (-1.2, 0.7, -2.9),
            (2.5, -1.4, 0.05),
            (-3.0, 1.5, 3.0),
        ];
        for (roll, pitch, yaw) in cases {
            let q = Quaternion::from_euler(roll, pitch, yaw);
            assert!((q.norm() - 1.0).abs() < EPS);
            let e = quaternion_to_euler(q.to_array()).unwrap();
            assert!((e.roll - roll).abs() < 1e-6, "roll {} vs {roll}", e.roll);
            assert!((e.pitch - pitch).abs() < 1e-6, "pitch {} vs {pitch}", e.pitch);
            assert!((e.yaw - yaw).abs() < 1e-6, "yaw {} vs {yaw}", e.yaw);
        }
    }

    #[test]
    fn pure_pitch_90_matrix_takes_singular_branch() {
        let r = RotationMatrix([[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]]);
        let e = rotation_matrix_to_euler(&r);
        assert_eq!(e.yaw, 0.0);
        assert!(e.roll.abs() < EPS);
        assert!((e.pitch - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn gimbal_lock_reports_rotation_as_roll() {
        let q = Quaternion::from_euler(0.4, FRAC_PI_2, 0.0);
        let e = quaternion_to_euler(q.to_array()).unwrap();
        assert_eq!(e.yaw, 0.0);
        assert!((e.pitch - FRAC_PI_2).abs() < 1e-6);
        assert!((e.roll - 0.4).abs() < 1e-6, "roll = {}", e.roll);
    }

    #[test]
    fn just_above_threshold_uses_regular_branch() {
        // sy = 2e-6, above the singularity threshold.
        let r = RotationMatrix([[2e-6, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 2e-6]]);
        let e = r.to_euler();
        assert_eq!(e.yaw, 0.0_f64.atan2(2e-6));
        assert!((e.roll - 0.0_f64.atan2(2e-6)).abs() < EPS);
    }

    #[test]
    fn euler_as_array_order() {
        let e = EulerAngles { roll: 1.0, pitch: 2.0, yaw: 3.0 };
        assert_eq!(e.as_array(), [1.0, 2.0, 3.0]);
    }
}
