//! Unit-quaternion algebra, `(w, x, y, z)` convention.

use crate::vec3::Vec3;
use core::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Fallback-to-LERP threshold for `slerp`: when `|dot(a,b)| > 1 - SLERP_EPS`.
pub const SLERP_EPS: f32 = 1e-5;
/// Below this angular displacement (`|w|*dt`), `from_angular_velocity` returns identity.
pub const ANGVEL_EPS: f32 = 1e-5;

/// Euler rotation-composition order. The library-wide default is `Zyx`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub enum EulerOrder {
    /// Default: yaw (Z) then pitch (Y) then roll (X).
    Zyx,
    Xyz,
}

impl Default for EulerOrder {
    fn default() -> Self {
        EulerOrder::Zyx
    }
}

/// Unit quaternion, `q = w + x*i + y*j + z*k`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quat {
    #[inline]
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self { w: 1.0, x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Hamilton product `self * rhs`.
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }

    #[inline]
    pub fn conjugate(self) -> Self {
        Self { w: self.w, x: -self.x, y: -self.y, z: -self.z }
    }

    /// Equal to `conjugate()` for unit quaternions.
    #[inline]
    pub fn inverse(self) -> Self {
        self.conjugate()
    }

    #[inline]
    pub fn dot(self, rhs: Self) -> f32 {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn scale(self, k: f32) -> Self {
        Self { w: self.w * k, x: self.x * k, y: self.y * k, z: self.z * k }
    }

    #[inline]
    pub fn add(self, rhs: Self) -> Self {
        Self { w: self.w + rhs.w, x: self.x + rhs.x, y: self.y + rhs.y, z: self.z + rhs.z }
    }

    pub fn normalize(self) -> Self {
        let len = self.length();
        if len <= 1e-12 {
            Self::identity()
        } else {
            self.scale(1.0 / len)
        }
    }

    /// Rotate `v` by `self`: `v' = q * (0,v) * q*`.
    pub fn rotate_vector(self, v: Vec3) -> Vec3 {
        let qv = Quat { w: 0.0, x: v.x, y: v.y, z: v.z };
        let r = self.mul(qv).mul(self.conjugate());
        Vec3::new(r.x, r.y, r.z)
    }

    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let n = axis.unit();
        if n == Vec3::zero() {
            return Self::identity();
        }
        let (s, c) = (0.5 * angle).sin_cos();
        Self { w: c, x: n.x * s, y: n.y * s, z: n.z * s }
    }

    /// Rotation accumulated over `dt` at constant angular velocity `omega`.
    /// Returns identity when the angular displacement `|omega|*dt` is
    /// below [`ANGVEL_EPS`].
    pub fn from_angular_velocity(omega: Vec3, dt: f32) -> Self {
        let mag = omega.length();
        let angle = mag * dt;
        if angle < ANGVEL_EPS {
            return Self::identity();
        }
        Self::from_axis_angle(omega, angle)
    }

    /// Shortest-arc spherical linear interpolation; falls back to
    /// normalized LERP when `|dot(a,b)| > 1 - SLERP_EPS`.
    pub fn slerp(a: Self, b: Self, t: f32) -> Self {
        let mut d = a.dot(b);
        let mut b = b;
        if d < 0.0 {
            b = b.scale(-1.0);
            d = -d;
        }
        if d > 1.0 - SLERP_EPS {
            return Self::lerp(a, b, t);
        }
        let theta = d.clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        let wa = ((1.0 - t) * theta).sin() / sin_theta;
        let wb = (t * theta).sin() / sin_theta;
        a.scale(wa).add(b.scale(wb)).normalize()
    }

    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        a.scale(1.0 - t).add(b.scale(t)).normalize()
    }

    /// Extract Euler angles (radians) under `order` (default `Zyx`).
    pub fn to_euler(self, order: EulerOrder) -> (f32, f32, f32) {
        let Quat { w, x, y, z } = self.normalize();
        match order {
            EulerOrder::Zyx => {
                let sinr_cosp = 2.0 * (w * x + y * z);
                let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
                let roll = sinr_cosp.atan2(cosr_cosp);

                let sinp = 2.0 * (w * y - z * x);
                let pitch = if sinp.abs() >= 1.0 {
                    core::f32::consts::FRAC_PI_2.copysign(sinp)
                } else {
                    sinp.asin()
                };

                let siny_cosp = 2.0 * (w * z + x * y);
                let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
                let yaw = siny_cosp.atan2(cosy_cosp);
                (roll, pitch, yaw)
            }
            EulerOrder::Xyz => {
                let sinp = 2.0 * (w * y + z * x);
                let pitch = if sinp.abs() >= 1.0 {
                    core::f32::consts::FRAC_PI_2.copysign(sinp)
                } else {
                    sinp.asin()
                };

                let sinr_cosp = 2.0 * (w * x - y * z);
                let cosr_cosp = 1.0 - 2.0 * (x * x + z * z);
                let roll = sinr_cosp.atan2(cosr_cosp);

                let siny_cosp = 2.0 * (w * z - x * y);
                let cosy_cosp = 1.0 - 2.0 * (x * x + z * z);
                let yaw = siny_cosp.atan2(cosy_cosp);
                (roll, pitch, yaw)
            }
        }
    }

    /// Construct from Euler angles (radians) under `order` (default `Zyx`).
    pub fn from_euler(roll: f32, pitch: f32, yaw: f32, order: EulerOrder) -> Self {
        let qx = Self::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), roll);
        let qy = Self::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), pitch);
        let qz = Self::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), yaw);
        match order {
            EulerOrder::Zyx => qz.mul(qy).mul(qx).normalize(),
            EulerOrder::Xyz => qx.mul(qy).mul(qz).normalize(),
        }
    }

    pub fn forward(self) -> Vec3 {
        self.rotate_vector(Vec3::new(1.0, 0.0, 0.0))
    }

    pub fn up(self) -> Vec3 {
        self.rotate_vector(Vec3::new(0.0, 1.0, 0.0))
    }

    pub fn right(self) -> Vec3 {
        self.rotate_vector(Vec3::new(0.0, 0.0, 1.0))
    }

    /// Decompose into a rotation axis and angle (radians).
    pub fn to_axis_angle(self) -> (Vec3, f32) {
        let q = self.normalize();
        let angle = 2.0 * q.w.clamp(-1.0, 1.0).acos();
        let s = (1.0 - q.w * q.w).max(0.0).sqrt();
        let axis = if s < 1e-6 {
            Vec3::new(1.0, 0.0, 0.0)
        } else {
            Vec3::new(q.x / s, q.y / s, q.z / s)
        };
        (axis, angle)
    }
}

impl fmt::Display for Quat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6}, {:.6}, {:.6})", self.w, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rotates_nothing() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(Quat::identity().rotate_vector(v).approx_eq(v));
    }

    #[test]
    fn rotation_preserves_length() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 0.7);
        let v = Vec3::new(3.0, -1.0, 2.0);
        let rotated = q.rotate_vector(v);
        assert!((rotated.length() - v.length()).abs() < 1e-5 * v.length());
    }

    #[test]
    fn euler_round_trip() {
        let q = Quat::from_euler(0.2, 0.3, 0.4, EulerOrder::Zyx);
        let (r, p, y) = q.to_euler(EulerOrder::Zyx);
        let q2 = Quat::from_euler(r, p, y, EulerOrder::Zyx);
        assert!((q.dot(q2).abs() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn slerp_endpoints() {
        let a = Quat::identity();
        let b = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 1.2);
        assert!((Quat::slerp(a, b, 0.0).dot(a).abs() - 1.0).abs() < 1e-4);
        assert!((Quat::slerp(a, b, 1.0).dot(b).abs() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn small_angular_velocity_is_identity() {
        let q = Quat::from_angular_velocity(Vec3::new(1e-7, 0.0, 0.0), 0.01);
        assert_eq!(q, Quat::identity());
    }
}
