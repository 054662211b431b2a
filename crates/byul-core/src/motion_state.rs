//! Linear and angular motion state.

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::quat::Quat;
use crate::vec3::Vec3;

/// Position/velocity/acceleration in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct LinearState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

impl LinearState {
    pub fn new(position: Vec3, velocity: Vec3, acceleration: Vec3) -> Self {
        Self { position, velocity, acceleration }
    }
}

/// Orientation/angular-velocity/angular-acceleration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct AttitudeState {
    pub orientation: Quat,
    pub angular_velocity: Vec3,
    pub angular_acceleration: Vec3,
}

impl Default for AttitudeState {
    fn default() -> Self {
        Self {
            orientation: Quat::identity(),
            angular_velocity: Vec3::zero(),
            angular_acceleration: Vec3::zero(),
        }
    }
}

impl AttitudeState {
    pub fn new(orientation: Quat, angular_velocity: Vec3, angular_acceleration: Vec3) -> Self {
        Self { orientation: orientation.normalize(), angular_velocity, angular_acceleration }
    }

    /// Re-normalizes `orientation`; must be called after every integrator
    /// step that advances it.
    pub fn renormalize(&mut self) {
        self.orientation = self.orientation.normalize();
    }
}

/// Combined linear + angular state of a body at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct MotionState {
    pub linear: LinearState,
    pub angular: AttitudeState,
}

impl MotionState {
    pub fn new(linear: LinearState, angular: AttitudeState) -> Self {
        Self { linear, angular }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attitude_orientation_is_unit() {
        let a = AttitudeState::default();
        assert!((a.orientation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn new_normalizes_orientation() {
        let q = Quat::new(2.0, 0.0, 0.0, 0.0);
        let a = AttitudeState::new(q, Vec3::zero(), Vec3::zero());
        assert!((a.orientation.length() - 1.0).abs() < 1e-6);
    }
}
