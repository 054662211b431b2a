//! Physical properties of a rigid/point body used by the force model.

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::vec3::Vec3;

/// Static physical properties consumed by `byul-numeq`'s force model.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct BodyProps {
    pub mass: f32,
    pub drag_coef: f32,
    pub cross_section: f32,
    pub restitution: f32,
    pub friction: f32,
    pub k_magnus: f32,
    pub k_gyro: f32,
}

impl Default for BodyProps {
    fn default() -> Self {
        Self {
            mass: 1.0,
            drag_coef: 0.47,
            cross_section: 0.01,
            restitution: 0.5,
            friction: 0.0,
            k_magnus: 0.0,
            k_gyro: 0.0,
        }
    }
}

impl BodyProps {
    pub fn new(mass: f32, drag_coef: f32, cross_section: f32) -> Self {
        Self { mass, drag_coef, cross_section, ..Default::default() }
    }

    /// Velocity after a linear-friction decay over `dt`:
    /// `v <- v * max(0, 1 - friction*dt)`.
    pub fn apply_friction(&self, v: Vec3, dt: f32) -> Vec3 {
        let k = (1.0 - self.friction * dt).max(0.0);
        v.scale(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friction_never_reverses_velocity() {
        let body = BodyProps { friction: 5.0, ..Default::default() };
        let v = Vec3::new(10.0, 0.0, 0.0);
        let out = body.apply_friction(v, 1.0);
        assert_eq!(out, Vec3::zero());
    }

    #[test]
    fn zero_friction_is_identity() {
        let body = BodyProps::default();
        let v = Vec3::new(3.0, -2.0, 1.0);
        assert_eq!(body.apply_friction(v, 0.5), v);
    }
}
