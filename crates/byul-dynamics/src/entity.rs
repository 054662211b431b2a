//! `EntityDynamic`: the moving-thing base every projectile/missile/aerial
//! vehicle in the engine is built from. Grounded on
//! `entity/entity_dynamic.h`'s layering — identity/age/lifetime, a
//! transform, body properties, and linear/angular velocity — kept as its
//! own type rather than inlined into `Projectile` so other entity kinds
//! (targets, non-projectile aerials) can reuse it.

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use byul_core::{BodyProps, Environ, Quat, Vec3};

/// Position + orientation. A thin pair kept local to byul-dynamics
/// (byul-core's `MotionState` carries velocity/acceleration too, which
/// `EntityDynamic` stores separately).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct Xform {
    pub pos: Vec3,
    pub rot: Quat,
}

impl Xform {
    pub fn new(pos: Vec3, rot: Quat) -> Self {
        Self { pos, rot }
    }

    pub fn identity() -> Self {
        Self { pos: Vec3::zero(), rot: Quat::identity() }
    }
}

/// Monotonically increasing identity source for entities created without
/// a caller-supplied id. Not exposed as global mutable state beyond this
/// one counter, which is itself only advisory (callers may always
/// override with `with_id`).
static NEXT_ID: core::sync::atomic::AtomicU64 = core::sync::atomic::AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, core::sync::atomic::Ordering::Relaxed)
}

/// A moving entity: transform, velocity/angular velocity, body
/// properties, lifetime bookkeeping, and a grounded flag the ground CCD
/// can set.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
pub struct EntityDynamic {
    pub id: u64,
    pub xform: Xform,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub props: BodyProps,
    pub age: f32,
    pub lifetime: f32,
    pub is_grounded: bool,
}

impl Default for EntityDynamic {
    fn default() -> Self {
        Self {
            id: next_id(),
            xform: Xform::identity(),
            velocity: Vec3::zero(),
            angular_velocity: Vec3::zero(),
            props: BodyProps::default(),
            age: 0.0,
            lifetime: f32::INFINITY,
            is_grounded: false,
        }
    }
}

impl EntityDynamic {
    pub fn new(xform: Xform, velocity: Vec3, props: BodyProps, lifetime: f32) -> Self {
        Self { xform, velocity, props, lifetime, ..Default::default() }
    }

    /// Assigns a caller-chosen id, overriding the auto-assigned one.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.xform.pos
    }

    pub fn orientation(&self) -> Quat {
        self.xform.rot
    }

    /// `(velocity - prev_velocity) / dt`; zero if `dt <= 0`.
    pub fn calc_accel(&self, prev_velocity: Vec3, dt: f32) -> Vec3 {
        if dt <= 0.0 {
            Vec3::zero()
        } else {
            (self.velocity - prev_velocity).scale(1.0 / dt)
        }
    }

    /// Same as [`Self::calc_accel`] but distorted through `env`'s
    /// external-acceleration model (used by `predict_accel_env`
    /// guidance to estimate a target's true acceleration under the
    /// environment it's flying through).
    pub fn calc_accel_env(&self, prev_velocity: Vec3, dt: f32, env: &Environ) -> Vec3 {
        let raw = self.calc_accel(prev_velocity, dt);
        env.distort_accel_except_gravity(false, raw)
    }

    /// Advances position/age by straight-line kinematics (no forcing):
    /// `p += v*dt`, `age += dt`. Used by entities with no independent
    /// physics model of their own (e.g. a guidance target snapshot).
    pub fn advance(&mut self, dt: f32) {
        self.xform.pos += self.velocity.scale(dt);
        self.age += dt;
    }

    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

/// Collision radius derived from `props.cross_section` (area) assuming a
/// circular profile: `r = sqrt(cross_section / pi)`. Shared by
/// [`crate::projectile::Projectile::entity_size`] and by the
/// predictor/ticker for the target side of sphere CCD, since a target is
/// a bare `EntityDynamic` with no `Projectile` wrapper to hang the method
/// off of.
pub fn entity_radius(e: &EntityDynamic) -> f32 {
    (e.props.cross_section / std::f32::consts::PI).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calc_accel_is_zero_for_nonpositive_dt() {
        let e = EntityDynamic::default();
        assert_eq!(e.calc_accel(Vec3::new(1.0, 0.0, 0.0), 0.0), Vec3::zero());
    }

    #[test]
    fn calc_accel_matches_velocity_delta_over_dt() {
        let mut e = EntityDynamic::default();
        e.velocity = Vec3::new(10.0, 0.0, 0.0);
        let a = e.calc_accel(Vec3::zero(), 2.0);
        assert!(a.approx_eq(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn advance_moves_position_by_velocity_dt() {
        let mut e = EntityDynamic::default();
        e.velocity = Vec3::new(1.0, 0.0, 0.0);
        e.advance(2.0);
        assert!(e.xform.pos.approx_eq(Vec3::new(2.0, 0.0, 0.0)));
        assert!((e.age - 2.0).abs() < 1e-6);
    }

    #[test]
    fn is_expired_at_or_past_lifetime() {
        let mut e = EntityDynamic { lifetime: 5.0, ..Default::default() };
        e.age = 5.0;
        assert!(e.is_expired());
    }

    #[test]
    fn distinct_entities_get_distinct_ids() {
        let a = EntityDynamic::default();
        let b = EntityDynamic::default();
        assert_ne!(a.id, b.id);
    }
}
