//! Steering-direction ("guidance") functions. Each produces a unit
//! vector (or zero, on a degenerate configuration) given the current
//! entity, a time step, and caller-supplied target information.
//!
//! Grounded on `projectile/guidance.h`'s `guidance_func` family. The
//! source passes target information through an untyped `void*
//! userdata` with a documented expected type per function and falls
//! back to a thread-unsafe static buffer when `out == NULL`; per the
//! REDESIGN note in spec §9, this port instead types each target
//! payload explicitly and makes the output a returned `Vec3` — there is
//! no `out == NULL` path to deprecate because there's no static buffer
//! to begin with.

use byul_core::{Environ, Vec3};

use crate::entity::EntityDynamic;

/// `lead`/`predict`/`predict_accel`/`predict_accel_env` all need the
/// target's dynamic state; this bundles it with the environment and a
/// reference time the way `guidance_target_info_t` does in the source,
/// rather than leaving it as caller-tracked loose parameters.
#[derive(Clone, Copy, Debug)]
pub struct GuidanceTargetInfo<'a> {
    pub target: &'a EntityDynamic,
    pub env: Option<&'a Environ>,
    pub current_time: f32,
}

/// No guidance: always the zero vector (projectile coasts on whatever
/// velocity/thrust it already has).
pub fn guidance_none(_proj: &EntityDynamic, _dt: f32) -> Vec3 {
    Vec3::zero()
}

/// Steer toward a fixed point.
pub fn guidance_point(proj: &EntityDynamic, target_pos: Vec3) -> Vec3 {
    (target_pos - proj.position()).unit()
}

/// Steer toward where a moving target will be after
/// `tau = |dp| / max(|v_missile|, eps)`.
pub fn guidance_lead(proj: &EntityDynamic, target: &EntityDynamic) -> Vec3 {
    let dp = target.position() - proj.position();
    let speed = proj.velocity.length().max(1e-6);
    let tau = dp.length() / speed;
    let future = target.position() + target.velocity.scale(tau);
    (future - proj.position()).unit()
}

/// Quadratic intercept (no target acceleration): solves
/// `(|v_t|^2 - s^2)*tau^2 + 2*(dp.v_t)*tau + |dp|^2 = 0` for the
/// smallest positive `tau`, falling back to `|dp|/s` when there is no
/// real root.
pub fn guidance_predict(proj: &EntityDynamic, info: &GuidanceTargetInfo) -> Vec3 {
    let dp = info.target.position() - proj.position();
    let v_t = info.target.velocity;
    let s = proj.velocity.length().max(0.01);

    let a = v_t.length_sq() - s * s;
    let b = 2.0 * dp.dot(v_t);
    let c = dp.length_sq();

    let tau = byul_numeq::solver::smallest_nonnegative_root(a, b, c).unwrap_or_else(|| {
        log::debug!("guidance_predict: no real intercept root, falling back to range/speed heuristic");
        dp.length() / s
    });

    let aim = dp + v_t.scale(tau);
    aim.unit()
}

/// Cubic intercept with target acceleration (no gravity split). Forms
/// `aa = 0.25*|a_t|^2`, `bb = v_t.a_t`, `cc = dp.a_t + |v_t|^2 - s^2`,
/// `dd = 2*dp.v_t` (the quartic `|p_rel(tau)|^2 - s^2*tau^2`'s cubic
/// term, quadratic term, linear term and constant, with the quartic's
/// own constant term dropped) and solves `aa*tau^3 + bb*tau^2 + cc*tau
/// + dd = 0` directly via Cardano's method. Degenerates to
/// [`guidance_predict`]'s quadratic case when the leading coefficient
/// is ~0.
pub fn guidance_predict_accel(proj: &EntityDynamic, info: &GuidanceTargetInfo, target_accel: Vec3) -> Vec3 {
    let dp = info.target.position() - proj.position();
    let v_t = info.target.velocity;
    let a_t = target_accel;
    let s = proj.velocity.length().max(0.01);

    let aa = 0.25 * a_t.length_sq();
    let bb = v_t.dot(a_t);
    let cc = dp.dot(a_t) + v_t.length_sq() - s * s;
    let dd = 2.0 * dp.dot(v_t);

    if aa.abs() < 1e-6 {
        return guidance_predict(proj, info);
    }

    let tau = byul_numeq::solver::smallest_nonnegative_cubic_root(aa, bb, cc, dd)
        .unwrap_or_else(|| dp.length() / s);

    let aim = dp + v_t.scale(tau) + a_t.scale(0.5 * tau * tau);
    aim.unit()
}

/// Same as [`guidance_predict_accel`] but the target's acceleration is
/// derived from its dynamic state under `env` via
/// [`EntityDynamic::calc_accel_env`] rather than supplied directly.
pub fn guidance_predict_accel_env(
    proj: &EntityDynamic,
    info: &GuidanceTargetInfo,
    prev_target_velocity: Vec3,
    dt: f32,
) -> Vec3 {
    let env = info.env;
    let target_accel = match env {
        Some(e) => info.target.calc_accel_env(prev_target_velocity, dt, e),
        None => info.target.calc_accel(prev_target_velocity, dt),
    };
    guidance_predict_accel(proj, info, target_accel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byul_core::BodyProps;
    use crate::entity::Xform;

    fn entity_at(pos: Vec3, vel: Vec3) -> EntityDynamic {
        EntityDynamic::new(Xform::new(pos, byul_core::Quat::identity()), vel, BodyProps::default(), f32::INFINITY)
    }

    #[test]
    fn none_is_always_zero() {
        assert_eq!(guidance_none(&entity_at(Vec3::zero(), Vec3::zero()), 0.1), Vec3::zero());
    }

    #[test]
    fn point_steers_toward_target() {
        let proj = entity_at(Vec3::zero(), Vec3::zero());
        let dir = guidance_point(&proj, Vec3::new(10.0, 0.0, 0.0));
        assert!(dir.approx_eq(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn point_at_same_position_is_zero_not_nan() {
        let proj = entity_at(Vec3::new(5.0, 0.0, 0.0), Vec3::zero());
        let dir = guidance_point(&proj, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(dir, Vec3::zero());
        assert!(!dir.x.is_nan());
    }

    #[test]
    fn lead_leads_a_receding_target() {
        let proj = entity_at(Vec3::zero(), Vec3::new(12.0, 0.0, 0.0));
        let target = entity_at(Vec3::new(15.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0));
        let dir = guidance_lead(&proj, &target);
        assert!(dir.x > 0.0);
    }

    #[test]
    fn predict_falls_back_to_heuristic_without_real_root() {
        let proj = entity_at(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0));
        let target = entity_at(Vec3::new(10.0, 0.0, 0.0), Vec3::zero());
        let info = GuidanceTargetInfo { target: &target, env: None, current_time: 0.0 };
        let dir = guidance_predict(&proj, &info);
        assert!(dir.x > 0.0);
    }

    #[test]
    fn predict_accel_degenerates_to_quadratic_when_no_target_accel() {
        let proj = entity_at(Vec3::zero(), Vec3::new(10.0, 0.0, 0.0));
        let target = entity_at(Vec3::new(20.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0));
        let info = GuidanceTargetInfo { target: &target, env: None, current_time: 0.0 };
        let dir = guidance_predict_accel(&proj, &info, Vec3::zero());
        assert!(dir.x > 0.0);
    }
}
