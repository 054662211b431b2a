//! Offline trajectory prediction: `projectile_predict` simulates a
//! projectile forward a fixed `dt` at a time up to `max_time`,
//! combining environment, propulsion, and guidance, and stopping at
//! the first collision against a target sphere or the ground plane.
//! Grounded on `balix/projectile/projectile.h`'s predictor struct and
//! spec'd per-step ordering: env-accel -> thrust-accel -> integrate ->
//! friction -> sample -> CCD.

use byul_core::{AttitudeState, Environ, LinearState, MotionState, Trajectory, Vec3};
use byul_numeq::filters::FilterInterface;
use byul_numeq::integrator::rk4_env_step;
use byul_numeq::model::{ground_plane_ccd, sphere_ccd_substep};

use crate::entity::{entity_radius, EntityDynamic};
use crate::projectile::Projectile;
use crate::propulsion::Propulsion;

/// Unit steering direction for one predictor/ticker step: the
/// projectile's current state, the target's current state (the
/// predictor/ticker's own live snapshot, advanced internally every
/// step — not a copy the closure must track itself), and the step
/// about to be taken. Implementations that need a running clock can
/// close over their own counter.
pub type GuidanceFn<'a> = dyn Fn(&EntityDynamic, Option<&EntityDynamic>, f32) -> Vec3 + 'a;

/// Outcome of an offline prediction run.
pub struct ProjectileResult {
    pub start_pos: Vec3,
    pub target_pos: Option<Vec3>,
    pub initial_velocity: Vec3,
    /// `-1.0` when no impact occurred.
    pub impact_time: f32,
    pub impact_pos: Vec3,
    pub bool_impacted: bool,
    pub trajectory: Trajectory,
}

impl ProjectileResult {
    fn new(start_pos: Vec3, target_pos: Option<Vec3>, initial_velocity: Vec3, capacity: usize) -> Self {
        Self {
            start_pos,
            target_pos,
            initial_velocity,
            impact_time: -1.0,
            impact_pos: Vec3::zero(),
            bool_impacted: false,
            trajectory: Trajectory::with_capacity(capacity),
        }
    }
}

/// Per-step acceleration assembly shared by the predictor and the
/// ticker: default steering is straight at `target` (zero if absent),
/// overridden by `guidance` when supplied; propulsion is advanced
/// toward its own max thrust and the resulting thrust is projected
/// along the steering direction.
pub(crate) fn assemble_thrust_accel(
    proj: &EntityDynamic,
    target: Option<&EntityDynamic>,
    guidance: Option<&GuidanceFn<'_>>,
    propulsion: Option<&mut Propulsion>,
    dt: f32,
) -> Vec3 {
    let default_steer = match target {
        Some(t) => (t.position() - proj.position()).unit(),
        None => Vec3::zero(),
    };
    let steer = match guidance {
        Some(g) => g(proj, target, dt),
        None => default_steer,
    };

    match propulsion {
        Some(p) => {
            p.update(p.max_thrust, dt);
            let mass = if proj.props.mass > 0.0 { proj.props.mass } else { 1.0 };
            steer.scale(p.get_thrust() / mass)
        }
        None => Vec3::zero(),
    }
}

/// Runs one offline prediction. `capacity` bounds the trajectory buffer
/// (`ceil(max_time / dt) + 1` samples at most).
#[allow(clippy::too_many_arguments)]
pub fn projectile_predict(
    proj: &Projectile,
    target: Option<&EntityDynamic>,
    max_time: f32,
    dt: f32,
    env: Option<&Environ>,
    mut propulsion: Option<&mut Propulsion>,
    guidance: Option<&GuidanceFn<'_>>,
    mut filter: Option<&mut dyn FilterInterface<State = (Vec3, Vec3), Measurement = Vec3>>,
) -> ProjectileResult {
    let start_pos = proj.base.position();
    let initial_velocity = proj.base.velocity;
    let target_pos = target.map(EntityDynamic::position);

    let steps = (max_time / dt).ceil().max(0.0) as usize + 1;
    let mut result = ProjectileResult::new(start_pos, target_pos, initial_velocity, steps);

    let mut state = MotionState {
        linear: LinearState::new(start_pos, initial_velocity, Vec3::zero()),
        angular: AttitudeState::new(proj.base.orientation(), proj.base.angular_velocity, Vec3::zero()),
    };
    let mut moving_target = target.copied();
    let own_radius = proj.entity_size();

    let mut t = 0.0;
    for _ in 0..steps {
        let p_prev = state.linear.position;
        let v_prev = state.linear.velocity;

        let proj_snapshot = EntityDynamic { xform: crate::entity::Xform::new(p_prev, proj.base.orientation()), velocity: v_prev, ..proj.base };

        let thrust_accel = assemble_thrust_accel(&proj_snapshot, moving_target.as_ref(), guidance, propulsion.as_deref_mut(), dt);
        state.linear.acceleration = thrust_accel;

        state.linear = rk4_env_step(&state.linear, env, &proj.base.props, dt);
        state.linear.velocity = proj.base.props.apply_friction(state.linear.velocity, dt);

        if let Some(f) = filter.as_mut() {
            f.time_update(dt);
            f.measurement_update(state.linear.position);
            let (pos, vel) = f.state();
            state.linear.position = pos;
            state.linear.velocity = vel;
        }

        if let Some(tgt) = moving_target.as_mut() {
            tgt.advance(dt);
        }

        let accel = state.linear.acceleration;

        if let Some(tgt) = moving_target.as_ref() {
            let p_rel0 = p_prev - tgt.position();
            let v_rel0 = v_prev - tgt.velocity;
            let r_sum = own_radius + entity_radius(tgt);
            if let Some(tau) = sphere_ccd_substep(p_rel0, v_rel0, accel, r_sum, dt) {
                let impact_pos = p_prev + v_prev.scale(tau) + accel.scale(0.5 * tau * tau);
                result.trajectory.add_sample(t + tau, state);
                result.impact_time = t + tau;
                result.impact_pos = impact_pos;
                result.bool_impacted = true;
                return result;
            }
        }

        if let Some(tau) = ground_plane_ccd(p_prev, v_prev, accel, state.linear.position, dt) {
            let impact_pos = Vec3::new(
                p_prev.x + v_prev.x * tau,
                0.0,
                p_prev.z + v_prev.z * tau,
            );
            result.trajectory.add_sample(t + tau, state);
            result.impact_time = t + tau;
            result.impact_pos = impact_pos;
            result.bool_impacted = true;
            return result;
        }

        t += dt;
        result.trajectory.add_sample(t, state);
    }

    log::debug!("projectile_predict exhausted {steps} steps over {max_time}s with no impact");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use byul_core::BodyProps;
    use crate::entity::Xform;

    fn falling_projectile() -> Projectile {
        let mut base = EntityDynamic::new(Xform::new(Vec3::new(0.0, 500.0, 0.0), byul_core::Quat::identity()), Vec3::zero(), BodyProps { drag_coef: 0.0, ..Default::default() }, f32::INFINITY);
        base.props.cross_section = 0.0;
        Projectile::new(base)
    }

    #[test]
    fn pure_gravity_hits_ground_near_expected_time() {
        let proj = falling_projectile();
        let env = Environ::gravity_only();
        let result = projectile_predict(&proj, None, 500.0, 1.0, Some(&env), None, None, None);
        assert!(result.bool_impacted);
        assert!((result.impact_time - 10.10).abs() < 1.0);
        assert!(result.impact_pos.y.abs() < 1.0);
    }

    #[test]
    fn no_impact_reports_false_and_minus_one() {
        let mut base = EntityDynamic::new(Xform::identity(), Vec3::new(0.0, 10.0, 0.0), BodyProps::default(), f32::INFINITY);
        base.props.cross_section = 0.0;
        let proj = Projectile::new(base);
        let env = Environ::none();
        let result = projectile_predict(&proj, None, 1.0, 0.5, Some(&env), None, None, None);
        assert!(!result.bool_impacted);
        assert_eq!(result.impact_time, -1.0);
    }

    #[test]
    fn static_target_intercept_hits_near_range() {
        let mut base = EntityDynamic::new(Xform::new(Vec3::new(0.0, 10.0, 0.0), byul_core::Quat::identity()), Vec3::new(15.0, 0.0, 0.0), BodyProps { drag_coef: 0.0, ..Default::default() }, f32::INFINITY);
        base.props.cross_section = 3.14159;
        let proj = Projectile::new(base);

        let mut target = EntityDynamic::new(Xform::new(Vec3::new(100.0, 10.0, 0.0), byul_core::Quat::identity()), Vec3::zero(), BodyProps::default(), f32::INFINITY);
        target.props.cross_section = 3.14159;

        let guidance: &GuidanceFn<'_> =
            &|p, t, _dt| crate::guidance::guidance_point(p, t.map(EntityDynamic::position).unwrap_or_default());

        let result = projectile_predict(&proj, Some(&target), 50.0, 2.0, Some(&Environ::none()), None, Some(guidance), None);
        assert!(result.bool_impacted);
        assert!((result.impact_pos.x - 100.0).abs() < proj.entity_size() + 5.0);
    }
}
