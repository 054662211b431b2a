//! Force model: drag, total acceleration, closed-form prediction, spin
//! coupling, and continuous collision detection (sphere–sphere,
//! sphere–plane).

use byul_core::{BodyProps, Environ, LinearState, Vec3};

use crate::solver::smallest_nonnegative_root;

const STD_AIR_DENSITY: f32 = 1.225;
/// Below this relative speed, drag is treated as exactly zero.
pub const EPS_REL_VEL: f32 = 1e-6;

/// Velocity-squared aerodynamic drag acceleration: `v` relative to
/// `env.wind_vel` (or `v` itself when `env` is absent).
pub fn drag_accel(v: Vec3, env: Option<&Environ>, body: &BodyProps) -> Vec3 {
    let rel_vel = match env {
        Some(e) => v - e.wind_vel,
        None => v,
    };
    let speed = rel_vel.length();
    if speed < EPS_REL_VEL {
        return Vec3::zero();
    }
    let rho = env.map(|e| e.air_density).unwrap_or(STD_AIR_DENSITY);
    let mag = 0.5 * rho * speed * speed * body.drag_coef * body.cross_section / body.mass;
    rel_vel.unit().scale(-mag)
}

/// Total linear acceleration: `g + drag + state.acceleration`, then
/// distorted by `env.distort_accel`.
pub fn model_accel(state: &LinearState, env: Option<&Environ>, body: &BodyProps) -> Vec3 {
    let gravity = env.map(|e| e.gravity).unwrap_or(Vec3::new(0.0, -9.81, 0.0));
    let drag = drag_accel(state.velocity, env, body);
    let raw = gravity + drag + state.acceleration;
    match env {
        Some(e) => e.distort_accel(raw),
        None => raw,
    }
}

/// External-only acceleration (no gravity): `drag + state.acceleration`,
/// distorted with gravity split out and re-subtracted.
pub fn model_accel_except_gravity(
    state: &LinearState,
    env: Option<&Environ>,
    body: &BodyProps,
) -> Vec3 {
    let gravity = env.map(|e| e.gravity).unwrap_or(Vec3::new(0.0, -9.81, 0.0));
    let drag = drag_accel(state.velocity, env, body);
    let ext = drag + state.acceleration;
    match env {
        Some(e) => e.distort_accel_except_gravity(true, ext + gravity) - gravity,
        None => ext,
    }
}

/// Closed-form prediction at time `t` from an initial state (drag is
/// recomputed at `t` from `v(t)`, not frozen at `t=0`).
pub fn predict(s0: &LinearState, env: Option<&Environ>, body: &BodyProps, t: f32) -> LinearState {
    let a0 = model_accel(s0, env, body);
    let v0 = body.apply_friction(s0.velocity, t);
    let velocity = v0 + a0.scale(t);
    let position = s0.position + s0.velocity.scale(t) + a0.scale(0.5 * t * t);
    let mut next = LinearState::new(position, velocity, a0);
    next.acceleration = model_accel(&next, env, body);
    next
}

/// RK4-env prediction: integrates `steps` sub-steps of `RK4-env`
/// (acceleration recomputed at every stage) over `[0, t]`.
pub fn predict_rk4(
    s0: &LinearState,
    env: Option<&Environ>,
    body: &BodyProps,
    t: f32,
    steps: u32,
) -> LinearState {
    let steps = steps.max(1);
    let dt = t / steps as f32;
    let mut state = *s0;
    for _ in 0..steps {
        state = crate::integrator::rk4_env_step(&state, env, body, dt);
    }
    state
}

/// Magnus + gyroscopic lateral acceleration:
/// `k_magnus*(omega x v) + k_gyro*dt*(alpha x v)`.
pub fn calc_spin_accel(v: Vec3, omega: Vec3, alpha: Vec3, body: &BodyProps, dt: f32) -> Vec3 {
    omega.cross(v).scale(body.k_magnus) + alpha.cross(v).scale(body.k_gyro * dt)
}

const SPIN_DRAG_REDUCTION_CAP: f32 = 0.30;
const SPIN_DRAG_PENALTY_CAP: f32 = 0.15;
const MAX_EFFECTIVE_SPIN: f32 = 50.0;

/// Drag scale multiplier induced by spin/relative-wind alignment.
/// Reduction (up to 30%, active for `c > 0`) and penalty (up to 15%,
/// active for `c < 0.5` with misalignment factor `(0.5 - c) / 1.5`)
/// are computed independently and combined as `1 - reduction +
/// penalty`, so partial alignment (`0 < c < 0.5`) incurs both at once.
/// Clamped to `[0, 2]`.
pub fn motion_drag_scale(rel_wind: Vec3, omega: Vec3) -> f32 {
    let wind_dir = rel_wind.unit();
    let spin_dir = omega.unit();
    if wind_dir == Vec3::zero() || spin_dir == Vec3::zero() {
        return 1.0;
    }
    let c = wind_dir.dot(spin_dir).clamp(-1.0, 1.0);
    let spin_factor = (omega.length() / MAX_EFFECTIVE_SPIN).min(1.0);
    let reduction = if c > 0.0 { SPIN_DRAG_REDUCTION_CAP * c * spin_factor } else { 0.0 };
    let penalty = if c < 0.5 {
        let misalign_factor = (0.5 - c) / 1.5;
        SPIN_DRAG_PENALTY_CAP * misalign_factor * spin_factor
    } else {
        0.0
    };
    (1.0 - reduction + penalty).clamp(0.0, 2.0)
}

/// Sphere–sphere CCD (no gravity): smallest non-negative `t` at which
/// `|p_a(t) - p_b(t)| == r_sum`, given constant relative acceleration.
/// Returns `None` if already separated and accelerating relative motion
/// (`ar != 0`) — the ticker's per-substep CCD covers that case instead.
pub fn sphere_sphere_ccd(a: &LinearState, b: &LinearState, r_sum: f32) -> Option<f32> {
    let pr = a.position - b.position;
    let vr = a.velocity - b.velocity;
    let ar = a.acceleration - b.acceleration;

    if pr.length_sq() <= r_sum * r_sum {
        return Some(0.0);
    }

    if ar != Vec3::zero() {
        return None;
    }

    let aq = vr.length_sq();
    let bq = 2.0 * pr.dot(vr);
    let cq = pr.length_sq() - r_sum * r_sum;
    smallest_nonnegative_root(aq, bq, cq)
}

/// Ray-accelerated sphere-vs-point CCD over a bounded sub-step `[0, dt]`,
/// used by the predictor/ticker per-step CCD against a moving target.
/// `p_rel(tau) = p_rel0 + v_rel0*tau + 0.5*a*tau^2`.
pub fn sphere_ccd_substep(
    p_rel0: Vec3,
    v_rel0: Vec3,
    a: Vec3,
    r_sum: f32,
    dt: f32,
) -> Option<f32> {
    if p_rel0.length_sq() <= r_sum * r_sum {
        return Some(0.0);
    }
    // |p_rel0 + v_rel0*tau + 0.5*a*tau^2|^2 = r_sum^2 expands into a
    // quartic in tau; approximate the force term as constant over the
    // sub-step and solve the quadratic in (p_rel0, v_rel0) first, then
    // fall back to the "distance decreased past R" interpolation.
    let aq = v_rel0.length_sq();
    let bq = 2.0 * p_rel0.dot(v_rel0);
    let cq = p_rel0.length_sq() - r_sum * r_sum;
    if let Some(tau) = smallest_nonnegative_root(aq, bq, cq) {
        if tau <= dt {
            return Some(tau);
        }
    }

    let p1 = p_rel0 + v_rel0.scale(dt) + a.scale(0.5 * dt * dt);
    let d0 = p_rel0.length();
    let d1 = p1.length();
    if d0 > r_sum && d1 <= r_sum {
        let span = d0 - d1;
        let frac = if span.abs() < 1e-9 { 0.0 } else { (d0 - r_sum) / span };
        return Some((frac * dt).clamp(0.0, dt));
    }
    None
}

/// Sphere-vs-plane CCD: `plane_point`/`plane_normal` define the plane;
/// `r_sum` is the combined radius. Accepts only forward (non-negative)
/// time.
pub fn sphere_plane_ccd(
    point: Vec3,
    velocity: Vec3,
    plane_point: Vec3,
    plane_normal: Vec3,
    r_sum: f32,
) -> Option<f32> {
    let n = plane_normal.unit();
    if n == Vec3::zero() {
        return None;
    }
    let signed_dist = (point - plane_point).dot(n);
    if signed_dist.abs() <= r_sum {
        return Some(0.0);
    }
    let offset_plane_point = plane_point + n.scale(r_sum * signed_dist.signum());
    let denom = velocity.dot(n);
    if denom.abs() < 1e-9 {
        return None;
    }
    let t = (offset_plane_point - point).dot(n) / denom;
    if t >= 0.0 {
        Some(t)
    } else {
        None
    }
}

/// Ground-plane (`y = 0`) CCD for one sub-step, used by the predictor.
/// Solves `p_prev.y + v_prev.y*tau + 0.5*a.y*tau^2 = 0` on `[0, dt]` and
/// returns the first root, only when the step actually crossed `y=0`.
pub fn ground_plane_ccd(p_prev: Vec3, v_prev: Vec3, a: Vec3, p_curr: Vec3, dt: f32) -> Option<f32> {
    if !(p_prev.y > 0.0 && p_curr.y <= 0.0) {
        return None;
    }
    let tau = smallest_nonnegative_root(0.5 * a.y, v_prev.y, p_prev.y)?;
    if tau <= dt {
        Some(tau)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byul_core::{BodyProps, Environ};

    #[test]
    fn drag_is_zero_below_eps_rel_vel() {
        let body = BodyProps::default();
        assert_eq!(drag_accel(Vec3::zero(), None, &body), Vec3::zero());
    }

    #[test]
    fn drag_opposes_motion() {
        let body = BodyProps::new(1.0, 0.5, 0.01);
        let v = Vec3::new(10.0, 0.0, 0.0);
        let a = drag_accel(v, None, &body);
        assert!(a.x < 0.0);
        assert_eq!(a.y, 0.0);
        assert_eq!(a.z, 0.0);
    }

    #[test]
    fn model_accel_uses_gravity_default_without_env() {
        let body = BodyProps { drag_coef: 0.0, ..Default::default() };
        let s = LinearState::default();
        let a = model_accel(&s, None, &body);
        assert!((a.y - (-9.81)).abs() < 1e-4);
    }

    #[test]
    fn predict_matches_projectile_motion_without_drag() {
        let body = BodyProps { drag_coef: 0.0, ..Default::default() };
        let env = Environ::gravity_only();
        let s0 = LinearState::new(Vec3::zero(), Vec3::new(10.0, 0.0, 0.0), Vec3::zero());
        let s1 = predict(&s0, Some(&env), &body, 1.0);
        assert!((s1.position.x - 10.0).abs() < 1e-3);
        assert!((s1.position.y - (-4.905)).abs() < 1e-2);
    }

    #[test]
    fn sphere_sphere_inside_is_time_zero() {
        let a = LinearState::new(Vec3::zero(), Vec3::zero(), Vec3::zero());
        let b = LinearState::new(Vec3::new(0.5, 0.0, 0.0), Vec3::zero(), Vec3::zero());
        assert_eq!(sphere_sphere_ccd(&a, &b, 1.0), Some(0.0));
    }

    #[test]
    fn sphere_sphere_closing_constant_velocity() {
        let a = LinearState::new(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0), Vec3::zero());
        let b = LinearState::new(Vec3::new(10.0, 0.0, 0.0), Vec3::zero(), Vec3::zero());
        let t = sphere_sphere_ccd(&a, &b, 1.0).unwrap();
        assert!((t - 9.0).abs() < 1e-3);
    }

    #[test]
    fn ground_plane_detects_crossing() {
        let p_prev = Vec3::new(0.0, 1.0, 0.0);
        let v_prev = Vec3::new(0.0, -2.0, 0.0);
        let a = Vec3::zero();
        let p_curr = Vec3::new(0.0, -1.0, 0.0);
        let tau = ground_plane_ccd(p_prev, v_prev, a, p_curr, 1.0).unwrap();
        assert!((tau - 0.5).abs() < 1e-3);
    }

    #[test]
    fn ground_plane_no_crossing_is_none() {
        let p_prev = Vec3::new(0.0, 5.0, 0.0);
        let v_prev = Vec3::new(0.0, -1.0, 0.0);
        let p_curr = Vec3::new(0.0, 4.0, 0.0);
        assert_eq!(ground_plane_ccd(p_prev, v_prev, Vec3::zero(), p_curr, 1.0), None);
    }

    #[test]
    fn spin_accel_combines_magnus_and_gyro_terms() {
        let body = BodyProps { k_magnus: 2.0, k_gyro: 1.0, ..Default::default() };
        let v = Vec3::new(10.0, 0.0, 0.0);
        let omega = Vec3::new(0.0, 1.0, 0.0);
        let alpha = Vec3::new(0.0, 0.0, 1.0);
        let a = calc_spin_accel(v, omega, alpha, &body, 0.5);
        // omega x v = (0,0,-10), scaled by k_magnus=2 -> (0,0,-20)
        // alpha x v = (0,10,0), scaled by k_gyro*dt=0.5 -> (0,5,0)
        assert!(a.approx_eq(Vec3::new(0.0, 5.0, -20.0)));
    }

    #[test]
    fn drag_scale_aligned_spin_reduces_drag() {
        // c=1, spin_factor=0.5 -> reduction=0.30*1*0.5=0.15, penalty=0 (c !< 0.5)
        let wind = Vec3::new(1.0, 0.0, 0.0);
        let omega = Vec3::new(25.0, 0.0, 0.0);
        let scale = motion_drag_scale(wind, omega);
        assert!((scale - 0.85).abs() < 1e-4);
    }

    #[test]
    fn drag_scale_misaligned_spin_penalizes_drag() {
        // c=-1, spin_factor=1.0 -> reduction=0, misalign_factor=(0.5-(-1))/1.5=1.0,
        // penalty=0.15*1.0*1.0=0.15
        let wind = Vec3::new(1.0, 0.0, 0.0);
        let omega = Vec3::new(-50.0, 0.0, 0.0);
        let scale = motion_drag_scale(wind, omega);
        assert!((scale - 1.15).abs() < 1e-4);
    }

    #[test]
    fn drag_scale_partial_alignment_stacks_reduction_and_penalty() {
        // c=0.3, spin_factor=1.0 -> reduction=0.30*0.3*1=0.09,
        // misalign_factor=(0.5-0.3)/1.5=0.13333, penalty=0.15*0.13333*1=0.02
        // scale = 1 - 0.09 + 0.02 = 0.93
        let wind = Vec3::new(1.0, 0.0, 0.0);
        let angle = 0.3f32.acos();
        let omega = Vec3::new(angle.cos(), angle.sin(), 0.0).scale(50.0);
        let scale = motion_drag_scale(wind, omega);
        assert!((scale - 0.93).abs() < 1e-3);
    }
}
