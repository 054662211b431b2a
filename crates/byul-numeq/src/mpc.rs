//! Model Predictive Control: discrete search over candidate linear/angular
//! acceleration pairs, scored by a pluggable cost function against a
//! forward roll-out. Lives apart from [`crate::controller`] because its
//! input/output shapes (motion state, not a scalar) don't fit the
//! `(target, measured, dt) -> f32` contract.

use byul_core::{AttitudeState, BodyProps, Environ, LinearState, MotionState, Quat, Vec3};

use crate::integrator::rk4_env_step;

/// MPC search/cost configuration. Defaults match the source library's
/// documented defaults.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MpcConfig {
    pub horizon_sec: f32,
    pub step_dt: f32,
    pub max_accel: f32,
    pub max_ang_accel: f32,
    pub max_speed: f32,
    pub max_ang_speed: f32,
    pub weight_distance: f32,
    pub weight_orientation: f32,
    pub weight_velocity: f32,
    pub weight_accel: f32,
    pub weight_ang_accel: f32,
    pub max_iter: u32,
    pub output_trajectory: bool,
    pub candidate_step: f32,
    pub ang_candidate_step: f32,
}

impl Default for MpcConfig {
    fn default() -> Self {
        Self {
            horizon_sec: 1.0,
            step_dt: 0.05,
            max_accel: 10.0,
            max_ang_accel: 5.0,
            max_speed: 50.0,
            max_ang_speed: 10.0,
            weight_distance: 1.0,
            weight_orientation: 0.5,
            weight_velocity: 0.1,
            weight_accel: 0.1,
            weight_ang_accel: 0.1,
            max_iter: 10,
            output_trajectory: false,
            candidate_step: 0.5,
            ang_candidate_step: 0.1,
        }
    }
}

/// Result of a single MPC solve: the input to apply now, the terminal
/// state it leads to over the horizon, its cost, and (if
/// `config.output_trajectory`) the chosen forward roll-out.
#[derive(Clone, Debug)]
pub struct MpcOutput {
    pub desired_accel: Vec3,
    pub desired_ang_accel: Vec3,
    pub future_state: MotionState,
    pub cost: f32,
    pub trajectory: Option<Vec<MotionState>>,
}

/// Shortest-arc angle between two orientations, in radians.
fn orientation_error(a: Quat, b: Quat) -> f32 {
    (2.0 * a.dot(b).clamp(-1.0, 1.0).abs().acos()).abs()
}

/// `w_d*|dp|^2 + w_r*d_theta^2 + w_a*|a|^2 + w_ang*|alpha|^2`.
pub fn cost_default(sim: &MotionState, target: &MotionState, cfg: &MpcConfig) -> f32 {
    let dp = sim.linear.position - target.linear.position;
    let d_theta = orientation_error(sim.angular.orientation, target.angular.orientation);
    cfg.weight_distance * dp.length_sq()
        + cfg.weight_orientation * d_theta * d_theta
        + cfg.weight_accel * sim.linear.acceleration.length_sq()
        + cfg.weight_ang_accel * sim.angular.angular_acceleration.length_sq()
}

/// `w_d*(|v|-v_target)^2 + w_a*|a|^2`, where `target.linear.velocity.x`
/// carries the target speed scalar.
pub fn cost_speed(sim: &MotionState, target: &MotionState, cfg: &MpcConfig) -> f32 {
    let v_target = target.linear.velocity.x;
    let dv = sim.linear.velocity.length() - v_target;
    cfg.weight_distance * dv * dv + cfg.weight_accel * sim.linear.acceleration.length_sq()
}

/// [`cost_default`] plus a velocity-error term.
pub fn cost_hybrid(sim: &MotionState, target: &MotionState, cfg: &MpcConfig) -> f32 {
    let dv = sim.linear.velocity - target.linear.velocity;
    cost_default(sim, target, cfg) + cfg.weight_velocity * dv.length_sq()
}

/// Cost function signature: simulated state, target state, config ->
/// scalar cost (lower is better).
pub type CostFn<'a> = dyn Fn(&MotionState, &MotionState, &MpcConfig) -> f32 + 'a;

fn clamp_speed(state: MotionState, cfg: &MpcConfig) -> MotionState {
    let mut s = state;
    let speed = s.linear.velocity.length();
    if speed > cfg.max_speed && speed > 0.0 {
        s.linear.velocity = s.linear.velocity.scale(cfg.max_speed / speed);
    }
    let ang_speed = s.angular.angular_velocity.length();
    if ang_speed > cfg.max_ang_speed && ang_speed > 0.0 {
        s.angular.angular_velocity = s.angular.angular_velocity.scale(cfg.max_ang_speed / ang_speed);
    }
    s
}

/// Rolls `current` forward `horizon_sec/step_dt` steps of motion-RK4
/// (constant `accel`/`ang_accel` forcing applied every step, env/body
/// ignored — MPC candidates are evaluated in free space) and returns the
/// terminal state plus (if requested) the full roll-out.
fn rollout(
    current: &MotionState,
    accel: Vec3,
    ang_accel: Vec3,
    cfg: &MpcConfig,
    record: bool,
) -> (MotionState, Option<Vec<MotionState>>) {
    let steps = (cfg.horizon_sec / cfg.step_dt).max(1.0).round() as u32;
    let mut state = *current;
    state.linear.acceleration = accel;
    state.angular.angular_acceleration = ang_accel;
    let mut trace = record.then(|| Vec::with_capacity(steps as usize + 1));
    if let Some(t) = trace.as_mut() {
        t.push(state);
    }
    for _ in 0..steps {
        state = crate::integrator::rk4_step(&state, cfg.step_dt);
        state.linear.acceleration = accel;
        state.angular.angular_acceleration = ang_accel;
        state = clamp_speed(state, cfg);
        if let Some(t) = trace.as_mut() {
            t.push(state);
        }
    }
    (state, trace)
}

fn evaluate(
    current: &MotionState,
    target: &MotionState,
    accel: Vec3,
    ang_accel: Vec3,
    cfg: &MpcConfig,
    cost_fn: &CostFn,
) -> (f32, MotionState) {
    let (future, _) = rollout(current, accel, ang_accel, cfg, false);
    (cost_fn(&future, target, cfg), future)
}

/// Basic solver: full `3x3x3 (linear) x 3x3x3 (angular)` = 729-candidate
/// search over `{-max, 0, +max}` per axis.
pub fn solve_basic(
    current: &MotionState,
    target: &MotionState,
    cfg: &MpcConfig,
    cost_fn: &CostFn,
) -> MpcOutput {
    let lin_candidates = [-cfg.max_accel, 0.0, cfg.max_accel];
    let ang_candidates = [-cfg.max_ang_accel, 0.0, cfg.max_ang_accel];
    best_over(current, target, cfg, cost_fn, &lin_candidates, &ang_candidates)
}

fn best_over(
    current: &MotionState,
    target: &MotionState,
    cfg: &MpcConfig,
    cost_fn: &CostFn,
    lin_candidates: &[f32],
    ang_candidates: &[f32],
) -> MpcOutput {
    let mut best: Option<(f32, Vec3, Vec3, MotionState)> = None;
    for &ax in lin_candidates {
        for &ay in lin_candidates {
            for &az in lin_candidates {
                let accel = Vec3::new(ax, ay, az);
                for &gx in ang_candidates {
                    for &gy in ang_candidates {
                        for &gz in ang_candidates {
                            let ang_accel = Vec3::new(gx, gy, gz);
                            let (cost, future) =
                                evaluate(current, target, accel, ang_accel, cfg, cost_fn);
                            let better = match &best {
                                None => true,
                                Some((best_cost, ..)) => cost < *best_cost,
                            };
                            if better {
                                best = Some((cost, accel, ang_accel, future));
                            }
                        }
                    }
                }
            }
        }
    }
    let (cost, accel, ang_accel, future) = best.expect("candidate grids are never empty");
    let trajectory = cfg
        .output_trajectory
        .then(|| rollout(current, accel, ang_accel, cfg, true).1)
        .flatten();
    MpcOutput { desired_accel: accel, desired_ang_accel: ang_accel, future_state: future, cost, trajectory }
}

/// Fast solver: `{0, sign(error)*max}` per axis (`2x2x2 x 2x2x2` = 64
/// candidates), biased toward the direction that reduces each axis's
/// error.
pub fn solve_fast(
    current: &MotionState,
    target: &MotionState,
    cfg: &MpcConfig,
    cost_fn: &CostFn,
) -> MpcOutput {
    let dp = target.linear.position - current.linear.position;
    let lin_candidates = [
        [0.0, if dp.x >= 0.0 { cfg.max_accel } else { -cfg.max_accel }],
        [0.0, if dp.y >= 0.0 { cfg.max_accel } else { -cfg.max_accel }],
        [0.0, if dp.z >= 0.0 { cfg.max_accel } else { -cfg.max_accel }],
    ];
    let ang_candidates = [0.0, cfg.max_ang_accel];

    let mut best: Option<(f32, Vec3, Vec3, MotionState)> = None;
    for &ax in &lin_candidates[0] {
        for &ay in &lin_candidates[1] {
            for &az in &lin_candidates[2] {
                let accel = Vec3::new(ax, ay, az);
                let mut partial_best = best.as_ref().map(|(c, ..)| *c).unwrap_or(f32::MAX);
                for &gx in &ang_candidates {
                    for &gy in &ang_candidates {
                        for &gz in &ang_candidates {
                            let ang_accel = Vec3::new(gx, gy, gz);
                            let (cost, future) =
                                evaluate(current, target, accel, ang_accel, cfg, cost_fn);
                            if cost < partial_best {
                                partial_best = cost;
                                best = Some((cost, accel, ang_accel, future));
                            }
                        }
                    }
                }
            }
        }
    }
    let (cost, accel, ang_accel, future) = best.expect("candidate grids are never empty");
    let trajectory = cfg
        .output_trajectory
        .then(|| rollout(current, accel, ang_accel, cfg, true).1)
        .flatten();
    MpcOutput { desired_accel: accel, desired_ang_accel: ang_accel, future_state: future, cost, trajectory }
}

/// Coarse-to-fine solver: a basic 3x3x3 pass, then a refinement pass of
/// `{-delta, 0, +delta}` (`delta = 0.25*max_accel`) around the coarse
/// best, with angular held fixed at the coarse result.
pub fn solve_coarse_to_fine(
    current: &MotionState,
    target: &MotionState,
    cfg: &MpcConfig,
    cost_fn: &CostFn,
) -> MpcOutput {
    let coarse = solve_basic(current, target, cfg, cost_fn);
    let delta = 0.25 * cfg.max_accel;
    let fine_candidates = [
        coarse.desired_accel.x - delta,
        coarse.desired_accel.x,
        coarse.desired_accel.x + delta,
    ];
    let fine_candidates_y = [
        coarse.desired_accel.y - delta,
        coarse.desired_accel.y,
        coarse.desired_accel.y + delta,
    ];
    let fine_candidates_z = [
        coarse.desired_accel.z - delta,
        coarse.desired_accel.z,
        coarse.desired_accel.z + delta,
    ];

    let mut best = (coarse.cost, coarse.desired_accel, coarse.future_state.clone());
    for &ax in &fine_candidates {
        for &ay in &fine_candidates_y {
            for &az in &fine_candidates_z {
                let accel = Vec3::new(ax, ay, az);
                let (cost, future) =
                    evaluate(current, target, accel, coarse.desired_ang_accel, cfg, cost_fn);
                if cost < best.0 {
                    best = (cost, accel, future);
                }
            }
        }
    }

    let trajectory = cfg
        .output_trajectory
        .then(|| rollout(current, best.1, coarse.desired_ang_accel, cfg, true).1)
        .flatten();
    MpcOutput {
        desired_accel: best.1,
        desired_ang_accel: coarse.desired_ang_accel,
        future_state: best.2,
        cost: best.0,
        trajectory,
    }
}

/// A list of waypoints to visit in order (or cyclically).
#[derive(Clone, Debug)]
pub struct TargetRoute {
    pub points: Vec<Vec3>,
    pub loop_route: bool,
}

/// Picks the nearest remaining waypoint as a single-target `target_state`
/// and delegates to [`solve_basic`].
pub fn solve_route(
    current: &MotionState,
    route: &TargetRoute,
    cfg: &MpcConfig,
    cost_fn: &CostFn,
) -> Option<MpcOutput> {
    let nearest = route
        .points
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = (*a - current.linear.position).length_sq();
            let db = (*b - current.linear.position).length_sq();
            da.partial_cmp(&db).unwrap()
        })?;
    let target = MotionState {
        linear: LinearState::new(nearest, Vec3::zero(), Vec3::zero()),
        angular: AttitudeState::default(),
    };
    Some(solve_basic(current, &target, cfg, cost_fn))
}

/// Direction-keeping target: maintain heading `direction` (and,
/// optionally, `orientation`) for `duration` seconds.
#[derive(Clone, Copy, Debug)]
pub struct DirectionTarget {
    pub direction: Vec3,
    pub orientation: Quat,
    pub weight_dir: f32,
    pub weight_rot: f32,
    pub duration: f32,
}

/// Projects a target position `current_pos + dir*(duration*step_dt*max_speed)`
/// with the given target orientation, then delegates to [`solve_basic`].
pub fn solve_directional(
    current: &MotionState,
    direction_target: &DirectionTarget,
    cfg: &MpcConfig,
    cost_fn: &CostFn,
) -> MpcOutput {
    let dir = direction_target.direction.unit();
    let reach = direction_target.duration * cfg.step_dt * cfg.max_speed;
    let target = MotionState {
        linear: LinearState::new(
            current.linear.position + dir.scale(reach),
            dir.scale(cfg.max_speed),
            Vec3::zero(),
        ),
        angular: AttitudeState::new(direction_target.orientation, Vec3::zero(), Vec3::zero()),
    };
    solve_basic(current, &target, cfg, cost_fn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> MotionState {
        MotionState::default()
    }

    fn target_at(x: f32) -> MotionState {
        MotionState {
            linear: LinearState::new(Vec3::new(x, 0.0, 0.0), Vec3::zero(), Vec3::zero()),
            angular: AttitudeState::default(),
        }
    }

    fn cfg() -> MpcConfig {
        MpcConfig { horizon_sec: 5.0, step_dt: 0.1, max_accel: 5.0, ..Default::default() }
    }

    #[test]
    fn basic_accelerates_toward_positive_target() {
        let out = solve_basic(&origin(), &target_at(10.0), &cfg(), &cost_default);
        assert!(out.desired_accel.x > 0.0);
    }

    #[test]
    fn fast_accelerates_toward_positive_target() {
        let out = solve_fast(&origin(), &target_at(10.0), &cfg(), &cost_default);
        assert!(out.desired_accel.x > 0.0);
    }

    #[test]
    fn basic_and_fast_both_close_distance() {
        let cfg = cfg();
        let basic = solve_basic(&origin(), &target_at(10.0), &cfg, &cost_default);
        let fast = solve_fast(&origin(), &target_at(10.0), &cfg, &cost_default);
        let dist_basic = (basic.future_state.linear.position - target_at(10.0).linear.position).length();
        let dist_fast = (fast.future_state.linear.position - target_at(10.0).linear.position).length();
        assert!(dist_basic < 10.0);
        assert!(dist_fast < 10.0);
    }

    #[test]
    fn coarse_to_fine_is_no_worse_than_basic_within_slack() {
        let cfg = cfg();
        let target = target_at(10.0);
        let basic = solve_basic(&origin(), &target, &cfg, &cost_default);
        let c2f = solve_coarse_to_fine(&origin(), &target, &cfg, &cost_default);
        let dist_basic = (basic.future_state.linear.position - target.linear.position).length();
        let dist_c2f = (c2f.future_state.linear.position - target.linear.position).length();
        assert!(dist_c2f <= dist_basic * 1.01 + 1e-3);
    }

    #[test]
    fn route_picks_nearest_waypoint() {
        let route = TargetRoute { points: vec![Vec3::new(50.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)], loop_route: false };
        let out = solve_route(&origin(), &route, &cfg(), &cost_default).unwrap();
        assert!(out.desired_accel.x >= 0.0);
    }

    #[test]
    fn directional_projects_target_along_direction() {
        let dt = DirectionTarget {
            direction: Vec3::new(1.0, 0.0, 0.0),
            orientation: Quat::identity(),
            weight_dir: 1.0,
            weight_rot: 0.5,
            duration: 10.0,
        };
        let out = solve_directional(&origin(), &dt, &cfg(), &cost_default);
        assert!(out.desired_accel.x > 0.0);
    }

    #[test]
    fn output_trajectory_records_rollout_when_enabled() {
        let cfg = MpcConfig { output_trajectory: true, ..cfg() };
        let out = solve_basic(&origin(), &target_at(10.0), &cfg, &cost_default);
        assert!(out.trajectory.is_some());
        assert!(out.trajectory.unwrap().len() > 1);
    }
}
