//! Single-step integration kernels and the stateful `Integrator` stepper
//! object that wraps them.

use byul_core::{AttitudeState, BodyProps, ByulError, Environ, LinearState, MotionState, Quat};

use crate::model::model_accel;

/// Closed set of integration strategies. Euler/SemiImplicit/Verlet
/// ignore `env`/`body`; RK4-env uses them to recompute acceleration at
/// every stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegratorKind {
    Euler,
    SemiImplicit,
    Verlet,
    Rk4,
    Rk4Env,
}

/// Per-instance integrator configuration.
#[derive(Clone, Copy, Debug)]
pub struct IntegratorConfig {
    pub kind: IntegratorKind,
    pub dt: f32,
}

impl IntegratorConfig {
    pub fn new(kind: IntegratorKind, dt: f32) -> Self {
        Self { kind, dt }
    }
}

/// Stateful stepper: holds the kernel selection, the current state, the
/// previous state (required by Verlet), and optional env/body (required
/// by `Rk4Env`).
#[derive(Clone)]
pub struct Integrator {
    pub config: IntegratorConfig,
    pub state: MotionState,
    pub prev_state: Option<MotionState>,
}

impl Integrator {
    pub fn new(config: IntegratorConfig, state: MotionState) -> Self {
        Self { config, state, prev_state: None }
    }

    /// Advances `self.state` by `dt`, dispatching on `self.config.kind`.
    /// `env`/`body` are only consulted by `Rk4Env`.
    pub fn step(
        &mut self,
        dt: f32,
        env: Option<&Environ>,
        body: Option<&BodyProps>,
    ) -> Result<(), ByulError> {
        let next = match self.config.kind {
            IntegratorKind::Euler => euler_step(&self.state, dt),
            IntegratorKind::SemiImplicit => semi_implicit_step(&self.state, dt),
            IntegratorKind::Verlet => {
                let prev = self.prev_state.ok_or_else(|| {
                    ByulError::PreconditionViolated(
                        "Verlet integration requires prev_state".into(),
                    )
                })?;
                verlet_step(&self.state, &prev, dt)
            }
            IntegratorKind::Rk4 => rk4_step(&self.state, dt),
            IntegratorKind::Rk4Env => {
                let (env, body) = env.zip(body).ok_or_else(|| {
                    ByulError::PreconditionViolated(
                        "RK4-env integration requires env and body".into(),
                    )
                })?;
                rk4_env_motion_step(&self.state, Some(env), body, dt)
            }
        };
        self.prev_state = Some(self.state);
        self.state = next;
        Ok(())
    }
}

fn exp_omega(omega: byul_core::Vec3, dt: f32) -> Quat {
    Quat::from_angular_velocity(omega, dt)
}

fn step_angular_euler(a: &AttitudeState, dt: f32) -> AttitudeState {
    let omega_next = a.angular_velocity + a.angular_acceleration.scale(dt);
    let orientation = a.orientation.mul(exp_omega(omega_next, dt)).normalize();
    AttitudeState { orientation, angular_velocity: omega_next, angular_acceleration: a.angular_acceleration }
}

pub fn euler_step(state: &MotionState, dt: f32) -> MotionState {
    let l = &state.linear;
    let velocity = l.velocity + l.acceleration.scale(dt);
    let position = l.position + l.velocity.scale(dt);
    let linear = LinearState::new(position, velocity, l.acceleration);
    MotionState { linear, angular: step_angular_euler(&state.angular, dt) }
}

pub fn semi_implicit_step(state: &MotionState, dt: f32) -> MotionState {
    let l = &state.linear;
    let velocity = l.velocity + l.acceleration.scale(dt);
    let position = l.position + velocity.scale(dt);
    let linear = LinearState::new(position, velocity, l.acceleration);
    MotionState { linear, angular: step_angular_euler(&state.angular, dt) }
}

pub fn verlet_step(state: &MotionState, prev: &MotionState, dt: f32) -> MotionState {
    let l = &state.linear;
    let position = l.position.scale(2.0) - prev.linear.position + l.acceleration.scale(dt * dt);
    let velocity = (position - prev.linear.position).scale(1.0 / (2.0 * dt));
    let linear = LinearState::new(position, velocity, l.acceleration);

    let a = &state.angular;
    let prev_a = &prev.angular;
    let omega = a.angular_velocity + a.angular_acceleration.scale(dt);
    let orientation = prev_a
        .orientation
        .mul(exp_omega(omega, 2.0 * dt))
        .normalize();
    let angular = AttitudeState { orientation, angular_velocity: omega, angular_acceleration: a.angular_acceleration };
    MotionState { linear, angular }
}

pub fn rk4_step(state: &MotionState, dt: f32) -> MotionState {
    // Constant acceleration within the step: RK4 on a linear ODE with
    // constant forcing reduces to the closed form, which is what the
    // four-stage evaluation below converges to exactly.
    let l = &state.linear;
    let a = l.acceleration;
    let k1v = a;
    let k1p = l.velocity;
    let k2v = a;
    let k2p = l.velocity + k1v.scale(dt / 2.0);
    let k3v = a;
    let k3p = l.velocity + k2v.scale(dt / 2.0);
    let k4v = a;
    let k4p = l.velocity + k3v.scale(dt);

    let velocity = l.velocity + (k1v + k2v.scale(2.0) + k3v.scale(2.0) + k4v).scale(dt / 6.0);
    let position = l.position + (k1p + k2p.scale(2.0) + k3p.scale(2.0) + k4p).scale(dt / 6.0);
    let linear = LinearState::new(position, velocity, a);

    let ang = &state.angular;
    let alpha = ang.angular_acceleration;
    let omega = ang.angular_velocity + alpha.scale(dt);
    let orientation = ang.orientation.mul(exp_omega(omega, dt)).normalize();
    let angular = AttitudeState { orientation, angular_velocity: omega, angular_acceleration: alpha };

    MotionState { linear, angular }
}

/// RK4 over `LinearState` alone, recomputing acceleration from
/// `model_accel` at every stage rather than freezing it at stage entry.
pub fn rk4_env_step(
    state: &LinearState,
    env: Option<&Environ>,
    body: &BodyProps,
    dt: f32,
) -> LinearState {
    let eval = |s: &LinearState| model_accel(s, env, body);

    let k1v = eval(state);
    let k1p = state.velocity;

    let s2 = LinearState::new(
        state.position + k1p.scale(dt / 2.0),
        state.velocity + k1v.scale(dt / 2.0),
        state.acceleration,
    );
    let k2v = eval(&s2);
    let k2p = s2.velocity;

    let s3 = LinearState::new(
        state.position + k2p.scale(dt / 2.0),
        state.velocity + k2v.scale(dt / 2.0),
        state.acceleration,
    );
    let k3v = eval(&s3);
    let k3p = s3.velocity;

    let s4 = LinearState::new(
        state.position + k3p.scale(dt),
        state.velocity + k3v.scale(dt),
        state.acceleration,
    );
    let k4v = eval(&s4);
    let k4p = s4.velocity;

    let velocity = state.velocity + (k1v + k2v.scale(2.0) + k3v.scale(2.0) + k4v).scale(dt / 6.0);
    let position = state.position + (k1p + k2p.scale(2.0) + k3p.scale(2.0) + k4p).scale(dt / 6.0);
    let a_final = eval(&LinearState::new(position, velocity, state.acceleration));
    LinearState::new(position, velocity, a_final)
}

fn rk4_env_motion_step(
    state: &MotionState,
    env: Option<&Environ>,
    body: &BodyProps,
    dt: f32,
) -> MotionState {
    let linear = rk4_env_step(&state.linear, env, body, dt);
    MotionState { linear, angular: rk4_step(state, dt).angular }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byul_core::Vec3;

    fn falling_state() -> MotionState {
        let linear = LinearState::new(Vec3::zero(), Vec3::zero(), Vec3::new(0.0, -9.81, 0.0));
        MotionState { linear, angular: AttitudeState::default() }
    }

    #[test]
    fn euler_matches_simple_kinematics_first_order() {
        let s = euler_step(&falling_state(), 1.0);
        assert!((s.linear.velocity.y - (-9.81)).abs() < 1e-4);
        assert_eq!(s.linear.position.y, 0.0);
    }

    #[test]
    fn semi_implicit_uses_updated_velocity_for_position() {
        let s = semi_implicit_step(&falling_state(), 1.0);
        assert!((s.linear.position.y - (-9.81)).abs() < 1e-4);
    }

    #[test]
    fn rk4_matches_exact_constant_acceleration_solution() {
        let s = rk4_step(&falling_state(), 1.0);
        assert!((s.linear.position.y - (-4.905)).abs() < 1e-3);
        assert!((s.linear.velocity.y - (-9.81)).abs() < 1e-3);
    }

    #[test]
    fn verlet_requires_prev_state() {
        let mut intgr = Integrator::new(
            IntegratorConfig::new(IntegratorKind::Verlet, 0.1),
            falling_state(),
        );
        let result = intgr.step(0.1, None, None);
        assert!(matches!(result, Err(ByulError::PreconditionViolated(_))));
    }

    #[test]
    fn rk4_env_requires_env_and_body() {
        let mut intgr = Integrator::new(
            IntegratorConfig::new(IntegratorKind::Rk4Env, 0.1),
            falling_state(),
        );
        let result = intgr.step(0.1, None, None);
        assert!(matches!(result, Err(ByulError::PreconditionViolated(_))));
    }

    #[test]
    fn orientation_stays_unit_after_steps() {
        let mut intgr = Integrator::new(
            IntegratorConfig::new(IntegratorKind::Rk4, 0.05),
            MotionState {
                linear: falling_state().linear,
                angular: AttitudeState {
                    orientation: Quat::identity(),
                    angular_velocity: Vec3::new(1.0, 0.3, 0.0),
                    angular_acceleration: Vec3::zero(),
                },
            },
        );
        for _ in 0..20 {
            intgr.step(0.05, None, None).unwrap();
        }
        assert!((intgr.state.angular.orientation.length() - 1.0).abs() < 1e-4);
    }
}
