//! PID, Bang-Bang, and the closed-set `Controller` dispatch enum.
//! MPC lives in [`crate::mpc`] since its config/output shapes differ
//! from the scalar `(target, measured, dt) -> f32` contract here.

/// Scalar PID controller state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PidConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub integral: f32,
    pub prev_error: f32,
    pub output_limit: f32,
    pub dt: f32,
    pub anti_windup: bool,
}

impl PidConfig {
    pub fn new(kp: f32, ki: f32, kd: f32, dt: f32) -> Self {
        Self { kp, ki, kd, integral: 0.0, prev_error: 0.0, output_limit: 0.0, dt, anti_windup: true }
    }

    /// `kp=0.6`, `ki = kp/(0.5*dt)`, `kd = 0.125*kp*dt`.
    pub fn auto_init(dt: f32) -> Self {
        let kp = 0.6;
        Self::new(kp, kp / (0.5 * dt), 0.125 * kp * dt, dt)
    }

    /// Advances the controller's internal state and returns the control
    /// output, clamped to `[-output_limit, +output_limit]` when
    /// `output_limit > 0`, with optional anti-windup rollback.
    pub fn update(&mut self, target: f32, measured: f32) -> f32 {
        let error = target - measured;
        let integral_candidate = self.integral + error * self.dt;
        let derivative = (error - self.prev_error) / self.dt;
        let raw = self.kp * error + self.ki * integral_candidate + self.kd * derivative;

        let (output, integral) = if self.output_limit > 0.0 {
            let clamped = raw.clamp(-self.output_limit, self.output_limit);
            if clamped != raw && self.anti_windup {
                (clamped, self.integral)
            } else {
                (clamped, integral_candidate)
            }
        } else {
            (raw, integral_candidate)
        };

        self.integral = integral;
        self.prev_error = error;
        output
    }

    /// Same arithmetic as `update` but on a local copy of `integral`;
    /// never mutates `self`.
    pub fn preview(&self, target: f32, measured: f32) -> f32 {
        let mut copy = *self;
        copy.update(target, measured)
    }

    /// Returns accumulators to their post-`init_full` state.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }
}

/// Three independent scalar PIDs, one per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3Pid {
    pub x: PidConfig,
    pub y: PidConfig,
    pub z: PidConfig,
}

impl Vec3Pid {
    pub fn new(kp: f32, ki: f32, kd: f32, dt: f32) -> Self {
        let axis = PidConfig::new(kp, ki, kd, dt);
        Self { x: axis, y: axis, z: axis }
    }

    pub fn update(&mut self, target: byul_core::Vec3, measured: byul_core::Vec3) -> byul_core::Vec3 {
        byul_core::Vec3::new(
            self.x.update(target.x, measured.x),
            self.y.update(target.y, measured.y),
            self.z.update(target.z, measured.z),
        )
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
    }
}

/// Two-state full-positive/full-negative control law. Stateless.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BangBang {
    pub max_output: f32,
}

impl BangBang {
    pub fn new(max_output: f32) -> Self {
        Self { max_output }
    }

    pub fn update(&self, target: f32, measured: f32) -> f32 {
        if measured < target {
            self.max_output
        } else {
            -self.max_output
        }
    }
}

/// Closed set of scalar controller kinds behind the uniform
/// `(target, measured, dt) -> f32` contract. MPC is deliberately not a
/// variant here: its input/output shapes are vector-valued and richer
/// than the scalar interface, so it is driven directly through
/// [`crate::mpc`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Controller {
    Pid(PidConfig),
    BangBang(BangBang),
}

impl Controller {
    pub fn compute(&mut self, target: f32, measured: f32, _dt: f32) -> f32 {
        match self {
            Controller::Pid(pid) => pid.update(target, measured),
            Controller::BangBang(bb) => bb.update(target, measured),
        }
    }

    pub fn reset(&mut self) {
        if let Controller::Pid(pid) = self {
            pid.reset();
        }
    }
}
