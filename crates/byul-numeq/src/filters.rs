//! Kalman filters (scalar and 3D constant-velocity) behind a uniform
//! `FilterInterface`.

use byul_core::Vec3;

/// Uniform filter contract: `time_update` advances the process model by
/// `dt` with no measurement; `measurement_update` fuses an observation;
/// `state` reads the current fused estimate. All synchronous, no
/// allocation.
pub trait FilterInterface {
    type State;
    type Measurement;

    fn time_update(&mut self, dt: f32);
    fn measurement_update(&mut self, z: Self::Measurement);
    fn state(&self) -> Self::State;
}

/// Scalar constant-velocity Kalman filter with identity observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KalmanFilter {
    pub x: f32,
    pub p: f32,
    pub q: f32,
    pub r: f32,
    pub k: f32,
}

impl KalmanFilter {
    pub fn new(x0: f32, p0: f32, q: f32, r: f32) -> Self {
        Self { x: x0, p: p0, q, r, k: 0.0 }
    }

    /// Resets accumulators to a fresh `(x0, p0)` pair, matching the
    /// post-`init_full` state.
    pub fn reset(&mut self, x0: f32, p0: f32) {
        self.x = x0;
        self.p = p0;
        self.k = 0.0;
    }
}

impl FilterInterface for KalmanFilter {
    type State = f32;
    type Measurement = f32;

    fn time_update(&mut self, _dt: f32) {
        self.p += self.q;
    }

    fn measurement_update(&mut self, z: f32) {
        self.k = self.p / (self.p + self.r);
        self.x += self.k * (z - self.x);
        self.p = (1.0 - self.k) * self.p;
    }

    fn state(&self) -> f32 {
        self.x
    }
}

/// 3D constant-velocity Kalman filter: position is the observed state,
/// velocity is reconstructed from consecutive position estimates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KalmanFilterVec3 {
    pub position: Vec3,
    pub velocity: Vec3,
    pub error_p: Vec3,
    pub q: f32,
    pub r: f32,
    dt: f32,
}

impl KalmanFilterVec3 {
    pub fn new(position: Vec3, velocity: Vec3, q: f32, r: f32, dt: f32) -> Self {
        Self { position, velocity, error_p: Vec3::zero(), q, r, dt }
    }

    pub fn reset(&mut self, position: Vec3, velocity: Vec3) {
        self.position = position;
        self.velocity = velocity;
        self.error_p = Vec3::zero();
    }

    /// Project the current estimate forward by `dt_future` with no
    /// further measurement fusion.
    pub fn project(&self, dt_future: f32) -> Vec3 {
        self.position + self.velocity.scale(dt_future)
    }
}

impl FilterInterface for KalmanFilterVec3 {
    type State = (Vec3, Vec3);
    type Measurement = Vec3;

    fn time_update(&mut self, dt: f32) {
        self.position += self.velocity.scale(dt);
        self.error_p += Vec3::new(self.q, self.q, self.q);
    }

    fn measurement_update(&mut self, z_pos: Vec3) {
        let old_position = self.position;
        let k = Vec3::new(
            self.error_p.x / (self.error_p.x + self.r),
            self.error_p.y / (self.error_p.y + self.r),
            self.error_p.z / (self.error_p.z + self.r),
        );
        self.position = Vec3::new(
            self.position.x + k.x * (z_pos.x - self.position.x),
            self.position.y + k.y * (z_pos.y - self.position.y),
            self.position.z + k.z * (z_pos.z - self.position.z),
        );
        if self.dt.abs() > 1e-9 {
            self.velocity = (self.position - old_position).scale(1.0 / self.dt);
        }
        self.error_p = Vec3::new(
            (1.0 - k.x) * self.error_p.x,
            (1.0 - k.y) * self.error_p.y,
            (1.0 - k.z) * self.error_p.z,
        );
    }

    fn state(&self) -> (Vec3, Vec3) {
        (self.position, self.velocity)
    }
}
