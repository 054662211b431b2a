//! Simulation environment: gravity, wind, atmosphere, and the pluggable
//! external-acceleration hook consumed by the force model in `byul-numeq`.

use crate::vec3::Vec3;

/// External-acceleration producer. Mirrors the boxed-closure convention
/// used for drag models: an open set of environment behaviors behind one
/// trait-object shaped callback, rather than an exhaustive enum.
///
/// Must be pure with respect to the `Environ` it is called with; any
/// state the function needs across calls belongs in a caller-owned
/// side-channel such as [`EnvironPeriodic`], not in `Environ` itself.
pub type EnvironFn = dyn Fn(&Environ) -> Vec3 + Send + Sync;

/// Simulation environment: gravity, wind, and atmospheric advisories.
pub struct Environ {
    pub gravity: Vec3,
    pub wind_vel: Vec3,
    pub air_density: f32,
    pub humidity: f32,
    pub temperature: f32,
    pub pressure: f32,
    environ_fn: Option<Box<EnvironFn>>,
}

impl Clone for Environ {
    /// `environ_fn` is a trait object and cannot be cloned as-is; the
    /// clone falls back to the `gravity_only`/`gravity_wind`/`periodic`
    /// behavior (`|env| env.gravity`), which matches every built-in. A
    /// custom `with_fn` hook loses its closure on clone — ticker
    /// duplication documents this as the deep-copy contract for
    /// `Environ`.
    fn clone(&self) -> Self {
        Self {
            gravity: self.gravity,
            wind_vel: self.wind_vel,
            air_density: self.air_density,
            humidity: self.humidity,
            temperature: self.temperature,
            pressure: self.pressure,
            environ_fn: Some(Box::new(|env: &Environ| env.gravity)),
        }
    }
}

impl Default for Environ {
    fn default() -> Self {
        Self::gravity_only()
    }
}

impl Environ {
    /// No gravity, no wind, no external acceleration.
    pub fn none() -> Self {
        Self {
            gravity: Vec3::zero(),
            wind_vel: Vec3::zero(),
            air_density: 1.225,
            humidity: 50.0,
            temperature: 20.0,
            pressure: 101_325.0,
            environ_fn: Some(Box::new(|_env: &Environ| Vec3::zero())),
        }
    }

    /// Standard gravity, no wind.
    pub fn gravity_only() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            wind_vel: Vec3::zero(),
            air_density: 1.225,
            humidity: 50.0,
            temperature: 20.0,
            pressure: 101_325.0,
            environ_fn: Some(Box::new(|env: &Environ| env.gravity)),
        }
    }

    /// Standard gravity plus a fixed wind velocity (wind affects drag via
    /// the force model's relative-velocity term, not via `environ_fn`
    /// directly; `environ_fn` here returns gravity alone).
    pub fn gravity_wind(wind_vel: Vec3) -> Self {
        Self {
            wind_vel,
            environ_fn: Some(Box::new(|env: &Environ| env.gravity)),
            ..Self::gravity_only()
        }
    }

    /// Standard gravity plus a wind velocity meant to be driven by an
    /// [`EnvironPeriodic`] owned alongside this `Environ` (the caller
    /// ticks it each step and writes the result back into `wind_vel`;
    /// `environ_fn` itself stays pure and returns gravity alone, same as
    /// `gravity_wind`).
    pub fn periodic(base_wind: Vec3) -> Self {
        Self::gravity_wind(base_wind)
    }

    /// Gravity plus a caller-supplied external acceleration hook.
    pub fn with_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Environ) -> Vec3 + Send + Sync + 'static,
    {
        self.environ_fn = Some(Box::new(f));
        self
    }

    /// Evaluate the current `environ_fn`, or zero if none is set.
    pub fn external_accel(&self) -> Vec3 {
        match &self.environ_fn {
            Some(f) => f(self),
            None => Vec3::zero(),
        }
    }

    /// Applies the environment's distortion model to `accel` as-is,
    /// without separating gravity. Idempotent on zero input.
    pub fn distort_accel(&self, accel: Vec3) -> Vec3 {
        if accel == Vec3::zero() {
            return Vec3::zero();
        }
        accel.scale(self.distortion_scale())
    }

    /// Splits gravity out (when `include_gravity`), distorts only the
    /// external remainder, then re-adds gravity. When `!include_gravity`,
    /// `accel` is treated as external-only and the distorted external
    /// term is returned with no gravity added. Idempotent on zero input.
    pub fn distort_accel_except_gravity(&self, include_gravity: bool, accel: Vec3) -> Vec3 {
        if accel == Vec3::zero() {
            return Vec3::zero();
        }
        if include_gravity {
            let ext = accel - self.gravity;
            ext.scale(self.distortion_scale()) + self.gravity
        } else {
            accel.scale(self.distortion_scale())
        }
    }

    /// Scalar attenuation derived from density/humidity/temperature/pressure
    /// relative to the standard defaults (1.225 kg/m^3, 50%, 20C, 101325 Pa).
    fn distortion_scale(&self) -> f32 {
        let density = self.air_density / 1.225;
        let humidity = 1.0 - (self.humidity - 50.0) * 0.0005;
        let temperature = 1.0 - (self.temperature - 20.0) * 0.001;
        let pressure = self.pressure / 101_325.0;
        density * humidity * temperature * pressure
    }
}

/// Periodic wind state carried alongside an [`Environ`] using the
/// `periodic` built-in; owns the mutable state `environ_fn` itself must
/// stay free of.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvironPeriodic {
    pub base_wind: Vec3,
    pub gust_amplitude: Vec3,
    pub gust_frequency: f32,
    pub elapsed: f32,
}

impl Default for EnvironPeriodic {
    fn default() -> Self {
        Self {
            base_wind: Vec3::zero(),
            gust_amplitude: Vec3::zero(),
            gust_frequency: 0.0,
            elapsed: 0.0,
        }
    }
}

impl EnvironPeriodic {
    pub fn new(base_wind: Vec3, gust_amplitude: Vec3, gust_frequency: f32) -> Self {
        Self { base_wind, gust_amplitude, gust_frequency, ..Default::default() }
    }

    /// Advances `elapsed` by `dt` and returns the wind velocity at the
    /// new time: `base_wind + gust_amplitude * sin(2*pi*freq*elapsed)`.
    pub fn tick(&mut self, dt: f32) -> Vec3 {
        self.elapsed += dt;
        self.wind_at(self.elapsed)
    }

    fn wind_at(&self, t: f32) -> Vec3 {
        let phase = (2.0 * core::f32::consts::PI * self.gust_frequency * t).sin();
        self.base_wind + self.gust_amplitude.scale(phase)
    }
}
