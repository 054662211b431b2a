//! Numerical kernels for the byul engine: root solvers, the force model,
//! integration kernels, Kalman filters, and PID/Bang-Bang/MPC
//! controllers. Builds on [`byul_core`]'s data model; guidance and
//! propulsion (which need [`byul_core`]'s `Environ` *and* an entity
//! concept) live one layer up, in `byul-dynamics`.
#![cfg_attr(not(test), warn(missing_docs))]
#![forbid(unsafe_code)]

pub mod controller;
pub mod filters;
pub mod integrator;
pub mod model;
pub mod mpc;
pub mod solver;

pub use controller::{BangBang, Controller, PidConfig, Vec3Pid};
pub use filters::{FilterInterface, KalmanFilter, KalmanFilterVec3};
pub use integrator::{Integrator, IntegratorConfig, IntegratorKind};
pub use mpc::{MpcConfig, MpcOutput};
