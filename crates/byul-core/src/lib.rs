//! Core math, motion data model, and environment types shared by the
//! rest of the byul engine: `Vec3`/`Quat` algebra, `BodyProps`,
//! `Environ`, the linear/angular `MotionState`, `Trajectory`, and the
//! error taxonomy surfaced by higher-level APIs.
#![cfg_attr(not(test), warn(missing_docs))]
#![forbid(unsafe_code)]

pub mod body_props;
pub mod environ;
pub mod error;
pub mod motion_state;
pub mod quat;
pub mod trajectory;
pub mod vec3;

pub use body_props::BodyProps;
pub use environ::{Environ, EnvironFn, EnvironPeriodic};
pub use error::ByulError;
pub use motion_state::{AttitudeState, LinearState, MotionState};
pub use quat::{EulerOrder, Quat};
pub use trajectory::{Trajectory, TrajectorySample};
pub use vec3::Vec3;
