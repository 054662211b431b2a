//! Error taxonomy for the byul engine.
//!
//! Most low-level math and small-struct APIs signal failure with a `bool`,
//! a sentinel (`NaN`, zero vector, `-1` time) or an `Option`/`Result`-free
//! return, exactly as the source library does. `ByulError` exists for the
//! smaller surface of operations where the caller genuinely needs to tell
//! "refused to run" (a programmer error) apart from "ran, found nothing"
//! (a normal degenerate outcome).

use thiserror::Error;

/// Error kinds surfaced by the engine's higher-level APIs.
///
/// A fifth kind from the source taxonomy, "degenerate" (zero-length
/// direction, zero relative velocity for CCD), never reaches this enum:
/// those cases return a zero vector or `false` rather than erroring.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ByulError {
    /// A required value was missing, zero, or out of its valid domain
    /// (e.g. non-positive `dt`, non-positive `mass`, zero capacity).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A fixed-capacity buffer could not accept another element.
    #[error("exhausted: {0}")]
    Exhausted(String),

    /// A root finder found no real solution in the admissible domain.
    #[error("unsolvable: {0}")]
    Unsolvable(String),

    /// The caller asked for a kernel/variant without the state it requires
    /// (e.g. Verlet without `prev_state`, RK4-env without `env`/`body`).
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),
}
