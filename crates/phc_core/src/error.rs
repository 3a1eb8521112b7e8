//! Programming-invariant violations.
//!
//! These are distinct from the numerical failure modes of the tracker
//! (those are captured in [`crate::types::CoreStatus`] and
//! [`crate::types::PathStatus`] — numerical trouble is never an `Err`).
//! A [`TrackerError`] means the core itself was misused or has a bug:
//! a dimension mismatch supplied by a collaborator, a patch fixed twice,
//! or similar. Implementations may choose to treat these as fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("projective patch is already fixed")]
    PatchAlreadyFixed,

    #[error("projective patch was not fixed before this operation")]
    PatchNotFixed,

    #[error("bordered linear system is singular; cannot compute tangent")]
    SingularBorderedSystem,

    #[error("invalid tracker options: {reason}")]
    InvalidOptions { reason: &'static str },
}
