//! Shared option and status types (`spec.md` §3, §6, §9 C13).
//!
//! Plain structs with `Default` impls, mirroring the shape of the
//! teacher's `ContinuationSettings` (`continuation/types.rs`) — this is
//! a library, not a service, so there is no file-based configuration
//! format here, just call-time options.

use serde::{Deserialize, Serialize};

/// Options controlling [`crate::core_tracker::CoreTracker`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoreTrackerOptions {
    pub accuracy: f64,
    pub max_corrector_iters: usize,
    pub max_steps: usize,
    pub initial_step_size: f64,
    pub min_step_size: f64,
    pub update_patch: bool,
}

impl Default for CoreTrackerOptions {
    fn default() -> Self {
        Self {
            accuracy: 1e-7,
            max_corrector_iters: 3,
            max_steps: 10_000,
            initial_step_size: 0.1,
            min_step_size: 1e-14,
            update_patch: true,
        }
    }
}

impl CoreTrackerOptions {
    pub fn validate(&self) -> Result<(), crate::error::TrackerError> {
        if self.accuracy <= 0.0 {
            return Err(crate::error::TrackerError::InvalidOptions {
                reason: "accuracy must be positive",
            });
        }
        if self.max_corrector_iters == 0 {
            return Err(crate::error::TrackerError::InvalidOptions {
                reason: "max_corrector_iters must be nonzero",
            });
        }
        if self.max_steps == 0 {
            return Err(crate::error::TrackerError::InvalidOptions {
                reason: "max_steps must be nonzero",
            });
        }
        if self.min_step_size <= 0.0 || self.initial_step_size <= 0.0 {
            return Err(crate::error::TrackerError::InvalidOptions {
                reason: "step sizes must be positive",
            });
        }
        Ok(())
    }
}

/// Options controlling [`crate::path_tracker::PathTracker`].
///
/// `max_step_size_endgame_start` is documented as `1e-6` in `spec.md`
/// §3 and as `1e-8` in the constructor-default bullet of §9's Open
/// Questions — the source disagreement the spec preserves. This
/// implementation picks `1e-6` (the docstring value) since scenarios
/// (S2)/(S3) are explicitly insensitive to the choice; see `DESIGN.md`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PathTrackerOptions {
    pub at_infinity_check: bool,
    pub max_step_size_endgame_start: f64,
    pub min_val_accuracy: f64,
    pub samples_per_loop: usize,
    pub max_winding_number: usize,
    pub max_affine_norm: f64,
}

impl Default for PathTrackerOptions {
    fn default() -> Self {
        Self {
            at_infinity_check: true,
            max_step_size_endgame_start: 1e-6,
            min_val_accuracy: 1e-3,
            samples_per_loop: 5,
            max_winding_number: 12,
            max_affine_norm: 1e6,
        }
    }
}

/// Status of a [`crate::core_tracker::CoreTracker`] (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreStatus {
    Tracking,
    Success,
    TerminatedInvalidStartValue,
    TerminatedMaxIters,
    TerminatedStepSizeTooSmall,
    TerminatedSingularity,
    TerminatedIllConditioned,
}

impl CoreStatus {
    pub fn is_tracking(&self) -> bool {
        matches!(self, CoreStatus::Tracking)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CoreStatus::Success)
    }
}

/// Status of a [`crate::path_tracker::PathTracker`] — a superset of
/// [`CoreStatus`] plus `AtInfinity` and `TrackerFailed` (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStatus {
    Tracking,
    Success,
    AtInfinity,
    TerminatedInvalidStartValue,
    TerminatedMaxIters,
    TerminatedStepSizeTooSmall,
    TerminatedSingularity,
    TerminatedIllConditioned,
    TrackerFailed,
}

/// Total function mapping a terminal [`CoreStatus`] to a [`PathStatus`]
/// (`spec.md` §4.8 step 2, §9 "Status enums: two closed sum types … a
/// total function maps core → path"). Panics if passed
/// `CoreStatus::Tracking`, which is never terminal.
pub fn core_status_to_path_status(status: CoreStatus) -> PathStatus {
    match status {
        CoreStatus::Tracking => panic!("core_status_to_path_status called on a non-terminal status"),
        CoreStatus::Success => PathStatus::Success,
        CoreStatus::TerminatedInvalidStartValue => PathStatus::TerminatedInvalidStartValue,
        CoreStatus::TerminatedMaxIters => PathStatus::TerminatedMaxIters,
        CoreStatus::TerminatedStepSizeTooSmall => PathStatus::TerminatedStepSizeTooSmall,
        CoreStatus::TerminatedSingularity => PathStatus::TerminatedSingularity,
        CoreStatus::TerminatedIllConditioned => PathStatus::TerminatedIllConditioned,
    }
}
