//! The step controller (C4, `spec.md` §4.4).
//!
//! Maintains a target Newton contraction rate `ω*` and adapts `Δs`
//! after each predictor-corrector attempt: grow on acceptance (scaled
//! by how far `ω` came in under target), shrink by a fixed factor on
//! rejection. The shrink factor and acceptance policy are grounded
//! directly on the teacher's `continue_with_problem` step loop
//! (`step_size *= 1.2` on success / `*= 0.5` on failure /
//! `MAX_CONSECUTIVE_FAILURES`), generalized into an explicit type since
//! `spec.md` requires step control to be queryable independent of the
//! outer tracking loop (`CoreTracker::step!` calls it once per attempt).
//!
//! `Δs` here is a nonnegative real *magnitude* along whatever direction
//! the caller is tracking in `t`; [`crate::core_tracker::CoreTracker`]
//! holds the (possibly complex, unit-length) direction separately and
//! multiplies it in, since the Cauchy endgame (`spec.md` §4.7) tracks
//! along complex polygon edges while the main path tracks along the
//! real axis.

/// Target Newton contraction rate. Steps that converge well under this
/// rate grow the step size; steps near or above it shrink it on the
/// next rejection.
pub const OMEGA_TARGET: f64 = 0.25;

/// Step-size shrink factor on a rejected step (`spec.md` §4.4: "shrink
/// Δs (e.g. ×0.25)").
pub const STEP_DECREASE_FACTOR: f64 = 0.25;

/// Maximum step-size growth factor on an accepted step.
pub const MAX_STEP_INCREASE_FACTOR: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Accepted,
    /// Rejected; `Δs` has already been shrunk. `terminal` is set once
    /// the shrunk `Δs` falls below `min_step_size`.
    Rejected { terminal: bool },
}

/// Adaptive step-size controller. Holds the nonnegative magnitude `Δs`
/// and `Δs_prev`, plus the minimum step-size floor.
#[derive(Debug, Clone, Copy)]
pub struct StepController {
    pub step_size: f64,
    pub step_size_prev: f64,
    min_step_size: f64,
}

impl StepController {
    pub fn new(initial_step_size: f64, min_step_size: f64) -> Self {
        let initial_step_size = initial_step_size.abs();
        Self {
            step_size: initial_step_size,
            step_size_prev: initial_step_size,
            min_step_size,
        }
    }

    /// `f_up(ω/ω*)`: grows `Δs` in proportion to how far the observed
    /// contraction rate came in under target, clamped to avoid wild
    /// jumps.
    pub fn accept(&mut self, omega: f64) {
        self.step_size_prev = self.step_size;
        let omega = omega.max(1e-14);
        let growth = (OMEGA_TARGET / omega).sqrt().clamp(1.0, MAX_STEP_INCREASE_FACTOR);
        self.step_size *= growth;
    }

    /// Shrinks `Δs` by [`STEP_DECREASE_FACTOR`]. Returns whether the
    /// shrunk step size fell below `min_step_size` (terminal
    /// condition, `spec.md` §4.4 / §7 "Step collapse").
    pub fn reject(&mut self) -> StepOutcome {
        self.step_size_prev = self.step_size;
        self.step_size *= STEP_DECREASE_FACTOR;
        StepOutcome::Rejected {
            terminal: self.step_size < self.min_step_size,
        }
    }

    /// Clamps `Δs` to `remaining` (a nonnegative distance-to-go along
    /// the tracking direction) if it would otherwise overshoot.
    pub fn clamp_to_remaining(&mut self, remaining: f64) {
        let remaining = remaining.abs();
        if remaining < self.step_size {
            self.step_size = remaining;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_grows_step_when_contraction_is_tight() {
        let mut sc = StepController::new(0.1, 1e-14);
        sc.accept(OMEGA_TARGET / 4.0);
        assert!(sc.step_size > 0.1);
    }

    #[test]
    fn reject_shrinks_and_flags_terminal_below_floor() {
        let mut sc = StepController::new(1e-13, 1e-14);
        let outcome = sc.reject();
        assert!(matches!(outcome, StepOutcome::Rejected { terminal: false }));
        let outcome2 = sc.reject();
        assert!(matches!(outcome2, StepOutcome::Rejected { terminal: true }));
    }

    #[test]
    fn clamp_to_remaining_prevents_overshoot() {
        let mut sc = StepController::new(0.5, 1e-14);
        sc.clamp_to_remaining(0.2);
        assert!((sc.step_size - 0.2).abs() < 1e-12);
    }
}
