//! The core tracker (C5, `spec.md` §4.5).
//!
//! Orchestrates predictor (C2), corrector (C3), and step controller
//! (C4) between two `t`-values in the complex plane. Exposes
//! `setup!`/`step!`/`track!` as the spec requires (rather than the
//! teacher's single monolithic `continue_with_problem` loop) because
//! [`crate::path_tracker::PathTracker`] needs to drive one step at a
//! time, inspecting diagnostics between steps, and because the Cauchy
//! endgame (`spec.md` §4.7) reuses this same tracker to walk a polygon
//! in the complex `t`-plane rather than the real segment `[0, 1]`.
//!
//! `t_from`/`t_to` may be any two complex values: the main path always
//! passes real-valued ones (`t_to < t_from` on the real axis), while
//! the endgame passes consecutive roots-of-unity-scaled vertices. The
//! step controller (C4) tracks only the nonnegative *magnitude*
//! `|t_to - t_from|`; this tracker fixes the unit `direction` once per
//! `setup!` call and reconstructs complex `Δt = direction * Δs`.

use log::{debug, trace};
use nalgebra::DVector;
use num_complex::Complex64;

use crate::corrector::{Corrector, CorrectorStatus};
use crate::error::TrackerError;
use crate::homotopy::Homotopy;
use crate::linalg;
use crate::predictor::Predictor;
use crate::step_control::StepController;
use crate::types::{CoreStatus, CoreTrackerOptions};

/// How large `‖H(x0, t1)‖` may be, relative to `accuracy`, before the
/// starting value is rejected as invalid (`spec.md` §4.5).
const INVALID_START_RESIDUAL_FACTOR: f64 = 1e3;

/// Consecutive singular-Jacobian predictor failures before the path is
/// declared terminally singular (`spec.md` §4.2, §7: "only terminal if
/// it persists").
const MAX_CONSECUTIVE_SINGULAR_PREDICTOR: usize = 5;

/// Mutable per-path state (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct CoreTrackerState {
    pub x: DVector<Complex64>,
    pub t: Complex64,
    pub x_prev: DVector<Complex64>,
    pub t_prev: Complex64,
    pub x_dot: DVector<Complex64>,

    pub step_size: f64,
    pub step_size_prev: f64,

    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub last_step_failed: bool,

    pub omega: f64,
    pub digits_lost: f64,
    pub accuracy_achieved: f64,

    pub status: CoreStatus,
}

impl CoreTrackerState {
    fn new(dim: usize) -> Self {
        Self {
            x: DVector::zeros(dim),
            t: Complex64::new(1.0, 0.0),
            x_prev: DVector::zeros(dim),
            t_prev: Complex64::new(1.0, 0.0),
            x_dot: DVector::zeros(dim),
            step_size: 0.0,
            step_size_prev: 0.0,
            accepted_steps: 0,
            rejected_steps: 0,
            last_step_failed: false,
            omega: 0.0,
            digits_lost: 0.0,
            accuracy_achieved: 0.0,
            status: CoreStatus::Tracking,
        }
    }
}

/// Orchestrates the predictor-corrector stepper between two `t`-values
/// for a fixed homotopy topology. A `CoreTracker` is created once per
/// homotopy and reused across many start solutions via repeated
/// `setup!`/`track!` calls.
pub struct CoreTracker<'h> {
    homotopy: &'h dyn Homotopy,
    pub options: CoreTrackerOptions,
    pub state: CoreTrackerState,
    step_controller: StepController,
    t_target: Complex64,
    /// Unit vector along which `t` moves this call, fixed at `setup!`.
    direction: Complex64,
    consecutive_singular_predictor: usize,
    /// Set while the projective patch is held fixed by a caller (the
    /// Cauchy endgame, `spec.md` §4.7/§9). `fix_patch`/`unfix_patch`
    /// are the scoped-acquisition pair guarding this.
    patch_fixed: bool,
}

impl<'h> CoreTracker<'h> {
    pub fn new(homotopy: &'h dyn Homotopy, options: CoreTrackerOptions) -> Self {
        let dim = homotopy.dimension();
        let step_controller = StepController::new(options.initial_step_size, options.min_step_size);
        Self {
            homotopy,
            options,
            state: CoreTrackerState::new(dim),
            step_controller,
            t_target: Complex64::new(0.0, 0.0),
            direction: Complex64::new(1.0, 0.0),
            consecutive_singular_predictor: 0,
            patch_fixed: false,
        }
    }

    /// Holds the projective patch fixed (disables `update_patch` for
    /// the duration of the Cauchy loop). Returns
    /// [`TrackerError::PatchAlreadyFixed`] if called while already
    /// fixed — a programming-invariant violation (`spec.md` §7, §9).
    pub fn fix_patch(&mut self) -> Result<bool, TrackerError> {
        if self.patch_fixed {
            return Err(TrackerError::PatchAlreadyFixed);
        }
        let previous = self.options.update_patch;
        self.options.update_patch = false;
        self.patch_fixed = true;
        Ok(previous)
    }

    /// Restores `update_patch` to `previous` (as returned by
    /// [`Self::fix_patch`]). Returns [`TrackerError::PatchNotFixed`] if
    /// the patch was not currently fixed.
    pub fn unfix_patch(&mut self, previous: bool) -> Result<(), TrackerError> {
        if !self.patch_fixed {
            return Err(TrackerError::PatchNotFixed);
        }
        self.options.update_patch = previous;
        self.patch_fixed = false;
        Ok(())
    }

    /// Resets tracker state and prepares to track from `(x0, t_from)`
    /// toward `t_to`. Validates the starting residual (`spec.md`
    /// §4.5). `t_from`/`t_to` may be complex — the main path passes
    /// real values, the Cauchy endgame passes polygon vertices.
    pub fn setup(&mut self, x0: &DVector<Complex64>, t_from: Complex64, t_to: Complex64) {
        let dim = self.homotopy.dimension();
        self.state = CoreTrackerState::new(dim);
        self.state.x = x0.clone();
        self.state.x_prev = x0.clone();
        self.state.t = t_from;
        self.state.t_prev = t_from;
        self.t_target = t_to;
        self.consecutive_singular_predictor = 0;

        let span = t_to - t_from;
        let span_norm = span.norm();
        self.direction = if span_norm > 0.0 {
            span / span_norm
        } else {
            Complex64::new(1.0, 0.0)
        };
        let magnitude = self.options.initial_step_size.abs().max(f64::MIN_POSITIVE);
        self.step_controller = StepController::new(magnitude, self.options.min_step_size);
        self.step_controller.clamp_to_remaining(span_norm);
        self.state.step_size = self.step_controller.step_size;
        self.state.step_size_prev = self.step_controller.step_size;

        let residual = self.homotopy.evaluate(&self.state.x, self.state.t);
        let residual_norm = linalg::norm2(&residual);
        self.state.accuracy_achieved = residual_norm;
        if residual_norm > self.options.accuracy * INVALID_START_RESIDUAL_FACTOR {
            debug!(
                "setup: start residual {residual_norm:.3e} exceeds {:.3e}",
                self.options.accuracy * INVALID_START_RESIDUAL_FACTOR
            );
            self.state.status = CoreStatus::TerminatedInvalidStartValue;
        } else {
            self.state.status = CoreStatus::Tracking;
        }
    }

    /// Remaining complex distance from `state.t` to `t_target`.
    fn remaining(&self) -> Complex64 {
        self.t_target - self.state.t
    }

    /// Performs exactly one predictor-corrector attempt with the
    /// current `Δs`, accepting or rejecting it, and updates
    /// `self.state` accordingly. No-op once `status != Tracking`.
    pub fn step(&mut self) {
        if !self.state.status.is_tracking() {
            return;
        }

        self.step_controller.clamp_to_remaining(self.remaining().norm());
        let delta_t = self.direction * Complex64::new(self.step_controller.step_size, 0.0);

        let prediction = match Predictor::predict(self.homotopy, &self.state.x, self.state.t, delta_t) {
            Ok(p) => p,
            Err(_) => {
                trace!("step: singular predictor Jacobian at t={:?}", self.state.t);
                self.consecutive_singular_predictor += 1;
                self.reject_step();
                if self.consecutive_singular_predictor >= MAX_CONSECUTIVE_SINGULAR_PREDICTOR {
                    self.state.status = CoreStatus::TerminatedSingularity;
                }
                return;
            }
        };
        self.consecutive_singular_predictor = 0;

        let t_new = self.state.t + delta_t;
        let (corrector_status, x_new) = Corrector::correct(
            self.homotopy,
            &prediction.x_hat,
            t_new,
            self.options.accuracy,
            self.options.max_corrector_iters,
        );

        match corrector_status {
            CorrectorStatus::Converged {
                omega,
                digits_lost,
                residual_norm,
                iterations,
            } => {
                trace!("step: converged in {iterations} iters, omega={omega:.3e}");
                self.state.x_prev = std::mem::replace(&mut self.state.x, x_new);
                self.state.t_prev = self.state.t;
                self.state.t = t_new;
                self.state.x_dot = prediction.x_dot;
                self.state.omega = omega;
                self.state.digits_lost = digits_lost;
                self.state.accuracy_achieved = residual_norm;
                self.state.accepted_steps += 1;
                self.state.last_step_failed = false;
                self.step_controller.accept(omega.max(1e-300));
                self.state.step_size = self.step_controller.step_size;
                self.state.step_size_prev = self.step_controller.step_size_prev;

                if self.remaining().norm() < 1e-12 {
                    debug!("step: reached t_target={:?}", self.t_target);
                    self.state.status = CoreStatus::Success;
                }
            }
            CorrectorStatus::IllConditioned { digits_lost } => {
                debug!("step: ill-conditioned, digits_lost={digits_lost:.2}");
                self.state.digits_lost = digits_lost;
                self.state.status = CoreStatus::TerminatedIllConditioned;
            }
            CorrectorStatus::Diverged => {
                trace!("step: corrector diverged at t={t_new:?}");
                self.reject_step();
            }
        }

        if self.state.accepted_steps + self.state.rejected_steps >= self.options.max_steps
            && self.state.status.is_tracking()
        {
            debug!("step: max_steps budget exhausted");
            self.state.status = CoreStatus::TerminatedMaxIters;
        }
    }

    fn reject_step(&mut self) {
        self.state.rejected_steps += 1;
        self.state.last_step_failed = true;
        let outcome = self.step_controller.reject();
        self.state.step_size = self.step_controller.step_size;
        self.state.step_size_prev = self.step_controller.step_size_prev;
        if let crate::step_control::StepOutcome::Rejected { terminal: true } = outcome {
            debug!("step: step size collapsed below floor");
            self.state.status = CoreStatus::TerminatedStepSizeTooSmall;
        }
    }

    /// Resets state via [`Self::setup`] and repeatedly calls
    /// [`Self::step`] until `status != Tracking`.
    pub fn track(&mut self, x0: &DVector<Complex64>, t_from: Complex64, t_to: Complex64) -> CoreStatus {
        self.setup(x0, t_from, t_to);
        while self.state.status.is_tracking() {
            self.step();
        }
        self.state.status
    }

    /// Convenience entry point for the real main path, where `t_from`
    /// and `t_to` are always real-valued (`spec.md` §4.8).
    pub fn track_real(&mut self, x0: &DVector<Complex64>, t_from: f64, t_to: f64) -> CoreStatus {
        self.track(x0, Complex64::new(t_from, 0.0), Complex64::new(t_to, 0.0))
    }

    /// Re-entrant `track!` with per-call option overrides, restored on
    /// return regardless of how tracking terminates (`spec.md` §4.9).
    pub fn track_with_overrides(
        &mut self,
        x0: &DVector<Complex64>,
        t_from: Complex64,
        t_to: Complex64,
        accuracy: Option<f64>,
        max_corrector_iters: Option<usize>,
        max_steps: Option<usize>,
    ) -> CoreStatus {
        let _guard = OptionOverrideGuard::new(self, accuracy, max_corrector_iters, max_steps);
        _guard.tracker.track(x0, t_from, t_to)
    }

    pub fn homotopy(&self) -> &'h dyn Homotopy {
        self.homotopy
    }
}

/// Scoped option override: restores the tracker's previous options on
/// drop, including on an early return or panic (`spec.md` §9 "Mutable
/// option overrides: implement via a scoped acquisition whose release
/// restores previous option values on every exit path").
struct OptionOverrideGuard<'a, 'h> {
    tracker: &'a mut CoreTracker<'h>,
    previous: CoreTrackerOptions,
}

impl<'a, 'h> OptionOverrideGuard<'a, 'h> {
    fn new(
        tracker: &'a mut CoreTracker<'h>,
        accuracy: Option<f64>,
        max_corrector_iters: Option<usize>,
        max_steps: Option<usize>,
    ) -> Self {
        let previous = tracker.options;
        if let Some(a) = accuracy {
            tracker.options.accuracy = a;
        }
        if let Some(m) = max_corrector_iters {
            tracker.options.max_corrector_iters = m;
        }
        if let Some(m) = max_steps {
            tracker.options.max_steps = m;
        }
        Self { tracker, previous }
    }
}

impl<'a, 'h> Drop for OptionOverrideGuard<'a, 'h> {
    fn drop(&mut self) {
        self.tracker.options = self.previous;
    }
}
