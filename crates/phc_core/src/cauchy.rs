//! The Cauchy endgame (C7, `spec.md` §4.7).
//!
//! Recovers a singular endpoint `x(0)` by looping the core tracker
//! around a small circle of radius `|t|` centered at `t = 0`, averaging
//! samples via Cauchy's integral formula. No teacher analog exists —
//! the teacher's continuation code has no endgame concept — so this is
//! grounded directly on `spec.md` §4.7's algorithm, reusing
//! [`crate::core_tracker::CoreTracker`] for each polygon edge the way
//! the teacher's `continue_with_problem` is reused by
//! `extend_branch_with_problem` for a sub-range of arclength.

use nalgebra::DVector;
use num_complex::Complex64;
use std::f64::consts::PI;

use crate::core_tracker::CoreTracker;
use crate::types::CoreStatus;

/// Outcome of a [`CauchyEndgame::run`] call.
#[derive(Debug, Clone)]
pub enum CauchyOutcome {
    /// The loop closed; `prediction` is the averaged endpoint estimate
    /// and `winding_number` the number of revolutions taken.
    Success {
        prediction: DVector<Complex64>,
        winding_number: usize,
    },
    /// `max_winding_number` was exceeded without the loop closing.
    MaxWindingNumber,
    /// A sub-track around the polygon returned a non-success core
    /// status; carried through unchanged for the caller to map.
    CoreFailure(CoreStatus),
}

pub struct CauchyEndgame;

impl CauchyEndgame {
    /// Runs the endgame starting from `(x0, t0)`, `t0` real and
    /// positive, using `core` (already set up for the homotopy in
    /// question; this call performs its own `setup!`/`track!` calls
    /// and restores `core`'s options/patch state on every exit path).
    pub fn run(
        core: &mut CoreTracker,
        x0: &DVector<Complex64>,
        t0: Complex64,
        samples_per_loop: usize,
        max_winding_number: usize,
        accuracy: f64,
    ) -> CauchyOutcome {
        let previous_update_patch = match core.fix_patch() {
            Ok(prev) => prev,
            // Already fixed is a programming bug upstream; surface as
            // a tracker failure rather than panicking mid-endgame.
            Err(_) => return CauchyOutcome::CoreFailure(CoreStatus::TerminatedSingularity),
        };

        let outcome = Self::run_inner(core, x0, t0, samples_per_loop, max_winding_number, accuracy);

        let _ = core.unfix_patch(previous_update_patch);
        outcome
    }

    fn run_inner(
        core: &mut CoreTracker,
        x0: &DVector<Complex64>,
        t0: Complex64,
        samples_per_loop: usize,
        max_winding_number: usize,
        accuracy: f64,
    ) -> CauchyOutcome {
        let n = samples_per_loop.max(1);
        let roots: Vec<Complex64> = (0..=n)
            .map(|j| Complex64::from_polar(1.0, 2.0 * PI * (j as f64) / (n as f64)))
            .collect();

        // `core.track!` resets `CoreTrackerState` on every call, so the
        // steps the outer path's main tracking already accumulated
        // must be saved and added back in rather than overwritten
        // (`spec.md` §4.7: "accumulated during loops are added back to
        // the outer core tracker state").
        let steps_before = (core.state.accepted_steps, core.state.rejected_steps);
        let mut accepted_total = 0usize;
        let mut rejected_total = 0usize;
        let mut prediction = DVector::<Complex64>::zeros(x0.len());
        let mut loop_start = x0.clone();

        for m in 1..=max_winding_number {
            let mut currx = loop_start.clone();
            for j in 1..=n {
                let theta_prev = t0 * roots[j - 1];
                let theta_j = t0 * roots[j];
                let status = core.track(&currx, theta_prev, theta_j);
                accepted_total += core.state.accepted_steps;
                rejected_total += core.state.rejected_steps;

                if !status.is_success() {
                    core.state.accepted_steps = steps_before.0 + accepted_total;
                    core.state.rejected_steps = steps_before.1 + rejected_total;
                    return CauchyOutcome::CoreFailure(status);
                }
                currx = core.state.x.clone();
                prediction += &currx;
            }

            // Closure is tested against the original loop start `x0`, not
            // the current revolution's own start: a winding number m >= 2
            // never returns to its own start after a single revolution,
            // only after the full m-revolution loop (`spec.md` §4.7 step 3).
            let closed = (&currx - x0).norm() < 4.0 * accuracy;
            if closed {
                core.state.accepted_steps = steps_before.0 + accepted_total;
                core.state.rejected_steps = steps_before.1 + rejected_total;
                let denom = Complex64::new((m * n) as f64, 0.0);
                return CauchyOutcome::Success {
                    prediction: prediction / denom,
                    winding_number: m,
                };
            }
            loop_start = currx;
        }

        core.state.accepted_steps = steps_before.0 + accepted_total;
        core.state.rejected_steps = steps_before.1 + rejected_total;
        CauchyOutcome::MaxWindingNumber
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homotopy::test_fixtures::DoubleRootHomotopy;
    use crate::types::CoreTrackerOptions;

    #[test]
    fn closes_after_two_revolutions_on_a_double_root() {
        let h = DoubleRootHomotopy;
        let mut core = CoreTracker::new(&h, CoreTrackerOptions::default());
        // Seed x near the singular endpoint x=1, at small real t.
        let t0 = Complex64::new(1e-3, 0.0);
        let x0 = DVector::from_vec(vec![Complex64::new(1.05, 0.0)]);
        let outcome = CauchyEndgame::run(&mut core, &x0, t0, 5, 12, 1e-7);
        match outcome {
            CauchyOutcome::Success { winding_number, prediction } => {
                assert_eq!(winding_number, 2);
                assert!((prediction[0] - Complex64::new(1.0, 0.0)).norm() < 0.25);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn patch_guard_restores_update_patch_after_run() {
        let h = DoubleRootHomotopy;
        let mut opts = CoreTrackerOptions::default();
        opts.update_patch = true;
        let mut core = CoreTracker::new(&h, opts);
        let t0 = Complex64::new(1e-3, 0.0);
        let x0 = DVector::from_vec(vec![Complex64::new(1.05, 0.0)]);
        let _ = CauchyEndgame::run(&mut core, &x0, t0, 5, 12, 1e-7);
        assert!(core.options.update_patch);
    }
}
