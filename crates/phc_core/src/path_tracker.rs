//! `PathTracker` (C8, `spec.md` §4.8).
//!
//! Wraps [`CoreTracker`], drives it from `t=1` to `t=0`, folds in the
//! valuation estimator (C6) after each accepted step, detects the
//! endgame zone and at-infinity, invokes the Cauchy endgame (C7) for
//! singular candidates, and packages a [`PathResult`]. No teacher
//! analog exists for the endgame-specific control flow; the overall
//! shape — a thin orchestrator owning a lower-level tracker and
//! querying its state between steps rather than being called back by
//! it — is grounded on the teacher's `ContinuationBranch` owning a
//! `CoreTracker`-equivalent stepper (`spec.md` §9: "PathTracker
//! exclusively owns the CoreTracker; state updates flow one way").

use nalgebra::DVector;
use num_complex::Complex64;

use crate::blas;
use crate::cauchy::{CauchyEndgame, CauchyOutcome};
use crate::core_tracker::CoreTracker;
use crate::corrector::{Corrector, CorrectorStatus};
use crate::homotopy::Homotopy;
use crate::linalg;
use crate::result::PathResult;
use crate::types::{core_status_to_path_status, CoreTrackerOptions, PathStatus, PathTrackerOptions};
use crate::valuation::ValuationEstimator;
use crate::vector::HomogeneousGroup;

/// `embed`/`pull_back`/homogeneous-group metadata the driver supplies
/// about the solution-vector representation (`spec.md` §6, out of this
/// core's scope beyond this contract).
pub struct VectorContract {
    pub groups: Option<Vec<HomogeneousGroup>>,
    pub embed: Box<dyn Fn(&DVector<Complex64>) -> DVector<Complex64>>,
    pub pull_back: Box<dyn Fn(&DVector<Complex64>) -> DVector<Complex64>>,
}

impl VectorContract {
    /// Plain affine vectors: `embed`/`pull_back` are the identity, no
    /// homogeneous groups.
    pub fn affine() -> Self {
        Self {
            groups: None,
            embed: Box::new(|x| x.clone()),
            pull_back: Box::new(|x| x.clone()),
        }
    }

    pub fn projective(
        groups: Vec<HomogeneousGroup>,
        embed: impl Fn(&DVector<Complex64>) -> DVector<Complex64> + 'static,
        pull_back: impl Fn(&DVector<Complex64>) -> DVector<Complex64> + 'static,
    ) -> Self {
        Self {
            groups: Some(groups),
            embed: Box::new(embed),
            pull_back: Box::new(pull_back),
        }
    }

    fn affine_len(&self, embedded_dim: usize) -> usize {
        match &self.groups {
            Some(groups) => groups.iter().map(|g| g.affine_len()).sum(),
            None => embedded_dim,
        }
    }

    /// Euclidean norm on the affine chart (`spec.md` §9 open question:
    /// a no-op — effectively zero-cost and never triggering — for
    /// plain affine vectors).
    fn affine_chart_norm(&self, x: &DVector<Complex64>) -> f64 {
        match &self.groups {
            None => linalg::norm2(x),
            Some(groups) => {
                let mut acc = 0.0_f64;
                for g in groups {
                    let h = x[g.homogenization_index];
                    if h.norm() == 0.0 {
                        return f64::INFINITY;
                    }
                    for idx in g.indices() {
                        if idx == g.homogenization_index {
                            continue;
                        }
                        acc += (x[idx] / h).norm_sqr();
                    }
                }
                acc.sqrt()
            }
        }
    }
}

pub struct PathTracker<'h> {
    core: CoreTracker<'h>,
    options: PathTrackerOptions,
    contract: VectorContract,
}

impl<'h> PathTracker<'h> {
    pub fn new(
        homotopy: &'h dyn Homotopy,
        core_options: CoreTrackerOptions,
        options: PathTrackerOptions,
        contract: VectorContract,
    ) -> Self {
        Self {
            core: CoreTracker::new(homotopy, core_options),
            options,
            contract,
        }
    }

    pub fn core(&self) -> &CoreTracker<'h> {
        &self.core
    }

    /// `track!(x1)` (`spec.md` §4.8): embeds `x1`, tracks `t: 1 → 0`,
    /// runs the endgame where needed, and returns a [`PathResult`] in
    /// user coordinates. Pins BLAS to a single thread for the call's
    /// duration (`spec.md` §5, C12).
    pub fn track(&mut self, x1: &DVector<Complex64>) -> PathResult {
        blas::with_single_thread(|| self.track_inner(x1))
    }

    fn track_inner(&mut self, x1: &DVector<Complex64>) -> PathResult {
        let x_embedded = (self.contract.embed)(x1);
        let affine_len = self.contract.affine_len(x_embedded.len());
        let mut valuation = ValuationEstimator::new(affine_len);

        self.core.setup(
            &x_embedded,
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
        );

        let mut endgame_zone_start: Option<f64> = None;
        let mut winding_number: usize = 0;
        let mut override_status: Option<PathStatus> = None;

        loop {
            if !self.core.state.status.is_tracking() {
                break;
            }
            self.core.step();
            if !self.core.state.status.is_tracking() {
                break;
            }
            if self.core.state.last_step_failed {
                continue;
            }

            valuation.update(
                &self.core.state.x,
                &self.core.state.x_dot,
                self.core.state.t.re,
                self.core.state.t_prev.re,
                self.contract.groups.as_deref(),
            );

            if self.core.state.step_size >= self.options.max_step_size_endgame_start {
                continue;
            }

            if self.options.at_infinity_check {
                if valuation
                    .first_accurate_below(-0.05, self.options.min_val_accuracy)
                    .is_some()
                {
                    override_status = Some(PathStatus::AtInfinity);
                    break;
                }
            }

            if !valuation.all_accurate(self.options.min_val_accuracy) {
                continue;
            }

            if endgame_zone_start.is_none() {
                endgame_zone_start = Some(self.core.state.t.re);
            }

            if self.check_singular_candidate(&valuation) {
                let x0 = self.core.state.x.clone();
                let t_current = self.core.state.t;
                let accuracy = self.core.options.accuracy;
                let outcome = CauchyEndgame::run(
                    &mut self.core,
                    &x0,
                    t_current,
                    self.options.samples_per_loop,
                    self.options.max_winding_number,
                    accuracy,
                );
                match outcome {
                    CauchyOutcome::Success {
                        prediction,
                        winding_number: m,
                    } => {
                        self.core.state.x = prediction;
                        winding_number = m;
                        override_status = Some(PathStatus::Success);
                        break;
                    }
                    CauchyOutcome::MaxWindingNumber => {
                        continue;
                    }
                    CauchyOutcome::CoreFailure(_) => {
                        override_status = Some(PathStatus::TrackerFailed);
                        break;
                    }
                }
            }
        }

        let mut status = override_status.unwrap_or_else(|| {
            if self.core.state.status.is_success() {
                PathStatus::Success
            } else {
                core_status_to_path_status(self.core.state.status)
            }
        });

        // Late at-infinity catch (`spec.md` §4.8 step 3).
        if status == PathStatus::Success
            && self.options.at_infinity_check
            && self.contract.groups.is_some()
            && self.contract.affine_chart_norm(&self.core.state.x) > self.options.max_affine_norm
        {
            status = PathStatus::AtInfinity;
        }

        // Final corrector refinement for regular (non-singular)
        // successes (`spec.md` §4.8 step 4).
        let mut accuracy_achieved = None;
        if status == PathStatus::Success && winding_number <= 1 {
            let (corrector_status, x_refined) = Corrector::correct(
                self.core.homotopy(),
                &self.core.state.x,
                self.core.state.t,
                self.core.options.accuracy,
                self.core.options.max_corrector_iters,
            );
            if let CorrectorStatus::Converged { residual_norm, .. } = corrector_status {
                self.core.state.x = x_refined;
                accuracy_achieved = Some(residual_norm);
            }
        }

        let final_residual = linalg::norm2(&self.core.homotopy().evaluate(&self.core.state.x, self.core.state.t));
        let jac = self
            .core
            .homotopy()
            .jacobian_x(&self.core.state.x, self.core.state.t);
        let condition_jacobian = Some(linalg::condition_estimate(&jac));

        PathResult {
            return_code: status,
            solution: (self.contract.pull_back)(&self.core.state.x),
            t: self.core.state.t,
            accuracy: accuracy_achieved,
            residual: final_residual,
            condition_jacobian,
            winding_number: if winding_number > 0 { Some(winding_number) } else { None },
            endgame_zone_start,
            accepted_steps: self.core.state.accepted_steps,
            rejected_steps: self.core.state.rejected_steps,
            valuation: Some(valuation.val.clone()),
            valuation_accuracy: Some(valuation.val_accuracy.clone()),
        }
    }

    /// `spec.md` §4.7 precondition: all valuations accurate and
    /// nonnegative but at least one fractional, OR the core tracker is
    /// distressed.
    fn check_singular_candidate(&self, valuation: &ValuationEstimator) -> bool {
        let fractional_case = valuation.all_accurate(self.options.min_val_accuracy)
            && valuation.all_nonnegative()
            && valuation.any_fractional();
        let distressed = self.core.state.digits_lost > 4.0
            || self.core.state.omega > 100.0
            || self.core.state.step_size < 1e-6;
        fractional_case || distressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homotopy::test_fixtures::{DivergingHomotopy, DoubleRootHomotopy, QuadraticHomotopy};

    #[test]
    fn tracks_a_regular_root_to_success() {
        let h = QuadraticHomotopy;
        let mut tracker = PathTracker::new(
            &h,
            CoreTrackerOptions::default(),
            PathTrackerOptions::default(),
            VectorContract::affine(),
        );
        let x1 = DVector::from_vec(vec![Complex64::new(1.0, 0.0)]);
        let result = tracker.track(&x1);
        assert!(result.is_success());
        assert!((result.solution[0] - Complex64::new(2.0_f64.sqrt(), 0.0)).norm() < 1e-6);
        assert!(result.winding_number.is_none());
    }

    #[test]
    fn recovers_a_double_root_via_the_endgame() {
        let h = DoubleRootHomotopy;
        let mut tracker = PathTracker::new(
            &h,
            CoreTrackerOptions::default(),
            PathTrackerOptions::default(),
            VectorContract::affine(),
        );
        let x1 = DVector::from_vec(vec![Complex64::new(-1.0, 0.0)]);
        let result = tracker.track(&x1);
        assert!(result.is_success());
        assert_eq!(result.winding_number, Some(2));
        assert!(result.is_singular(None));
        assert!((result.solution[0] - Complex64::new(1.0, 0.0)).norm() < 0.25);
    }

    #[test]
    fn detects_a_path_diverging_to_infinity() {
        let h = DivergingHomotopy;
        let groups = vec![HomogeneousGroup::new(0, 2, 1)];
        let contract = VectorContract::projective(
            groups,
            |x| x.clone(),
            |x| DVector::from_vec(vec![x[0] / x[1]]),
        );
        let mut tracker = PathTracker::new(
            &h,
            CoreTrackerOptions::default(),
            PathTrackerOptions::default(),
            contract,
        );
        let x1 = DVector::from_vec(vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)]);
        let result = tracker.track(&x1);
        assert!(result.is_at_infinity());
    }
}
