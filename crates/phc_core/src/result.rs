//! `PathResult` (`spec.md` §6): the record [`crate::path_tracker::PathTracker`]
//! hands back to the driver, plus the classification helpers the spec
//! names (`is_success`, `is_singular`, …).

use nalgebra::DVector;
use num_complex::Complex64;

use crate::types::PathStatus;

/// Default condition-number threshold above which a success is
/// classified singular even with `winding_number <= 1` (`spec.md` §6).
pub const DEFAULT_CONDITION_JACOBIAN_TOL: f64 = 1e14;

/// Default tolerance for [`PathResult::is_real`]'s imaginary-part norm
/// check.
pub const DEFAULT_REAL_TOL: f64 = 1e-8;

/// The per-path outcome handed back to the driver.
#[derive(Debug, Clone)]
pub struct PathResult {
    pub return_code: PathStatus,
    /// Solution in user coordinates (after `pull_back`).
    pub solution: DVector<Complex64>,
    /// `t` at which the result was decided.
    pub t: Complex64,
    /// Populated only for non-singular successes (`spec.md` §6).
    pub accuracy: Option<f64>,
    pub residual: f64,
    pub condition_jacobian: Option<f64>,
    /// `None` unless a Cauchy endgame ran and reported `winding_number
    /// > 0`.
    pub winding_number: Option<usize>,
    pub endgame_zone_start: Option<f64>,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub valuation: Option<DVector<f64>>,
    pub valuation_accuracy: Option<DVector<f64>>,
}

impl PathResult {
    pub fn is_success(&self) -> bool {
        self.return_code == PathStatus::Success
    }

    pub fn is_at_infinity(&self) -> bool {
        self.return_code == PathStatus::AtInfinity
    }

    pub fn is_failed(&self) -> bool {
        !matches!(self.return_code, PathStatus::Success | PathStatus::AtInfinity)
    }

    /// `winding_number > 1` OR `condition_jacobian` exceeds
    /// `tol` (default [`DEFAULT_CONDITION_JACOBIAN_TOL`]).
    pub fn is_singular(&self, tol: Option<f64>) -> bool {
        let tol = tol.unwrap_or(DEFAULT_CONDITION_JACOBIAN_TOL);
        let winding_singular = self.winding_number.map(|w| w > 1).unwrap_or(false);
        let condition_singular = self.condition_jacobian.map(|c| c > tol).unwrap_or(false);
        winding_singular || condition_singular
    }

    pub fn is_nonsingular(&self, tol: Option<f64>) -> bool {
        self.is_success() && !self.is_singular(tol)
    }

    /// True if the imaginary-part 2-norm of the solution is below
    /// `tol` (default [`DEFAULT_REAL_TOL`]).
    pub fn is_real(&self, tol: Option<f64>) -> bool {
        let tol = tol.unwrap_or(DEFAULT_REAL_TOL);
        let imag_norm_sqr: f64 = self.solution.iter().map(|c| c.im * c.im).sum();
        imag_norm_sqr.sqrt() < tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_result() -> PathResult {
        PathResult {
            return_code: PathStatus::Success,
            solution: DVector::from_vec(vec![Complex64::new(1.0, 0.0)]),
            t: Complex64::new(0.0, 0.0),
            accuracy: Some(1e-10),
            residual: 1e-12,
            condition_jacobian: Some(10.0),
            winding_number: None,
            endgame_zone_start: None,
            accepted_steps: 5,
            rejected_steps: 0,
            valuation: None,
            valuation_accuracy: None,
        }
    }

    #[test]
    fn nonsingular_success_is_classified_correctly() {
        let r = base_result();
        assert!(r.is_success());
        assert!(!r.is_failed());
        assert!(r.is_nonsingular(None));
        assert!(!r.is_singular(None));
        assert!(r.is_real(None));
    }

    #[test]
    fn high_winding_number_is_singular() {
        let mut r = base_result();
        r.winding_number = Some(2);
        assert!(r.is_singular(None));
        assert!(!r.is_nonsingular(None));
    }

    #[test]
    fn ill_conditioned_jacobian_is_singular() {
        let mut r = base_result();
        r.condition_jacobian = Some(1e15);
        assert!(r.is_singular(None));
    }

    #[test]
    fn complex_solution_is_not_real() {
        let mut r = base_result();
        r.solution = DVector::from_vec(vec![Complex64::new(1.0, 0.5)]);
        assert!(!r.is_real(None));
    }

    #[test]
    fn at_infinity_is_not_a_failure() {
        let mut r = base_result();
        r.return_code = PathStatus::AtInfinity;
        assert!(r.is_at_infinity());
        assert!(!r.is_failed());
        assert!(!r.is_success());
    }

    #[test]
    fn terminated_status_is_a_failure() {
        let mut r = base_result();
        r.return_code = PathStatus::TerminatedMaxIters;
        assert!(r.is_failed());
    }
}
