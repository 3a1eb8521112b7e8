//! The predictor (C2, `spec.md` §4.2).
//!
//! Given `(x, t)` and a step `Δt` (complex — see [`crate::homotopy`]),
//! solves `J_x · ẋ = -∂H/∂t` for the path tangent, then produces `x̂` by
//! an explicit RK2 (Heun) step — a locally `O(|Δt|^2)` extrapolation,
//! satisfying the spec's "locally `O(Δt^p)` with `p ≥ 2`" contract.
//! Grounded on the teacher's bordered tangent solve
//! (`continuation.rs::compute_tangent_from_problem`), simplified here to
//! a direct (non-bordered) linear solve since the predictor holds `t`
//! fixed per stage rather than treating it as an unknown.

use nalgebra::DVector;
use num_complex::Complex64;

use crate::homotopy::Homotopy;
use crate::linalg;

/// The predictor failed because the Jacobian was singular at the
/// evaluation point. Per `spec.md` §4.2 this is not a [`TrackerError`]
/// (programming bug) but a numerical event the step controller reacts
/// to by shrinking the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingularJacobian;

pub struct PredictorOutput {
    /// Predicted state `x̂(t + Δt)`.
    pub x_hat: DVector<Complex64>,
    /// Tangent `ẋ` evaluated at `(x, t)`, reused by the valuation
    /// estimator (C6) after the step is accepted.
    pub x_dot: DVector<Complex64>,
}

pub struct Predictor;

impl Predictor {
    /// Solves `J_x(x, t) · ẋ = -∂H/∂t(x, t)` for the path tangent.
    pub fn tangent(
        h: &dyn Homotopy,
        x: &DVector<Complex64>,
        t: Complex64,
    ) -> Result<DVector<Complex64>, SingularJacobian> {
        let jac = h.jacobian_x(x, t);
        let neg_vt = -h.jacobian_t(x, t);
        linalg::lu_solve(&jac, &neg_vt).ok_or(SingularJacobian)
    }

    /// Predicts `x̂(t + Δt)` via an explicit Heun (RK2) step:
    /// `x̂ = x + (Δt/2)(ẋ(x,t) + ẋ(x_euler, t+Δt))`.
    pub fn predict(
        h: &dyn Homotopy,
        x: &DVector<Complex64>,
        t: Complex64,
        delta_t: Complex64,
    ) -> Result<PredictorOutput, SingularJacobian> {
        let x_dot0 = Self::tangent(h, x, t)?;
        let x_euler = x + &x_dot0 * delta_t;
        let t1 = t + delta_t;
        let x_dot1 = Self::tangent(h, &x_euler, t1)?;
        let half_dt = delta_t * Complex64::new(0.5, 0.0);
        let x_hat = x + (&x_dot0 + &x_dot1) * half_dt;
        Ok(PredictorOutput {
            x_hat,
            x_dot: x_dot0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homotopy::test_fixtures::QuadraticHomotopy;

    fn r(v: f64) -> Complex64 {
        Complex64::new(v, 0.0)
    }

    #[test]
    fn tangent_matches_closed_form_for_quadratic_homotopy() {
        let h = QuadraticHomotopy;
        let x = DVector::from_vec(vec![r(1.0)]);
        let tangent = Predictor::tangent(&h, &x, r(1.0)).expect("nonsingular");
        // H = (1-t)(x^2-2) + t(x^2-1); at x=1,t=1: J_x = 2x = 2,
        // dH/dt = (x^2-1)-(x^2-2) = 1, so xdot = -1/2.
        assert!((tangent[0] - r(-0.5)).norm() < 1e-9);
    }

    #[test]
    fn predict_moves_away_from_start_point() {
        let h = QuadraticHomotopy;
        let x = DVector::from_vec(vec![r(1.0)]);
        let out = Predictor::predict(&h, &x, r(1.0), r(-0.01)).expect("nonsingular");
        assert!((out.x_hat[0] - x[0]).norm() > 0.0);
    }

    #[test]
    fn tangent_singular_at_zero_jacobian() {
        let h = QuadraticHomotopy;
        let x = DVector::from_vec(vec![r(0.0)]);
        // J_x = 2x = 0 at x=0, any t.
        assert_eq!(Predictor::tangent(&h, &x, r(0.5)), Err(SingularJacobian));
    }
}
