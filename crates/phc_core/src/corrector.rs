//! The corrector (C3, `spec.md` §4.3).
//!
//! Plain Newton iteration on `H(·, t+Δt)` starting from the predictor's
//! `x̂`, tracking the Newton contraction factor
//! `ω ≈ ‖Δx_{k+1}‖ / ‖Δx_k‖²` and a `digits_lost` condition-number
//! estimate. Grounded on the teacher's damped-Newton loop in
//! `equilibrium.rs::solve_equilibrium`, simplified to undamped Newton
//! (the spec gives no damping parameter) and restructured to report a
//! status rather than `bail!`, since corrector failure is a routine
//! numerical event here, not a validation error.

use nalgebra::DVector;
use num_complex::Complex64;

use crate::homotopy::Homotopy;
use crate::linalg;

/// If the estimated condition number of `J_x` at convergence implies
/// more than this many decimal digits of accuracy have been lost, the
/// corrector reports ill-conditioning instead of a plain converged
/// result.
pub const ILL_CONDITIONED_DIGITS_LOST: f64 = 13.0;

/// A correction step is declared diverging once the correction norm
/// grows by more than this factor over the previous step.
const DIVERGENCE_GROWTH_FACTOR: f64 = 1e3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrectorStatus {
    Converged {
        omega: f64,
        digits_lost: f64,
        iterations: usize,
        residual_norm: f64,
    },
    Diverged,
    IllConditioned {
        digits_lost: f64,
    },
}

impl CorrectorStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, CorrectorStatus::Converged { .. })
    }
}

pub struct Corrector;

impl Corrector {
    /// Runs Newton iteration on `H(·, t)` starting at `x_hat`.
    /// Returns the final status and the final iterate (the converged
    /// point on success, the last attempted point otherwise).
    pub fn correct(
        h: &dyn Homotopy,
        x_hat: &DVector<Complex64>,
        t: Complex64,
        accuracy: f64,
        max_iters: usize,
    ) -> (CorrectorStatus, DVector<Complex64>) {
        let mut x = x_hat.clone();
        let mut prev_delta_norm: Option<f64> = None;
        let mut omega = 0.0_f64;

        for iter in 0..max_iters {
            let residual = h.evaluate(&x, t);
            let jac = h.jacobian_x(&x, t);
            let neg_residual = -&residual;
            let delta = match linalg::lu_solve(&jac, &neg_residual) {
                Some(d) => d,
                None => return (CorrectorStatus::Diverged, x),
            };
            let delta_norm = linalg::norm2(&delta);

            if !delta_norm.is_finite() {
                return (CorrectorStatus::Diverged, x);
            }
            if let Some(prev) = prev_delta_norm {
                if prev > 0.0 {
                    omega = delta_norm / (prev * prev);
                }
                if delta_norm > DIVERGENCE_GROWTH_FACTOR * prev && delta_norm > accuracy {
                    return (CorrectorStatus::Diverged, x);
                }
            }

            x += &delta;

            if delta_norm <= accuracy {
                let new_residual = h.evaluate(&x, t);
                let residual_norm = linalg::norm2(&new_residual);
                let jac_at_solution = h.jacobian_x(&x, t);
                let digits_lost = linalg::digits_lost(&jac_at_solution);
                if digits_lost > ILL_CONDITIONED_DIGITS_LOST {
                    return (CorrectorStatus::IllConditioned { digits_lost }, x);
                }
                return (
                    CorrectorStatus::Converged {
                        omega,
                        digits_lost,
                        iterations: iter + 1,
                        residual_norm,
                    },
                    x,
                );
            }

            prev_delta_norm = Some(delta_norm);
        }

        (CorrectorStatus::Diverged, x)
    }
}
