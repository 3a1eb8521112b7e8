//! The homotopy evaluator contract (C1, `spec.md` §4.1).
//!
//! A [`Homotopy`] is an opaque handle, generalizing the teacher's
//! `ContinuationProblem` trait (`residual`/`extended_jacobian`) from a
//! real pseudo-arclength residual to a complex, explicitly
//! `t`-parametrized map `H(x, t)`.
//!
//! `t` is `Complex64`, not `f64`: along the main path `t` only ever
//! takes real values from `1` down to `0`, but the Cauchy endgame
//! (`spec.md` §4.7) drives the same stepper around a circle in the
//! complex `t`-plane. Keeping `t` complex throughout lets
//! [`crate::core_tracker::CoreTracker`] serve both the main path and
//! the endgame loop without a second code path. Implementers are
//! expected to cache the last `(x, t)` pair to amortize a combined
//! evaluate-and-Jacobian call; the core never assumes that for them.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

/// `H(x, t): ℂⁿ × ℂ → ℂⁿ`, with `H(x, 1) = G(x)` (start system) and
/// `H(x, 0) = F(x)` (target system). `t` is real-valued along the main
/// path and traces a circle during the Cauchy endgame.
pub trait Homotopy {
    /// Dimension `n` of the (possibly projective-extended) vector space
    /// this homotopy operates on.
    fn dimension(&self) -> usize;

    /// Evaluates `H(x, t)`.
    fn evaluate(&self, x: &DVector<Complex64>, t: Complex64) -> DVector<Complex64>;

    /// Evaluates `∂H/∂x(x, t)`.
    fn jacobian_x(&self, x: &DVector<Complex64>, t: Complex64) -> DMatrix<Complex64>;

    /// Evaluates `∂H/∂t(x, t)`.
    fn jacobian_t(&self, x: &DVector<Complex64>, t: Complex64) -> DVector<Complex64>;

    /// Combined evaluate + Jacobian, for implementers that can amortize
    /// shared work (e.g. evaluating monomials once for both). The
    /// default simply calls both.
    fn evaluate_and_jac(
        &self,
        x: &DVector<Complex64>,
        t: Complex64,
    ) -> (DVector<Complex64>, DMatrix<Complex64>) {
        (self.evaluate(x, t), self.jacobian_x(x, t))
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    //! Small hand-rolled homotopies used across the test suite. Since
    //! symbolic polynomial-system construction is out of scope
    //! (`spec.md` §1), fixtures implement [`Homotopy`] directly rather
    //! than going through a parser.
    use super::*;

    /// `H(x, t) = (1-t) F(x) + t G(x)` for a fixed target `F`, start `G`.
    /// `F(x) = x^2 - 2`, `G(x) = x^2 - 1` (start roots ±1).
    pub struct QuadraticHomotopy;

    impl Homotopy for QuadraticHomotopy {
        fn dimension(&self) -> usize {
            1
        }

        fn evaluate(&self, x: &DVector<Complex64>, t: Complex64) -> DVector<Complex64> {
            let one = Complex64::new(1.0, 0.0);
            let f = x[0] * x[0] - Complex64::new(2.0, 0.0);
            let g = x[0] * x[0] - Complex64::new(1.0, 0.0);
            DVector::from_vec(vec![f * (one - t) + g * t])
        }

        fn jacobian_x(&self, x: &DVector<Complex64>, _t: Complex64) -> DMatrix<Complex64> {
            DMatrix::from_vec(1, 1, vec![Complex64::new(2.0, 0.0) * x[0]])
        }

        fn jacobian_t(&self, x: &DVector<Complex64>, _t: Complex64) -> DVector<Complex64> {
            let f = x[0] * x[0] - Complex64::new(2.0, 0.0);
            let g = x[0] * x[0] - Complex64::new(1.0, 0.0);
            DVector::from_vec(vec![g - f])
        }
    }

    /// `H(x, t) = (1-t)((x-1)^2) + t(x^2 - 1)`: a homotopy whose target
    /// `F(x) = (x-1)^2` has a double root at `x = 1`.
    pub struct DoubleRootHomotopy;

    impl Homotopy for DoubleRootHomotopy {
        fn dimension(&self) -> usize {
            1
        }

        fn evaluate(&self, x: &DVector<Complex64>, t: Complex64) -> DVector<Complex64> {
            let one = Complex64::new(1.0, 0.0);
            let f = (x[0] - one) * (x[0] - one);
            let g = x[0] * x[0] - one;
            DVector::from_vec(vec![f * (one - t) + g * t])
        }

        fn jacobian_x(&self, x: &DVector<Complex64>, t: Complex64) -> DMatrix<Complex64> {
            let one = Complex64::new(1.0, 0.0);
            let df = Complex64::new(2.0, 0.0) * (x[0] - one);
            let dg = Complex64::new(2.0, 0.0) * x[0];
            DMatrix::from_vec(1, 1, vec![df * (one - t) + dg * t])
        }

        fn jacobian_t(&self, x: &DVector<Complex64>, _t: Complex64) -> DVector<Complex64> {
            let one = Complex64::new(1.0, 0.0);
            let f = (x[0] - one) * (x[0] - one);
            let g = x[0] * x[0] - one;
            DVector::from_vec(vec![g - f])
        }
    }

    /// A homotopy in homogeneous coordinates `[x0 : x1]` with `x1` the
    /// homogenization variable and patch `x1 = 1`. Its affine coordinate
    /// `x0 / x1` diverges to infinity as `t \to 0`:
    /// `H([x0:x1], t) = [t*x0 - x1, x1 - 1]`. On the patch (`x1 = 1`)
    /// this forces `x0 = 1/t \to \infty`.
    pub struct DivergingHomotopy;

    impl Homotopy for DivergingHomotopy {
        fn dimension(&self) -> usize {
            2
        }

        fn evaluate(&self, x: &DVector<Complex64>, t: Complex64) -> DVector<Complex64> {
            let one = Complex64::new(1.0, 0.0);
            DVector::from_vec(vec![t * x[0] - x[1], x[1] - one])
        }

        fn jacobian_x(&self, _x: &DVector<Complex64>, t: Complex64) -> DMatrix<Complex64> {
            DMatrix::from_row_slice(
                2,
                2,
                &[
                    t,
                    -Complex64::new(1.0, 0.0),
                    Complex64::new(0.0, 0.0),
                    Complex64::new(1.0, 0.0),
                ],
            )
        }

        fn jacobian_t(&self, x: &DVector<Complex64>, _t: Complex64) -> DVector<Complex64> {
            DVector::from_vec(vec![x[0], Complex64::new(0.0, 0.0)])
        }
    }
}
