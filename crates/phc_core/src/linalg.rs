//! Dense linear-algebra primitives the rest of the crate treats as
//! "assumed available" (see `spec.md` §1): LU solve, row-equilibration
//! scaling, a condition-number estimate, and the complex 2-norm.
//!
//! These are thin wrappers over `nalgebra`, following the same pattern
//! the teacher's equilibrium solver used for its Newton-step linear
//! solves and eigenpair computation: factor, solve, and fall back
//! gracefully to `None`/`infinity` rather than panicking on a singular
//! system.

use nalgebra::{linalg::SVD, DMatrix, DVector};
use num_complex::Complex64;

/// Euclidean (2-)norm of a complex vector.
pub fn norm2(v: &DVector<Complex64>) -> f64 {
    v.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt()
}

/// Solves `a * x = b` via LU decomposition, returning `None` if `a` is
/// numerically singular.
pub fn lu_solve(a: &DMatrix<Complex64>, b: &DVector<Complex64>) -> Option<DVector<Complex64>> {
    a.clone().lu().solve(b)
}

/// Row-equilibrates `a` and `b` in place by scaling each row of `a` by
/// the reciprocal of its largest-magnitude entry. Improves conditioning
/// of the LU solve when rows differ wildly in scale, a standard
/// precondition for Newton-style correctors on polynomial systems.
pub fn row_equilibrate(a: &mut DMatrix<Complex64>, b: &mut DVector<Complex64>) {
    for i in 0..a.nrows() {
        let row_max = (0..a.ncols())
            .map(|j| a[(i, j)].norm())
            .fold(0.0_f64, f64::max);
        if row_max > 0.0 && row_max.is_finite() {
            let scale = 1.0 / row_max;
            for j in 0..a.ncols() {
                a[(i, j)] *= Complex64::new(scale, 0.0);
            }
            b[i] *= Complex64::new(scale, 0.0);
        }
    }
}

/// Estimates `cond(a)` as the ratio of largest to smallest singular
/// value. Returns `f64::INFINITY` for a (numerically) singular or
/// non-square matrix whose SVD fails to converge.
pub fn condition_estimate(a: &DMatrix<Complex64>) -> f64 {
    if a.nrows() == 0 || a.ncols() == 0 {
        return 1.0;
    }
    let svd = SVD::new(a.clone(), false, false);
    let sigma_max = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let sigma_min = svd
        .singular_values
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min);
    if sigma_min <= 0.0 || !sigma_min.is_finite() {
        f64::INFINITY
    } else {
        sigma_max / sigma_min
    }
}

/// `log10(cond(a))`, clamped at zero — the `digits_lost` diagnostic used
/// by the corrector (`spec.md` §4.3).
pub fn digits_lost(a: &DMatrix<Complex64>) -> f64 {
    condition_estimate(a).log10().max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(n: usize) -> DMatrix<Complex64> {
        DMatrix::identity(n, n)
    }

    #[test]
    fn identity_is_well_conditioned() {
        let id = identity(3);
        assert!((condition_estimate(&id) - 1.0).abs() < 1e-9);
        assert!(digits_lost(&id) < 1e-9);
    }

    #[test]
    fn singular_matrix_has_infinite_condition() {
        let m = DMatrix::<Complex64>::zeros(2, 2);
        assert!(condition_estimate(&m).is_infinite());
    }

    #[test]
    fn lu_solve_recovers_known_solution() {
        let mut a = DMatrix::<Complex64>::zeros(2, 2);
        a[(0, 0)] = Complex64::new(2.0, 0.0);
        a[(1, 1)] = Complex64::new(4.0, 0.0);
        let b = DVector::from_vec(vec![Complex64::new(2.0, 0.0), Complex64::new(8.0, 0.0)]);
        let x = lu_solve(&a, &b).expect("solvable");
        assert!((x[0] - Complex64::new(1.0, 0.0)).norm() < 1e-9);
        assert!((x[1] - Complex64::new(2.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn norm2_matches_manual_computation() {
        let v = DVector::from_vec(vec![Complex64::new(3.0, 0.0), Complex64::new(0.0, 4.0)]);
        assert!((norm2(&v) - 5.0).abs() < 1e-9);
    }
}
