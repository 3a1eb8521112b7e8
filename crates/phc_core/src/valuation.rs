//! The valuation estimator (C6, `spec.md` §4.6).
//!
//! For a candidate Puiseux branch `x_i(t) = c·t^{ω_i} + …`, the
//! valuation satisfies `ω_i(t) = t · Re(x_i · conj(ẋ_i)) / |x_i|²`.
//! After each accepted core step this module recomputes `ω_i` for every
//! affine coordinate, tracks an accuracy metric between consecutive
//! samples, and exposes the "valuation is accurate" predicate the
//! endgame and at-infinity checks rely on.
//!
//! No direct teacher analog exists for this running-estimate shape; it
//! is grounded on the style of `fork_core::analysis`'s Lyapunov
//! exponent accumulator — maintain a running previous/current sample
//! pair and derive a convergence diagnostic from their difference.

use nalgebra::DVector;
use num_complex::Complex64;

use crate::vector::HomogeneousGroup;

/// Raw (non-dehomogenized) valuation of every component of `x`.
fn raw_valuation(x: &DVector<Complex64>, x_dot: &DVector<Complex64>, t: f64) -> DVector<f64> {
    DVector::from_iterator(
        x.len(),
        x.iter().zip(x_dot.iter()).map(|(xi, xdoti)| {
            let denom = xi.norm_sqr();
            if denom == 0.0 {
                0.0
            } else {
                t * (xi * xdoti.conj()).re / denom
            }
        }),
    )
}

/// Valuation restricted to affine coordinates: for a projective vector,
/// each group's homogenization-variable valuation is subtracted from
/// every other member of the group (`spec.md` §4.6).
pub fn affine_valuation(
    x: &DVector<Complex64>,
    x_dot: &DVector<Complex64>,
    t: f64,
    groups: Option<&[HomogeneousGroup]>,
) -> DVector<f64> {
    let raw = raw_valuation(x, x_dot, t);
    match groups {
        None => raw,
        Some(groups) => {
            let mut out = Vec::with_capacity(raw.len());
            for g in groups {
                let h_val = raw[g.homogenization_index];
                for idx in g.indices() {
                    if idx == g.homogenization_index {
                        continue;
                    }
                    out.push(raw[idx] - h_val);
                }
            }
            DVector::from_vec(out)
        }
    }
}

/// Running valuation state for one path: current/previous valuation
/// and their accuracy metrics, all of affine length (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct ValuationEstimator {
    pub val: DVector<f64>,
    pub prev_val: DVector<f64>,
    pub val_accuracy: DVector<f64>,
    pub prev_val_accuracy: DVector<f64>,
    has_sample: bool,
}

impl ValuationEstimator {
    pub fn new(affine_len: usize) -> Self {
        Self {
            val: DVector::zeros(affine_len),
            prev_val: DVector::zeros(affine_len),
            val_accuracy: DVector::from_element(affine_len, f64::INFINITY),
            prev_val_accuracy: DVector::from_element(affine_len, f64::INFINITY),
            has_sample: false,
        }
    }

    /// Folds in a new sample taken at `(x, x_dot, t)`, the step having
    /// come from `t_prev`. Updates `val`/`prev_val` and the accuracy
    /// metric `acc_i(k) = |ω_i(t_k) − ω_i(t_{k−1})| / log(1 + Δt/t_k)`.
    pub fn update(
        &mut self,
        x: &DVector<Complex64>,
        x_dot: &DVector<Complex64>,
        t: f64,
        t_prev: f64,
        groups: Option<&[HomogeneousGroup]>,
    ) {
        let new_val = affine_valuation(x, x_dot, t, groups);
        if self.has_sample {
            let delta_t = (t_prev - t).abs();
            let denom = (1.0 + delta_t / t.abs()).ln();
            self.prev_val_accuracy = self.val_accuracy.clone();
            for i in 0..new_val.len() {
                self.val_accuracy[i] = if denom.abs() > 1e-300 && denom.is_finite() {
                    (new_val[i] - self.val[i]).abs() / denom
                } else {
                    f64::INFINITY
                };
            }
        }
        self.prev_val = std::mem::replace(&mut self.val, new_val);
        self.has_sample = true;
    }

    /// Coordinate `i`'s valuation is "accurate" when both
    /// `acc_i(k−1) < min_val_accuracy` and either `acc_i(k) <
    /// acc_i(k−1)` or `acc_i(k) < min_val_accuracy²` (`spec.md` §4.6).
    pub fn is_accurate(&self, i: usize, min_val_accuracy: f64) -> bool {
        if !self.has_sample {
            return false;
        }
        let prev = self.prev_val_accuracy[i];
        let cur = self.val_accuracy[i];
        prev < min_val_accuracy && (cur < prev || cur < min_val_accuracy * min_val_accuracy)
    }

    pub fn all_accurate(&self, min_val_accuracy: f64) -> bool {
        (0..self.val.len()).all(|i| self.is_accurate(i, min_val_accuracy))
    }

    /// Index of an accurate coordinate whose valuation is `<= threshold`
    /// (used by the at-infinity check, which looks for `ω_i < -0.05`).
    pub fn first_accurate_below(&self, threshold: f64, min_val_accuracy: f64) -> Option<usize> {
        (0..self.val.len()).find(|&i| self.is_accurate(i, min_val_accuracy) && self.val[i] < threshold)
    }

    /// True if any valuation (accurate or not) is non-integer within
    /// tolerance `0.1` — a candidate for a singular/fractional endpoint
    /// (`spec.md` §4.7).
    pub fn any_fractional(&self) -> bool {
        self.val.iter().any(|&w| (w.round() - w).abs() > 0.1)
    }

    pub fn all_nonnegative(&self) -> bool {
        self.val.iter().all(|&w| w >= -1e-9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affine_valuation_without_groups_matches_raw() {
        let x = DVector::from_vec(vec![Complex64::new(2.0, 0.0)]);
        let xdot = DVector::from_vec(vec![Complex64::new(1.0, 0.0)]);
        let val = affine_valuation(&x, &xdot, 0.5, None);
        // t * Re(x * conj(xdot)) / |x|^2 = 0.5 * 2 / 4 = 0.25
        assert!((val[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn diverging_coordinate_eventually_reports_negative_valuation() {
        // x(t) = 1/t behaves like t^{-1}; xdot(t) = -1/t^2.
        let mut est = ValuationEstimator::new(1);
        let mut t = 0.5;
        for _ in 0..6 {
            let t_prev = t;
            t *= 0.5;
            let x = DVector::from_vec(vec![Complex64::new(1.0 / t, 0.0)]);
            let xdot = DVector::from_vec(vec![Complex64::new(-1.0 / (t * t), 0.0)]);
            est.update(&x, &xdot, t, t_prev, None);
        }
        assert!(est.val[0] < -0.9);
    }

    #[test]
    fn accuracy_requires_two_consecutive_samples() {
        let mut est = ValuationEstimator::new(1);
        let x = DVector::from_vec(vec![Complex64::new(1.0, 0.0)]);
        let xdot = DVector::from_vec(vec![Complex64::new(0.0, 0.0)]);
        assert!(!est.is_accurate(0, 1e-3));
        est.update(&x, &xdot, 0.5, 1.0, None);
        // Only one sample folded in; accuracy undefined until a second.
        assert!(!est.is_accurate(0, 1e-3));
    }

    #[test]
    fn projective_valuation_subtracts_homogenization_variable() {
        let x = DVector::from_vec(vec![
            Complex64::new(4.0, 0.0),
            Complex64::new(2.0, 0.0),
        ]);
        let xdot = DVector::from_vec(vec![
            Complex64::new(4.0, 0.0),
            Complex64::new(0.0, 0.0),
        ]);
        let groups = vec![HomogeneousGroup::new(0, 2, 1)];
        let val = affine_valuation(&x, &xdot, 1.0, Some(&groups));
        assert_eq!(val.len(), 1);
        // raw[0] = 1*Re(4*4)/16 = 1.0, raw[1] = 0 (xdot=0) -> val = 1.0 - 0 = 1.0
        assert!((val[0] - 1.0).abs() < 1e-12);
    }
}
