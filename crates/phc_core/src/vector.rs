//! The solution-vector variant (`spec.md` §3, §9): either a plain affine
//! `ℂⁿ` vector, or a projective vector partitioned into homogeneous
//! groups with an affine-patch normal vector. Modeled as a tagged sum
//! with a small capability interface, per the design note in `spec.md`
//! §9 ("Variant of vector type … tagged sum with a capability
//! interface exposing length, affine_length, iterate-by-group,
//! norm-on-affine-chart").

use nalgebra::DVector;
use num_complex::Complex64;

/// One homogeneous group within a projective vector: a contiguous range
/// of component indices and the index (within that range) designated as
/// the homogenization variable.
#[derive(Debug, Clone)]
pub struct HomogeneousGroup {
    pub start: usize,
    pub len: usize,
    /// Index (absolute, into the full vector) of this group's
    /// homogenization variable.
    pub homogenization_index: usize,
}

impl HomogeneousGroup {
    pub fn new(start: usize, len: usize, homogenization_index: usize) -> Self {
        debug_assert!(homogenization_index >= start && homogenization_index < start + len);
        Self {
            start,
            len,
            homogenization_index,
        }
    }

    pub fn affine_len(&self) -> usize {
        self.len - 1
    }

    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// A tracked solution vector: affine, or projective with homogeneous
/// groups and a fixed affine-patch normal vector.
#[derive(Debug, Clone)]
pub enum TrackedVector {
    Affine(DVector<Complex64>),
    Projective {
        data: DVector<Complex64>,
        groups: Vec<HomogeneousGroup>,
        /// Affine-patch normal vector `q`; the patch condition is
        /// `q^T x = 1`. Held fixed during the Cauchy endgame loop.
        patch: DVector<Complex64>,
    },
}

impl TrackedVector {
    pub fn len(&self) -> usize {
        match self {
            TrackedVector::Affine(v) => v.len(),
            TrackedVector::Projective { data, .. } => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_projective(&self) -> bool {
        matches!(self, TrackedVector::Projective { .. })
    }

    /// Dimension of the dehomogenized (affine) coordinate space — the
    /// length the valuation estimator's `val`/`prev_val` arrays use.
    pub fn affine_len(&self) -> usize {
        match self {
            TrackedVector::Affine(v) => v.len(),
            TrackedVector::Projective { groups, .. } => groups.iter().map(|g| g.affine_len()).sum(),
        }
    }

    pub fn as_slice(&self) -> &[Complex64] {
        match self {
            TrackedVector::Affine(v) => v.as_slice(),
            TrackedVector::Projective { data, .. } => data.as_slice(),
        }
    }

    pub fn data(&self) -> &DVector<Complex64> {
        match self {
            TrackedVector::Affine(v) => v,
            TrackedVector::Projective { data, .. } => data,
        }
    }

    pub fn data_mut(&mut self) -> &mut DVector<Complex64> {
        match self {
            TrackedVector::Affine(v) => v,
            TrackedVector::Projective { data, .. } => data,
        }
    }

    pub fn groups(&self) -> Option<&[HomogeneousGroup]> {
        match self {
            TrackedVector::Affine(_) => None,
            TrackedVector::Projective { groups, .. } => Some(groups),
        }
    }

    /// Euclidean norm on the affine chart: for an affine vector this is
    /// just its norm; for a projective vector each group is first
    /// dehomogenized (divided by its homogenization variable) before
    /// taking the norm over the dehomogenized coordinates.
    ///
    /// Per `spec.md` §9 open question, this is a no-op concept for
    /// affine vectors — `max_affine_norm`'s late at-infinity catch only
    /// ever fires for projective vectors.
    pub fn affine_chart_norm(&self) -> f64 {
        match self {
            TrackedVector::Affine(v) => crate::linalg::norm2(v),
            TrackedVector::Projective { data, groups, .. } => {
                let mut acc = 0.0_f64;
                for g in groups {
                    let h = data[g.homogenization_index];
                    if h.norm() == 0.0 {
                        return f64::INFINITY;
                    }
                    for idx in g.indices() {
                        if idx == g.homogenization_index {
                            continue;
                        }
                        let dehom = data[idx] / h;
                        acc += dehom.norm_sqr();
                    }
                }
                acc.sqrt()
            }
        }
    }

    /// Iterates dehomogenized affine indices in group order, paired with
    /// their source index in `data()`. For an affine vector this is
    /// simply `0..len` paired with itself.
    pub fn affine_source_indices(&self) -> Vec<usize> {
        match self {
            TrackedVector::Affine(v) => (0..v.len()).collect(),
            TrackedVector::Projective { groups, .. } => groups
                .iter()
                .flat_map(|g| g.indices().filter(move |&i| i != g.homogenization_index))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn affine_vector_lengths_agree() {
        let v = TrackedVector::Affine(DVector::from_vec(vec![c(1.0, 0.0), c(2.0, 0.0)]));
        assert_eq!(v.len(), 2);
        assert_eq!(v.affine_len(), 2);
        assert!(!v.is_projective());
    }

    #[test]
    fn projective_affine_len_subtracts_homogenization_vars() {
        let data = DVector::from_vec(vec![c(1.0, 0.0), c(2.0, 0.0), c(3.0, 0.0)]);
        let groups = vec![HomogeneousGroup::new(0, 3, 0)];
        let patch = DVector::from_vec(vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)]);
        let v = TrackedVector::Projective {
            data,
            groups,
            patch,
        };
        assert_eq!(v.len(), 3);
        assert_eq!(v.affine_len(), 2);
        assert!(v.is_projective());
    }

    #[test]
    fn affine_chart_norm_dehomogenizes() {
        let data = DVector::from_vec(vec![c(2.0, 0.0), c(4.0, 0.0), c(6.0, 0.0)]);
        let groups = vec![HomogeneousGroup::new(0, 3, 0)];
        let patch = DVector::from_vec(vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)]);
        let v = TrackedVector::Projective {
            data,
            groups,
            patch,
        };
        // dehomogenized: [4/2, 6/2] = [2, 3] -> norm = sqrt(4+9) = sqrt(13)
        assert!((v.affine_chart_norm() - 13.0_f64.sqrt()).abs() < 1e-9);
    }
}
