//! Dense 3×3 tensor kernel
//!
//! Fixed-size matrix and vector operations batched over per-element arrays.
//! These are the innermost routines of the simulation: they run once per
//! element per step, so every operation is written out explicitly for the
//! 3×3 case instead of going through a generic factorization.
//!
//! All batch operations are pure, allocate fresh output, and contain no
//! data-dependent branching, so identical inputs reproduce identical bits.

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

/// Determinant of a 3×3 matrix by explicit cofactor expansion.
#[inline]
pub fn det3(a: &Matrix3<f64>) -> f64 {
    a[(0, 0)] * a[(1, 1)] * a[(2, 2)] - a[(0, 0)] * a[(1, 2)] * a[(2, 1)]
        - a[(0, 1)] * a[(1, 0)] * a[(2, 2)]
        + a[(0, 1)] * a[(1, 2)] * a[(2, 0)]
        + a[(0, 2)] * a[(1, 0)] * a[(2, 1)]
        - a[(0, 2)] * a[(1, 1)] * a[(2, 0)]
}

/// Inverse of a 3×3 matrix via the adjugate.
///
/// A singular input produces non-finite entries rather than an error; the
/// outer loop watches element volumes and catches collapsing tetrahedra
/// before their configuration matrices become singular.
#[inline]
pub fn inv3(a: &Matrix3<f64>) -> Matrix3<f64> {
    let inv_det = 1.0 / det3(a);
    Matrix3::new(
        a[(1, 1)] * a[(2, 2)] - a[(1, 2)] * a[(2, 1)],
        a[(0, 2)] * a[(2, 1)] - a[(0, 1)] * a[(2, 2)],
        a[(0, 1)] * a[(1, 2)] - a[(0, 2)] * a[(1, 1)],
        a[(1, 2)] * a[(2, 0)] - a[(1, 0)] * a[(2, 2)],
        a[(0, 0)] * a[(2, 2)] - a[(0, 2)] * a[(2, 0)],
        a[(0, 2)] * a[(1, 0)] - a[(0, 0)] * a[(1, 2)],
        a[(1, 0)] * a[(2, 1)] - a[(1, 1)] * a[(2, 0)],
        a[(0, 1)] * a[(2, 0)] - a[(0, 0)] * a[(2, 1)],
        a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)],
    ) * inv_det
}

/// Cross product of two 3-vectors.
#[inline]
pub fn cross3(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    )
}

/// Matrix–vector product for a single 3×3 matrix.
#[inline]
pub fn mat_vec3(a: &Matrix3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(
        a[(0, 0)] * b[0] + a[(0, 1)] * b[1] + a[(0, 2)] * b[2],
        a[(1, 0)] * b[0] + a[(1, 1)] * b[1] + a[(1, 2)] * b[2],
        a[(2, 0)] * b[0] + a[(2, 1)] * b[1] + a[(2, 2)] * b[2],
    )
}

/// Batched determinants.
///
/// # Arguments
/// * `a` - One 3×3 matrix per element
///
/// # Returns
/// `det(a[i])` for each element
pub fn det_batch(a: &[Matrix3<f64>]) -> Vec<f64> {
    a.par_iter().map(det3).collect()
}

/// Batched transposes.
pub fn transpose_batch(a: &[Matrix3<f64>]) -> Vec<Matrix3<f64>> {
    a.par_iter().map(|m| m.transpose()).collect()
}

/// Batched matrix–matrix products `a[i] * b[i]`.
///
/// # Panics
/// Panics if the batch lengths differ.
pub fn mat_mul_batch(a: &[Matrix3<f64>], b: &[Matrix3<f64>]) -> Vec<Matrix3<f64>> {
    assert_eq!(a.len(), b.len(), "Batch lengths must match");
    a.par_iter().zip(b.par_iter()).map(|(m, n)| m * n).collect()
}

/// Batched inverses.
pub fn inv_batch(a: &[Matrix3<f64>]) -> Vec<Matrix3<f64>> {
    a.par_iter().map(inv3).collect()
}

/// Batched matrix–vector products `a[i] * b[i]`.
///
/// # Panics
/// Panics if the batch lengths differ.
pub fn mat_vec_batch(a: &[Matrix3<f64>], b: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    assert_eq!(a.len(), b.len(), "Batch lengths must match");
    a.par_iter()
        .zip(b.par_iter())
        .map(|(m, v)| mat_vec3(m, v))
        .collect()
}

/// Batched Euclidean norms of 3-vectors.
pub fn norm_batch(a: &[Vector3<f64>]) -> Vec<f64> {
    a.par_iter()
        .map(|v| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt())
        .collect()
}

/// Batched cross products `a[i] × b[i]`.
///
/// # Panics
/// Panics if the batch lengths differ.
pub fn cross_batch(a: &[Vector3<f64>], b: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    assert_eq!(a.len(), b.len(), "Batch lengths must match");
    a.par_iter()
        .zip(b.par_iter())
        .map(|(u, v)| cross3(u, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_det3_identity() {
        assert_relative_eq!(det3(&Matrix3::identity()), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_det3_matches_cofactor_by_hand() {
        let a = Matrix3::new(2.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0);
        // 2*(6-1) - 1*(2-0) + 0 = 8
        assert_relative_eq!(det3(&a), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inv3_roundtrip() {
        let a = Matrix3::new(2.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0);
        let prod = a * inv3(&a);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(prod[(i, j)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_cross3_orthogonality() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(-1.0, 0.5, 2.0);
        let c = cross3(&a, &b);
        assert_relative_eq!(c.dot(&a), 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.dot(&b), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cross3_right_handed() {
        let c = cross3(&Vector3::x(), &Vector3::y());
        assert_relative_eq!(c[2], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_batch_ops_match_single() {
        let ms = vec![
            Matrix3::new(1.0, 2.0, 3.0, 0.0, 1.0, 4.0, 5.0, 6.0, 0.0),
            Matrix3::identity() * 2.0,
        ];
        let dets = det_batch(&ms);
        for (d, m) in dets.iter().zip(ms.iter()) {
            assert_relative_eq!(*d, det3(m), epsilon = 1e-15);
        }

        let ts = transpose_batch(&ms);
        assert_relative_eq!(ts[0][(0, 1)], ms[0][(1, 0)], epsilon = 1e-15);

        let ps = mat_mul_batch(&ms, &ts);
        let expected = ms[0] * ms[0].transpose();
        assert_relative_eq!(ps[0][(0, 0)], expected[(0, 0)], epsilon = 1e-12);
    }

    #[test]
    fn test_norm_batch() {
        let vs = vec![Vector3::new(3.0, 4.0, 0.0), Vector3::zeros()];
        let ns = norm_batch(&vs);
        assert_relative_eq!(ns[0], 5.0, epsilon = 1e-15);
        assert_relative_eq!(ns[1], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_mat_vec3() {
        let a = Matrix3::new(1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 3.0);
        let v = mat_vec3(&a, &Vector3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(v[0], 1.0, epsilon = 1e-15);
        assert_relative_eq!(v[1], 2.0, epsilon = 1e-15);
        assert_relative_eq!(v[2], 3.0, epsilon = 1e-15);
    }
}
