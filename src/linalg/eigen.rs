//! Symmetric eigenvalue decomposition
//!
//! Two independent paths:
//!
//! * [`eigenvalues_sym3`] — closed-form eigenvalues of a symmetric 3×3
//!   matrix from the trigonometric solution of its characteristic cubic.
//!   No eigenvectors; used where only principal stretches are needed.
//! * [`eigen_decomposition`] — full n×n decomposition via Householder
//!   reduction to tridiagonal form followed by the QL algorithm with
//!   implicit shifts, after the classical Algol procedures `tred2`/`tql2`
//!   (Bowdler, Martin, Reinsch, Wilkinson; EISPACK lineage).
//!
//! The input must be exactly symmetric; that is the caller's contract and
//! is not checked. Eigenvalues come back sorted ascending with matching
//! unit-norm eigenvector columns.

use nalgebra::{DMatrix, DVector, Matrix3};

use crate::error::{Result, SimError};

/// Relative convergence tolerance of the QL iteration (2⁻⁵²).
pub const QL_EPS: f64 = f64::EPSILON;

/// Cap on QL sweeps per eigenvalue index. The classical algorithm iterates
/// without bound; exceeding this cap is reported as a convergence failure
/// instead of hanging the step.
pub const MAX_QL_SWEEPS: usize = 50;

/// Closed-form eigenvalues of a symmetric 3×3 matrix, descending.
///
/// Solves the characteristic polynomial through its depressed-cubic
/// trigonometric form. The `phi` discriminant can come out slightly
/// negative from floating-point cancellation; its absolute value is taken
/// before the square root, which widens the tolerance for near-degenerate
/// spectra instead of producing NaN.
///
/// # Arguments
/// * `x` - Symmetric 3×3 matrix (symmetry is the caller's contract)
///
/// # Returns
/// `[l1, l2, l3]` with `l1 >= l2 >= l3`
pub fn eigenvalues_sym3(x: &Matrix3<f64>) -> [f64; 3] {
    let c1 = x[(0, 0)] * x[(1, 1)] + x[(0, 0)] * x[(2, 2)] + x[(1, 1)] * x[(2, 2)]
        - x[(0, 1)] * x[(0, 1)]
        - x[(1, 2)] * x[(1, 2)]
        - x[(0, 2)] * x[(0, 2)];
    let c0 = x[(2, 2)] * x[(0, 1)] * x[(0, 1)]
        + x[(0, 0)] * x[(1, 2)] * x[(1, 2)]
        + x[(1, 1)] * x[(0, 2)] * x[(0, 2)]
        - x[(0, 0)] * x[(1, 1)] * x[(2, 2)]
        - 2.0 * x[(0, 2)] * x[(0, 1)] * x[(1, 2)];

    let tr = x[(0, 0)] + x[(1, 1)] + x[(2, 2)];
    let p = tr * tr - 3.0 * c1;
    let q = tr * (p - 3.0 / 2.0 * c1) - 27.0 / 2.0 * c0;

    let phi = 27.0 * (0.25 * c1 * c1 * (p - c1) + c0 * (q + 27.0 / 4.0 * c0));
    let phi = 1.0 / 3.0 * phi.abs().sqrt().atan2(q);
    let t = p.abs().sqrt() * phi.cos();
    let s = 1.0 / 3.0_f64.sqrt() * p.abs().sqrt() * phi.sin();

    let l3 = 1.0 / 3.0 * (tr - t) - s;
    let l2 = l3 + 2.0 * s;
    let l1 = l3 + t + s;

    [l1, l2, l3]
}

/// Householder reduction of a symmetric matrix to tridiagonal form.
///
/// On entry `v` holds the symmetric input; on exit it holds the accumulated
/// orthogonal transform, `d` the diagonal and `e` the sub-diagonal of the
/// tridiagonal matrix. The `scale == 0` branch (column already tridiagonal)
/// overwrites a different subset of `v`/`d`/`e` than the general branch and
/// must not be folded into it.
#[allow(clippy::needless_range_loop)]
fn tred2(n: usize, v: &mut DMatrix<f64>, d: &mut DVector<f64>, e: &mut DVector<f64>) {
    for j in 0..n {
        d[j] = v[(n - 1, j)];
    }

    // Householder reduction, working up from the last row.
    for i in (1..n).rev() {
        let mut scale = 0.0;
        let mut h = 0.0;

        for k in 0..i {
            scale += d[k].abs();
        }

        if scale == 0.0 {
            e[i] = d[i - 1];

            for j in 0..i {
                d[j] = v[(i - 1, j)];
                v[(i, j)] = 0.0;
                v[(j, i)] = 0.0;
            }
        } else {
            for k in 0..i {
                d[k] /= scale;
                h += d[k] * d[k];
            }

            let mut f = d[i - 1];
            let mut g = h.sqrt();
            if f > 0.0 {
                g = -g;
            }

            e[i] = scale * g;
            h -= f * g;
            d[i - 1] = f - g;

            for j in 0..i {
                e[j] = 0.0;
            }

            // Apply the Householder similarity transformation to the
            // remaining submatrix.
            for j in 0..i {
                f = d[j];
                v[(j, i)] = f;
                g = e[j] + v[(j, j)] * f;

                for k in (j + 1)..i {
                    g += v[(k, j)] * d[k];
                    e[k] += v[(k, j)] * f;
                }

                e[j] = g;
            }

            f = 0.0;
            for j in 0..i {
                e[j] /= h;
                f += e[j] * d[j];
            }

            let hh = f / (2.0 * h);
            for j in 0..i {
                e[j] -= hh * d[j];
            }

            for j in 0..i {
                f = d[j];
                g = e[j];

                for k in j..i {
                    v[(k, j)] -= f * e[k] + g * d[k];
                }

                d[j] = v[(i - 1, j)];
                v[(i, j)] = 0.0;
            }
        }

        d[i] = h;
    }

    // Accumulate the transformations.
    for i in 0..(n - 1) {
        v[(n - 1, i)] = v[(i, i)];
        v[(i, i)] = 1.0;
        let h = d[i + 1];

        if h != 0.0 {
            for k in 0..=i {
                d[k] = v[(k, i + 1)] / h;
            }

            for j in 0..=i {
                let mut g = 0.0;
                for k in 0..=i {
                    g += v[(k, i + 1)] * v[(k, j)];
                }
                for k in 0..=i {
                    v[(k, j)] -= g * d[k];
                }
            }
        }

        for k in 0..=i {
            v[(k, i + 1)] = 0.0;
        }
    }

    for j in 0..n {
        d[j] = v[(n - 1, j)];
        v[(n - 1, j)] = 0.0;
    }

    v[(n - 1, n - 1)] = 1.0;
    e[0] = 0.0;
}

/// QL iteration with implicit shifts on a symmetric tridiagonal matrix.
///
/// `d`/`e` hold the tridiagonal produced by [`tred2`] and `v` its
/// accumulated transform. On success `d` holds the eigenvalues sorted
/// ascending and the columns of `v` the matching eigenvectors.
#[allow(clippy::needless_range_loop)]
fn tql2(n: usize, v: &mut DMatrix<f64>, d: &mut DVector<f64>, e: &mut DVector<f64>) -> Result<()> {
    for i in 1..n {
        e[i - 1] = e[i];
    }
    e[n - 1] = 0.0;

    let mut f = 0.0;
    let mut tst1: f64 = 0.0;

    for l in 0..n {
        tst1 = tst1.max(d[l].abs() + e[l].abs());

        // Find the first small sub-diagonal entry at or below l.
        let mut m = l;
        while m < n {
            if e[m].abs() <= QL_EPS * tst1 {
                break;
            }
            m += 1;
        }

        if m > l {
            let mut sweeps = 0;

            loop {
                if sweeps >= MAX_QL_SWEEPS {
                    return Err(SimError::Convergence { index: l, sweeps });
                }
                sweeps += 1;

                // Implicit shift from the 2×2 leading block.
                let g = d[l];
                let mut p = (d[l + 1] - g) / (2.0 * e[l]);
                let mut r = (p * p + 1.0).sqrt();
                if p < 0.0 {
                    r = -r;
                }

                d[l] = e[l] / (p + r);
                d[l + 1] = e[l] * (p + r);
                let dl1 = d[l + 1];
                let mut h = g - d[l];

                for i in (l + 2)..n {
                    d[i] -= h;
                }
                f += h;

                // One QL sweep of plane rotations, bottom to top.
                p = d[m];
                let mut c = 1.0;
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l + 1];
                let mut s = 0.0;
                let mut s2 = 0.0;

                for i in (l..m).rev() {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    let g = c * e[i];
                    h = c * p;
                    r = (p * p + e[i] * e[i]).sqrt();
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);

                    for k in 0..n {
                        h = v[(k, i + 1)];
                        v[(k, i + 1)] = s * v[(k, i)] + c * h;
                        v[(k, i)] = c * v[(k, i)] - s * h;
                    }
                }

                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;

                if e[l].abs() <= QL_EPS * tst1 {
                    break;
                }
            }
        }

        d[l] += f;
        e[l] = 0.0;
    }

    // Sort eigenvalues ascending, carrying eigenvector columns along.
    for i in 0..(n - 1) {
        let mut k = i;
        let mut p = d[i];

        for j in (i + 1)..n {
            if d[j] < p {
                k = j;
                p = d[j];
            }
        }

        if k != i {
            d[k] = d[i];
            d[i] = p;

            for j in 0..n {
                let p = v[(j, i)];
                v[(j, i)] = v[(j, k)];
                v[(j, k)] = p;
            }
        }
    }

    Ok(())
}

/// Full eigenvalue decomposition of a symmetric n×n matrix.
///
/// # Arguments
/// * `a` - Symmetric matrix; symmetry is the caller's contract and is not
///   checked
///
/// # Returns
/// `(d, v)` with eigenvalues `d` ascending and the i-th column of `v` the
/// unit-norm eigenvector for `d[i]`, or [`SimError::Convergence`] if any
/// eigenvalue exceeds the sweep cap. The caller may retry with a slightly
/// perturbed input or abort the step.
///
/// # Panics
/// Panics if `a` is not square.
pub fn eigen_decomposition(a: &DMatrix<f64>) -> Result<(DVector<f64>, DMatrix<f64>)> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "Eigen decomposition requires a square matrix");
    assert!(n > 0, "Eigen decomposition requires a non-empty matrix");

    let mut v = a.clone();
    let mut d = DVector::zeros(n);
    let mut e = DVector::zeros(n);

    tred2(n, &mut v, &mut d, &mut e);
    tql2(n, &mut v, &mut d, &mut e)?;

    Ok((d, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dmatrix_from_sym3(m: &Matrix3<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(3, 3, |i, j| m[(i, j)])
    }

    #[test]
    fn test_identity_eigenvalues() {
        let a = DMatrix::<f64>::identity(5, 5);
        let (d, v) = eigen_decomposition(&a).unwrap();

        for i in 0..5 {
            assert_relative_eq!(d[i], 1.0, epsilon = 1e-14);
        }
        // Eigenvectors of the identity stay the identity columns
        // (up to order/sign).
        for j in 0..5 {
            let col = v.column(j);
            assert_relative_eq!(col.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_known_spectrum() {
        // Block diagonal: [[2,1],[1,2]] has eigenvalues 1 and 3.
        let a = Matrix3::new(2.0, 1.0, 0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 3.0);
        let (d, v) = eigen_decomposition(&dmatrix_from_sym3(&a)).unwrap();

        assert_relative_eq!(d[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(d[1], 3.0, epsilon = 1e-10);
        assert_relative_eq!(d[2], 3.0, epsilon = 1e-10);

        // Residual check: A v = λ v for every pair.
        let ad = dmatrix_from_sym3(&a);
        for j in 0..3 {
            let col = v.column(j).clone_owned();
            let res = &ad * &col - &col * d[j];
            assert!(res.norm() < 1e-9, "residual {} for eigenpair {}", res.norm(), j);
        }
    }

    #[test]
    fn test_diagonal_input_takes_scale_zero_branch() {
        // A diagonal matrix drives every Householder column through the
        // scale == 0 early exit.
        let a = DMatrix::from_diagonal(&DVector::from_vec(vec![4.0, -1.0, 2.5, 0.0]));
        let (d, v) = eigen_decomposition(&a).unwrap();

        assert_relative_eq!(d[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(d[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(d[2], 2.5, epsilon = 1e-12);
        assert_relative_eq!(d[3], 4.0, epsilon = 1e-12);

        for j in 0..4 {
            assert_relative_eq!(v.column(j).norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_closed_form_matches_iterative() {
        let cases = [
            Matrix3::new(2.0, 1.0, 0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 3.0),
            Matrix3::new(1.0, 0.5, 0.25, 0.5, 2.0, -0.75, 0.25, -0.75, 3.0),
            Matrix3::new(-1.0, 2.0, 0.0, 2.0, -1.0, 2.0, 0.0, 2.0, -1.0),
            Matrix3::identity(),
        ];

        for x in &cases {
            let mut closed = eigenvalues_sym3(x);
            closed.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let (d, _) = eigen_decomposition(&dmatrix_from_sym3(x)).unwrap();
            let scale = closed.iter().fold(1.0_f64, |m, l| m.max(l.abs()));

            for i in 0..3 {
                assert!(
                    (closed[i] - d[i]).abs() <= 1e-9 * scale,
                    "eigenvalue {} mismatch: {} vs {}",
                    i,
                    closed[i],
                    d[i]
                );
            }
        }
    }

    #[test]
    fn test_closed_form_descending_order() {
        let x = Matrix3::new(1.0, 0.5, 0.25, 0.5, 2.0, -0.75, 0.25, -0.75, 3.0);
        let [l1, l2, l3] = eigenvalues_sym3(&x);
        assert!(l1 >= l2 && l2 >= l3);

        // Trace and determinant invariants of the spectrum.
        assert_relative_eq!(l1 + l2 + l3, x.trace(), epsilon = 1e-9);
        assert_relative_eq!(
            l1 * l2 * l3,
            crate::linalg::tensor::det3(&x),
            epsilon = 1e-9
        );
    }
}
