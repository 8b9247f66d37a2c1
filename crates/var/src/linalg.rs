//! Small dense linear-algebra helpers shared by the VAR and DFM crates.
//!
//! Matrices are stored as `ndarray::Array2<f64>`; routines that need a
//! decomposition from `nalgebra` go through [`to_dmatrix`].

use nalgebra::DMatrix;
use ndarray::Array2;

use crate::error::VarError;

/// Tolerance, relative to the column's diagonal entry, under which a
/// Cholesky pivot is treated as zero.
const PIVOT_TOL: f64 = 1e-12;

/// Relative tolerance on the residual column below a zero pivot.
const RESIDUAL_TOL: f64 = 1e-8;

/// Copies an `ndarray` matrix into a column-major `nalgebra::DMatrix`.
pub fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Lower Cholesky factor `L` of a symmetric positive-semidefinite matrix,
/// with `A = L·Lᵗ`.
///
/// Only the lower triangle of `a` is read. A pivot that vanishes relative to
/// its own diagonal entry produces a zero column, so singular PSD matrices
/// factorise; the diagonal of `L` is non-negative.
///
/// # Errors
///
/// [`VarError::NotPositiveSemidefinite`] when a pivot is negative, or when a
/// zero pivot leaves a non-zero residual below it.
pub fn lower_cholesky(a: &Array2<f64>) -> Result<Array2<f64>, VarError> {
    let n = a.nrows();
    debug_assert_eq!(n, a.ncols(), "lower_cholesky: matrix must be square");

    let mut l = Array2::zeros((n, n));
    for j in 0..n {
        let ajj = a[[j, j]].abs();
        let pivot_tol = PIVOT_TOL * ajj;
        let mut d = a[[j, j]];
        for k in 0..j {
            d -= l[[j, k]] * l[[j, k]];
        }
        if !d.is_finite() || d < -pivot_tol {
            return Err(VarError::NotPositiveSemidefinite { pivot: j });
        }
        if d <= pivot_tol {
            for i in j + 1..n {
                let mut r = a[[i, j]];
                for k in 0..j {
                    r -= l[[i, k]] * l[[j, k]];
                }
                // |a[i,j]| <= sqrt(a[i,i]·a[j,j]) for a PSD matrix
                if r.abs() > RESIDUAL_TOL * (a[[i, i]].abs() * ajj).sqrt() {
                    return Err(VarError::NotPositiveSemidefinite { pivot: j });
                }
            }
            continue;
        }
        let djj = d.sqrt();
        l[[j, j]] = djj;
        for i in j + 1..n {
            let mut r = a[[i, j]];
            for k in 0..j {
                r -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = r / djj;
        }
    }
    Ok(l)
}

/// Computes `X·Xᵗ`.
///
/// Only the lower triangle is accumulated and then mirrored, so the result
/// is exactly symmetric.
pub fn xxt(x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();
    let mut out = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let v = x.row(i).dot(&x.row(j));
            out[[i, j]] = v;
            out[[j, i]] = v;
        }
    }
    out
}
