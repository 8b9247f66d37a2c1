//! Unconditional covariance of the stacked VAR state.
//!
//! Solves the discrete Lyapunov equation
//!
//! ```text
//! V = T V Tᵗ + Q
//! ```
//!
//! directly as a linear system in the `n(n+1)/2` lower-triangular entries of
//! `V`, where `T` is the companion matrix and `Q` holds the innovation
//! covariance in its top-left block. Only the first block row of `T` is
//! dense; the shift rows contribute a single unit entry each, so the system
//! is filled from sparse rows instead of a Kronecker product.

use nalgebra::{DMatrix, DVector};
use ndarray::Array2;

use crate::descriptor::VarDescriptor;
use crate::error::VarError;

/// Stationary covariance of `(f[t], ..., f[t-p+1])`.
///
/// The result is exactly symmetric. Near the unit circle it may be
/// ill-conditioned or indefinite; regularising it is left to the caller.
///
/// # Errors
///
/// [`VarError::SingularSystem`] when the linear system is singular or its
/// solution is not finite (e.g. a unit root).
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use nowcast_var::{VarDescriptor, unconditional_covariance};
///
/// let var = VarDescriptor::new(array![[0.5]], array![[1.0]]).unwrap();
/// let v = unconditional_covariance(&var).unwrap();
/// assert!((v[[0, 0]] - 4.0 / 3.0).abs() < 1e-12);
/// ```
pub fn unconditional_covariance(desc: &VarDescriptor) -> Result<Array2<f64>, VarError> {
    unconditional_covariance_with_lags(desc, desc.nlags())
}

/// Stationary covariance of a state holding `max(nlags, desc.nlags())`
/// lagged blocks.
///
/// Extra blocks are handled by treating the VAR as having zero coefficients
/// on the additional lags, which yields the exact autocovariances of the
/// longer stacked state.
#[tracing::instrument(skip(desc), fields(nvars = desc.nvars(), var_lags = desc.nlags()))]
pub fn unconditional_covariance_with_lags(
    desc: &VarDescriptor,
    nlags: usize,
) -> Result<Array2<f64>, VarError> {
    let nb = desc.nvars();
    let n = nb * nlags.max(desc.nlags());
    let np = n * (n + 1) / 2;

    let rows = companion_rows(desc, n);
    let sigma = desc.innovations_variance();

    let mut m = DMatrix::<f64>::zeros(np, np);
    let mut q = DVector::<f64>::zeros(np);
    for c in 0..n {
        for r in c..n {
            let i = packed_index(r, c, n);
            m[(i, i)] += 1.0;
            if r < nb {
                q[i] = sigma[[r, c]];
            }
            // vec(T V Tᵗ)[r, c] = Σ_l Σ_k T[r, l] V[l, k] T[c, k]
            for &(l, trl) in &rows[r] {
                for &(k, tck) in &rows[c] {
                    let j = if l >= k {
                        packed_index(l, k, n)
                    } else {
                        packed_index(k, l, n)
                    };
                    m[(i, j)] -= trl * tck;
                }
            }
        }
    }

    let b = m
        .full_piv_lu()
        .solve(&q)
        .ok_or(VarError::SingularSystem { dim: np })?;
    if b.iter().any(|v| !v.is_finite()) {
        return Err(VarError::SingularSystem { dim: np });
    }

    let mut v = Array2::zeros((n, n));
    for c in 0..n {
        for r in c..n {
            let x = b[packed_index(r, c, n)];
            v[[r, c]] = x;
            v[[c, r]] = x;
        }
    }
    Ok(v)
}

/// Non-zero entries `(column, value)` of each companion row.
fn companion_rows(desc: &VarDescriptor, n: usize) -> Vec<Vec<(usize, f64)>> {
    let nb = desc.nvars();
    let coefficients = desc.coefficients();
    (0..n)
        .map(|r| {
            if r < nb {
                coefficients
                    .row(r)
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| **a != 0.0)
                    .map(|(k, a)| (k, *a))
                    .collect()
            } else {
                vec![(r - nb, 1.0)]
            }
        })
        .collect()
}

/// Position of `(r, c)`, `r >= c`, in the column-major packed lower triangle
/// of an `n x n` matrix.
fn packed_index(r: usize, c: usize, n: usize) -> usize {
    r + c * (2 * n - c - 1) / 2
}
