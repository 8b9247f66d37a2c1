//! VAR(p) descriptor and its companion (state-space) form.
//!
//! A VAR with `n` variables and `p` lags
//!
//! ```text
//! f[t] = A_1 f[t-1] + ... + A_p f[t-p] + u[t],     u[t] ~ N(0, Σ)
//! ```
//!
//! is stored as the `n x (n·p)` matrix `[A_1 | A_2 | ... | A_p]` plus `Σ`.
//! Stacking `s[t] = (f[t], f[t-1], ..., f[t-p+1])` gives the companion form
//! `s[t+1] = T s[t] + R u[t]` where the first block row of `T` holds the
//! coefficient blocks and the block sub-diagonal holds identities.

use ndarray::{Array2, ArrayView2, s};

use crate::error::VarError;
use crate::stability::{SpectralRadius, spectral_radius};

/// Tolerance on `|Σ[i,j] - Σ[j,i]|`, relative to the largest entry of `Σ`.
const SYMMETRY_TOL: f64 = 1e-10;

/// Coefficients and innovation covariance of a VAR(p).
#[derive(Clone, Debug, PartialEq)]
pub struct VarDescriptor {
    nvars: usize,
    nlags: usize,
    coefficients: Array2<f64>,
    innovations_variance: Array2<f64>,
}

impl VarDescriptor {
    /// Creates a descriptor from the `n x (n·p)` coefficient matrix and the
    /// `n x n` innovation covariance. The number of lags is inferred from the
    /// coefficient shape.
    ///
    /// The covariance is not checked for positive semidefiniteness here;
    /// that happens where it is factorised.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`VarError::Empty`] | no rows or no columns |
    /// | [`VarError::CoefficientShape`] | columns not a multiple of rows |
    /// | [`VarError::CovarianceShape`] | covariance not `n x n` |
    /// | [`VarError::NonFinite`] | NaN or infinite entries |
    /// | [`VarError::NotSymmetric`] | covariance not symmetric |
    pub fn new(
        coefficients: Array2<f64>,
        innovations_variance: Array2<f64>,
    ) -> Result<Self, VarError> {
        let (rows, cols) = coefficients.dim();
        if rows == 0 || cols == 0 {
            return Err(VarError::Empty);
        }
        if cols % rows != 0 {
            return Err(VarError::CoefficientShape { rows, cols });
        }
        let (vr, vc) = innovations_variance.dim();
        if vr != rows || vc != rows {
            return Err(VarError::CovarianceShape {
                expected: rows,
                rows: vr,
                cols: vc,
            });
        }
        if coefficients
            .iter()
            .chain(innovations_variance.iter())
            .any(|v| !v.is_finite())
        {
            return Err(VarError::NonFinite);
        }
        check_symmetric(&innovations_variance)?;
        Ok(Self {
            nvars: rows,
            nlags: cols / rows,
            coefficients,
            innovations_variance,
        })
    }

    /// Number of variables (factors).
    pub fn nvars(&self) -> usize {
        self.nvars
    }

    /// Number of lags.
    pub fn nlags(&self) -> usize {
        self.nlags
    }

    /// Dimension of the stacked state, `nvars * nlags`.
    pub fn state_dim(&self) -> usize {
        self.nvars * self.nlags
    }

    /// The `n x (n·p)` coefficient matrix `[A_1 | ... | A_p]`.
    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    /// The `n x n` innovation covariance `Σ`.
    pub fn innovations_variance(&self) -> &Array2<f64> {
        &self.innovations_variance
    }

    /// Coefficient block of lag `lag` (1-based, `1..=nlags`).
    ///
    /// # Panics
    ///
    /// Panics if `lag` is 0 or greater than `nlags`.
    pub fn lag(&self, lag: usize) -> ArrayView2<'_, f64> {
        assert!(
            lag >= 1 && lag <= self.nlags,
            "lag {lag} out of range 1..={}",
            self.nlags
        );
        let n = self.nvars;
        self.coefficients.slice(s![.., (lag - 1) * n..lag * n])
    }

    /// Returns a copy with new coefficients (same validation as [`VarDescriptor::new`]).
    pub fn with_coefficients(&self, coefficients: Array2<f64>) -> Result<Self, VarError> {
        Self::new(coefficients, self.innovations_variance.clone())
    }

    /// Companion matrix `T` of the stacked state (`nvars*nlags` square).
    pub fn companion(&self) -> Array2<f64> {
        companion_matrix(self.coefficients.view(), self.nlags)
    }

    /// Companion matrix of a state holding `max(blocks, nlags)` lagged
    /// blocks; lags beyond `nlags` have zero coefficients.
    pub fn companion_with_blocks(&self, blocks: usize) -> Array2<f64> {
        companion_matrix(self.coefficients.view(), blocks)
    }

    /// Innovation covariance embedded in the top-left block of a
    /// `(nvars·blocks)` square matrix.
    pub fn transition_covariance(&self, blocks: usize) -> Array2<f64> {
        let n = self.nvars * blocks.max(self.nlags);
        let mut q = Array2::zeros((n, n));
        q.slice_mut(s![..self.nvars, ..self.nvars])
            .assign(&self.innovations_variance);
        q
    }

    /// Spectral radius of the companion matrix.
    pub fn spectral_radius(&self) -> SpectralRadius {
        spectral_radius(&self.companion())
    }

    /// `true` iff all companion eigenvalues lie strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.spectral_radius().is_stable()
    }
}

fn check_symmetric(a: &Array2<f64>) -> Result<(), VarError> {
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tol = SYMMETRY_TOL * scale;
    let n = a.nrows();
    for i in 0..n {
        for j in 0..i {
            if (a[[i, j]] - a[[j, i]]).abs() > tol {
                return Err(VarError::NotSymmetric { row: i, col: j });
            }
        }
    }
    Ok(())
}

/// Builds the companion matrix from an `n x (n·p)` coefficient matrix for a
/// state of `max(blocks, p)` blocks.
///
/// The first block row holds the coefficients, block `(i, i-1)` is the
/// identity for `i >= 1`, everything else is zero.
pub fn companion_matrix(coefficients: ArrayView2<'_, f64>, blocks: usize) -> Array2<f64> {
    let (nb, cols) = coefficients.dim();
    if nb == 0 {
        return Array2::zeros((0, 0));
    }
    let n = nb * blocks.max(cols / nb);
    let mut t = Array2::zeros((n, n));
    t.slice_mut(s![..nb, ..cols]).assign(&coefficients);
    for i in nb..n {
        t[[i, i - nb]] = 1.0;
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn var2() -> VarDescriptor {
        VarDescriptor::new(
            array![[0.5, 0.1, 0.2, 0.0], [0.0, 0.3, 0.0, 0.1]],
            array![[1.0, 0.2], [0.2, 0.5]],
        )
        .unwrap()
    }

    #[test]
    fn infers_lags() {
        let v = var2();
        assert_eq!(v.nvars(), 2);
        assert_eq!(v.nlags(), 2);
        assert_eq!(v.state_dim(), 4);
    }

    #[test]
    fn rejects_empty() {
        let err = VarDescriptor::new(Array2::zeros((0, 0)), Array2::zeros((0, 0))).unwrap_err();
        assert!(matches!(err, VarError::Empty));
    }

    #[test]
    fn rejects_ragged_coefficients() {
        let err = VarDescriptor::new(Array2::zeros((2, 3)), Array2::eye(2)).unwrap_err();
        assert!(matches!(err, VarError::CoefficientShape { rows: 2, cols: 3 }));
    }

    #[test]
    fn rejects_covariance_shape() {
        let err = VarDescriptor::new(Array2::zeros((2, 2)), Array2::eye(3)).unwrap_err();
        assert!(matches!(err, VarError::CovarianceShape { expected: 2, .. }));
    }

    #[test]
    fn rejects_non_finite() {
        let err =
            VarDescriptor::new(array![[f64::NAN]], array![[1.0]]).unwrap_err();
        assert!(matches!(err, VarError::NonFinite));
    }

    #[test]
    fn lag_blocks() {
        let v = var2();
        assert_eq!(v.lag(1), array![[0.5, 0.1], [0.0, 0.3]]);
        assert_eq!(v.lag(2), array![[0.2, 0.0], [0.0, 0.1]]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn lag_zero_panics() {
        var2().lag(0);
    }

    #[test]
    fn companion_layout() {
        let t = var2().companion();
        assert_eq!(t.dim(), (4, 4));
        // first block row = coefficients
        assert_abs_diff_eq!(t[[0, 0]], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(t[[0, 2]], 0.2, epsilon = 1e-15);
        assert_abs_diff_eq!(t[[1, 3]], 0.1, epsilon = 1e-15);
        // identity shift
        assert_eq!(t[[2, 0]], 1.0);
        assert_eq!(t[[3, 1]], 1.0);
        assert_eq!(t[[2, 1]], 0.0);
        assert_eq!(t[[3, 3]], 0.0);
    }

    #[test]
    fn companion_with_extra_blocks() {
        let t = var2().companion_with_blocks(3);
        assert_eq!(t.dim(), (6, 6));
        assert_eq!(t[[0, 4]], 0.0);
        assert_eq!(t[[4, 2]], 1.0);
        assert_eq!(t[[5, 3]], 1.0);
    }

    #[test]
    fn transition_covariance_top_left() {
        let q = var2().transition_covariance(2);
        assert_eq!(q.dim(), (4, 4));
        assert_eq!(q[[0, 1]], 0.2);
        assert_eq!(q[[1, 1]], 0.5);
        assert_eq!(q[[2, 2]], 0.0);
    }

    #[test]
    fn rejects_asymmetric_covariance() {
        let err = VarDescriptor::new(
            array![[0.5, 0.0], [0.0, 0.5]],
            array![[1.0, 0.9], [0.0, 1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, VarError::NotSymmetric { row: 1, col: 0 }));
    }

    #[test]
    fn accepts_rounding_asymmetry() {
        let sigma = array![[2.0, 0.3 + 1e-14], [0.3, 1.0]];
        assert!(VarDescriptor::new(Array2::zeros((2, 2)), sigma).is_ok());
    }

    #[test]
    fn with_coefficients_copies() {
        let v = var2();
        let w = v.with_coefficients(Array2::zeros((2, 4))).unwrap();
        assert_eq!(w.innovations_variance(), v.innovations_variance());
        assert_eq!(v.coefficients()[[0, 0]], 0.5);
        assert_eq!(w.coefficients()[[0, 0]], 0.0);
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VarDescriptor>();
    }
}
