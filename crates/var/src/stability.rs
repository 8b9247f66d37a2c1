//! Stationarity check through the spectral radius of the companion matrix.

use ndarray::Array2;
use tracing::debug;

use crate::linalg::to_dmatrix;

/// Schur sweeps allowed per matrix dimension before giving up.
const MAX_SWEEPS_PER_DIM: usize = 200;

/// Radii within this distance of 1 count as unit roots.
pub const UNIT_ROOT_TOL: f64 = 1e-10;

/// Outcome of a spectral-radius computation.
///
/// A failed eigen-decomposition is not an error: it is reported as
/// [`SpectralRadius::Degenerate`], which callers treat as unstable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpectralRadius {
    /// Largest eigenvalue modulus.
    Finite(f64),
    /// The decomposition did not converge, or the matrix or its eigenvalues
    /// were not finite.
    Degenerate,
}

impl SpectralRadius {
    /// `true` iff the radius is finite and below `1 - UNIT_ROOT_TOL`.
    pub fn is_stable(&self) -> bool {
        matches!(self, Self::Finite(r) if *r < 1.0 - UNIT_ROOT_TOL)
    }

    /// The radius, if the decomposition succeeded.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Finite(r) => Some(*r),
            Self::Degenerate => None,
        }
    }
}

/// Largest eigenvalue modulus of a square matrix (complex eigenvalues
/// included).
pub fn spectral_radius(m: &Array2<f64>) -> SpectralRadius {
    let n = m.nrows();
    debug_assert_eq!(n, m.ncols(), "spectral_radius: matrix must be square");
    if n == 0 {
        return SpectralRadius::Finite(0.0);
    }
    if m.iter().any(|v| !v.is_finite()) {
        debug!(dim = n, "non-finite matrix entries");
        return SpectralRadius::Degenerate;
    }

    let Some(schur) = to_dmatrix(m).try_schur(f64::EPSILON, MAX_SWEEPS_PER_DIM * n) else {
        debug!(dim = n, "schur decomposition did not converge");
        return SpectralRadius::Degenerate;
    };

    let mut radius: f64 = 0.0;
    for z in schur.complex_eigenvalues().iter() {
        let modulus = z.norm();
        if !modulus.is_finite() {
            debug!(dim = n, "non-finite eigenvalue");
            return SpectralRadius::Degenerate;
        }
        radius = radius.max(modulus);
    }
    SpectralRadius::Finite(radius)
}
