//! Error types for the nowcast-var crate.

/// Error type for all fallible operations in the nowcast-var crate.
///
/// Covers shape and symmetry validation of VAR descriptors and the numerical
/// failures of the Cholesky factorisation and the steady-state solver.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VarError {
    /// Returned when the coefficient matrix has no rows or no columns.
    #[error("VAR must have at least one variable and one lag")]
    Empty,

    /// Returned when the coefficient matrix is not `n x (n * nlags)`.
    #[error("coefficient matrix must be n x (n * nlags), got {rows}x{cols}")]
    CoefficientShape {
        /// Number of rows (variables).
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Returned when the innovation covariance is not `n x n`.
    #[error("innovation covariance must be {expected}x{expected}, got {rows}x{cols}")]
    CovarianceShape {
        /// Number of VAR variables.
        expected: usize,
        /// Number of rows supplied.
        rows: usize,
        /// Number of columns supplied.
        cols: usize,
    },

    /// Returned when a coefficient or covariance entry is NaN or infinite.
    #[error("VAR contains non-finite values")]
    NonFinite,

    /// Returned when the innovation covariance is not symmetric.
    #[error("innovation covariance is not symmetric at ({row}, {col})")]
    NotSymmetric {
        /// Row of the first mismatching entry.
        row: usize,
        /// Column of the first mismatching entry.
        col: usize,
    },

    /// Returned when a Cholesky factorisation meets a negative pivot.
    #[error("matrix is not positive semidefinite (pivot {pivot})")]
    NotPositiveSemidefinite {
        /// Index of the failing pivot.
        pivot: usize,
    },

    /// Returned when the steady-state linear system cannot be solved.
    #[error("steady-state system of dimension {dim} is singular")]
    SingularSystem {
        /// Number of unknowns in the system.
        dim: usize,
    },
}
