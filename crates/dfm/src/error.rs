//! Error types for the nowcast-dfm crate.

use nowcast_var::VarError;

/// Error type for all fallible operations in the nowcast-dfm crate.
///
/// Model validation failures, parameter-vector mismatches, state-space
/// assembly problems and errors bubbling up from the VAR layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DfmError {
    /// Returned when a model has no measurement equation.
    #[error("model has no measurements")]
    NoMeasurements,

    /// Returned when a measurement does not have one coefficient slot per factor.
    #[error("measurement {measurement} has {got} coefficients, expected {expected}")]
    CoefficientCount {
        /// Index of the measurement.
        measurement: usize,
        /// Number of factors.
        expected: usize,
        /// Number of coefficient slots supplied.
        got: usize,
    },

    /// Returned when a loaded coefficient is NaN or infinite.
    #[error("measurement {measurement} has a non-finite loading on factor {factor}")]
    NonFiniteCoefficient {
        /// Index of the measurement.
        measurement: usize,
        /// Index of the factor.
        factor: usize,
    },

    /// Returned when a measurement variance is negative or not finite.
    #[error("measurement {measurement} has invalid variance {value} (must be finite and >= 0)")]
    InvalidVariance {
        /// Index of the measurement.
        measurement: usize,
        /// The invalid value.
        value: f64,
    },

    /// Returned when no measurement loads on a factor.
    #[error("factor {factor} is not loaded by any measurement")]
    UnloadedFactor {
        /// Index of the factor.
        factor: usize,
    },

    /// Returned when a measurement type is malformed.
    #[error("invalid measurement type: {reason}")]
    InvalidMeasurementType {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a parameter vector has the wrong length.
    #[error("parameter vector has length {got}, expected {expected}")]
    ParameterLength {
        /// Dimension of the mapping.
        expected: usize,
        /// Length supplied.
        got: usize,
    },

    /// Returned when a model does not share the template's structure.
    #[error("model is incompatible with the mapping template: {reason}")]
    IncompatibleModel {
        /// Description of the mismatch.
        reason: String,
    },

    /// Returned when a supplied initial covariance has the wrong shape.
    #[error("initial covariance must be {expected}x{expected} (or the VAR state size), got {rows}x{cols}")]
    InitialCovarianceShape {
        /// State dimension.
        expected: usize,
        /// Rows supplied.
        rows: usize,
        /// Columns supplied.
        cols: usize,
    },

    /// Returned when the optimiser fails or produces no best parameter.
    #[error("optimisation failed: {reason}")]
    OptimizationFailed {
        /// Description of the failure.
        reason: String,
    },

    /// Error from the VAR layer.
    #[error(transparent)]
    Var(#[from] VarError),
}
