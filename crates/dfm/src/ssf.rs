//! State-space form of a dynamic factor model.
//!
//! ```text
//! s[t+1] = T s[t] + u[t],      u[t] ~ N(0, Q)
//! y[t]   = Z s[t] + e[t],      e[t] ~ N(0, diag(h))
//! s[0]   ~ N(0, P0)
//! ```
//!
//! The state holds `L` lagged factor blocks `(f[t], f[t-1], ..., f[t-L+1])`.
//! Filtering is left to the caller.

use ndarray::{Array1, Array2, s};
use nowcast_var::{VarDescriptor, unconditional_covariance_with_lags};

use crate::error::DfmError;
use crate::measurement::MeasurementDescriptor;

/// How the initial state covariance `P0` is obtained.
#[derive(Clone, Debug, PartialEq)]
pub enum Initialization {
    /// Stationary covariance of the stacked factors.
    Unconditional,
    /// A user-provided matrix, either for the full state or for the
    /// `nfactors·nlags` VAR state (zero-padded).
    Supplied(Array2<f64>),
}

/// System matrices handed to a Kalman filter.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSpace {
    nfactors: usize,
    block_length: usize,
    transition: Array2<f64>,
    transition_covariance: Array2<f64>,
    loadings: Array2<f64>,
    measurement_variances: Array1<f64>,
    initial_mean: Array1<f64>,
    initial_covariance: Array2<f64>,
}

impl StateSpace {
    /// Assembles the state-space form.
    ///
    /// The state holds `L = max(nlags, lags, longest measurement polynomial)`
    /// blocks. Row `i` of `Z` is `coefficient(i, j) · weight_l` at column
    /// `l·nfactors + j`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`DfmError::NoMeasurements`] | `measurements` is empty |
    /// | [`DfmError::CoefficientCount`] | a measurement does not have `nfactors` slots |
    /// | [`DfmError::InitialCovarianceShape`] | a supplied `P0` has neither accepted shape |
    /// | [`DfmError::Var`] | the stationary covariance cannot be solved |
    #[tracing::instrument(skip(var, measurements, init), fields(nfactors = var.nvars(), nlags = var.nlags()))]
    pub fn assemble(
        var: &VarDescriptor,
        measurements: &[MeasurementDescriptor],
        init: Initialization,
        lags: usize,
    ) -> Result<Self, DfmError> {
        let nb = var.nvars();
        if measurements.is_empty() {
            return Err(DfmError::NoMeasurements);
        }
        if let Some((i, m)) = measurements
            .iter()
            .enumerate()
            .find(|(_, m)| m.coefficients().len() != nb)
        {
            return Err(DfmError::CoefficientCount {
                measurement: i,
                expected: nb,
                got: m.coefficients().len(),
            });
        }

        let block_length = measurements
            .iter()
            .map(|m| m.mtype().length())
            .fold(var.nlags().max(lags), usize::max);
        let n = nb * block_length;

        let mut loadings = Array2::zeros((measurements.len(), n));
        for (i, m) in measurements.iter().enumerate() {
            for (l, w) in m.mtype().weights().into_iter().enumerate() {
                for (j, c) in m.coefficients().iter().enumerate() {
                    if let Some(c) = c {
                        loadings[[i, l * nb + j]] = c * w;
                    }
                }
            }
        }

        let initial_covariance = match init {
            Initialization::Unconditional => unconditional_covariance_with_lags(var, block_length)?,
            Initialization::Supplied(p0) => pad_initial_covariance(p0, n, var.state_dim())?,
        };

        Ok(Self {
            nfactors: nb,
            block_length,
            transition: var.companion_with_blocks(block_length),
            transition_covariance: var.transition_covariance(block_length),
            loadings,
            measurement_variances: measurements.iter().map(|m| m.variance()).collect(),
            initial_mean: Array1::zeros(n),
            initial_covariance,
        })
    }

    /// Number of factors.
    pub fn nfactors(&self) -> usize {
        self.nfactors
    }

    /// Number of factor blocks in the state.
    pub fn block_length(&self) -> usize {
        self.block_length
    }

    /// State dimension `nfactors · block_length`.
    pub fn state_dim(&self) -> usize {
        self.nfactors * self.block_length
    }

    /// Number of observed series.
    pub fn measurement_count(&self) -> usize {
        self.loadings.nrows()
    }

    /// Transition matrix `T`.
    pub fn transition(&self) -> &Array2<f64> {
        &self.transition
    }

    /// Transition noise covariance `Q`, non-zero only in the top-left block.
    pub fn transition_covariance(&self) -> &Array2<f64> {
        &self.transition_covariance
    }

    /// Measurement matrix `Z`.
    pub fn loadings(&self) -> &Array2<f64> {
        &self.loadings
    }

    /// Measurement noise variances `h`.
    pub fn measurement_variances(&self) -> &Array1<f64> {
        &self.measurement_variances
    }

    /// Initial state mean (zero).
    pub fn initial_mean(&self) -> &Array1<f64> {
        &self.initial_mean
    }

    /// Initial state covariance `P0`.
    pub fn initial_covariance(&self) -> &Array2<f64> {
        &self.initial_covariance
    }
}

fn pad_initial_covariance(
    p0: Array2<f64>,
    n: usize,
    var_dim: usize,
) -> Result<Array2<f64>, DfmError> {
    let (rows, cols) = p0.dim();
    if rows == n && cols == n {
        return Ok(p0);
    }
    if rows == var_dim && cols == var_dim {
        let mut padded = Array2::zeros((n, n));
        padded.slice_mut(s![..var_dim, ..var_dim]).assign(&p0);
        return Ok(padded);
    }
    Err(DfmError::InitialCovarianceShape {
        expected: n,
        rows,
        cols,
    })
}
