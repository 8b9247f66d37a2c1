//! Measurement equations of a dynamic factor model.

use crate::error::DfmError;

/// How an observed series aggregates the current and lagged factor values.
///
/// The loading of a measurement on a factor multiplies a fixed lag
/// polynomial given by [`MeasurementType::weights`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasurementType {
    /// The series loads on the current factor value only.
    Level,
    /// The series loads on the sum of the last `length` factor values.
    Cumulated {
        /// Number of periods summed.
        length: usize,
    },
    /// The series loads on the difference of two consecutive cumulated
    /// sums of `length` periods: weights `1, 2, ..., length, ..., 2, 1`.
    CumulatedDifferences {
        /// Number of periods in each cumulated sum.
        length: usize,
    },
}

impl MeasurementType {
    /// Number of factor lags involved (length of [`MeasurementType::weights`]).
    pub fn length(&self) -> usize {
        match *self {
            Self::Level => 1,
            Self::Cumulated { length } => length,
            Self::CumulatedDifferences { length } => (2 * length).saturating_sub(1),
        }
    }

    /// Weights applied to `f[t], f[t-1], ...`.
    pub fn weights(&self) -> Vec<f64> {
        match *self {
            Self::Level => vec![1.0],
            Self::Cumulated { length } => vec![1.0; length],
            Self::CumulatedDifferences { length } => (1..=length)
                .chain((1..length).rev())
                .map(|w| w as f64)
                .collect(),
        }
    }

    /// Checks that cumulated types span at least one period.
    pub fn validate(&self) -> Result<(), DfmError> {
        match *self {
            Self::Level => Ok(()),
            Self::Cumulated { length } | Self::CumulatedDifferences { length } => {
                if length == 0 {
                    Err(DfmError::InvalidMeasurementType {
                        reason: format!("{self:?}: length must be at least 1"),
                    })
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// One measurement equation: loadings on each factor plus the variance of
/// the idiosyncratic noise.
///
/// A coefficient of `None` means the series does not load on that factor;
/// such coefficients are never estimated.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementDescriptor {
    mtype: MeasurementType,
    coefficients: Vec<Option<f64>>,
    variance: f64,
}

impl MeasurementDescriptor {
    /// Creates a measurement. Shape checks happen when it is added to a
    /// [`DynamicFactorModel`](crate::DynamicFactorModel).
    pub fn new(mtype: MeasurementType, coefficients: Vec<Option<f64>>, variance: f64) -> Self {
        Self {
            mtype,
            coefficients,
            variance,
        }
    }

    /// Creates a [`MeasurementType::Level`] measurement.
    pub fn level(coefficients: Vec<Option<f64>>, variance: f64) -> Self {
        Self::new(MeasurementType::Level, coefficients, variance)
    }

    /// The measurement type.
    pub fn mtype(&self) -> MeasurementType {
        self.mtype
    }

    /// Loadings, one slot per factor.
    pub fn coefficients(&self) -> &[Option<f64>] {
        &self.coefficients
    }

    /// Loading on factor `factor`, or `None` when not loaded.
    ///
    /// # Panics
    ///
    /// Panics if `factor` is out of range.
    pub fn coefficient(&self, factor: usize) -> Option<f64> {
        self.coefficients[factor]
    }

    /// `true` when the series loads on `factor`.
    pub fn is_loaded(&self, factor: usize) -> bool {
        self.coefficients.get(factor).is_some_and(Option::is_some)
    }

    /// Number of loaded coefficients.
    pub fn loaded_count(&self) -> usize {
        self.coefficients.iter().filter(|c| c.is_some()).count()
    }

    /// Idiosyncratic noise variance.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Returns a copy with new coefficients.
    pub fn with_coefficients(&self, coefficients: Vec<Option<f64>>) -> Self {
        Self {
            coefficients,
            ..self.clone()
        }
    }

    /// Returns a copy with a new variance.
    pub fn with_variance(&self, variance: f64) -> Self {
        Self {
            variance,
            ..self.clone()
        }
    }
}
