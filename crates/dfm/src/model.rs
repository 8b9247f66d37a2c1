//! The dynamic factor model: measurement equations plus VAR factor dynamics.

use ndarray::{Array1, Array2};
use nowcast_var::VarDescriptor;

use crate::error::DfmError;
use crate::measurement::MeasurementDescriptor;
use crate::ssf::{Initialization, StateSpace};

/// A dynamic factor model.
///
/// `nfactors` latent factors follow the VAR in [`DynamicFactorModel::var`];
/// each observed series is described by one [`MeasurementDescriptor`], in a
/// stable order that identifies the series.
///
/// Values are immutable: the `with_*` methods return new models.
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicFactorModel {
    measurements: Vec<MeasurementDescriptor>,
    var: VarDescriptor,
}

impl DynamicFactorModel {
    /// Creates a model after validating the measurements against the VAR.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`DfmError::NoMeasurements`] | `measurements` is empty |
    /// | [`DfmError::CoefficientCount`] | a measurement does not have `nfactors` slots |
    /// | [`DfmError::NonFiniteCoefficient`] | a loaded coefficient is NaN or infinite |
    /// | [`DfmError::InvalidVariance`] | a variance is negative or not finite |
    /// | [`DfmError::InvalidMeasurementType`] | a cumulated type has zero length |
    /// | [`DfmError::UnloadedFactor`] | no measurement loads on some factor |
    pub fn new(
        measurements: Vec<MeasurementDescriptor>,
        var: VarDescriptor,
    ) -> Result<Self, DfmError> {
        validate(&measurements, var.nvars())?;
        Ok(Self { measurements, var })
    }

    /// Number of factors.
    pub fn nfactors(&self) -> usize {
        self.var.nvars()
    }

    /// Number of VAR lags.
    pub fn nlags(&self) -> usize {
        self.var.nlags()
    }

    /// Measurement equations, in series order.
    pub fn measurements(&self) -> &[MeasurementDescriptor] {
        &self.measurements
    }

    /// Number of observed series.
    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }

    /// Factor dynamics.
    pub fn var(&self) -> &VarDescriptor {
        &self.var
    }

    /// Number of lagged factor blocks the state must hold: the VAR order or
    /// the longest measurement lag polynomial, whichever is larger.
    pub fn block_length(&self) -> usize {
        self.measurements
            .iter()
            .map(|m| m.mtype().length())
            .fold(self.nlags(), usize::max)
    }

    /// `nmeasurements x nfactors` loadings, NaN where a series does not load.
    pub fn loadings_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.measurement_count(), self.nfactors()), |(i, j)| {
            self.measurements[i].coefficient(j).unwrap_or(f64::NAN)
        })
    }

    /// Idiosyncratic variances, in series order.
    pub fn measurement_variances(&self) -> Array1<f64> {
        self.measurements.iter().map(|m| m.variance()).collect()
    }

    /// Returns a copy with new measurements (validated).
    pub fn with_measurements(
        &self,
        measurements: Vec<MeasurementDescriptor>,
    ) -> Result<Self, DfmError> {
        Self::new(measurements, self.var.clone())
    }

    /// Returns a copy with new factor dynamics (validated; the factor count
    /// must not change).
    pub fn with_var(&self, var: VarDescriptor) -> Result<Self, DfmError> {
        Self::new(self.measurements.clone(), var)
    }

    /// State-space form initialised with the unconditional covariance of the
    /// factors, holding [`DynamicFactorModel::block_length`] blocks.
    pub fn ssf_representation(&self) -> Result<StateSpace, DfmError> {
        StateSpace::assemble(
            &self.var,
            &self.measurements,
            Initialization::Unconditional,
            self.block_length(),
        )
    }
}

fn validate(measurements: &[MeasurementDescriptor], nfactors: usize) -> Result<(), DfmError> {
    if measurements.is_empty() {
        return Err(DfmError::NoMeasurements);
    }
    for (i, m) in measurements.iter().enumerate() {
        if m.coefficients().len() != nfactors {
            return Err(DfmError::CoefficientCount {
                measurement: i,
                expected: nfactors,
                got: m.coefficients().len(),
            });
        }
        if let Some(factor) = m
            .coefficients()
            .iter()
            .position(|c| c.is_some_and(|v| !v.is_finite()))
        {
            return Err(DfmError::NonFiniteCoefficient {
                measurement: i,
                factor,
            });
        }
        if !m.variance().is_finite() || m.variance() < 0.0 {
            return Err(DfmError::InvalidVariance {
                measurement: i,
                value: m.variance(),
            });
        }
        m.mtype().validate()?;
    }
    if let Some(factor) = (0..nfactors).find(|&j| !measurements.iter().any(|m| m.is_loaded(j))) {
        return Err(DfmError::UnloadedFactor { factor });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::MeasurementType;
    use ndarray::array;

    fn var(nb: usize, nl: usize) -> VarDescriptor {
        VarDescriptor::new(Array2::zeros((nb, nb * nl)), Array2::eye(nb)).unwrap()
    }

    fn two_factor_model() -> DynamicFactorModel {
        DynamicFactorModel::new(
            vec![
                MeasurementDescriptor::level(vec![Some(1.0), None], 0.5),
                MeasurementDescriptor::level(vec![Some(0.4), Some(0.9)], 1.5),
                MeasurementDescriptor::new(
                    MeasurementType::Cumulated { length: 3 },
                    vec![None, Some(0.2)],
                    0.1,
                ),
            ],
            var(2, 2),
        )
        .unwrap()
    }

    #[test]
    fn accessors() {
        let m = two_factor_model();
        assert_eq!(m.nfactors(), 2);
        assert_eq!(m.nlags(), 2);
        assert_eq!(m.measurement_count(), 3);
        assert_eq!(m.block_length(), 3);
        assert_eq!(m.measurement_variances(), array![0.5, 1.5, 0.1]);
    }

    #[test]
    fn loadings_matrix_marks_missing() {
        let l = two_factor_model().loadings_matrix();
        assert_eq!(l.dim(), (3, 2));
        assert_eq!(l[[0, 0]], 1.0);
        assert!(l[[0, 1]].is_nan());
        assert!(l[[2, 0]].is_nan());
        assert_eq!(l[[1, 1]], 0.9);
    }

    #[test]
    fn rejects_empty() {
        let err = DynamicFactorModel::new(vec![], var(1, 1)).unwrap_err();
        assert!(matches!(err, DfmError::NoMeasurements));
    }

    #[test]
    fn rejects_wrong_coefficient_count() {
        let err = DynamicFactorModel::new(
            vec![MeasurementDescriptor::level(vec![Some(1.0)], 1.0)],
            var(2, 1),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DfmError::CoefficientCount {
                measurement: 0,
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn rejects_negative_variance() {
        let err = DynamicFactorModel::new(
            vec![MeasurementDescriptor::level(vec![Some(1.0)], -0.1)],
            var(1, 1),
        )
        .unwrap_err();
        assert!(matches!(err, DfmError::InvalidVariance { measurement: 0, .. }));
    }

    #[test]
    fn rejects_non_finite_loading() {
        let err = DynamicFactorModel::new(
            vec![MeasurementDescriptor::level(vec![Some(f64::INFINITY)], 1.0)],
            var(1, 1),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DfmError::NonFiniteCoefficient {
                measurement: 0,
                factor: 0
            }
        ));
    }

    #[test]
    fn rejects_unloaded_factor() {
        let err = DynamicFactorModel::new(
            vec![
                MeasurementDescriptor::level(vec![Some(1.0), None], 1.0),
                MeasurementDescriptor::level(vec![Some(0.5), None], 1.0),
            ],
            var(2, 1),
        )
        .unwrap_err();
        assert!(matches!(err, DfmError::UnloadedFactor { factor: 1 }));
    }

    #[test]
    fn rejects_zero_length_type() {
        let err = DynamicFactorModel::new(
            vec![MeasurementDescriptor::new(
                MeasurementType::Cumulated { length: 0 },
                vec![Some(1.0)],
                1.0,
            )],
            var(1, 1),
        )
        .unwrap_err();
        assert!(matches!(err, DfmError::InvalidMeasurementType { .. }));
    }

    #[test]
    fn with_var_keeps_measurements() {
        let m = two_factor_model();
        let v = VarDescriptor::new(Array2::from_elem((2, 4), 0.1), Array2::eye(2)).unwrap();
        let n = m.with_var(v.clone()).unwrap();
        assert_eq!(n.var(), &v);
        assert_eq!(n.measurements(), m.measurements());
        assert_ne!(m.var(), &v);
    }

    #[test]
    fn with_var_rejects_factor_count_change() {
        let m = two_factor_model();
        assert!(m.with_var(var(3, 1)).is_err());
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DynamicFactorModel>();
    }
}
