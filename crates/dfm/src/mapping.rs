//! Bijection between a [`DynamicFactorModel`] and a flat parameter vector.
//!
//! The vector is laid out as described by [`SegmentLayout`]:
//!
//! ```text
//! [ loadings | measurement_scale | var_coefficients | covariance_factor ]
//! ```
//!
//! Variances enter through their square roots and the innovation covariance
//! through its lower Cholesky factor, so any real vector maps to a model with
//! non-negative variances and a positive-semidefinite covariance.

use ndarray::Array2;
use nowcast_var::linalg::{lower_cholesky, xxt};
use nowcast_var::{VarDescriptor, companion_matrix, spectral_radius};
use tracing::trace;

use crate::error::DfmError;
use crate::identification::{FixedBlocks, Identification, SegmentLayout};
use crate::model::DynamicFactorModel;

/// Parameter mapping of a dynamic factor model around a template.
///
/// The template fixes the structure (factor count, lags, measurement types,
/// which loadings exist) and supplies the values of everything that is not
/// estimated. The identification scheme is frozen at construction.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use nowcast_dfm::{DfmMapping, DynamicFactorModel, MeasurementDescriptor};
/// use nowcast_var::VarDescriptor;
///
/// let var = VarDescriptor::new(array![[0.5]], array![[1.0]]).unwrap();
/// let model = DynamicFactorModel::new(
///     vec![
///         MeasurementDescriptor::level(vec![Some(0.8)], 2.0),
///         MeasurementDescriptor::level(vec![Some(0.3)], 0.5),
///     ],
///     var,
/// )
/// .unwrap();
///
/// let mapping = DfmMapping::new(model);
/// assert_eq!(mapping.dim(), 4);
///
/// let p = mapping.default_parameters().unwrap();
/// let back = mapping.to_model(&p).unwrap();
/// assert_eq!(back.measurements()[1].coefficient(0), Some(0.3));
/// ```
#[derive(Clone, Debug)]
pub struct DfmMapping {
    template: DynamicFactorModel,
    fixed: FixedBlocks,
    identification: Identification,
}

impl DfmMapping {
    /// Mapping with every block estimated.
    pub fn new(template: DynamicFactorModel) -> Self {
        Self::with_fixed_blocks(template, FixedBlocks::NONE)
    }

    /// Mapping with the given blocks held at their template values.
    pub fn with_fixed_blocks(template: DynamicFactorModel, fixed: FixedBlocks) -> Self {
        let identification = Identification::new(&template, fixed);
        Self {
            template,
            fixed,
            identification,
        }
    }

    /// The template model.
    pub fn template(&self) -> &DynamicFactorModel {
        &self.template
    }

    /// Which blocks are fixed.
    pub fn fixed_blocks(&self) -> FixedBlocks {
        self.fixed
    }

    /// The frozen identification scheme.
    pub fn identification(&self) -> &Identification {
        &self.identification
    }

    /// Segment positions in the parameter vector.
    pub fn layout(&self) -> &SegmentLayout {
        self.identification.layout()
    }

    /// Number of parameters.
    pub fn dim(&self) -> usize {
        self.layout().dim()
    }

    /// Rebuilds a model from a parameter vector.
    ///
    /// # Errors
    ///
    /// [`DfmError::ParameterLength`] when `params.len() != dim()`, checked
    /// before anything else. Non-finite entries fail model validation.
    pub fn to_model(&self, params: &[f64]) -> Result<DynamicFactorModel, DfmError> {
        self.check_length(params)?;
        trace!(dim = params.len(), "parameters to model");

        let id = &self.identification;
        let layout = id.layout();

        let mut coefficients: Vec<Vec<Option<f64>>> = self
            .template
            .measurements()
            .iter()
            .map(|m| m.coefficients().to_vec())
            .collect();
        let mut variances: Vec<f64> = self
            .template
            .measurements()
            .iter()
            .map(|m| m.variance())
            .collect();

        for (factor, anchor) in id.loading_anchors().iter().enumerate() {
            coefficients[anchor.measurement][factor] = Some(anchor.value);
        }
        for (&(i, j), &x) in id.free_loadings().iter().zip(&params[layout.loadings.clone()]) {
            coefficients[i][j] = Some(x);
        }
        if let Some(anchor) = id.variance_anchor() {
            variances[anchor.measurement] = anchor.value;
        }
        for (&i, &x) in id
            .free_scales()
            .iter()
            .zip(&params[layout.measurement_scale.clone()])
        {
            variances[i] = x * x;
        }

        let measurements = self
            .template
            .measurements()
            .iter()
            .zip(coefficients)
            .zip(variances)
            .map(|((m, c), v)| m.with_coefficients(c).with_variance(v))
            .collect();

        let var = if self.fixed.transition {
            self.template.var().clone()
        } else {
            VarDescriptor::new(
                self.coefficients_from(params),
                xxt(&self.cholesky_from(params)),
            )?
        };

        DynamicFactorModel::new(measurements, var)
    }

    /// Extracts the parameter vector of a model sharing the template's
    /// structure.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`DfmError::IncompatibleModel`] | factor, lag or measurement count, measurement type or loading pattern differs from the template |
    /// | [`DfmError::Var`] | the innovation covariance is not positive semidefinite |
    pub fn to_parameters(&self, model: &DynamicFactorModel) -> Result<Vec<f64>, DfmError> {
        self.check_compatible(model)?;
        trace!(dim = self.dim(), "model to parameters");

        let id = &self.identification;
        let mut params = Vec::with_capacity(self.dim());

        for &(i, j) in id.free_loadings() {
            params.push(model.measurements()[i].coefficient(j).unwrap_or_default());
        }
        for &i in id.free_scales() {
            params.push(model.measurements()[i].variance().sqrt());
        }
        if !self.fixed.transition {
            params.extend(model.var().coefficients().iter().copied());
            let l = lower_cholesky(model.var().innovations_variance())?;
            for r in 0..l.nrows() {
                params.extend((0..=r).map(|c| l[[r, c]]));
            }
        }
        Ok(params)
    }

    /// Parameters of the template itself.
    pub fn default_parameters(&self) -> Result<Vec<f64>, DfmError> {
        self.to_parameters(&self.template)
    }

    /// `true` when the VAR encoded in `params` is stationary.
    ///
    /// Always `true` when the transition block is fixed, `false` when the
    /// vector has the wrong length.
    pub fn check_stability(&self, params: &[f64]) -> bool {
        if params.len() != self.dim() {
            return false;
        }
        if self.layout().var_coefficients.is_empty() {
            return true;
        }
        let t = companion_matrix(self.coefficients_from(params).view(), self.template.nlags());
        spectral_radius(&t).is_stable()
    }

    fn check_length(&self, params: &[f64]) -> Result<(), DfmError> {
        if params.len() != self.dim() {
            return Err(DfmError::ParameterLength {
                expected: self.dim(),
                got: params.len(),
            });
        }
        Ok(())
    }

    /// `nb x (nb·nl)` coefficients read row-major from the VAR segment.
    fn coefficients_from(&self, params: &[f64]) -> Array2<f64> {
        let nb = self.template.nfactors();
        let cols = nb * self.template.nlags();
        let seg = &params[self.layout().var_coefficients.clone()];
        Array2::from_shape_fn((nb, cols), |(r, c)| seg[r * cols + c])
    }

    /// Lower triangular factor read row by row from the covariance segment.
    fn cholesky_from(&self, params: &[f64]) -> Array2<f64> {
        let nb = self.template.nfactors();
        let seg = &params[self.layout().covariance_factor.clone()];
        Array2::from_shape_fn((nb, nb), |(r, c)| {
            if c <= r { seg[r * (r + 1) / 2 + c] } else { 0.0 }
        })
    }

    fn check_compatible(&self, model: &DynamicFactorModel) -> Result<(), DfmError> {
        let t = &self.template;
        let mismatch = |reason: String| Err(DfmError::IncompatibleModel { reason });

        if model.nfactors() != t.nfactors() {
            return mismatch(format!(
                "{} factors, expected {}",
                model.nfactors(),
                t.nfactors()
            ));
        }
        if model.nlags() != t.nlags() {
            return mismatch(format!("{} lags, expected {}", model.nlags(), t.nlags()));
        }
        if model.measurement_count() != t.measurement_count() {
            return mismatch(format!(
                "{} measurements, expected {}",
                model.measurement_count(),
                t.measurement_count()
            ));
        }
        for (i, (m, tm)) in model.measurements().iter().zip(t.measurements()).enumerate() {
            if m.mtype() != tm.mtype() {
                return mismatch(format!(
                    "measurement {i} has type {:?}, expected {:?}",
                    m.mtype(),
                    tm.mtype()
                ));
            }
            let same_pattern = m
                .coefficients()
                .iter()
                .zip(tm.coefficients())
                .all(|(a, b)| a.is_some() == b.is_some());
            if !same_pattern {
                return mismatch(format!("measurement {i} has a different loading pattern"));
            }
        }
        Ok(())
    }
}
