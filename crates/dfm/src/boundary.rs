//! What a numerical optimiser needs to know about a parameter space.

use crate::error::DfmError;
use crate::mapping::DfmMapping;
use crate::ssf::StateSpace;

/// Step used for numerical derivatives, see [`ParameterMapping::epsilon`].
pub const EPSILON: f64 = 1e-5;

/// Outcome of [`ParameterMapping::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamValidation {
    /// The parameters describe an admissible model.
    Valid,
    /// The parameters must be rejected by the optimiser.
    Invalid,
}

/// A mapping from flat parameter vectors to a model object.
pub trait ParameterMapping {
    /// What a parameter vector maps to.
    type Output;

    /// Number of parameters.
    fn dim(&self) -> usize;

    /// Maps a parameter vector to its output.
    fn map(&self, params: &[f64]) -> Result<Self::Output, DfmError>;

    /// Whether the optimiser may accept `params`.
    fn validate(&self, params: &[f64]) -> ParamValidation;

    /// Lower and upper bound of parameter `idx`. Unbounded by default.
    fn bounds(&self, _idx: usize) -> (f64, f64) {
        (f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Signed step for a numerical derivative of parameter `idx`: moves
    /// towards zero, `-EPSILON` for a positive value and `+EPSILON` otherwise.
    fn epsilon(&self, params: &[f64], idx: usize) -> f64 {
        if params.get(idx).is_some_and(|&v| v > 0.0) {
            -EPSILON
        } else {
            EPSILON
        }
    }

    /// Human-readable name of parameter `idx`.
    fn description(&self, idx: usize) -> String;
}

impl ParameterMapping for DfmMapping {
    type Output = StateSpace;

    fn dim(&self) -> usize {
        DfmMapping::dim(self)
    }

    fn map(&self, params: &[f64]) -> Result<StateSpace, DfmError> {
        self.to_model(params)?.ssf_representation()
    }

    fn validate(&self, params: &[f64]) -> ParamValidation {
        if self.check_stability(params) {
            ParamValidation::Valid
        } else {
            ParamValidation::Invalid
        }
    }

    fn description(&self, idx: usize) -> String {
        let layout = self.layout();
        let id = self.identification();
        if layout.loadings.contains(&idx) {
            let (m, f) = id.free_loadings()[idx - layout.loadings.start];
            format!("loading[{m},{f}]")
        } else if layout.measurement_scale.contains(&idx) {
            let m = id.free_scales()[idx - layout.measurement_scale.start];
            format!("scale[{m}]")
        } else if layout.var_coefficients.contains(&idx) {
            let cols = self.template().nfactors() * self.template().nlags();
            let k = idx - layout.var_coefficients.start;
            format!("var[{},{}]", k / cols, k % cols)
        } else if layout.covariance_factor.contains(&idx) {
            let k = idx - layout.covariance_factor.start;
            // row r starts at r(r+1)/2
            let mut r = 0;
            while (r + 1) * (r + 2) / 2 <= k {
                r += 1;
            }
            format!("chol[{},{}]", r, k - r * (r + 1) / 2)
        } else {
            format!("param[{idx}]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::MeasurementDescriptor;
    use crate::model::DynamicFactorModel;
    use ndarray::{Array2, array};
    use nowcast_var::VarDescriptor;

    fn mapping() -> DfmMapping {
        let var = VarDescriptor::new(Array2::from_elem((2, 4), 0.1), Array2::eye(2)).unwrap();
        let model = DynamicFactorModel::new(
            vec![
                MeasurementDescriptor::level(vec![Some(0.9), Some(0.1)], 1.0),
                MeasurementDescriptor::level(vec![Some(0.2), Some(-0.7)], 2.5),
                MeasurementDescriptor::level(vec![Some(0.5), None], 0.3),
            ],
            var,
        )
        .unwrap();
        DfmMapping::new(model)
    }

    #[test]
    fn descriptions_cover_every_segment() {
        let m = mapping();
        // loadings: (0,1), (1,0), (2,0); scales: 0, 2
        let names: Vec<String> = (0..ParameterMapping::dim(&m))
            .map(|i| m.description(i))
            .collect();
        assert_eq!(names.len(), 3 + 2 + 8 + 3);
        assert_eq!(names[0], "loading[0,1]");
        assert_eq!(names[1], "loading[1,0]");
        assert_eq!(names[2], "loading[2,0]");
        assert_eq!(names[3], "scale[0]");
        assert_eq!(names[4], "scale[2]");
        assert_eq!(names[5], "var[0,0]");
        assert_eq!(names[8], "var[0,3]");
        assert_eq!(names[9], "var[1,0]");
        assert_eq!(names[12], "var[1,3]");
        assert_eq!(names[13], "chol[0,0]");
        assert_eq!(names[14], "chol[1,0]");
        assert_eq!(names[15], "chol[1,1]");
        assert_eq!(m.description(99), "param[99]");
    }

    #[test]
    fn epsilon_moves_towards_zero() {
        let m = mapping();
        let p = [0.5, -0.5, 0.0];
        assert_eq!(m.epsilon(&p, 0), -EPSILON);
        assert_eq!(m.epsilon(&p, 1), EPSILON);
        assert_eq!(m.epsilon(&p, 2), EPSILON);
    }

    #[test]
    fn unbounded() {
        let (lo, hi) = mapping().bounds(3);
        assert_eq!(lo, f64::NEG_INFINITY);
        assert_eq!(hi, f64::INFINITY);
    }

    #[test]
    fn validate_follows_stability() {
        let var = VarDescriptor::new(array![[0.5]], array![[1.0]]).unwrap();
        let model = DynamicFactorModel::new(
            vec![
                MeasurementDescriptor::level(vec![Some(0.8)], 2.0),
                MeasurementDescriptor::level(vec![Some(0.3)], 0.5),
            ],
            var,
        )
        .unwrap();
        let m = DfmMapping::new(model);
        assert_eq!(m.validate(&[0.3, 0.7, 0.99, 1.0]), ParamValidation::Valid);
        assert_eq!(m.validate(&[0.3, 0.7, 1.01, 1.0]), ParamValidation::Invalid);
        assert_eq!(m.validate(&[0.3]), ParamValidation::Invalid);
    }

    #[test]
    fn unit_root_lag_polynomial_is_invalid() {
        let var = VarDescriptor::new(array![[0.5, 0.1]], array![[1.0]]).unwrap();
        let model = DynamicFactorModel::new(
            vec![
                MeasurementDescriptor::level(vec![Some(0.8)], 2.0),
                MeasurementDescriptor::level(vec![Some(0.3)], 0.5),
            ],
            var,
        )
        .unwrap();
        let m = DfmMapping::new(model);
        // roots 1 and 0.5
        assert_eq!(
            m.validate(&[0.3, 0.7, 1.5, -0.5, 1.0]),
            ParamValidation::Invalid
        );
        // roots 0.8 and 0.7
        let stable = [0.3, 0.7, 1.5, -0.56, 1.0];
        assert_eq!(m.validate(&stable), ParamValidation::Valid);
        assert!(m.map(&stable).is_ok());
    }

    #[test]
    fn map_builds_state_space() {
        let m = mapping();
        let p = m.default_parameters().unwrap();
        let ss = m.map(&p).unwrap();
        assert_eq!(ss.state_dim(), 4);
        assert_eq!(ss.loadings().dim(), (3, 4));
    }
}
