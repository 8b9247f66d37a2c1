//! Nelder-Mead minimisation over a [`ParameterMapping`].
//!
//! The objective (typically a negative log-likelihood from a Kalman filter)
//! is supplied by the caller and evaluated on the mapped output.

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use tracing::debug;

use crate::boundary::{ParamValidation, ParameterMapping};
use crate::error::DfmError;

/// Default iteration cap for [`minimize`].
pub const DEFAULT_MAX_ITERS: u64 = 1000;

/// Offset of each initial simplex vertex from the start vector.
const SIMPLEX_STEP: f64 = 0.5;

/// argmin cost function: objective of the mapped parameters.
///
/// Vectors rejected by [`ParameterMapping::validate`], vectors that fail to
/// map and non-finite objective values all cost `f64::MAX`.
pub struct MappedCost<'a, M, F> {
    mapping: &'a M,
    objective: F,
}

impl<'a, M, F> MappedCost<'a, M, F>
where
    M: ParameterMapping,
    F: Fn(&M::Output) -> f64,
{
    /// Wraps a mapping and an objective on its output.
    pub fn new(mapping: &'a M, objective: F) -> Self {
        Self { mapping, objective }
    }

    fn evaluate(&self, params: &[f64]) -> f64 {
        if self.mapping.validate(params) == ParamValidation::Invalid {
            return f64::MAX;
        }
        match self.mapping.map(params) {
            Ok(output) => {
                let value = (self.objective)(&output);
                if value.is_finite() { value } else { f64::MAX }
            }
            Err(_) => f64::MAX,
        }
    }
}

impl<M, F> CostFunction for MappedCost<'_, M, F>
where
    M: ParameterMapping,
    F: Fn(&M::Output) -> f64,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.evaluate(params))
    }
}

/// Result of [`minimize`].
#[derive(Clone, Debug, PartialEq)]
pub struct Minimum {
    /// Best parameter vector found.
    pub params: Vec<f64>,
    /// Objective at `params`.
    pub cost: f64,
    /// Iterations performed.
    pub iterations: u64,
}

/// Minimises `objective` over the parameter space of `mapping` with
/// Nelder-Mead, starting from `start`.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`DfmError::ParameterLength`] | `start` does not have `mapping.dim()` entries |
/// | [`DfmError::OptimizationFailed`] | argmin fails or returns no best parameter |
pub fn minimize<M, F>(
    mapping: &M,
    objective: F,
    start: &[f64],
    max_iters: u64,
) -> Result<Minimum, DfmError>
where
    M: ParameterMapping,
    F: Fn(&M::Output) -> f64,
{
    let dim = mapping.dim();
    if start.len() != dim {
        return Err(DfmError::ParameterLength {
            expected: dim,
            got: start.len(),
        });
    }

    let cost = MappedCost::new(mapping, objective);

    // nothing to move
    if dim == 0 {
        return Ok(Minimum {
            params: Vec::new(),
            cost: cost.evaluate(start),
            iterations: 0,
        });
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    simplex.push(start.to_vec());
    for i in 0..dim {
        let mut vertex = start.to_vec();
        vertex[i] += SIMPLEX_STEP;
        simplex.push(vertex);
    }

    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(1e-8)
        .map_err(|e| DfmError::OptimizationFailed {
            reason: e.to_string(),
        })?;
    let result = Executor::new(cost, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()
        .map_err(|e| DfmError::OptimizationFailed {
            reason: e.to_string(),
        })?;

    let state = result.state();
    let params = state
        .best_param
        .clone()
        .ok_or_else(|| DfmError::OptimizationFailed {
            reason: "no best parameter".to_string(),
        })?;

    debug!(
        cost = state.best_cost,
        iterations = state.iter,
        "nelder-mead finished"
    );

    Ok(Minimum {
        params,
        cost: state.best_cost,
        iterations: state.iter,
    })
}
