//! JSON reports printed by the subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::Serialize;
use tracing::info;

use nowcast_dfm::{DfmMapping, DynamicFactorModel, ParameterMapping};

/// Output of `params`.
#[derive(Debug, Serialize)]
pub struct ParamsReport {
    pub dim: usize,
    pub measurements_fixed: bool,
    pub transition_fixed: bool,
    pub parameters: Vec<NamedParameter>,
}

/// One entry of a parameter vector.
#[derive(Debug, Serialize)]
pub struct NamedParameter {
    pub index: usize,
    pub name: String,
    pub value: f64,
}

/// Output of `map`. Unloaded coefficients serialise as `null`.
#[derive(Debug, Serialize)]
pub struct ModelReport {
    pub loadings: Vec<Vec<Option<f64>>>,
    pub variances: Vec<f64>,
    pub var_coefficients: Vec<Vec<f64>>,
    pub innovations_variance: Vec<Vec<f64>>,
    pub stable: bool,
    pub spectral_radius: Option<f64>,
}

/// Output of `check`.
#[derive(Debug, Serialize)]
pub struct StabilityReport {
    pub stable: bool,
    pub spectral_radius: Option<f64>,
}

/// Output of `steady-state`.
#[derive(Debug, Serialize)]
pub struct SteadyStateReport {
    pub nfactors: usize,
    pub blocks: usize,
    pub covariance: Vec<Vec<f64>>,
}

impl ParamsReport {
    pub fn new(mapping: &DfmMapping, params: &[f64]) -> Self {
        Self {
            dim: params.len(),
            measurements_fixed: mapping.fixed_blocks().measurements,
            transition_fixed: mapping.fixed_blocks().transition,
            parameters: params
                .iter()
                .enumerate()
                .map(|(index, &value)| NamedParameter {
                    index,
                    name: mapping.description(index),
                    value,
                })
                .collect(),
        }
    }
}

impl ModelReport {
    pub fn new(model: &DynamicFactorModel, stable: bool) -> Self {
        Self {
            loadings: model
                .measurements()
                .iter()
                .map(|m| m.coefficients().to_vec())
                .collect(),
            variances: model.measurement_variances().to_vec(),
            var_coefficients: rows(model.var().coefficients()),
            innovations_variance: rows(model.var().innovations_variance()),
            stable,
            spectral_radius: model.var().spectral_radius().value(),
        }
    }
}

/// Row-major nested vectors of a matrix.
pub fn rows(a: &Array2<f64>) -> Vec<Vec<f64>> {
    a.rows().into_iter().map(|r| r.to_vec()).collect()
}

/// Writes pretty JSON to `output`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialise report")?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
