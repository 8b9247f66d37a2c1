use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level model file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NowcastConfig {
    /// Factor dynamics.
    pub var: VarToml,

    /// Measurement equations, in series order.
    #[serde(default)]
    pub measurement: Vec<MeasurementToml>,

    /// Which blocks the mapping keeps fixed.
    #[serde(default)]
    pub mapping: MappingToml,
}

/// VAR block: `nb` rows of `nb·nl` coefficients and the `nb x nb`
/// innovation covariance.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VarToml {
    pub coefficients: Vec<Vec<f64>>,
    pub innovations_variance: Vec<Vec<f64>>,
}

/// One measurement equation. A `nan` coefficient marks a factor the series
/// does not load on.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasurementToml {
    #[serde(rename = "type", default = "default_measurement_type")]
    pub mtype: String,
    #[serde(default)]
    pub length: Option<usize>,
    pub coefficients: Vec<f64>,
    pub variance: f64,
}

fn default_measurement_type() -> String {
    "level".to_string()
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MappingToml {
    #[serde(default)]
    pub measurements_fixed: bool,
    #[serde(default)]
    pub transition_fixed: bool,
}

/// Reads and parses a model file.
pub fn load(path: &Path) -> Result<NowcastConfig> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&toml_str).context("failed to parse TOML config")
}
