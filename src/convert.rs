//! Pure conversion functions: TOML config structs -> library types.

use anyhow::{Context, Result, bail};
use ndarray::Array2;

use crate::config::*;

use nowcast_dfm::{
    DfmMapping, DynamicFactorModel, FixedBlocks, MeasurementDescriptor, MeasurementType,
};
use nowcast_var::VarDescriptor;

/// Parses a measurement type name; the cumulated types need a `length`.
pub fn parse_measurement_type(name: &str, length: Option<usize>) -> Result<MeasurementType> {
    match (name.to_lowercase().as_str(), length) {
        ("level", None) => Ok(MeasurementType::Level),
        ("level", Some(_)) => bail!("measurement type \"level\" takes no length"),
        ("cumulated", Some(length)) => Ok(MeasurementType::Cumulated { length }),
        ("cumulated-differences", Some(length)) => {
            Ok(MeasurementType::CumulatedDifferences { length })
        }
        ("cumulated" | "cumulated-differences", None) => {
            bail!("measurement type {name:?} requires a length")
        }
        (other, _) => bail!("unknown measurement type: {other:?}"),
    }
}

/// Builds a dense matrix from TOML rows, rejecting ragged input.
pub fn build_matrix(rows: &[Vec<f64>], what: &str) -> Result<Array2<f64>> {
    let ncols = rows.first().map_or(0, Vec::len);
    if let Some(i) = rows.iter().position(|r| r.len() != ncols) {
        bail!(
            "{what}: row {i} has {} entries, expected {ncols}",
            rows[i].len()
        );
    }
    Ok(Array2::from_shape_fn((rows.len(), ncols), |(i, j)| rows[i][j]))
}

/// Builds a [`VarDescriptor`] from the `[var]` table.
pub fn build_var(var: &VarToml) -> Result<VarDescriptor> {
    let coefficients = build_matrix(&var.coefficients, "var.coefficients")?;
    let sigma = build_matrix(&var.innovations_variance, "var.innovations_variance")?;
    VarDescriptor::new(coefficients, sigma).context("invalid [var] table")
}

/// Builds a [`MeasurementDescriptor`]; `nan` coefficients become "not loaded".
pub fn build_measurement(m: &MeasurementToml) -> Result<MeasurementDescriptor> {
    let mtype = parse_measurement_type(&m.mtype, m.length)?;
    let coefficients = m
        .coefficients
        .iter()
        .map(|&c| if c.is_nan() { None } else { Some(c) })
        .collect();
    Ok(MeasurementDescriptor::new(mtype, coefficients, m.variance))
}

/// Builds the [`DynamicFactorModel`] described by the whole file.
pub fn build_model(config: &NowcastConfig) -> Result<DynamicFactorModel> {
    let var = build_var(&config.var)?;
    let measurements = config
        .measurement
        .iter()
        .enumerate()
        .map(|(i, m)| build_measurement(m).with_context(|| format!("measurement {i}")))
        .collect::<Result<Vec<_>>>()?;
    DynamicFactorModel::new(measurements, var).context("invalid model")
}

/// Builds [`FixedBlocks`] from the `[mapping]` table.
pub fn build_fixed_blocks(mapping: &MappingToml) -> FixedBlocks {
    FixedBlocks {
        measurements: mapping.measurements_fixed,
        transition: mapping.transition_fixed,
    }
}

/// Builds the parameter mapping around the configured model.
pub fn build_mapping(config: &NowcastConfig) -> Result<DfmMapping> {
    let model = build_model(config)?;
    Ok(DfmMapping::with_fixed_blocks(
        model,
        build_fixed_blocks(&config.mapping),
    ))
}
