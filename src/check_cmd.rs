//! Check command: stability of a parameter vector.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use crate::cli::CheckArgs;
use crate::{config, convert, output};

/// Run the check command.
pub fn run(args: CheckArgs) -> Result<()> {
    let _cmd = info_span!("check").entered();
    let config = config::load(&args.config)?;
    let mapping = convert::build_mapping(&config)?;

    let params = match args.params {
        Some(p) => p,
        None => mapping
            .default_parameters()
            .context("failed to extract parameters from the model")?,
    };
    let model = mapping
        .to_model(&params)
        .context("failed to map parameters to a model")?;

    let report = output::StabilityReport {
        stable: mapping.check_stability(&params),
        spectral_radius: model.var().spectral_radius().value(),
    };
    info!(stable = report.stable, "stability checked");

    output::write_json(&report, args.output.as_deref())
}
