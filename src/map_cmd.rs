//! Map command: rebuild the model from a parameter vector.

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use crate::cli::MapArgs;
use crate::{config, convert, output};

/// Run the map command.
pub fn run(args: MapArgs) -> Result<()> {
    let _cmd = info_span!("map").entered();
    let config = config::load(&args.config)?;
    let mapping = convert::build_mapping(&config)?;

    let model = mapping
        .to_model(&args.params)
        .context("failed to map parameters to a model")?;
    let stable = mapping.check_stability(&args.params);
    if !stable {
        warn!("parameters describe a non-stationary VAR");
    }
    info!(
        measurements = model.measurement_count(),
        factors = model.nfactors(),
        "model rebuilt"
    );

    output::write_json(
        &output::ModelReport::new(&model, stable),
        args.output.as_deref(),
    )
}
