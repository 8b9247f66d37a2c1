//! Params command: print the parameter vector of the configured model.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use crate::cli::ParamsArgs;
use crate::{config, convert, output};

/// Run the params command.
pub fn run(args: ParamsArgs) -> Result<()> {
    let _cmd = info_span!("params").entered();
    let config = config::load(&args.config)?;
    let mapping = convert::build_mapping(&config)?;

    let params = mapping
        .default_parameters()
        .context("failed to extract parameters from the model")?;
    info!(dim = params.len(), "parameter vector extracted");

    output::write_json(
        &output::ParamsReport::new(&mapping, &params),
        args.output.as_deref(),
    )
}
