//! Steady-state command: unconditional covariance of the stacked factors.

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use nowcast_var::unconditional_covariance_with_lags;

use crate::cli::SteadyStateArgs;
use crate::{config, convert, output};

/// Run the steady-state command.
pub fn run(args: SteadyStateArgs) -> Result<()> {
    let _cmd = info_span!("steady_state").entered();
    let config = config::load(&args.config)?;
    let var = convert::build_var(&config.var)?;

    let blocks = args.lags.unwrap_or(var.nlags());
    if blocks < var.nlags() {
        bail!("--lags {blocks} is below the VAR order {}", var.nlags());
    }
    if !var.is_stable() {
        bail!("the VAR is not stationary; it has no unconditional covariance");
    }

    let covariance = unconditional_covariance_with_lags(&var, blocks)
        .context("failed to solve the steady-state equation")?;
    info!(dim = covariance.nrows(), "steady-state covariance solved");

    output::write_json(
        &output::SteadyStateReport {
            nfactors: var.nvars(),
            blocks,
            covariance: output::rows(&covariance),
        },
        args.output.as_deref(),
    )
}
