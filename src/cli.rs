use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Dynamic factor model parameter and state-space tool.
#[derive(Parser)]
#[command(
    name = "nowcast",
    version,
    about = "Dynamic factor model parameter mapping and steady-state tool"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the parameter vector of the configured model.
    Params(ParamsArgs),
    /// Rebuild the model from a parameter vector.
    Map(MapArgs),
    /// Check the stability of a parameter vector.
    Check(CheckArgs),
    /// Print the unconditional covariance of the stacked factor state.
    SteadyState(SteadyStateArgs),
}

/// Arguments for the `params` subcommand.
#[derive(clap::Args)]
pub struct ParamsArgs {
    /// Path to TOML model file.
    #[arg(short, long, default_value = "model.toml")]
    pub config: PathBuf,

    /// Write the JSON report here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `map` subcommand.
#[derive(clap::Args)]
pub struct MapArgs {
    /// Path to TOML model file.
    #[arg(short, long, default_value = "model.toml")]
    pub config: PathBuf,

    /// Comma-separated parameter vector.
    #[arg(
        short,
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        required = true
    )]
    pub params: Vec<f64>,

    /// Write the JSON report here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `check` subcommand.
#[derive(clap::Args)]
pub struct CheckArgs {
    /// Path to TOML model file.
    #[arg(short, long, default_value = "model.toml")]
    pub config: PathBuf,

    /// Comma-separated parameter vector (defaults to the model's own).
    #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    pub params: Option<Vec<f64>>,

    /// Write the JSON report here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `steady-state` subcommand.
#[derive(clap::Args)]
pub struct SteadyStateArgs {
    /// Path to TOML model file.
    #[arg(short, long, default_value = "model.toml")]
    pub config: PathBuf,

    /// Number of lagged factor blocks in the state (at least the VAR order).
    #[arg(short, long)]
    pub lags: Option<usize>,

    /// Write the JSON report here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
