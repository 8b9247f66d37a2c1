mod check_cmd;
mod cli;
mod config;
mod convert;
mod logging;
mod map_cmd;
mod output;
mod params_cmd;
mod steady_state_cmd;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Params(args) => params_cmd::run(args),
        Command::Map(args) => map_cmd::run(args),
        Command::Check(args) => check_cmd::run(args),
        Command::SteadyState(args) => steady_state_cmd::run(args),
    }
}
