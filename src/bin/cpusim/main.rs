use structopt::StructOpt;

use cpusim::utils;
use cpusim::utils::prelude::*;

use crate::commands::Cmd;

mod cli;
mod commands;

fn main() -> Result<()> {
    // panic setup should be done early
    utils::panic::setup();

    let cli = cli::Cli::from_args();

    // initialize Configuration
    utils::app_config::init(cli.config.as_deref(), cli.preset.as_deref())?;

    // logging is configured from the config, so it comes after.
    // every command prints its results on stdout
    let _guard = utils::logging::setup(true)?;

    trace!("Start cli execution");

    cli.cmd.run()
}
