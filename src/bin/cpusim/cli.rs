use std::path::PathBuf;

use structopt::StructOpt;

use crate::commands::{self, Cmd};
use cpusim::utils::prelude::*;

#[derive(StructOpt)]
#[structopt(about)]
pub struct Cli {
    /// Set a custom config file, merged over the defaults
    #[structopt(short, long, parse(from_os_str), value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Apply a named preset from the `presets` table
    #[structopt(short, long, value_name = "NAME", global = true)]
    pub preset: Option<String>,

    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(StructOpt)]
pub enum Command {
    Run(commands::Run),
    Compare(commands::Compare),
    Config(commands::Config),
}

impl Cmd for Command {
    fn run(self) -> Result<()> {
        match self {
            Command::Run(c) => c.run(),
            Command::Compare(c) => c.run(),
            Command::Config(c) => c.run(),
        }
    }
}
