use std::path::PathBuf;

use structopt::StructOpt;

use cpusim::utils::prelude::*;
use cpusim::{Algorithm, SimConfig};

/// Should be implemented by individual subcommand
pub trait Cmd {
    fn run(self) -> Result<()>;
}

/// Show the effective configuration
#[derive(StructOpt)]
pub struct Config {}

impl Cmd for Config {
    fn run(self) -> Result<()> {
        let cfg: SimConfig = config().fetch()?;
        print!("{}", serde_yaml::to_string(&cfg)?);

        Ok(())
    }
}

/// Simulate one scheduling policy
#[derive(StructOpt)]
pub struct Run {
    /// Policy to simulate, overrides the configured one (SJF, SRTF, HRRN)
    #[structopt(short, long)]
    algorithm: Option<Algorithm>,

    /// Read the process batch from a CSV file with an `id,arrival,execution` header
    #[structopt(short, long, parse(from_os_str), value_name = "FILE")]
    input: Option<PathBuf>,
}

impl Cmd for Run {
    fn run(self) -> Result<()> {
        let mut cfg: SimConfig = config().fetch()?;
        if let Some(algorithm) = self.algorithm {
            cfg.algorithm = algorithm;
        }
        cfg.load_processes(self.input)?;
        debug!(algorithm = %cfg.algorithm, processes.len = cfg.processes.len(), "run");

        let stdout = std::io::stdout();
        cpusim::run_sim(&cfg, stdout.lock())?;
        Ok(())
    }
}

/// Simulate every policy on the same batch and compare the averages
#[derive(StructOpt)]
pub struct Compare {
    /// Read the process batch from a CSV file with an `id,arrival,execution` header
    #[structopt(short, long, parse(from_os_str), value_name = "FILE")]
    input: Option<PathBuf>,
}

impl Cmd for Compare {
    fn run(self) -> Result<()> {
        let mut cfg: SimConfig = config().fetch()?;
        cfg.load_processes(self.input)?;

        let stdout = std::io::stdout();
        cpusim::run_compare(&cfg, stdout.lock())?;
        Ok(())
    }
}
