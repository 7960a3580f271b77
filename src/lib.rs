//! Uniprocessor CPU scheduling simulator.
//!
//! An engine ([`schedulers::Sjf`], [`schedulers::Srtf`] or [`schedulers::Hrrn`]) turns a batch of
//! [`ProcessSpec`]s into a [`Schedule`], then [`metrics::evaluate`] derives the timings from it:
//!
//! ```
//! use cpusim::{simulate, Algorithm, ProcessSpec};
//!
//! let batch = [
//!     ProcessSpec::new(1, 0, 5),
//!     ProcessSpec::new(2, 1, 3),
//!     ProcessSpec::new(3, 2, 1),
//! ];
//! let report = simulate(Algorithm::Sjf, &batch).unwrap();
//! assert_eq!(report.summary.makespan, 9);
//! ```

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::AppConfigExt;
use crate::utils::prelude::*;

mod config;
pub mod input;
pub mod metrics;
pub mod output;
pub mod process;
pub mod schedulers;
pub mod simulator;
pub mod timeline;
pub mod utils;

pub use metrics::Report;
pub use process::{ProcessId, ProcessRecord, ProcessSpec, Tick};
pub use schedulers::{Algorithm, Scheduler};
pub use simulator::Schedule;
pub use timeline::{Occupant, Timeline};

/// The simulation part of the application config
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimConfig {
    pub algorithm: Algorithm,
    #[serde(default)]
    pub processes: Vec<ProcessSpec>,
    /// smallest batch the front end accepts
    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,
    #[serde(default)]
    pub outputs: output::OutputConfig,
}

fn default_min_batch_size() -> usize {
    3
}

impl SimConfig {
    /// Process batch from the given CSV file, falling back to the configured one
    pub fn load_processes(&mut self, input: Option<PathBuf>) -> Result<()> {
        if let Some(path) = input {
            self.processes = input::from_csv(&path)?;
        }
        input::check_batch_size(&self.processes, self.min_batch_size)
    }
}

/// Run one engine over the batch and evaluate the result
pub fn simulate(algorithm: Algorithm, processes: &[ProcessSpec]) -> Result<Report> {
    let _g = info_span!("simulate", %algorithm).entered();

    let schedule = schedulers::from_config(&algorithm).schedule(processes)?;
    metrics::evaluate(&schedule)
}

/// Run every engine over the same batch. Each run simulates on its own copy.
pub fn compare(processes: &[ProcessSpec]) -> Result<Vec<Report>> {
    Algorithm::ALL
        .iter()
        .map(|a| simulate(*a, processes))
        .collect()
}

/// Simulate as configured and produce the configured outputs
pub fn run_sim(cfg: &SimConfig, mut out: impl io::Write) -> Result<Report> {
    let _g = info_span!("sim").entered();

    let report = simulate(cfg.algorithm, &cfg.processes)?;

    {
        let _g = info_span!("output").entered();
        let outputs = &cfg.outputs;
        if outputs.table {
            output::render_table(&report, &mut out)?;
        }
        if outputs.gantt {
            output::render_gantt(&report, &mut out)?;
        }
        if outputs.ratios {
            output::render_ratios(&report, &mut out)?;
        }
        if outputs.csv || outputs.chrome_trace {
            let dir = utils::app_config::config().output_dir()?;
            let stem = report.algorithm.to_string().to_lowercase();
            if outputs.csv {
                output::write_csv(&report, &dir.file(format!("{}_metrics.csv", stem))?)?;
            }
            if outputs.chrome_trace {
                output::write_chrome_trace(&report, &dir.file(format!("{}_trace.json", stem))?)?;
            }
        }
    }

    Ok(report)
}

/// Run all engines and print one summary row each
pub fn run_compare(cfg: &SimConfig, mut out: impl io::Write) -> Result<Vec<Report>> {
    let _g = info_span!("compare").entered();

    let reports = compare(&cfg.processes)?;
    output::render_comparison(&reports, &mut out)?;
    Ok(reports)
}
