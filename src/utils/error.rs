use thiserror::Error;

use crate::process::{ProcessId, Tick};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid process batch: {0}")]
    InvalidInput(#[from] InputError),
    #[error("internal consistency failure: {0}")]
    Defect(#[from] Defect),
    #[error("at least {min} processes are needed to schedule, got {got}")]
    BatchTooSmall { min: usize, got: usize },
    #[error(transparent)]
    InvalidConfig(#[from] config::ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Others(#[from] anyhow::Error),
}

/// Malformed batches, rejected before any simulation state exists
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("the batch is empty")]
    Empty,
    #[error("process id must be positive")]
    ZeroId,
    #[error("process id {0} appears more than once")]
    DuplicateId(ProcessId),
    #[error("process {id} arrives at negative tick {arrival}")]
    NegativeArrival { id: ProcessId, arrival: Tick },
    #[error("process {id} has non-positive execution time {execution}")]
    NonPositiveExecution { id: ProcessId, execution: Tick },
}

/// States no engine may ever produce
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    #[error("process {id} selected at tick {tick} after it already completed")]
    TerminalReselected { id: ProcessId, tick: Tick },
    #[error("timeline event at tick {got} does not follow tick {expected}")]
    TimelineOutOfOrder { expected: Tick, got: Tick },
    #[error("process {0} never ran to completion")]
    Unfinished(ProcessId),
    #[error("process {id} has turnaround {turnaround} for execution {execution}")]
    BadTurnaround {
        id: ProcessId,
        turnaround: Tick,
        execution: Tick,
    },
}

/// A type alias that forces the usage of the custom error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<tracing_subscriber::util::TryInitError> for Error {
    fn from(err: tracing_subscriber::util::TryInitError) -> Self {
        Self::Others(anyhow::Error::from(err))
    }
}
