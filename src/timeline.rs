//! Per-tick record of who holds the CPU, with a run-length view for charts.

use std::fmt;

use itertools::Itertools;
use parse_display::Display;
use serde::Serialize;

use crate::process::{ProcessId, Tick};
use crate::utils::prelude::*;
use crate::utils::Defect;

/// Who holds the CPU during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupant {
    #[display("P{0}")]
    Process(ProcessId),
    #[display("-")]
    Idle,
}

impl Occupant {
    pub fn process(&self) -> Option<ProcessId> {
        match self {
            Occupant::Process(id) => Some(*id),
            Occupant::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Occupant::Idle)
    }
}

/// Consecutive ticks with the same occupant, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[display("{occupant}[{start}, {end})")]
pub struct Run {
    pub occupant: Occupant,
    pub start: Tick,
    pub end: Tick,
}

impl Run {
    pub fn len(&self) -> Tick {
        self.end - self.start
    }
}

/// Collects run events in tick order
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    slots: Vec<Occupant>,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// the next tick the builder accepts
    pub fn next_tick(&self) -> Tick {
        self.slots.len() as Tick
    }

    /// Ticks must arrive ascending and without gaps, starting at 0
    pub fn push(&mut self, tick: Tick, occupant: Occupant) -> Result<()> {
        let expected = self.next_tick();
        if tick != expected {
            return Err(Defect::TimelineOutOfOrder { expected, got: tick }.into());
        }
        self.slots.push(occupant);
        Ok(())
    }

    pub fn finish(self) -> Timeline {
        Timeline { slots: self.slots }
    }
}

/// Which occupant held the CPU at every tick from 0 up to the makespan
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    slots: Vec<Occupant>,
}

impl Timeline {
    pub fn len(&self) -> Tick {
        self.slots.len() as Tick
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn occupant_at(&self, tick: Tick) -> Option<Occupant> {
        if tick < 0 {
            return None;
        }
        self.slots.get(tick as usize).copied()
    }

    /// `(tick, occupant)` in ascending tick order
    pub fn iter(&self) -> impl Iterator<Item = (Tick, Occupant)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(t, o)| (t as Tick, *o))
    }

    /// every tick the given process ran at
    pub fn ticks_of(&self, id: ProcessId) -> Vec<Tick> {
        self.iter()
            .filter(|(_, o)| *o == Occupant::Process(id))
            .map(|(t, _)| t)
            .collect()
    }

    pub fn idle_ticks(&self) -> Tick {
        self.slots.iter().filter(|o| o.is_idle()).count() as Tick
    }

    /// Collapse consecutive ticks of the same occupant
    pub fn runs(&self) -> Vec<Run> {
        let groups = self.iter().group_by(|(_, o)| *o);
        groups
            .into_iter()
            .map(|(occupant, mut ticks)| {
                // group_by never yields an empty group
                let (start, _) = ticks.next().unwrap_or((0, occupant));
                let end = ticks.last().map(|(t, _)| t).unwrap_or(start) + 1;
                Run { occupant, start, end }
            })
            .collect()
    }

    /// Switches from one process straight to a different one, or back after idling
    pub fn context_switches(&self) -> usize {
        self.runs()
            .iter()
            .filter_map(|r| r.occupant.process())
            .tuple_windows()
            .filter(|(a, b)| a != b)
            .count()
    }
}

/// Renders the run-length chart with the tick boundaries below it:
///
/// ```text
/// | P1  | P3  | P2  |
/// 0     5     6     9
/// ```
impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let runs = self.runs();
        if runs.is_empty() {
            return write!(f, "||");
        }

        let cells = runs
            .iter()
            .map(|r| format!(" {:<4}", r.occupant.to_string()))
            .collect_vec();

        let mut bar = String::from("|");
        let mut axis = String::from("0");
        for (cell, run) in cells.iter().zip(runs.iter()) {
            bar.push_str(cell);
            bar.push('|');
            let mark = run.end.to_string();
            axis.push_str(&format!("{:>width$}", mark, width = cell.len() + 1));
        }
        writeln!(f, "{}", bar)?;
        write!(f, "{}", axis)
    }
}
