use serde::Serialize;

use crate::process::{self, ProcessId, ProcessRecord, ProcessSpec, Tick};
use crate::schedulers::{Algorithm, ResponseRatio};
use crate::timeline::{Occupant, Timeline, TimelineBuilder};
use crate::utils::prelude::*;
use crate::utils::Defect;

/// The ratios every eligible process had when HRRN made a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub tick: Tick,
    /// in scan order
    pub candidates: Vec<(ProcessId, ResponseRatio)>,
}

/// What an engine hands back: completed records in input order, plus the timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub algorithm: Algorithm,
    pub records: Vec<ProcessRecord>,
    pub timeline: Timeline,
    /// only filled by ratio-driven engines
    pub decisions: Vec<Decision>,
}

/// Virtual clock and the records one engine run owns
#[derive(Debug)]
pub struct Simulation {
    time: Tick,
    records: Vec<ProcessRecord>,
    timeline: TimelineBuilder,
    decisions: Vec<Decision>,
}

impl Simulation {
    /// Validate the batch and take a private copy of it
    pub fn new(specs: &[ProcessSpec]) -> Result<Self> {
        process::validate(specs)?;
        Ok(Self {
            time: 0,
            records: specs.iter().copied().map(ProcessRecord::new).collect(),
            timeline: TimelineBuilder::new(),
            decisions: vec![],
        })
    }

    pub fn time(&self) -> Tick {
        self.time
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn is_done(&self) -> bool {
        self.records.iter().all(ProcessRecord::is_terminal)
    }

    /// `(input index, record)` of every eligible process, in input order
    pub fn eligible(&self) -> impl Iterator<Item = (usize, &ProcessRecord)> + '_ {
        let now = self.time;
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.is_eligible(now))
    }

    /// Nobody can run, burn one tick
    pub fn idle(&mut self) -> Result<()> {
        trace!(time = self.time, "idle");
        self.timeline.push(self.time, Occupant::Idle)?;
        self.time += 1;
        Ok(())
    }

    /// Run the process at input index `idx` for one tick
    pub fn run_tick(&mut self, idx: usize) -> Result<()> {
        let record = &mut self.records[idx];
        record.run_tick(self.time)?;
        self.timeline
            .push(self.time, Occupant::Process(record.id()))?;
        if let Some(done) = record.completion() {
            debug!(time = self.time, process = record.id(), done, "completed");
        }
        self.time += 1;
        Ok(())
    }

    /// Run the process at input index `idx` until it is done
    pub fn run_to_completion(&mut self, idx: usize) -> Result<()> {
        let record = &mut self.records[idx];
        let start = self.time;
        let done = record.run_to_completion(start)?;
        for tick in start..done {
            self.timeline
                .push(tick, Occupant::Process(record.id()))?;
        }
        debug!(start, process = record.id(), done, "completed");
        self.time = done;
        Ok(())
    }

    pub fn record_decision(&mut self, decision: Decision) {
        self.decisions.push(decision);
    }

    pub fn finish(self, algorithm: Algorithm) -> Result<Schedule> {
        if let Some(r) = self.records.iter().find(|r| !r.is_terminal()) {
            return Err(Defect::Unfinished(r.id()).into());
        }
        Ok(Schedule {
            algorithm,
            records: self.records,
            timeline: self.timeline.finish(),
            decisions: self.decisions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<ProcessSpec> {
        vec![ProcessSpec::new(1, 2, 2), ProcessSpec::new(2, 0, 1)]
    }

    #[test]
    fn eligible_in_input_order() {
        let mut sim = Simulation::new(&specs()).unwrap();
        let ids: Vec<_> = sim.eligible().map(|(_, r)| r.id()).collect();
        assert_eq!(ids, vec![2]);

        sim.run_tick(1).unwrap();
        assert_eq!(sim.time(), 1);
        assert_eq!(sim.eligible().count(), 0);

        sim.idle().unwrap();
        let ids: Vec<_> = sim.eligible().map(|(i, r)| (i, r.id())).collect();
        assert_eq!(ids, vec![(0, 1)]);
    }

    #[test]
    fn finish_requires_every_process_done() {
        let mut sim = Simulation::new(&specs()).unwrap();
        sim.run_tick(1).unwrap();
        sim.idle().unwrap();
        sim.run_tick(0).unwrap();
        assert!(!sim.is_done());

        let sim = Simulation::new(&specs()).unwrap();
        match sim.finish(Algorithm::Srtf) {
            Err(Error::Defect(Defect::Unfinished(id))) => assert_eq!(id, 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn run_to_completion_fills_timeline() {
        let mut sim = Simulation::new(&specs()).unwrap();
        sim.run_to_completion(1).unwrap();
        sim.idle().unwrap();
        sim.run_to_completion(0).unwrap();
        assert!(sim.is_done());

        let schedule = sim.finish(Algorithm::Sjf).unwrap();
        assert_eq!(schedule.timeline.len(), 4);
        assert_eq!(schedule.timeline.ticks_of(1), vec![2, 3]);
        assert_eq!(schedule.records[0].completion(), Some(4));
        assert!(schedule.decisions.is_empty());
    }

    #[test]
    fn invalid_batch_never_starts() {
        assert!(matches!(
            Simulation::new(&[ProcessSpec::new(1, 0, -2)]),
            Err(Error::InvalidInput(_))
        ));
    }
}
