use std::collections::HashSet;
use std::fmt;

use parse_display::Display;
use serde::{Deserialize, Serialize};

use crate::utils::prelude::*;
use crate::utils::{Defect, InputError};

/// A point in simulated time, counted in CPU ticks
pub type Tick = i64;

/// Identity of a process within one batch
pub type ProcessId = u32;

/// One process as handed over by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display("P{id}(@{arrival}, {execution})")]
pub struct ProcessSpec {
    pub id: ProcessId,
    /// first tick the process may run at
    pub arrival: Tick,
    /// total ticks of CPU needed
    pub execution: Tick,
}

impl ProcessSpec {
    pub fn new(id: ProcessId, arrival: Tick, execution: Tick) -> Self {
        Self { id, arrival, execution }
    }
}

/// Reject a batch no engine should ever see
pub fn validate(specs: &[ProcessSpec]) -> Result<()> {
    if specs.is_empty() {
        return Err(InputError::Empty.into());
    }

    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        if spec.id == 0 {
            return Err(InputError::ZeroId.into());
        }
        if !seen.insert(spec.id) {
            return Err(InputError::DuplicateId(spec.id).into());
        }
        if spec.arrival < 0 {
            return Err(InputError::NegativeArrival {
                id: spec.id,
                arrival: spec.arrival,
            }
            .into());
        }
        if spec.execution <= 0 {
            return Err(InputError::NonPositiveExecution {
                id: spec.id,
                execution: spec.execution,
            }
            .into());
        }
    }
    Ok(())
}

/// Static inputs of one process plus what the simulation did to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRecord {
    spec: ProcessSpec,
    remaining: Tick,
    start: Option<Tick>,
    completion: Option<Tick>,
}

impl ProcessRecord {
    pub fn new(spec: ProcessSpec) -> Self {
        Self {
            spec,
            remaining: spec.execution,
            start: None,
            completion: None,
        }
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn id(&self) -> ProcessId {
        self.spec.id
    }

    pub fn arrival(&self) -> Tick {
        self.spec.arrival
    }

    pub fn execution(&self) -> Tick {
        self.spec.execution
    }

    pub fn remaining(&self) -> Tick {
        self.remaining
    }

    /// tick of the first executed unit
    pub fn start(&self) -> Option<Tick> {
        self.start
    }

    /// tick right after the last executed unit
    pub fn completion(&self) -> Option<Tick> {
        self.completion
    }

    pub fn is_terminal(&self) -> bool {
        self.remaining == 0
    }

    /// arrived and not yet done
    pub fn is_eligible(&self, now: Tick) -> bool {
        self.spec.arrival <= now && !self.is_terminal()
    }

    /// Execute a single unit at `now`
    pub(crate) fn run_tick(&mut self, now: Tick) -> Result<()> {
        self.run_for(now, 1)
    }

    /// Execute everything that is left, starting at `now`. Returns the completion tick.
    pub(crate) fn run_to_completion(&mut self, now: Tick) -> Result<Tick> {
        let left = self.remaining;
        self.run_for(now, left)?;
        Ok(now + left)
    }

    fn run_for(&mut self, now: Tick, ticks: Tick) -> Result<()> {
        if self.is_terminal() {
            return Err(Defect::TerminalReselected {
                id: self.spec.id,
                tick: now,
            }
            .into());
        }
        debug_assert!(ticks > 0 && ticks <= self.remaining);

        self.start.get_or_insert(now);
        self.remaining -= ticks;
        if self.is_terminal() {
            self.completion = Some(now + ticks);
        }
        Ok(())
    }
}

impl fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}[{}/{}]", self.spec.id, self.remaining, self.spec.execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_well_formed_batch() {
        let specs = [ProcessSpec::new(1, 0, 5), ProcessSpec::new(2, 1, 3)];
        assert!(validate(&specs).is_ok());
    }

    #[test]
    fn validate_rejects_malformed_batches() {
        let cases = vec![
            (vec![], InputError::Empty),
            (vec![ProcessSpec::new(0, 0, 1)], InputError::ZeroId),
            (
                vec![ProcessSpec::new(1, 0, 1), ProcessSpec::new(1, 2, 3)],
                InputError::DuplicateId(1),
            ),
            (
                vec![ProcessSpec::new(4, -1, 3)],
                InputError::NegativeArrival { id: 4, arrival: -1 },
            ),
            (
                vec![ProcessSpec::new(2, 0, 0)],
                InputError::NonPositiveExecution { id: 2, execution: 0 },
            ),
        ];

        for (specs, expected) in cases {
            match validate(&specs) {
                Err(Error::InvalidInput(err)) => assert_eq!(err, expected),
                other => panic!("expected {:?}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn start_at_tick_zero_is_kept() {
        let mut record = ProcessRecord::new(ProcessSpec::new(1, 0, 3));
        assert_eq!(record.start(), None);

        record.run_tick(0).unwrap();
        record.run_tick(1).unwrap();
        assert_eq!(record.start(), Some(0));
        assert_eq!(record.remaining(), 1);
        assert_eq!(record.completion(), None);

        // resumed later, start must not move
        record.run_tick(5).unwrap();
        assert_eq!(record.start(), Some(0));
        assert_eq!(record.completion(), Some(6));
        assert!(record.is_terminal());
    }

    #[test]
    fn run_to_completion() {
        let mut record = ProcessRecord::new(ProcessSpec::new(3, 2, 4));
        assert!(!record.is_eligible(1));
        assert!(record.is_eligible(2));

        assert_eq!(record.run_to_completion(7).unwrap(), 11);
        assert_eq!(record.start(), Some(7));
        assert_eq!(record.completion(), Some(11));
        assert!(!record.is_eligible(20));
    }

    #[test]
    fn run_to_completion_after_partial_run() {
        let mut record = ProcessRecord::new(ProcessSpec::new(4, 0, 5));
        record.run_tick(0).unwrap();
        record.run_tick(1).unwrap();

        // 3 units left, resumed at 6
        assert_eq!(record.run_to_completion(6).unwrap(), 9);
        assert_eq!(record.completion(), Some(9));
        assert_eq!(record.start(), Some(0));
    }

    #[test]
    fn terminal_record_is_never_rescheduled() {
        let mut record = ProcessRecord::new(ProcessSpec::new(9, 0, 1));
        record.run_tick(0).unwrap();

        match record.run_tick(1) {
            Err(Error::Defect(Defect::TerminalReselected { id, tick })) => {
                assert_eq!((id, tick), (9, 1));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(record.remaining(), 0);
        assert_eq!(record.completion(), Some(1));
    }

    #[test]
    fn display() {
        let spec = ProcessSpec::new(2, 1, 3);
        assert_eq!(spec.to_string(), "P2(@1, 3)");
        assert_eq!(ProcessRecord::new(spec).to_string(), "P2[3/3]");
    }
}
