use super::*;
use crate::simulator::{Decision, Simulation};

/// Highest Response Ratio Next.
///
/// The ratio `(now - arrival + execution) / execution` of every eligible process is computed
/// from scratch at each tick, and the winner runs for a single tick. Waiting is measured from
/// arrival, so a process keeps aging while it runs and long jobs are not starved.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hrrn;

impl Hrrn {
    /// The first process holding the highest ratio wins
    fn pick(candidates: &[(usize, ResponseRatio)]) -> Option<usize> {
        let mut best: Option<&(usize, ResponseRatio)> = None;
        for candidate in candidates {
            if best.map_or(true, |(_, ratio)| candidate.1 > *ratio) {
                best = Some(candidate);
            }
        }
        best.map(|(idx, _)| *idx)
    }
}

impl Scheduler for Hrrn {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Hrrn
    }

    #[instrument(level = "debug", skip(self, processes), fields(processes.len = processes.len()))]
    fn schedule(&self, processes: &[ProcessSpec]) -> Result<Schedule> {
        let mut sim = Simulation::new(processes)?;

        while !sim.is_done() {
            let now = sim.time();
            let candidates: Vec<_> = sim
                .eligible()
                .map(|(idx, r)| (idx, ResponseRatio::new(now, r.arrival(), r.execution())))
                .collect();

            let next = match Self::pick(&candidates) {
                Some(idx) => idx,
                None => {
                    sim.idle()?;
                    continue;
                }
            };

            let decision = Decision {
                tick: now,
                candidates: candidates
                    .iter()
                    .map(|(idx, ratio)| (sim.records()[*idx].id(), *ratio))
                    .collect(),
            };
            for (id, ratio) in decision.candidates.iter() {
                debug!(time = now, process = id, %ratio, "response ratio");
            }
            sim.record_decision(decision);

            sim.run_tick(next)?;
        }

        sim.finish(self.algorithm())
    }
}
