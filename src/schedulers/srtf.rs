use super::*;
use crate::simulator::Simulation;

/// Shortest Remaining Time First, deciding again at every tick
#[derive(Debug, Clone, Copy, Default)]
pub struct Srtf;

impl Scheduler for Srtf {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Srtf
    }

    #[instrument(level = "debug", skip(self, processes), fields(processes.len = processes.len()))]
    fn schedule(&self, processes: &[ProcessSpec]) -> Result<Schedule> {
        let mut sim = Simulation::new(processes)?;

        while !sim.is_done() {
            // min_by_key keeps the first of equal minimums, i.e. the earliest in input order
            let next = sim
                .eligible()
                .min_by_key(|(_, r)| r.remaining())
                .map(|(idx, _)| idx);

            match next {
                Some(idx) => sim.run_tick(idx)?,
                None => sim.idle()?,
            }
        }

        sim.finish(self.algorithm())
    }
}
