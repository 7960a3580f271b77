use super::*;
use crate::simulator::Simulation;

/// Shortest Job First. Once picked, a process keeps the CPU until it is done.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sjf;

impl Scheduler for Sjf {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Sjf
    }

    #[instrument(level = "debug", skip(self, processes), fields(processes.len = processes.len()))]
    fn schedule(&self, processes: &[ProcessSpec]) -> Result<Schedule> {
        let mut sim = Simulation::new(processes)?;

        while !sim.is_done() {
            // (execution, arrival, id) is a total order, ids being unique
            let next = sim
                .eligible()
                .min_by_key(|(_, r)| (r.execution(), r.arrival(), r.id()))
                .map(|(idx, _)| idx);

            match next {
                Some(idx) => sim.run_to_completion(idx)?,
                None => sim.idle()?,
            }
        }

        sim.finish(self.algorithm())
    }
}
