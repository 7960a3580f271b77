//! Derived timings of a finished schedule.
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Turnaround | completion - arrival |
//! | Waiting | turnaround - execution |
//! | Response | first start - arrival |
//! | Utilization | execution / turnaround |

use serde::Serialize;

use crate::process::{ProcessId, ProcessRecord, Tick};
use crate::schedulers::Algorithm;
use crate::simulator::{Decision, Schedule};
use crate::timeline::Timeline;
use crate::utils::prelude::*;
use crate::utils::Defect;

/// Timings of one process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessMetrics {
    pub id: ProcessId,
    pub arrival: Tick,
    pub execution: Tick,
    pub start: Tick,
    pub completion: Tick,
    pub waiting: Tick,
    pub turnaround: Tick,
    pub response: Tick,
    /// fraction of the turnaround spent on the CPU, in (0, 1]
    pub utilization: f64,
}

impl ProcessMetrics {
    fn derive(record: &ProcessRecord) -> Result<Self> {
        let (start, completion) = match (record.start(), record.completion()) {
            (Some(s), Some(c)) if record.is_terminal() => (s, c),
            _ => return Err(Defect::Unfinished(record.id()).into()),
        };

        let turnaround = completion - record.arrival();
        if turnaround <= 0 || turnaround < record.execution() {
            return Err(Defect::BadTurnaround {
                id: record.id(),
                turnaround,
                execution: record.execution(),
            }
            .into());
        }

        Ok(Self {
            id: record.id(),
            arrival: record.arrival(),
            execution: record.execution(),
            start,
            completion,
            waiting: turnaround - record.execution(),
            turnaround,
            response: start - record.arrival(),
            utilization: record.execution() as f64 / turnaround as f64,
        })
    }
}

/// Batch-wide figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub avg_waiting: f64,
    pub avg_turnaround: f64,
    pub avg_response: f64,
    /// mean of the per-process utilization
    pub avg_utilization: f64,
    /// tick the last process completed at
    pub makespan: Tick,
    pub idle_ticks: Tick,
    /// busy ticks over makespan
    pub cpu_busy: f64,
    pub context_switches: usize,
}

impl Summary {
    fn calculate(processes: &[ProcessMetrics], timeline: &Timeline) -> Self {
        let makespan = processes
            .iter()
            .map(|p| p.completion)
            .max()
            .unwrap_or(0);
        let idle_ticks = timeline.idle_ticks();
        let cpu_busy = if makespan == 0 {
            0.0
        } else {
            (makespan - idle_ticks) as f64 / makespan as f64
        };

        Self {
            avg_waiting: mean(processes.iter().map(|p| p.waiting as f64)),
            avg_turnaround: mean(processes.iter().map(|p| p.turnaround as f64)),
            avg_response: mean(processes.iter().map(|p| p.response as f64)),
            avg_utilization: mean(processes.iter().map(|p| p.utilization)),
            makespan,
            idle_ticks,
            cpu_busy,
            context_switches: timeline.context_switches(),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Everything a caller needs to present one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub algorithm: Algorithm,
    /// in input order
    pub processes: Vec<ProcessMetrics>,
    pub summary: Summary,
    pub timeline: Timeline,
    /// HRRN's per-tick ratio table, empty for the other engines
    pub decisions: Vec<Decision>,
}

/// Derive per-process and batch metrics. Pure, the schedule is left untouched.
#[instrument(level = "debug", skip(schedule), fields(algorithm = %schedule.algorithm))]
pub fn evaluate(schedule: &Schedule) -> Result<Report> {
    if schedule.records.is_empty() {
        return Err(crate::utils::InputError::Empty.into());
    }

    let processes = schedule
        .records
        .iter()
        .map(ProcessMetrics::derive)
        .collect::<Result<Vec<_>>>()?;
    let summary = Summary::calculate(&processes, &schedule.timeline);
    debug!(?summary, "evaluated");

    Ok(Report {
        algorithm: schedule.algorithm,
        processes,
        summary,
        timeline: schedule.timeline.clone(),
        decisions: schedule.decisions.clone(),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::process::ProcessSpec;
    use crate::schedulers::{Hrrn, Scheduler, Sjf, Srtf};

    fn scenario() -> Vec<ProcessSpec> {
        vec![
            ProcessSpec::new(1, 0, 5),
            ProcessSpec::new(2, 1, 3),
            ProcessSpec::new(3, 2, 1),
        ]
    }

    #[test]
    fn sjf_metrics() {
        let report = evaluate(&Sjf.schedule(&scenario()).unwrap()).unwrap();

        let p = &report.processes;
        assert_eq!((p[0].waiting, p[0].turnaround, p[0].response), (0, 5, 0));
        assert_eq!((p[1].waiting, p[1].turnaround, p[1].response), (5, 8, 5));
        assert_eq!((p[2].waiting, p[2].turnaround, p[2].response), (3, 4, 3));
        assert_relative_eq!(p[1].utilization, 3.0 / 8.0);

        let s = &report.summary;
        assert_relative_eq!(s.avg_waiting, 8.0 / 3.0);
        assert_relative_eq!(s.avg_turnaround, 17.0 / 3.0);
        assert_relative_eq!(s.avg_utilization, (1.0 + 3.0 / 8.0 + 0.25) / 3.0);
        assert_eq!(s.makespan, 9);
        assert_eq!(s.idle_ticks, 0);
        assert_relative_eq!(s.cpu_busy, 1.0);
        assert_eq!(s.context_switches, 2);
    }

    #[test]
    fn srtf_waiting_differs_from_response() {
        let report = evaluate(&Srtf.schedule(&scenario()).unwrap()).unwrap();

        // P1 starts right away but sits out 4 ticks of preemption
        let p1 = &report.processes[0];
        assert_eq!(p1.response, 0);
        assert_eq!(p1.waiting, 4);
        assert_eq!(p1.turnaround, 9);
        assert_eq!(report.summary.context_switches, 4);
    }

    #[test]
    fn single_process_is_fully_utilized() {
        let specs = [ProcessSpec::new(1, 0, 4)];
        for scheduler in [
            Box::new(Sjf) as Box<dyn Scheduler>,
            Box::new(Srtf),
            Box::new(Hrrn),
        ]
        .iter()
        {
            let report = evaluate(&scheduler.schedule(&specs).unwrap()).unwrap();
            let p = &report.processes[0];
            assert_eq!(p.waiting, 0);
            assert_eq!(p.turnaround, 4);
            assert_relative_eq!(p.utilization, 1.0);
            assert_relative_eq!(report.summary.avg_utilization, 1.0);
        }
    }

    #[test]
    fn idle_ticks_lower_cpu_busy() {
        let specs = [ProcessSpec::new(1, 2, 2), ProcessSpec::new(2, 0, 1)];
        let report = evaluate(&Sjf.schedule(&specs).unwrap()).unwrap();

        assert_eq!(report.summary.makespan, 4);
        assert_eq!(report.summary.idle_ticks, 1);
        assert_relative_eq!(report.summary.cpu_busy, 0.75);
    }

    #[test]
    fn unfinished_record_is_a_defect() {
        let mut schedule = Sjf.schedule(&scenario()).unwrap();
        schedule.records[1] = ProcessRecord::new(ProcessSpec::new(2, 1, 3));

        match evaluate(&schedule) {
            Err(Error::Defect(Defect::Unfinished(id))) => assert_eq!(id, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn too_short_turnaround_is_a_defect() {
        // run before it arrived, something no engine may do
        let mut forged = ProcessRecord::new(ProcessSpec::new(5, 6, 3));
        forged.run_to_completion(4).unwrap();
        match ProcessMetrics::derive(&forged) {
            Err(Error::Defect(Defect::BadTurnaround { id, turnaround, execution })) => {
                assert_eq!((id, turnaround, execution), (5, 1, 3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
