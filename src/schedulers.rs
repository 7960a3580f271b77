use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use parse_display::Display;
use serde::{Deserialize, Serialize};

use crate::process::{ProcessSpec, Tick};
use crate::simulator::Schedule;
use crate::utils::prelude::*;

mod from_config;
mod hrrn;
mod sjf;
mod srtf;

pub use from_config::from_config;
pub use hrrn::Hrrn;
pub use sjf::Sjf;
pub use srtf::Srtf;

/// Scheduling policies known to the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(style = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Algorithm {
    /// Shortest Job First, non-preemptive
    Sjf,
    /// Shortest Remaining Time First
    Srtf,
    /// Highest Response Ratio Next, re-evaluated every tick
    Hrrn,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Sjf, Algorithm::Srtf, Algorithm::Hrrn];

    pub fn is_preemptive(&self) -> bool {
        !matches!(self, Algorithm::Sjf)
    }
}

impl FromStr for Algorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Algorithm::ALL
            .iter()
            .copied()
            .find(|a| a.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("unknown algorithm `{}`, expected one of SJF, SRTF, HRRN", s))
    }
}

impl TryFrom<String> for Algorithm {
    type Error = anyhow::Error;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// A scheduling engine: turns a batch into a complete schedule
pub trait Scheduler {
    fn algorithm(&self) -> Algorithm;

    /// The input slice is never touched; every call simulates on its own copy
    fn schedule(&self, processes: &[ProcessSpec]) -> Result<Schedule>;
}

impl Scheduler for Box<dyn Scheduler> {
    #[inline]
    fn algorithm(&self) -> Algorithm {
        (**self).algorithm()
    }

    #[inline]
    fn schedule(&self, processes: &[ProcessSpec]) -> Result<Schedule> {
        (**self).schedule(processes)
    }
}

/// HRRN priority, `(waited + execution) / execution`, kept as an exact fraction
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResponseRatio {
    waited: Tick,
    execution: Tick,
}

impl ResponseRatio {
    pub fn new(now: Tick, arrival: Tick, execution: Tick) -> Self {
        debug_assert!(execution > 0);
        Self {
            waited: now - arrival,
            execution,
        }
    }

    pub fn value(&self) -> f64 {
        (self.waited as f64 + self.execution as f64) / self.execution as f64
    }

    fn cross(&self, other: &Self) -> (i128, i128) {
        let lhs = (self.waited as i128 + self.execution as i128) * other.execution as i128;
        let rhs = (other.waited as i128 + other.execution as i128) * self.execution as i128;
        (lhs, rhs)
    }
}

impl PartialEq for ResponseRatio {
    fn eq(&self, other: &Self) -> bool {
        let (lhs, rhs) = self.cross(other);
        lhs == rhs
    }
}

impl Eq for ResponseRatio {}

impl PartialOrd for ResponseRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResponseRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        let (lhs, rhs) = self.cross(other);
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for ResponseRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names() {
        assert_eq!(Algorithm::Sjf.to_string(), "SJF");
        assert_eq!(Algorithm::Hrrn.to_string(), "HRRN");
        assert_eq!("srtf".parse::<Algorithm>().unwrap(), Algorithm::Srtf);
        assert_eq!(" Hrrn ".parse::<Algorithm>().unwrap(), Algorithm::Hrrn);
        assert!("fifo".parse::<Algorithm>().is_err());
        assert!(!Algorithm::Sjf.is_preemptive());
        assert!(Algorithm::Srtf.is_preemptive());
    }

    #[test]
    fn algorithm_serde() {
        let a: Algorithm = serde_json::from_str("\"HRRN\"").unwrap();
        assert_eq!(a, Algorithm::Hrrn);
        let a: Algorithm = serde_json::from_str("\"sjf\"").unwrap();
        assert_eq!(a, Algorithm::Sjf);
        let a: Algorithm = serde_json::from_str("\"sRtF\"").unwrap();
        assert_eq!(a, Algorithm::Srtf);
        let err = serde_json::from_str::<Algorithm>("\"fifo\"").unwrap_err();
        assert!(err.to_string().contains("unknown algorithm"));
        assert_eq!(serde_json::to_string(&Algorithm::Srtf).unwrap(), "\"SRTF\"");
    }

    #[test]
    fn response_ratio_is_exact() {
        // waited 2, execution 4 => 1.5
        let a = ResponseRatio::new(2, 0, 4);
        // waited 1, execution 2 => 1.5
        let b = ResponseRatio::new(3, 2, 2);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        approx::assert_relative_eq!(a.value(), 1.5);

        // waited 0 => always 1
        let fresh = ResponseRatio::new(5, 5, 7);
        assert!(fresh < a);
        assert_eq!(fresh.to_string(), "1.00");

        // 1/3 style fractions compare exactly
        let c = ResponseRatio::new(1, 0, 3);
        let d = ResponseRatio::new(2, 0, 6);
        assert_eq!(c, d);
        assert_eq!(c.to_string(), "1.33");

        // waited + execution would overflow i64
        let huge = ResponseRatio::new(i64::MAX, 0, i64::MAX);
        let half = ResponseRatio::new(i64::MAX / 2, 0, i64::MAX / 2);
        assert_eq!(huge, half);
        assert!(huge > fresh);
    }

    #[test]
    fn boxed_scheduler_forwards() {
        let boxed: Box<dyn Scheduler> = from_config(&Algorithm::Hrrn);
        assert_eq!(boxed.algorithm(), Algorithm::Hrrn);

        let schedule = boxed
            .schedule(&[ProcessSpec::new(1, 0, 2)])
            .unwrap();
        assert_eq!(schedule.algorithm, Algorithm::Hrrn);
        assert_eq!(schedule.timeline.len(), 2);
    }
}
