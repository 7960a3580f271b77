use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::metrics::Report;
use crate::timeline::Occupant;
use crate::utils::prelude::*;

/// Which renderings a run produces
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// per-process table plus averages, on stdout
    pub table: bool,
    /// run-length chart, on stdout
    pub gantt: bool,
    /// HRRN's ratio table at every decision, on stdout
    pub ratios: bool,
    /// per-process metrics as `<algorithm>_metrics.csv` in `output_dir`
    pub csv: bool,
    /// timeline as `<algorithm>_trace.json` in `output_dir`, for chrome://tracing
    pub chrome_trace: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table: true,
            gantt: true,
            ratios: false,
            csv: false,
            chrome_trace: false,
        }
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

const HEADERS: [&str; 9] = [
    "Process",
    "Arrival",
    "Execution",
    "Start",
    "Completion",
    "Waiting",
    "Turnaround",
    "Response",
    "Utilization",
];

fn table_line<S: AsRef<str>>(cells: impl Iterator<Item = S>, widths: &[usize]) -> String {
    cells
        .zip(widths.iter())
        .map(|(c, width)| format!("{:>width$}", c.as_ref(), width = width))
        .collect::<Vec<_>>()
        .join("  ")
}

/// The per-process table followed by the batch averages
pub fn render_table(report: &Report, mut w: impl io::Write) -> Result<()> {
    writeln!(w, "Process scheduling through {}", report.algorithm)?;
    writeln!(w)?;

    let rows: Vec<[String; 9]> = report
        .processes
        .iter()
        .map(|p| {
            [
                format!("P{}", p.id),
                p.arrival.to_string(),
                p.execution.to_string(),
                p.start.to_string(),
                p.completion.to_string(),
                p.waiting.to_string(),
                p.turnaround.to_string(),
                p.response.to_string(),
                percent(p.utilization),
            ]
        })
        .collect();

    let widths: Vec<usize> = HEADERS
        .iter()
        .enumerate()
        .map(|(i, h)| rows.iter().map(|r| r[i].len()).fold(h.len(), usize::max))
        .collect();

    writeln!(w, "{}", table_line(HEADERS.iter(), &widths))?;
    for row in rows.iter() {
        writeln!(w, "{}", table_line(row.iter(), &widths))?;
    }

    let s = &report.summary;
    writeln!(w)?;
    writeln!(w, "-> Average Waiting Time: {:.2}", s.avg_waiting)?;
    writeln!(w, "-> Average Turnaround Time: {:.2}", s.avg_turnaround)?;
    writeln!(w, "-> Average Response Time: {:.2}", s.avg_response)?;
    writeln!(w, "-> Utilization Rate of Whole System: {}", percent(s.avg_utilization))?;
    writeln!(
        w,
        "-> Makespan: {} ticks, {} idle, CPU busy {}, {} context switches",
        s.makespan,
        s.idle_ticks,
        percent(s.cpu_busy),
        s.context_switches
    )?;
    Ok(())
}

pub fn render_gantt(report: &Report, mut w: impl io::Write) -> Result<()> {
    writeln!(w)?;
    writeln!(w, "Gantt chart")?;
    writeln!(w, "{}", report.timeline)?;
    Ok(())
}

/// One line per decision tick, `ratio` of every eligible process
pub fn render_ratios(report: &Report, mut w: impl io::Write) -> Result<()> {
    if report.decisions.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    writeln!(w, "Response ratios")?;
    for decision in report.decisions.iter() {
        let cells: Vec<_> = decision
            .candidates
            .iter()
            .map(|(id, ratio)| format!("P{}={}", id, ratio))
            .collect();
        writeln!(w, "t={:<4} {}", decision.tick, cells.join(" "))?;
    }
    Ok(())
}

/// One summary row per engine, for runs over the same batch
pub fn render_comparison(reports: &[Report], mut w: impl io::Write) -> Result<()> {
    writeln!(
        w,
        "{:<6}{:>10}{:>12}{:>10}{:>13}{:>10}{:>10}",
        "Algo", "Waiting", "Turnaround", "Response", "Utilization", "Makespan", "Switches"
    )?;
    for report in reports {
        let s = &report.summary;
        writeln!(
            w,
            "{:<6}{:>10.2}{:>12.2}{:>10.2}{:>13}{:>10}{:>10}",
            report.algorithm.to_string(),
            s.avg_waiting,
            s.avg_turnaround,
            s.avg_response,
            percent(s.avg_utilization),
            s.makespan,
            s.context_switches
        )?;
    }
    Ok(())
}

pub fn write_csv(report: &Report, path: &Path) -> Result<()> {
    info!(path = %path.display(), "writing metrics csv");
    let mut wtr = csv::Writer::from_path(path)?;
    for p in report.processes.iter() {
        wtr.serialize(p)?;
    }
    wtr.flush()?;
    Ok(())
}

fn event_line(writer: impl io::Write, val: serde_json::Value) -> Result<()> {
    event_line_with_ending(writer, val, true)
}

fn event_line_with_ending(mut writer: impl io::Write, val: serde_json::Value, ending: bool) -> Result<()> {
    serde_json::to_writer(&mut writer, &val)?;
    if ending {
        writer.write_all(b",\n")?;
    }
    Ok(())
}

/// Timeline in the chrome trace event format, one tick as one microsecond.
///
/// The CPU is drawn as pid 0, each process gets its own track under pid 1 showing
/// the span from arrival to completion.
pub fn write_chrome_trace(report: &Report, path: &Path) -> Result<()> {
    info!(path = %path.display(), "writing chrome trace");
    let mut file = BufWriter::new(File::create(path)?);
    render_chrome_trace(report, &mut file)?;
    file.flush()?;
    Ok(())
}

pub fn render_chrome_trace(report: &Report, mut w: impl io::Write) -> Result<()> {
    w.write_all(b"{\"traceEvents\":[\n")?;

    for run in report.timeline.runs() {
        let (name, cat) = match run.occupant {
            Occupant::Process(id) => (format!("P{}", id), "exec"),
            Occupant::Idle => ("idle".to_string(), "idle"),
        };
        event_line(
            &mut w,
            json!({
                "name": name,
                "ph": "X",
                "cat": cat,
                "ts": run.start,
                "dur": run.len(),
                "pid": 0,
                "tid": 0,
            }),
        )?;
    }

    for p in report.processes.iter() {
        // presence in the system, arrival to completion
        event_line(
            &mut w,
            json!({
                "name": format!("P{}", p.id),
                "ph": "X",
                "cat": "presence",
                "ts": p.arrival,
                "dur": p.turnaround,
                "pid": 1,
                "tid": p.id,
                "args": {
                    "execution": p.execution,
                    "waiting": p.waiting,
                    "response": p.response,
                }
            }),
        )?;
        event_line(
            &mut w,
            json!({
                "name": format!("P{} start", p.id),
                "ph": "I",
                "cat": "start",
                "ts": p.start,
                "pid": 1,
                "tid": p.id,
            }),
        )?;
    }

    event_line(
        &mut w,
        json!({
            "name": "process_name",
            "ph": "M",
            "pid": 0,
            "args": {
                "name": format!("CPU ({})", report.algorithm)
            }
        }),
    )?;
    event_line_with_ending(
        &mut w,
        json!({
            "name": "process_name",
            "ph": "M",
            "pid": 1,
            "args": {
                "name": "Processes"
            }
        }),
        false,
    )?;
    w.write_all(b"\n],\"summary\":")?;
    serde_json::to_writer(&mut w, &report.summary)?;
    w.write_all(b"\n}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::evaluate;
    use crate::process::ProcessSpec;
    use crate::schedulers::{Hrrn, Scheduler, Sjf};

    fn report() -> Report {
        let specs = [
            ProcessSpec::new(1, 0, 5),
            ProcessSpec::new(2, 1, 3),
            ProcessSpec::new(3, 2, 1),
        ];
        evaluate(&Sjf.schedule(&specs).unwrap()).unwrap()
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = vec![];
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn table() {
        let out = render(|w| render_table(&report(), w));
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines[0], "Process scheduling through SJF");
        assert_eq!(
            lines[2],
            "Process  Arrival  Execution  Start  Completion  Waiting  Turnaround  Response  Utilization"
        );
        assert_eq!(
            lines[3],
            "     P1        0          5      0           5        0           5         0      100.00%"
        );
        assert!(out.contains("-> Average Waiting Time: 2.67\n"));
        assert!(out.contains("-> Average Turnaround Time: 5.67\n"));
        assert!(out.contains("-> Utilization Rate of Whole System: 54.17%\n"));
    }

    #[test]
    fn gantt() {
        let out = render(|w| render_gantt(&report(), w));
        assert!(out.contains("| P1  | P3  | P2  |\n0     5     6     9\n"));
    }

    #[test]
    fn ratios_only_for_hrrn() {
        assert_eq!(render(|w| render_ratios(&report(), w)), "");

        let specs = [ProcessSpec::new(1, 0, 2), ProcessSpec::new(2, 1, 1)];
        let hrrn = evaluate(&Hrrn.schedule(&specs).unwrap()).unwrap();
        let out = render(|w| render_ratios(&hrrn, w));
        assert!(out.contains("t=0    P1=1.00\n"));
        assert!(out.contains("t=1    P1=1.50 P2=1.00\n"));
    }

    #[test]
    fn comparison() {
        let out = render(|w| render_comparison(&[report()], w));
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("SJF "));
        assert!(lines[1].contains("2.67"));
        assert!(lines[1].contains("54.17%"));
    }

    #[test]
    fn chrome_trace_is_valid_json() {
        let out = render(|w| render_chrome_trace(&report(), w));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        let events = value["traceEvents"].as_array().unwrap();
        // 3 runs, 2 events per process, 2 metadata
        assert_eq!(events.len(), 3 + 6 + 2);
        assert_eq!(events[1]["name"], "P3");
        assert_eq!(events[1]["ts"], 5);
        assert_eq!(value["summary"]["makespan"], 9);
    }
}
