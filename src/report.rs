//! End-of-run statistics.
//!
//! One row per finished process, in completion order, plus the aggregates
//! operators actually compare runs by: average waiting time, average
//! turnaround, average weighted turnaround and CPU utilisation.  The
//! `Display` rendering is the run's human-readable summary; the CLI can
//! also persist it next to the workload file.

use std::fmt;

use crate::clock::Tick;
use crate::ready::FifoQueue;

// ── Rows ──────────────────────────────────────────────────────────────────────

/// Final accounting for one finished process.
#[derive(Debug, Clone)]
pub struct ProcessRow {
    pub id: u32,
    pub arrival: Tick,
    pub run_time: Tick,
    pub priority: i32,
    pub start: Tick,
    pub end: Tick,
    pub wait: Tick,
    /// `end − arrival`.
    pub turnaround: Tick,
    /// Turnaround divided by service time.
    pub weighted: f64,
}

// ── SimReport ─────────────────────────────────────────────────────────────────

/// The complete end-of-run report.
#[derive(Debug, Clone, Default)]
pub struct SimReport {
    /// Per-process rows, in completion order.
    pub rows: Vec<ProcessRow>,
    pub avg_wait: f64,
    pub avg_turnaround: f64,
    pub avg_weighted: f64,
    /// Busy ticks over the makespan, in `[0, 1]`.
    pub cpu_utilization: f64,
    /// Tick at which the last process finished.
    pub makespan: Tick,
}

impl SimReport {
    /// Build the report from the engine's terminated ledger (which holds
    /// processes in completion order).
    pub fn from_finished(finished: FifoQueue) -> Self {
        let rows: Vec<ProcessRow> = finished
            .into_iter()
            .map(|pcb| {
                let end = pcb.end.unwrap_or_default();
                let turnaround = end - pcb.arrival;
                ProcessRow {
                    id: pcb.id,
                    arrival: pcb.arrival,
                    run_time: pcb.run_time,
                    priority: pcb.priority,
                    start: pcb.start.unwrap_or_default(),
                    end,
                    wait: pcb.wait,
                    turnaround,
                    weighted: turnaround as f64 / pcb.run_time as f64,
                }
            })
            .collect();

        if rows.is_empty() {
            return Self::default();
        }

        let count = rows.len() as f64;
        let busy: Tick = rows.iter().map(|r| r.run_time).sum();
        let makespan = rows.iter().map(|r| r.end).max().unwrap_or_default();

        Self {
            avg_wait: rows.iter().map(|r| r.wait).sum::<Tick>() as f64 / count,
            avg_turnaround: rows.iter().map(|r| r.turnaround).sum::<Tick>() as f64 / count,
            avg_weighted: rows.iter().map(|r| r.weighted).sum::<f64>() / count,
            cpu_utilization: if makespan == 0 {
                0.0
            } else {
                busy as f64 / makespan as f64
            },
            makespan,
            rows,
        }
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>4} {:>8} {:>8} {:>5} {:>6} {:>6} {:>6} {:>11} {:>5}",
            "id", "arrival", "runtime", "prio", "start", "end", "wait", "turnaround", "wta"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>4} {:>8} {:>8} {:>5} {:>6} {:>6} {:>6} {:>11} {:>5.2}",
                row.id,
                row.arrival,
                row.run_time,
                row.priority,
                row.start,
                row.end,
                row.wait,
                row.turnaround,
                row.weighted
            )?;
        }
        writeln!(f, "CPU utilization = {:.2}%", self.cpu_utilization * 100.0)?;
        writeln!(f, "Avg WTA = {:.2}", self.avg_weighted)?;
        writeln!(f, "Avg Waiting = {:.2}", self.avg_wait)?;
        write!(f, "Avg Turnaround = {:.2}", self.avg_turnaround)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcb::{Pcb, ProcessSpec};

    fn finished_pcb(id: u32, arrival: Tick, run_time: Tick, start: Tick, end: Tick) -> Pcb {
        let mut pcb = Pcb::admit(ProcessSpec {
            id,
            arrival,
            run_time,
            priority: 0,
            memory: 0,
        });
        pcb.start = Some(start);
        pcb.end = Some(end);
        pcb.wait = end - arrival - run_time;
        pcb
    }

    #[test]
    fn aggregates_match_hand_computation() {
        let mut ledger = FifoQueue::new();
        ledger.enqueue(finished_pcb(1, 0, 5, 0, 5)); // wait 0, ta 5,  wta 1.0
        ledger.enqueue(finished_pcb(2, 1, 3, 5, 8)); // wait 4, ta 7,  wta 7/3
        ledger.enqueue(finished_pcb(3, 2, 2, 8, 10)); // wait 6, ta 8, wta 4.0

        let report = SimReport::from_finished(ledger);
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.makespan, 10);
        assert!((report.avg_wait - 10.0 / 3.0).abs() < 1e-9);
        assert!((report.avg_turnaround - 20.0 / 3.0).abs() < 1e-9);
        assert!((report.avg_weighted - (1.0 + 7.0 / 3.0 + 4.0) / 3.0).abs() < 1e-9);
        assert!((report.cpu_utilization - 1.0).abs() < 1e-9, "no idle ticks");
    }

    #[test]
    fn rows_keep_completion_order() {
        let mut ledger = FifoQueue::new();
        ledger.enqueue(finished_pcb(3, 0, 1, 0, 1));
        ledger.enqueue(finished_pcb(1, 0, 2, 1, 3));
        let report = SimReport::from_finished(ledger);
        let order: Vec<u32> = report.rows.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![3, 1]);
    }

    #[test]
    fn empty_ledger_yields_empty_report() {
        let report = SimReport::from_finished(FifoQueue::new());
        assert!(report.rows.is_empty());
        assert_eq!(report.cpu_utilization, 0.0);
    }

    #[test]
    fn display_carries_the_aggregate_lines() {
        let mut ledger = FifoQueue::new();
        ledger.enqueue(finished_pcb(1, 0, 4, 0, 4));
        let text = SimReport::from_finished(ledger).to_string();
        assert!(text.contains("CPU utilization = 100.00%"));
        assert!(text.contains("Avg WTA = 1.00"));
        assert!(text.contains("Avg Waiting = 0.00"));
    }
}
