/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Workload files and the process generator.
//!
//! A workload file is UTF-8 text: a `#` header line, then one process per
//! line as five tab-separated non-negative integers —
//!
//! ```text
//! #id  arrival runtime priority    memory
//! 1    1       11      4           133
//! 2    4       22      9           76
//! ```
//!
//! All five fields are parsed and carried (the memory column feeds the
//! allocator).  Arrival times must be non-decreasing, and a runtime of zero
//! is rejected up front — a process that owes no service can never be
//! dispatched meaningfully.
//!
//! [`generate`]/[`write`] produce random workloads in the same shape, and
//! [`feed`] is the generator task: it releases each process onto the ingress
//! channel once the shared clock reaches its arrival tick.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::clock::SimClock;
use crate::pcb::{Pcb, ProcessSpec};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures loading or writing a workload file.  All fatal.
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("cannot access workload file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workload line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("workload line {line}: arrival times must be non-decreasing")]
    ArrivalOrder { line: usize },
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parse a workload file into process rows.
///
/// Lines starting with `#` and blank lines are skipped; every other line
/// must carry exactly five fields.  Line numbers in errors are 1-based.
pub fn load(path: &Path) -> Result<Vec<ProcessSpec>, WorkloadError> {
    let content = std::fs::read_to_string(path).map_err(|source| WorkloadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut specs = Vec::new();
    let mut last_arrival = 0;

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(WorkloadError::Parse {
                line,
                reason: format!("expected 5 fields, found {}", fields.len()),
            });
        }

        let spec = ProcessSpec {
            id: parse_field(fields[0], "id", line)?,
            arrival: parse_field(fields[1], "arrival", line)?,
            run_time: parse_field(fields[2], "runtime", line)?,
            priority: parse_field::<u32>(fields[3], "priority", line)? as i32,
            memory: parse_field(fields[4], "memory", line)?,
        };

        if spec.run_time == 0 {
            return Err(WorkloadError::Parse {
                line,
                reason: format!("process {} has a runtime of 0", spec.id),
            });
        }
        if spec.arrival < last_arrival {
            return Err(WorkloadError::ArrivalOrder { line });
        }
        last_arrival = spec.arrival;
        specs.push(spec);
    }

    debug!(count = specs.len(), path = %path.display(), "workload loaded");
    Ok(specs)
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    name: &str,
    line: usize,
) -> Result<T, WorkloadError> {
    raw.parse().map_err(|_| WorkloadError::Parse {
        line,
        reason: format!("{name} '{raw}' is not a non-negative integer"),
    })
}

// ── Generation ────────────────────────────────────────────────────────────────

/// Generate `count` random processes in the classic workload distribution:
/// arrivals start at 1 and grow by 0–10 per process (so they arrive in
/// order), runtimes 1–30, priorities 0–10, memory demands 0–255 bytes.
///
/// A fixed `seed` reproduces the same workload run after run.
pub fn generate(count: usize, seed: Option<u64>) -> Vec<ProcessSpec> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut arrival = 1;
    (1..=count as u32)
        .map(|id| {
            let spec = ProcessSpec {
                id,
                arrival,
                run_time: rng.gen_range(1..=30),
                priority: rng.gen_range(0..=10),
                memory: rng.gen_range(0..=255),
            };
            arrival += rng.gen_range(0..=10);
            spec
        })
        .collect()
}

/// Write `specs` as a workload file (header line plus tab-separated rows).
pub fn write(path: &Path, specs: &[ProcessSpec]) -> Result<(), WorkloadError> {
    let mut out = String::from("#id\tarrival\truntime\tpriority\tmemory\n");
    for spec in specs {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            spec.id, spec.arrival, spec.run_time, spec.priority, spec.memory
        ));
    }
    std::fs::write(path, out).map_err(|source| WorkloadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Feeding ───────────────────────────────────────────────────────────────────

/// The generator task: release each process onto the ingress channel once
/// the clock reaches its arrival tick.
///
/// `specs` must be in arrival order (the parser guarantees it).  A closed
/// channel means the consumer is gone — on interrupt, for instance — and
/// ends the task quietly rather than erroring.
pub async fn feed(
    specs: Vec<ProcessSpec>,
    clock: SimClock,
    ingress: UnboundedSender<Pcb>,
    poll: Duration,
) {
    for spec in specs {
        while clock.now() < spec.arrival {
            tokio::time::sleep(poll).await;
        }
        if ingress.send(Pcb::admit(spec)).is_err() {
            debug!("ingress channel closed, generator stopping");
            return;
        }
        debug!(process = spec.id, tick = clock.now(), "process released");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
