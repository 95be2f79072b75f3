/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Process Control Block — the per-process record carried through the engine.
//!
//! Two types model the two ends of the pipeline:
//!
//! ```text
//! workload file ──► ProcessSpec ──(ingress channel)──► Pcb ──(engine)──► report row
//!                    ↑ immutable five-field row          ↑ mutable working record
//! ```
//!
//! # Ownership model
//! A [`Pcb`] is **owned** by exactly one place at a time: the ingress
//! channel in flight, then the engine's ready structure or running slot, and
//! finally the terminated ledger.  The engine mutates it in place as ticks
//! pass; the compiler guarantees there is never a second live copy to fall
//! out of sync.
//!
//! Sentinels from the original record layout are replaced by types: "no start
//! time yet" is `Option<Tick>` rather than a magic value, and the process
//! state is a real enum.

use crate::clock::Tick;
use crate::memory::Block;
use crate::worker::WorkerHandle;

// ── Process state ─────────────────────────────────────────────────────────────

/// Lifecycle state of a process.
///
/// `Blocked` is reserved for I/O-style waiting; the engine never enters it
/// (memory pressure keeps a process queued in `New` instead), but the state
/// vocabulary carries it so downstream consumers don't need a schema change
/// if blocking is ever modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    /// Arrived, never dispatched.
    #[default]
    New,
    /// Dispatched at least once, currently waiting in a ready structure.
    Ready,
    /// Holding the CPU.
    Running,
    /// Reserved — never entered.
    Blocked,
    /// Finished; accounted in the terminated ledger.
    Terminated,
}

// ── ProcessSpec (input row) ───────────────────────────────────────────────────

/// One row of the workload file: the immutable description of a synthetic
/// process before it enters the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Unique process id (positive, unique across the workload).
    pub id: u32,
    /// Arrival tick.
    pub arrival: Tick,
    /// Required CPU time in ticks (always ≥ 1; the parser rejects zero).
    pub run_time: Tick,
    /// Scheduling priority; lower value = higher priority.
    pub priority: i32,
    /// Requested memory in bytes.
    pub memory: usize,
}

// ── Pcb (working record) ──────────────────────────────────────────────────────

/// The mutable per-process record.
///
/// Created from a [`ProcessSpec`] when the process arrives, mutated by the
/// engine on every tick it spends in the system, finalised at termination.
#[derive(Debug, Clone, Default)]
pub struct Pcb {
    /// Process id from the workload.
    pub id: u32,
    /// Arrival tick (immutable after admission).
    pub arrival: Tick,
    /// Total required CPU ticks (immutable after admission).
    pub run_time: Tick,
    /// CPU ticks still owed.  Initialised to `run_time`, strictly decreasing
    /// while the process runs.
    pub remaining: Tick,
    /// Ticks spent in a ready structure after arrival.
    pub wait: Tick,
    /// Tick of first dispatch.
    pub start: Option<Tick>,
    /// Tick of termination.
    pub end: Option<Tick>,
    /// Priority; lower value = higher priority.
    pub priority: i32,
    /// Requested memory in bytes.
    pub memory: usize,
    /// Allocated pool range, once the first dispatch succeeded.
    pub block: Option<Block>,
    /// Lifecycle state.
    pub state: ProcessState,
    /// Handle to the simulated worker, set on first dispatch.
    pub worker: Option<WorkerHandle>,
}

impl Pcb {
    /// Build a fresh `New` record from a workload row, as the engine admits
    /// it: the full runtime is still owed and no waiting has been charged.
    pub fn admit(spec: ProcessSpec) -> Self {
        Self {
            id: spec.id,
            arrival: spec.arrival,
            run_time: spec.run_time,
            remaining: spec.run_time,
            priority: spec.priority,
            memory: spec.memory,
            ..Default::default()
        }
    }

    /// `true` until the first successful dispatch.
    pub fn has_started(&self) -> bool {
        self.start.is_some()
    }

    /// The process needs a pool allocation before it can run.
    pub fn needs_memory(&self) -> bool {
        self.state == ProcessState::New && self.block.is_none()
    }

    /// `end − arrival`, once finished.
    pub fn turnaround(&self) -> Option<Tick> {
        self.end.map(|end| end - self.arrival)
    }

    /// Turnaround divided by service time, once finished.
    pub fn weighted_turnaround(&self) -> Option<f64> {
        self.turnaround()
            .map(|ta| ta as f64 / self.run_time as f64)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
