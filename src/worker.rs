/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Simulated workers — the "child processes" the engine dispatches onto the
//! CPU.
//!
//! Each dispatched process is backed by one cooperative task whose lifetime
//! the engine holds through a [`WorkerHandle`].  The engine drives it with
//! the same three-verb vocabulary an OS scheduler would use on a real child:
//! `stop` (suspend), `cont` (resume), `kill` (terminate).  The task itself
//! does no work — the engine's per-tick decrement is the simulated CPU
//! consumption — but its lifecycle makes dispatch, preemption and
//! termination observable and gives spawn a real failure mode.
//!
//! Commands travel over an unbounded channel, so the engine never blocks on
//! a worker.  Sending to a worker that is already gone is logged and
//! ignored; only the initial spawn is allowed to fail the simulation.

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{trace, warn};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Worker creation failed.  This is fatal to the simulation: a process that
/// cannot get a worker can never run.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// No async runtime is available to host the worker task.
    #[error("cannot spawn worker for process {0}: no async runtime available")]
    NoRuntime(u32),
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Control verbs the engine sends to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerCommand {
    /// Suspend (preemption).
    Stop,
    /// Resume after a suspension.
    Cont,
    /// Terminate; the worker task exits.
    Kill,
}

// ── WorkerHandle ──────────────────────────────────────────────────────────────

/// Engine-side handle to one simulated worker.
///
/// Cloneable so the engine can keep a control line to a worker whose `Pcb`
/// has moved back into a ready structure.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    pcb_id: u32,
    tx: UnboundedSender<WorkerCommand>,
}

impl WorkerHandle {
    /// Launch the worker task for process `pcb_id`.
    ///
    /// # Errors
    /// Fails with [`SpawnError::NoRuntime`] when called outside a tokio
    /// runtime — the simulator's spawn-failure case.
    pub fn spawn(pcb_id: u32) -> Result<Self, SpawnError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SpawnError::NoRuntime(pcb_id))?;
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(worker_loop(pcb_id, rx));
        trace!(process = pcb_id, "worker spawned");
        Ok(Self { pcb_id, tx })
    }

    /// Suspend the worker (preemption).
    pub fn stop(&self) {
        self.send(WorkerCommand::Stop);
    }

    /// Resume a suspended worker.
    pub fn cont(&self) {
        self.send(WorkerCommand::Cont);
    }

    /// Terminate the worker.  Best-effort: a worker that is already gone is
    /// as killed as it needs to be.
    pub fn kill(&self) {
        self.send(WorkerCommand::Kill);
    }

    fn send(&self, cmd: WorkerCommand) {
        if self.tx.send(cmd).is_err() {
            warn!(process = self.pcb_id, ?cmd, "worker is gone, command dropped");
        }
    }
}

/// The worker task body: acknowledge control verbs until killed.
async fn worker_loop(pcb_id: u32, mut rx: UnboundedReceiver<WorkerCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkerCommand::Stop => trace!(process = pcb_id, "worker suspended"),
            WorkerCommand::Cont => trace!(process = pcb_id, "worker resumed"),
            WorkerCommand::Kill => {
                trace!(process = pcb_id, "worker terminated");
                return;
            }
        }
    }
    // Channel closed without an explicit kill: the engine dropped the
    // handle, treat it the same way.
    trace!(process = pcb_id, "worker control channel closed");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_and_full_command_cycle() {
        let worker = WorkerHandle::spawn(1).expect("runtime is available");
        worker.stop();
        worker.cont();
        worker.kill();
        // Commands after kill are dropped, not panicking
        tokio::task::yield_now().await;
        worker.stop();
    }

    #[test]
    fn spawn_outside_runtime_is_a_spawn_error() {
        let err = WorkerHandle::spawn(7).unwrap_err();
        assert!(matches!(err, SpawnError::NoRuntime(7)));
    }

    #[tokio::test]
    async fn clones_control_the_same_worker() {
        let worker = WorkerHandle::spawn(2).expect("runtime is available");
        let other = worker.clone();
        other.kill();
        tokio::task::yield_now().await;
        // Original handle now talks to a dead worker; must not panic
        worker.cont();
    }
}
