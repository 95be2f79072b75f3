/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Tick-driven scheduling engine for a single simulated CPU.
//!
//! [`Scheduler`] is a synchronous state machine with two entry points —
//! [`admit`](Scheduler::admit) for an arrival and [`tick`](Scheduler::tick)
//! for one clock tick — plus an async [`run`](Scheduler::run) driver that
//! busy-polls the non-blocking ingress channel and the shared clock, exactly
//! the way the surrounding system delivers events.  Tests drive the state
//! machine directly and get fully deterministic schedules.
//!
//! # Policies
//!
//! | Policy | Ready structure | Key | Preemption |
//! |---|---|---|---|
//! | `Hpf` | stable priority queue | `priority` | none — runs to completion |
//! | `Srtn` | stable priority queue | `remaining` | every tick, against the queue head |
//! | `RoundRobin` | circular FIFO | arrival order | when the running slice reaches the quantum |
//!
//! All three policies step **every tick**: the running process is charged
//! one tick of service per step, and round-robin enforces its quantum with a
//! slice counter instead of stretching the step interval.  That keeps the
//! waiting-time charge (one per tick per queued process) exact, and lets a
//! process whose remaining time is shorter than the quantum finish mid-slice
//! at its true end tick.
//!
//! # Tick anatomy
//!
//! Per tick `T`, in order: ingest pending arrivals (driver), charge waiting
//! time to every queued process that arrived before `T`, then run the
//! policy step at `T`.  Dispatch allocates the process's memory demand on
//! first dispatch; if the pool cannot serve it the process keeps its ready
//! position and the CPU idles this tick — the retry costs nothing and the
//! blocked process keeps accruing waiting time.

pub mod error;

pub use error::EngineError;

use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::clock::{SimClock, Tick};
use crate::memory::BuddyAllocator;
use crate::pcb::{Pcb, ProcessState};
use crate::ready::{FifoQueue, ReadyQueue};
use crate::report::SimReport;
use crate::worker::WorkerHandle;

// ── Policy ────────────────────────────────────────────────────────────────────

/// The scheduling policy driving the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Highest-Priority-First, non-preemptive.
    Hpf,
    /// Shortest-Remaining-Time-Next, preemptive.
    Srtn,
    /// Round-Robin with a fixed quantum.
    RoundRobin,
}

impl Policy {
    /// Parse the numeric algorithm id from the command line
    /// (0 = HPF, 1 = SRTN, 2 = RR).  Unknown ids are a configuration error,
    /// not a default.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Policy::Hpf),
            1 => Some(Policy::Srtn),
            2 => Some(Policy::RoundRobin),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Policy::Hpf => "HPF",
            Policy::Srtn => "SRTN",
            Policy::RoundRobin => "RR",
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// The scheduling engine: one CPU, one ready structure, one memory pool.
///
/// Owns every piece of mutable simulation state — the ready structure, the
/// running slot, the allocator, the arrival counters and the terminated
/// ledger — so the whole simulation is a value that moves through the
/// driver, with no process-wide mutable state anywhere.
#[derive(Debug)]
pub struct Scheduler {
    policy: Policy,
    /// RR slice length in ticks; unused by the other policies.
    quantum: Tick,
    /// Ticks the running process has held the CPU in the current RR slice.
    slice: Tick,
    ready: ReadyQueue,
    running: Option<Pcb>,
    allocator: BuddyAllocator,
    /// Total arrivals the generator owes us.
    expected: usize,
    /// Arrivals ingested so far.
    received: usize,
    finished: FifoQueue,
}

impl Scheduler {
    /// Create an engine for `policy`, expecting `expected` arrivals.
    ///
    /// # Errors
    /// [`EngineError::InvalidQuantum`] when round-robin is selected with a
    /// zero quantum.
    pub fn new(
        policy: Policy,
        quantum: Tick,
        expected: usize,
        allocator: BuddyAllocator,
    ) -> Result<Self, EngineError> {
        if policy == Policy::RoundRobin && quantum == 0 {
            return Err(EngineError::InvalidQuantum);
        }
        let ready = match policy {
            Policy::RoundRobin => ReadyQueue::circular(),
            Policy::Hpf | Policy::Srtn => ReadyQueue::priority(),
        };
        Ok(Self {
            policy,
            quantum,
            slice: 0,
            ready,
            running: None,
            allocator,
            expected,
            received: 0,
            finished: FifoQueue::new(),
        })
    }

    /// Emit the policy banner the log consumers key on.
    pub fn log_banner(&self) {
        match self.policy {
            Policy::Srtn => info!("============ SRTN ============"),
            Policy::RoundRobin => info!("============= RR ============="),
            Policy::Hpf => {}
        }
    }

    /// The simulation is over: every expected arrival has been ingested and
    /// has run to termination.
    pub fn is_done(&self) -> bool {
        self.received >= self.expected && self.ready.is_empty() && self.running.is_none()
    }

    // ── Arrival ingestion ─────────────────────────────────────────────────────

    /// Ingest one arrival at tick `now`.
    ///
    /// # Errors
    /// [`EngineError::MemoryDemandTooLarge`] for a demand that rounds above
    /// the whole pool — retrying such an allocation can never succeed, so it
    /// is rejected here instead of deadlocking the ready queue.
    pub fn admit(&mut self, mut pcb: Pcb, now: Tick) -> Result<(), EngineError> {
        let rounded = BuddyAllocator::round_request(pcb.memory);
        if rounded > self.allocator.pool_size() {
            return Err(EngineError::MemoryDemandTooLarge {
                id: pcb.id,
                bytes: pcb.memory,
                rounded,
                pool: self.allocator.pool_size(),
            });
        }
        debug_assert!(pcb.run_time >= 1, "the workload parser rejects zero runtimes");

        pcb.state = ProcessState::New;
        pcb.remaining = pcb.run_time;
        pcb.wait = 0;
        self.received += 1;
        info!("At time = {}, received process with ID = {}", now, pcb.id);

        let key = self.queue_key(&pcb);
        self.ready.enqueue(key, pcb);
        Ok(())
    }

    /// Ordering key under the current policy.
    fn queue_key(&self, pcb: &Pcb) -> i64 {
        match self.policy {
            Policy::Hpf => pcb.priority as i64,
            Policy::Srtn => pcb.remaining as i64,
            Policy::RoundRobin => 0,
        }
    }

    // ── Tick step ─────────────────────────────────────────────────────────────

    /// Advance the simulation by one tick.
    ///
    /// Charges waiting time first (to every queued process that arrived
    /// before `now`), then runs the policy step.
    pub fn tick(&mut self, now: Tick) -> Result<(), EngineError> {
        self.ready.increment_waits(now);
        match self.policy {
            Policy::Hpf => self.step_hpf(now),
            Policy::Srtn => self.step_srtn(now),
            Policy::RoundRobin => self.step_rr(now),
        }
    }

    /// Non-preemptive: the running process keeps the CPU until its service
    /// is complete; termination frees the CPU for the next head within the
    /// same tick.
    fn step_hpf(&mut self, now: Tick) -> Result<(), EngineError> {
        let Some(pcb) = self.running.as_mut() else {
            self.dispatch_next(now, None)?;
            return Ok(());
        };
        pcb.remaining -= 1;
        if pcb.remaining == 0 {
            if let Some(pcb) = self.running.take() {
                self.terminate(pcb, now);
            }
            self.dispatch_next(now, None)?;
        }
        Ok(())
    }

    /// Preemptive shortest-remaining-first: evict the incumbent (terminating
    /// it if its service completed, else back into the queue keyed by its
    /// new remaining time), then select the queue head.  Re-selecting the
    /// evicted incumbent is signal- and log-silent; an actual switch
    /// suspends the evicted worker.
    fn step_srtn(&mut self, now: Tick) -> Result<(), EngineError> {
        let mut evicted: Option<(u32, Tick, Option<WorkerHandle>)> = None;

        if let Some(mut pcb) = self.running.take() {
            pcb.remaining -= 1;
            if pcb.remaining == 0 {
                self.terminate(pcb, now);
            } else {
                evicted = Some((pcb.id, pcb.remaining, pcb.worker.clone()));
                pcb.state = ProcessState::Ready;
                let key = self.queue_key(&pcb);
                self.ready.enqueue(key, pcb);
            }
        }

        let silent = evicted.as_ref().map(|(id, _, _)| *id);
        self.dispatch_next(now, silent)?;

        if let Some((id, remaining, control)) = evicted {
            let kept_cpu = self.running.as_ref().map(|p| p.id) == Some(id);
            if !kept_cpu {
                if let Some(control) = control {
                    control.stop();
                }
                info!("At time = {}, ID = {}, remaining time = {}", now, id, remaining);
            }
        }
        Ok(())
    }

    /// Round-robin: charge the tick, then act on completion or slice
    /// exhaustion.  A process alone on the machine simply gets a fresh
    /// slice instead of a pointless switch to itself.
    fn step_rr(&mut self, now: Tick) -> Result<(), EngineError> {
        let Some(pcb) = self.running.as_mut() else {
            self.slice = 0;
            self.dispatch_next(now, None)?;
            return Ok(());
        };
        pcb.remaining -= 1;
        self.slice += 1;

        if pcb.remaining == 0 {
            if let Some(pcb) = self.running.take() {
                self.terminate(pcb, now);
            }
            self.slice = 0;
            self.dispatch_next(now, None)?;
        } else if self.slice >= self.quantum {
            if self.ready.is_empty() {
                self.slice = 0;
            } else {
                if let Some(mut pcb) = self.running.take() {
                    if let Some(worker) = pcb.worker.as_ref() {
                        worker.stop();
                    }
                    info!(
                        "At time = {}, ID = {}, remaining time = {}",
                        now, pcb.id, pcb.remaining
                    );
                    pcb.state = ProcessState::Ready;
                    let key = self.queue_key(&pcb);
                    self.ready.enqueue(key, pcb);
                }
                self.slice = 0;
                self.dispatch_next(now, None)?;
            }
        }
        Ok(())
    }

    // ── Dispatch & termination ────────────────────────────────────────────────

    /// Move the queue head onto the CPU, allocating its memory demand first
    /// if this is its first dispatch.
    ///
    /// On pool exhaustion the head **keeps its ready position** and nothing
    /// is dispatched this tick; the next tick retries with whatever memory
    /// terminations have freed in the meantime.
    ///
    /// `silent` marks a process that never conceptually left the CPU this
    /// tick (the re-selected SRTN incumbent): its dispatch sends no worker
    /// signal and emits no log line.
    fn dispatch_next(&mut self, now: Tick, silent: Option<u32>) -> Result<bool, EngineError> {
        let demand = match self.ready.peek() {
            None => return Ok(false),
            Some(head) => head.needs_memory().then_some(head.memory),
        };

        let block = match demand {
            None => None,
            Some(bytes) => match self.allocator.allocate(bytes) {
                Some(block) => Some(block),
                None => {
                    debug!(tick = now, "memory pool exhausted, dispatch deferred");
                    return Ok(false);
                }
            },
        };

        let Some(mut pcb) = self.ready.dequeue() else {
            return Ok(false);
        };
        if let Some(block) = block {
            let (start, end) = block.range();
            debug!(process = pcb.id, start, end, size = block.size, "memory assigned");
            pcb.block = Some(block);
        }

        if pcb.state == ProcessState::New {
            pcb.worker = Some(WorkerHandle::spawn(pcb.id)?);
            pcb.start = Some(now);
            info!(
                "At time = {}, new process with ID = {} started running",
                now, pcb.id
            );
        } else {
            debug_assert_eq!(pcb.state, ProcessState::Ready);
            if silent != Some(pcb.id) {
                if let Some(worker) = pcb.worker.as_ref() {
                    worker.cont();
                }
                info!(
                    "At time = {}, ID = {}, remaining time = {}",
                    now, pcb.id, pcb.remaining
                );
            }
        }

        pcb.state = ProcessState::Running;
        self.running = Some(pcb);
        Ok(true)
    }

    /// Finalise a process whose service completed at tick `now`: kill its
    /// worker, release its memory, stamp the end time and move it to the
    /// terminated ledger.
    fn terminate(&mut self, mut pcb: Pcb, now: Tick) {
        if let Some(worker) = pcb.worker.take() {
            worker.kill();
        }
        if let Some(block) = pcb.block.take() {
            self.allocator.deallocate(block);
        }
        pcb.end = Some(now);
        pcb.state = ProcessState::Terminated;
        info!("At time = {}, process with ID = {}, has finished", now, pcb.id);
        debug_assert_eq!(
            now - pcb.arrival,
            pcb.wait + pcb.run_time,
            "turnaround of process {} must equal waiting plus service",
            pcb.id
        );
        self.finished.enqueue(pcb);
    }

    /// Consume the engine and build the end-of-run report.
    pub fn finish(self) -> SimReport {
        SimReport::from_finished(self.finished)
    }

    // ── Async driver ──────────────────────────────────────────────────────────

    /// Drive the engine to completion against the live clock and ingress
    /// channel.
    ///
    /// The loop never blocks on the channel: arrivals are drained with a
    /// non-blocking poll, the clock is caught up one tick at a time (so a
    /// clock that jumps several ticks between polls never skips accounting),
    /// and the task sleeps `poll` between passes.
    ///
    /// # Errors
    /// Propagates fatal engine errors; a channel that disconnects while
    /// arrivals are still owed is [`EngineError::ChannelClosed`].
    pub async fn run(
        mut self,
        mut ingress: UnboundedReceiver<Pcb>,
        clock: SimClock,
        poll: Duration,
    ) -> Result<SimReport, EngineError> {
        self.log_banner();
        let mut next_tick: Tick = 0;
        loop {
            loop {
                match ingress.try_recv() {
                    Ok(pcb) => self.admit(pcb, clock.now())?,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if self.received < self.expected {
                            return Err(EngineError::ChannelClosed {
                                received: self.received,
                                expected: self.expected,
                            });
                        }
                        break;
                    }
                }
            }

            let now = clock.now();
            while next_tick <= now {
                self.tick(next_tick)?;
                next_tick += 1;
            }

            if self.is_done() {
                return Ok(self.finish());
            }
            tokio::time::sleep(poll).await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
