/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Simulated clock shared by the generator, the engine and the tests.
//!
//! The clock is a single monotonically non-decreasing counter visible to
//! every collaborator through a cloneable handle.  Nothing in the simulation
//! blocks on it: readers poll [`SimClock::now`] and react when the value has
//! moved.  In a live run a background ticker task advances the counter once
//! per wall-clock period; tests advance it by hand and get fully
//! deterministic schedules.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// One unit of simulated time.
pub type Tick = u64;

/// Cloneable handle to the shared tick counter.
///
/// All clones observe the same counter.  `now()` is the only operation the
/// engine and generator use; `advance()` belongs to the ticker driver (or to
/// a test standing in for it).
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    tick: Arc<AtomicU64>,
}

impl SimClock {
    /// Create a clock at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick.
    pub fn now(&self) -> Tick {
        self.tick.load(Ordering::Relaxed)
    }

    /// Advance by one tick and return the new value.
    pub fn advance(&self) -> Tick {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Spawn the ticker task: advance the clock once per `period` of wall
    /// time, forever.  The caller aborts the returned handle when the
    /// simulation is over.
    pub fn run_driver(&self, period: Duration) -> JoinHandle<()> {
        let clock = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first interval tick completes immediately; consume it so
            // tick 0 lasts a full period like every other tick.
            interval.tick().await;
            loop {
                interval.tick().await;
                clock.advance();
            }
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(SimClock::new().now(), 0);
    }

    #[test]
    fn advance_is_visible_to_all_clones() {
        let clock = SimClock::new();
        let other = clock.clone();
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance(), 2);
        assert_eq!(other.now(), 2);
    }

    #[tokio::test]
    async fn driver_advances_the_clock() {
        let clock = SimClock::new();
        let driver = clock.run_driver(Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(20)).await;
        driver.abort();
        assert!(clock.now() > 0, "ticker never advanced the clock");
    }
}
