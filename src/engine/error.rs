/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the scheduling engine.
//!
//! Everything here is fatal: the engine's only recoverable conditions — an
//! empty ingress poll and an allocator miss — are not errors at all (the
//! first is the idle path of the driver loop, the second keeps the process
//! queued for a retry on the next tick).  Every variant carries enough data
//! for the caller to log exactly what died without re-deriving state.

use thiserror::Error;

use crate::worker::SpawnError;

/// Fatal failures of the scheduling engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The ingress channel disconnected while arrivals were still owed.
    #[error("ingress channel closed early: received {received} of {expected} processes")]
    ChannelClosed { received: usize, expected: usize },

    /// A worker could not be created for a dispatched process.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// Round-robin was selected without a usable quantum.
    #[error("round-robin requires a quantum of at least 1 tick")]
    InvalidQuantum,

    /// A process demands more memory than the whole pool; retrying can never
    /// succeed, so the workload is rejected up front.
    #[error(
        "process {id} demands {bytes} bytes (rounds to {rounded}), more than the {pool}-byte pool"
    )]
    MemoryDemandTooLarge {
        id: u32,
        bytes: usize,
        rounded: usize,
        pool: usize,
    },
}
