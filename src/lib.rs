/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! schedsim – discrete-time process scheduling simulator with an integrated
//! binary buddy memory allocator.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── clock      – shared simulated tick counter + ticker task
//! ├── pcb        – Process Control Block and workload row types
//! ├── memory     – binary buddy allocator over a fixed pool
//! ├── ready      – priority / circular / plain FIFO ready structures
//! ├── engine/    – the tick-driven scheduling engine (HPF, SRTN, RR)
//! ├── worker     – simulated per-process workers (stop / cont / kill)
//! ├── workload   – workload file parsing, generation and the feeder task
//! ├── config     – YAML simulation settings
//! └── report     – per-process and aggregate end-of-run statistics
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod memory;
pub mod pcb;
pub mod ready;
pub mod report;
pub mod worker;
pub mod workload;
