/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! schedsim command-line entry point.
//!
//! `run` wires the four collaborators of a simulation together — the clock
//! ticker, the process generator, the scheduling engine and its workers —
//! as tokio tasks sharing one clock handle and one ingress channel, and
//! waits for either completion or ctrl-c.  `generate` writes a random
//! workload file for later runs.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use schedsim::clock::{SimClock, Tick};
use schedsim::config::SimConfig;
use schedsim::engine::{Policy, Scheduler};
use schedsim::memory::BuddyAllocator;
use schedsim::workload;

// ── CLI surface ───────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "schedsim", about, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a simulation over an existing workload file.
    Run(RunArgs),
    /// Generate a random workload file.
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Number of processes to simulate (must not exceed the workload file).
    process_count: usize,

    /// Scheduling algorithm: 0 = HPF, 1 = SRTN, 2 = RR.
    algorithm: u8,

    /// Quantum size in ticks; ignored unless the algorithm is RR.
    quantum: Option<Tick>,

    /// Workload file to read (overrides the settings file).
    #[arg(long)]
    workload: Option<PathBuf>,

    /// Optional YAML settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wall-clock milliseconds per tick (overrides the settings file).
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Write the end-of-run statistics to this file as well as the log.
    #[arg(long)]
    perf: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Number of processes to generate.
    count: usize,

    /// Output file.
    #[arg(long, default_value = "processes.txt")]
    output: PathBuf,

    /// Seed for a reproducible workload.
    #[arg(long)]
    seed: Option<u64>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Generate(args) => generate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("schedsim: {err:#}");
            ExitCode::FAILURE
        }
    }
}

// ── run ───────────────────────────────────────────────────────────────────────

async fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(workload) = args.workload {
        config.workload = workload;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.tick_ms = tick_ms;
    }
    config.validate()?;

    let policy = Policy::from_id(args.algorithm)
        .ok_or_else(|| anyhow!("unknown algorithm id {} (valid: 0 = HPF, 1 = SRTN, 2 = RR)", args.algorithm))?;
    let quantum = args.quantum.unwrap_or(0);

    let specs = workload::load(&config.workload)?;
    if args.process_count > specs.len() {
        bail!(
            "workload file {} holds {} processes, {} requested",
            config.workload.display(),
            specs.len(),
            args.process_count
        );
    }
    let specs: Vec<_> = specs.into_iter().take(args.process_count).collect();

    info!(
        policy = policy.name(),
        processes = specs.len(),
        tick_ms = config.tick_ms,
        pool = config.pool_size,
        "simulation starting"
    );

    let clock = SimClock::new();
    let ticker = clock.run_driver(config.tick_period());
    let (ingress_tx, ingress_rx) = tokio::sync::mpsc::unbounded_channel();

    let generator = tokio::spawn(workload::feed(
        specs,
        clock.clone(),
        ingress_tx,
        config.poll_period(),
    ));

    let allocator = BuddyAllocator::new(config.pool_size);
    let scheduler = Scheduler::new(policy, quantum, args.process_count, allocator)?;
    let simulation = scheduler.run(ingress_rx, clock, config.poll_period());

    let report = tokio::select! {
        result = simulation => {
            ticker.abort();
            result?
        }
        _ = tokio::signal::ctrl_c() => {
            // Tear down the collaborators; dropping the engine side of the
            // channel stops the generator on its next send.
            ticker.abort();
            generator.abort();
            info!("interrupted, simulation resources released");
            return Ok(());
        }
    };

    info!("simulation complete\n{report}");
    if let Some(path) = args.perf {
        std::fs::write(&path, format!("{report}\n"))
            .with_context(|| format!("cannot write statistics to {}", path.display()))?;
        info!("statistics written to {}", path.display());
    }
    Ok(())
}

// ── generate ──────────────────────────────────────────────────────────────────

fn generate(args: GenerateArgs) -> Result<()> {
    let specs = workload::generate(args.count, args.seed);
    workload::write(&args.output, &specs)?;
    info!(
        count = specs.len(),
        file = %args.output.display(),
        "workload generated"
    );
    Ok(())
}
