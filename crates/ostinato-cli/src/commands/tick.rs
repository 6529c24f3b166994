//! Clock-driving command.
//!
//! Replays a topology, links every completed pipeline to its schedule
//! domain and advances the platform timer. Pipelines on the DMA domain get
//! one simulated transfer completion per period.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Args;
use ostinato_core::{EntryId, PipelineStatus, TimeDomain};
use ostinato_platform::PIPELINE_DMAC;

use super::common::{check, compile, context, replay};

#[derive(Args)]
pub struct TickArgs {
    /// Topology file (TOML)
    file: PathBuf,

    /// Milliseconds to run
    #[arg(long, default_value_t = 10)]
    ms: u64,

    /// Number of cores
    #[arg(long, default_value_t = 2)]
    cores: usize,
}

pub fn run(args: TickArgs) -> anyhow::Result<()> {
    let (topology, requests) = compile(&args.file, args.cores)?;
    let ctx = context(args.cores)?;
    let steps = replay(&ctx, requests, false)?;
    check(&steps)?;

    let complete: Vec<EntryId> = ctx
        .graph()
        .iter()
        .filter_map(|e| e.as_pipeline())
        .filter(|p| p.status() == PipelineStatus::Complete)
        .map(|p| p.id())
        .collect();
    if complete.is_empty() {
        anyhow::bail!("{}: no completed pipeline to schedule", topology.name);
    }

    let mut counters = Vec::with_capacity(complete.len());
    for id in complete {
        let runs = Arc::new(AtomicU64::new(0));
        let counter = runs.clone();
        let scheduled = ctx.schedule_pipeline(
            id,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        )?;
        counters.push((scheduled, runs));
    }

    let ticks = ctx.timer_domain().clock().ms_to_ticks(args.ms);
    let timer_runs = ctx.advance(ticks);
    for (scheduled, _) in &counters {
        if let (TimeDomain::Dma, Some((PIPELINE_DMAC, channel, _))) =
            (scheduled.domain, scheduled.task.dma_binding())
        {
            for _ in 0..ticks / scheduled.task.period {
                ctx.complete_dma(channel);
            }
        }
    }
    tracing::debug!(ticks, timer_runs, "clock stopped");

    println!("Ran {} for {} ms ({} ticks)", topology.name, args.ms, ticks);
    println!();
    for (scheduled, runs) in &counters {
        println!(
            "  pipeline {:>4}  {}  {:5}  period {:>6} ticks  runs {}",
            scheduled.pipeline,
            scheduled.task.core,
            domain_name(scheduled.domain),
            scheduled.task.period,
            runs.load(Ordering::Relaxed)
        );
    }

    for (scheduled, _) in &counters {
        ctx.unschedule_pipeline(scheduled.pipeline)?;
    }
    Ok(())
}

fn domain_name(domain: TimeDomain) -> &'static str {
    match domain {
        TimeDomain::Timer => "timer",
        TimeDomain::Dma => "dma",
    }
}
