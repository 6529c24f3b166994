//! Topology replay command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use std::path::PathBuf;

use clap::Args;
use ostinato_core::{EntryKind, EntrySummary};

use super::common::{Step, check, compile, context, entry_counts, replay};

#[derive(Args)]
pub struct LoadArgs {
    /// Topology file (TOML)
    file: PathBuf,

    /// Number of cores
    #[arg(long, default_value_t = 2)]
    cores: usize,

    /// Run every core on its own worker thread
    #[arg(long)]
    threads: bool,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: LoadArgs) -> anyhow::Result<()> {
    let (topology, requests) = compile(&args.file, args.cores)?;
    let ctx = context(args.cores)?;
    let steps = replay(&ctx, requests, args.threads)?;
    let summaries = ctx.graph().summaries();

    if args.json {
        let json = serde_json::json!({
            "name": topology.name,
            "steps": steps.iter().map(step_json).collect::<Vec<_>>(),
            "entries": summaries.iter().map(entry_json).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return check(&steps);
    }

    println!("Topology: {} ({} cores)", topology.name, args.cores);
    if let Some(description) = &topology.description {
        println!("{description}");
    }
    println!();
    println!("  {:>3}  {:18}  {:6}  {:4}  {}", "#", "Request", "Core", "Hops", "Reply");
    for s in &steps {
        println!(
            "  {:>3}  {:18}  {:6}  {:4}  {}",
            s.index,
            s.op,
            s.core.to_string(),
            s.hops,
            s.code
        );
    }

    let [components, buffers, pipelines] = entry_counts(&ctx);
    println!();
    println!("Graph: {components} components, {buffers} buffers, {pipelines} pipelines");
    for e in &summaries {
        println!("  {}", describe(e));
    }
    check(&steps)
}

fn describe(e: &EntrySummary) -> String {
    let h = e.header;
    let head = format!("{:9} {:>4}  {}  pipeline {}", h.kind.name(), h.id, h.core, e.pipeline_id);
    let link = |id: Option<ostinato_core::EntryId>| id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match h.kind {
        EntryKind::Component => format!(
            "{head}  {}  in {} out {}{}",
            e.state.map_or("?", |s| s.name()),
            e.upstream,
            e.downstream,
            if e.is_shared { "  shared" } else { "" }
        ),
        EntryKind::Buffer => format!(
            "{head}  {} -> {}{}",
            link(e.links[0]),
            link(e.links[1]),
            if e.inter_core { "  inter-core" } else { "" }
        ),
        EntryKind::Pipeline => {
            format!("{head}  source {} sink {}", link(e.links[0]), link(e.links[1]))
        }
    }
}

fn step_json(s: &Step) -> serde_json::Value {
    serde_json::json!({
        "index": s.index,
        "op": s.op,
        "core": s.core.index(),
        "hops": s.hops,
        "reply": s.code,
    })
}

fn entry_json(e: &EntrySummary) -> serde_json::Value {
    serde_json::json!({
        "id": e.header.id.0,
        "kind": e.header.kind.name(),
        "core": e.header.core.index(),
        "pipeline": e.pipeline_id.0,
        "state": e.state.map(|s| s.name()),
        "shared": e.is_shared,
        "inter_core": e.inter_core,
        "links": e.links.map(|l| l.map(|id| id.0)),
    })
}
