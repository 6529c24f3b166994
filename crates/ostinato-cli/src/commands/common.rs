//! Shared CLI helpers used across multiple commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use ostinato_config::{Topology, TopologyValidator};
use ostinato_core::{ControlRequest, CoreId, Dispatch, EntryKind, reply_code};
use ostinato_platform::{HostCores, PlatformConfig, PlatformContext};

/// Outcome of one replayed request.
#[derive(Debug, Clone)]
pub struct Step {
    pub index: usize,
    pub op: &'static str,
    pub core: CoreId,
    pub hops: u32,
    pub code: i32,
}

/// Loads `path` and compiles it for `cores` cores.
pub fn compile(path: &Path, cores: usize) -> anyhow::Result<(Topology, Vec<ControlRequest>)> {
    let topology = Topology::load(path)?;
    let requests = TopologyValidator::new(cores)
        .compile(&topology)
        .with_context(|| format!("topology '{}' is invalid", topology.name))?;
    tracing::info!(name = %topology.name, requests = requests.len(), "topology compiled");
    Ok((topology, requests))
}

/// Platform context with the built-in drivers.
pub fn context(cores: usize) -> anyhow::Result<Arc<PlatformContext>> {
    let config = PlatformConfig::default().with_cores(cores);
    Ok(Arc::new(PlatformContext::with_builtin_drivers(config)?))
}

/// Replays `requests` in order, stopping after the first rejected one.
///
/// With `threads` every core runs on its own worker; otherwise forwarded
/// requests are re-run inline on the owning core.
pub fn replay(
    ctx: &Arc<PlatformContext>,
    requests: Vec<ControlRequest>,
    threads: bool,
) -> anyhow::Result<Vec<Step>> {
    if threads {
        let cores = HostCores::start(ctx.clone())?;
        let completions = cores.submit_all(requests)?;
        return Ok(completions
            .iter()
            .enumerate()
            .map(|(index, c)| Step {
                index,
                op: c.op,
                core: c.core,
                hops: c.hops,
                code: c.reply_code(),
            })
            .collect());
    }

    let mut steps = Vec::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        let mut step = Step {
            index,
            op: request.name(),
            core: CoreId::PRIMARY,
            hops: 0,
            code: 0,
        };
        let mut result = ctx.dispatch(CoreId::PRIMARY, request);
        if let Ok(Dispatch::Forwarded(owner)) = result {
            step.core = owner;
            step.hops = 1;
            result = ctx.dispatch(owner, request);
        }
        step.code = reply_code(&result);
        steps.push(step);
        if result.is_err() {
            break;
        }
    }
    Ok(steps)
}

/// Fails if the last step was rejected.
pub fn check(steps: &[Step]) -> anyhow::Result<()> {
    match steps.last() {
        Some(s) if s.code < 0 => {
            anyhow::bail!("request {} ({}) failed on {} with {}", s.index, s.op, s.core, s.code)
        }
        _ => Ok(()),
    }
}

/// Component, buffer and pipeline counts.
pub fn entry_counts(ctx: &PlatformContext) -> [usize; 3] {
    let graph = ctx.graph();
    [
        graph.count(EntryKind::Component),
        graph.count(EntryKind::Buffer),
        graph.count(EntryKind::Pipeline),
    ]
}
