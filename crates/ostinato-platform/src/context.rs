//! Explicit platform context.
//!
//! One [`PlatformContext`] is built at startup and handed to every call site
//! that needs the graph or a schedule domain. It owns the graph registry,
//! the memory collaborators, and one schedule domain per trigger type:
//! a timer domain backed by a [`SoftTimer`] and a DMA multi-channel domain
//! backed by a [`SimDmac`].
//!
//! Completed pipelines are linked to their domain with
//! [`schedule_pipeline`](PlatformContext::schedule_pipeline). Time is driven
//! by [`advance`](PlatformContext::advance), DMA completions by
//! [`complete_dma`](PlatformContext::complete_dma).

use std::collections::BTreeMap;
use std::sync::Arc;

use ostinato_core::{
    ControlRequest, CoreId, CountingCache, Dispatch, DriverList, EntryId, GraphRegistry,
    PipelineStatus, PoolAllocator, TimeDomain,
};
use ostinato_registry::DriverCatalog;
use ostinato_schedule::{
    ClockSource, DmaMultiChannelBackend, HardwareTimer, ScheduleDomain, SharedDmac, SimDmac,
    SoftTimer, Task, TaskHandler, Tick, TimerBackend, UNARMED,
};
use parking_lot::{Mutex, MutexGuard};

use crate::config::{POOL_BASE, PlatformConfig};
use crate::error::PlatformError;

const TIMER_CLOCK: u32 = 0;
const DMA_CLOCK: u32 = 1;

/// Controller index every DMA-driven pipeline binds to.
pub const PIPELINE_DMAC: usize = 0;

/// Handlers waiting for a core's timer interrupt.
type RunQueue = Arc<Mutex<Vec<TaskHandler>>>;

struct Scheduled {
    task: Task,
    domain: TimeDomain,
    handler: TaskHandler,
    next_due: Tick,
}

/// A pipeline linked to a schedule domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledPipeline {
    /// Pipeline entry id.
    pub pipeline: EntryId,
    /// Task registered with the domain.
    pub task: Task,
    /// Domain driving the task.
    pub domain: TimeDomain,
}

/// Process-wide runtime state.
pub struct PlatformContext {
    config: PlatformConfig,
    graph: Mutex<GraphRegistry>,
    allocator: Arc<PoolAllocator>,
    cache: Arc<CountingCache>,
    timer: Arc<SoftTimer>,
    timer_backend: Arc<TimerBackend<Arc<SoftTimer>>>,
    timer_domain: ScheduleDomain,
    run_queues: Vec<RunQueue>,
    core_irqs: Vec<TaskHandler>,
    dmac: Arc<SimDmac>,
    dma_backend: Arc<DmaMultiChannelBackend>,
    dma_domain: ScheduleDomain,
    scheduled: Mutex<BTreeMap<EntryId, Scheduled>>,
}

impl PlatformContext {
    /// Builds the context for `config` with `drivers` as the driver table.
    pub fn new(config: PlatformConfig, drivers: DriverList) -> Result<Self, PlatformError> {
        config.validate()?;

        let allocator = Arc::new(PoolAllocator::new(POOL_BASE, config.memory_capacity));
        let cache = Arc::new(CountingCache::new());
        let graph = GraphRegistry::new(drivers, allocator.clone(), cache.clone())
            .with_core_count(config.core_count);

        let timer = Arc::new(SoftTimer::default());
        let timer_backend = Arc::new(TimerBackend::new(timer.clone()));
        let timer_domain = ScheduleDomain::new(
            timer_backend.clone(),
            ClockSource::new(TIMER_CLOCK, config.timer_ticks_per_ms),
            false,
        );

        let run_queues: Vec<RunQueue> = (0..config.core_count)
            .map(|_| Arc::new(Mutex::new(Vec::new())))
            .collect();
        let core_irqs = run_queues
            .iter()
            .map(|queue| {
                let queue = queue.clone();
                let irq: TaskHandler = Arc::new(move || {
                    let due = std::mem::take(&mut *queue.lock());
                    for handler in due {
                        handler();
                    }
                });
                irq
            })
            .collect();

        let dmac = Arc::new(SimDmac::new(config.dma_channels));
        let dmacs: Vec<SharedDmac> = vec![dmac.clone()];
        let dma_backend = Arc::new(DmaMultiChannelBackend::new(dmacs, config.aggregated_irq));
        let dma_domain = ScheduleDomain::new(
            dma_backend.clone(),
            ClockSource::new(DMA_CLOCK, config.timer_ticks_per_ms),
            false,
        );

        tracing::info!(
            cores = config.core_count,
            memory = config.memory_capacity,
            drivers = graph.drivers().len(),
            "platform context ready"
        );

        Ok(Self {
            config,
            graph: Mutex::new(graph),
            allocator,
            cache,
            timer,
            timer_backend,
            timer_domain,
            run_queues,
            core_irqs,
            dmac,
            dma_backend,
            dma_domain,
            scheduled: Mutex::new(BTreeMap::new()),
        })
    }

    /// Builds the context with every built-in driver registered.
    pub fn with_builtin_drivers(config: PlatformConfig) -> Result<Self, PlatformError> {
        Self::new(config, DriverCatalog::new().driver_list())
    }

    /// Configuration the context was built from.
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Number of cores.
    pub fn core_count(&self) -> usize {
        self.config.core_count
    }

    // --- Control dispatch ---

    /// Runs `request` as if received on `cpu`.
    pub fn dispatch(&self, cpu: CoreId, request: &ControlRequest) -> ostinato_core::Result<Dispatch> {
        let result = self.graph.lock().apply(cpu, request);
        match &result {
            Ok(Dispatch::Completed) => tracing::debug!(%cpu, op = request.name(), "completed"),
            Ok(Dispatch::Forwarded(owner)) => {
                tracing::debug!(%cpu, %owner, op = request.name(), "forwarded");
            }
            Err(e) => tracing::warn!(%cpu, op = request.name(), error = %e, "rejected"),
        }
        result
    }

    /// Runs `request` on `cpu` and returns the reply code.
    pub fn reply(&self, cpu: CoreId, request: &ControlRequest) -> i32 {
        ostinato_core::reply_code(&self.dispatch(cpu, request))
    }

    /// Runs `request` from the primary core, following a forward to the
    /// owning core. Returns the core that completed it.
    pub fn execute(&self, request: &ControlRequest) -> Result<CoreId, PlatformError> {
        match self.dispatch(CoreId::PRIMARY, request)? {
            Dispatch::Completed => Ok(CoreId::PRIMARY),
            Dispatch::Forwarded(owner) => match self.dispatch(owner, request)? {
                Dispatch::Completed => Ok(owner),
                Dispatch::Forwarded(_) => Err(PlatformError::Unroutable(owner)),
            },
        }
    }

    /// Executes `requests` in order, stopping at the first failure.
    pub fn execute_all<'a>(
        &self,
        requests: impl IntoIterator<Item = &'a ControlRequest>,
    ) -> Result<usize, PlatformError> {
        let mut count = 0;
        for request in requests {
            self.execute(request)?;
            count += 1;
        }
        Ok(count)
    }

    /// Locks the graph registry.
    pub fn graph(&self) -> MutexGuard<'_, GraphRegistry> {
        self.graph.lock()
    }

    /// Allocator backing every registry object.
    pub fn allocator(&self) -> &PoolAllocator {
        &self.allocator
    }

    /// Cache maintenance counters.
    pub fn cache(&self) -> &CountingCache {
        &self.cache
    }

    // --- Scheduling ---

    /// Domain driven by the platform timer.
    pub fn timer_domain(&self) -> &ScheduleDomain {
        &self.timer_domain
    }

    /// Domain driven by DMA completions.
    pub fn dma_domain(&self) -> &ScheduleDomain {
        &self.dma_domain
    }

    /// Platform timer.
    pub fn timer(&self) -> &SoftTimer {
        &self.timer
    }

    /// Simulated DMA controller.
    pub fn dmac(&self) -> &SimDmac {
        &self.dmac
    }

    /// Current platform tick.
    pub fn now(&self) -> Tick {
        self.timer.now()
    }

    /// Registers the scheduling component of pipeline `id` with the domain
    /// named by its time domain. `handler` runs once per period.
    pub fn schedule_pipeline(
        &self,
        id: EntryId,
        handler: TaskHandler,
    ) -> Result<ScheduledPipeline, PlatformError> {
        let (params, sched, source, pipeline_id) = {
            let graph = self.graph.lock();
            let pipe = graph
                .pipeline(id)
                .ok_or(ostinato_core::Error::NotFound(id))?;
            if pipe.status() != PipelineStatus::Complete {
                return Err(PlatformError::NotSchedulable(id));
            }
            let (Some(sched), Some(source)) = (pipe.sched_comp(), pipe.source_comp()) else {
                return Err(PlatformError::NotSchedulable(id));
            };
            (*pipe.params(), sched, source, pipe.pipeline_id())
        };

        let mut scheduled = self.scheduled.lock();
        if scheduled.contains_key(&id) {
            return Err(PlatformError::AlreadyScheduled(id));
        }

        let core = params.core;
        let now = self.timer.now();
        let domain = match params.time_domain {
            TimeDomain::Timer => &self.timer_domain,
            TimeDomain::Dma => &self.dma_domain,
        };
        let period = domain.clock().us_to_ticks(u64::from(params.period)).max(1);

        let task = match params.time_domain {
            TimeDomain::Timer => {
                let task = Task::timer(sched, core, period).starting_at(now);
                self.timer_domain
                    .register(core, &task, self.core_irqs[core.index()].clone())?;
                self.timer_domain.enable(core);
                self.timer_domain.stage_target(self.timer_domain.next_tick());
                self.timer_domain.stage_target(now + period);
                self.timer_domain.commit_target();
                task
            }
            TimeDomain::Dma => {
                let channel = pipeline_id.0 as usize % self.config.dma_channels;
                let task = Task::dma(sched, core, period, PIPELINE_DMAC, channel, source);
                self.dma_domain.register(core, &task, handler.clone())?;
                self.dma_domain.enable(core);
                task
            }
        };

        tracing::debug!(
            pipeline = %id,
            %core,
            domain = domain.kind().name(),
            period,
            "pipeline scheduled"
        );
        scheduled.insert(
            id,
            Scheduled {
                task,
                domain: params.time_domain,
                handler,
                next_due: now + period,
            },
        );
        Ok(ScheduledPipeline {
            pipeline: id,
            task,
            domain: params.time_domain,
        })
    }

    /// Unregisters pipeline `id` from its domain.
    ///
    /// The core's interrupt source is disabled when its last task in the
    /// domain goes, and the timer is disarmed when no timer task is left.
    pub fn unschedule_pipeline(&self, id: EntryId) -> Result<(), PlatformError> {
        let mut scheduled = self.scheduled.lock();
        let entry = scheduled.remove(&id).ok_or(PlatformError::NotScheduled(id))?;
        let core = entry.task.core;
        let remaining = scheduled
            .values()
            .filter(|s| s.domain == entry.domain && s.task.core == core)
            .count() as u32;

        let domain = match entry.domain {
            TimeDomain::Timer => &self.timer_domain,
            TimeDomain::Dma => &self.dma_domain,
        };
        if let Err(e) = domain.unregister(core, &entry.task, remaining) {
            scheduled.insert(id, entry);
            return Err(e.into());
        }
        if remaining == 0 {
            domain.disable(core);
        }
        if entry.domain == TimeDomain::Timer
            && !scheduled.values().any(|s| s.domain == TimeDomain::Timer)
        {
            self.timer_domain.disarm();
        }
        tracing::debug!(pipeline = %id, %core, remaining, "pipeline unscheduled");
        Ok(())
    }

    /// Pipelines currently linked to a domain, in id order.
    pub fn scheduled(&self) -> Vec<ScheduledPipeline> {
        self.scheduled
            .lock()
            .iter()
            .map(|(&pipeline, s)| ScheduledPipeline {
                pipeline,
                task: s.task,
                domain: s.domain,
            })
            .collect()
    }

    /// Moves the platform timer forward by `ticks`, taking every timer
    /// interrupt that falls inside the window.
    ///
    /// Returns the number of pipeline runs.
    pub fn advance(&self, ticks: Tick) -> usize {
        let end = self.timer.now().saturating_add(ticks);
        let mut runs = 0;

        loop {
            let deadline = self.timer_domain.next_tick();
            if deadline == UNARMED || deadline > end {
                break;
            }
            self.timer.set_now(deadline);

            let mut fired = vec![false; self.config.core_count];
            {
                let mut scheduled = self.scheduled.lock();
                for s in scheduled
                    .values_mut()
                    .filter(|s| s.domain == TimeDomain::Timer)
                {
                    if s.next_due <= deadline && self.timer_domain.is_pending(&s.task).pending {
                        let core = s.task.core.index();
                        self.run_queues[core].lock().push(s.handler.clone());
                        fired[core] = true;
                        runs += 1;
                        while s.next_due <= deadline {
                            s.next_due += s.task.period;
                        }
                    }
                    self.timer_domain.stage_target(s.next_due);
                }
            }
            self.timer_domain.commit_target();

            for core in CoreId::all().filter(|c| fired.get(c.index()).copied().unwrap_or(false)) {
                self.timer_backend.fire(core);
            }
            if self.timer_domain.next_tick() <= deadline {
                break;
            }
        }

        self.timer.set_now(end);
        tracing::trace!(now = end, runs, "timer advanced");
        runs
    }

    /// Raises a completion on DMA `channel` and takes its interrupt.
    ///
    /// Returns whether a scheduled pipeline ran.
    pub fn complete_dma(&self, channel: usize) -> bool {
        self.dmac.complete(channel);
        let task = self
            .scheduled
            .lock()
            .values()
            .find(|s| {
                matches!(s.task.dma_binding(), Some((PIPELINE_DMAC, ch, _)) if ch == channel)
            })
            .map(|s| s.task);
        let Some(task) = task else {
            return false;
        };
        let pending = self.dma_domain.is_pending(&task);
        if !pending.pending {
            return false;
        }
        tracing::trace!(channel, source = ?pending.source, "dma completion");
        self.dma_backend.fire(PIPELINE_DMAC, channel)
    }
}

impl std::fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformContext")
            .field("config", &self.config)
            .field("timer_domain", &self.timer_domain)
            .field("dma_domain", &self.dma_domain)
            .finish_non_exhaustive()
    }
}
