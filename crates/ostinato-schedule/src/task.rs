//! Periodic tasks as seen by a schedule domain.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use ostinato_core::{CoreId, EntryId};

/// Hardware clock count.
pub type Tick = u64;

/// Deadline sentinel meaning no interrupt is armed.
pub const UNARMED: Tick = Tick::MAX;

/// Interrupt-context callback installed by a registration.
pub type TaskHandler = Arc<dyn Fn() + Send + Sync>;

/// What makes a task due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskTrigger {
    /// Elapsed timer tick.
    Timer,
    /// Transfer completion on one DMA channel.
    DmaChannel {
        /// Controller index.
        dma: usize,
        /// Channel index on that controller.
        channel: usize,
        /// Component feeding the channel.
        source: EntryId,
    },
}

/// A periodic task registered against a domain.
///
/// Usually the scheduling component of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    /// Task id, normally the scheduling component id.
    pub id: EntryId,
    /// Core the task runs on.
    pub core: CoreId,
    /// Priority, lower runs first.
    pub priority: u32,
    /// Period in ticks.
    pub period: Tick,
    /// Earliest tick the task may run.
    pub start: Tick,
    /// Trigger source.
    pub trigger: TaskTrigger,
}

impl Task {
    /// Timer-driven task starting at tick 0.
    pub const fn timer(id: EntryId, core: CoreId, period: Tick) -> Self {
        Self {
            id,
            core,
            priority: 0,
            period,
            start: 0,
            trigger: TaskTrigger::Timer,
        }
    }

    /// DMA-driven task bound to `channel` of controller `dma`.
    pub const fn dma(
        id: EntryId,
        core: CoreId,
        period: Tick,
        dma: usize,
        channel: usize,
        source: EntryId,
    ) -> Self {
        Self {
            id,
            core,
            priority: 0,
            period,
            start: 0,
            trigger: TaskTrigger::DmaChannel {
                dma,
                channel,
                source,
            },
        }
    }

    /// Sets the earliest start tick.
    #[must_use]
    pub const fn starting_at(mut self, start: Tick) -> Self {
        self.start = start;
        self
    }

    /// DMA binding, if the task is channel driven.
    pub const fn dma_binding(&self) -> Option<(usize, usize, EntryId)> {
        match self.trigger {
            TaskTrigger::DmaChannel {
                dma,
                channel,
                source,
            } => Some((dma, channel, source)),
            TaskTrigger::Timer => None,
        }
    }
}

/// Clock feeding a domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockSource {
    /// Platform clock index.
    pub id: u32,
    /// Ticks per millisecond.
    pub ticks_per_ms: u32,
}

impl ClockSource {
    /// Creates a clock description.
    pub const fn new(id: u32, ticks_per_ms: u32) -> Self {
        Self { id, ticks_per_ms }
    }

    /// Converts milliseconds to ticks.
    pub const fn ms_to_ticks(&self, ms: u64) -> Tick {
        ms * self.ticks_per_ms as u64
    }

    /// Converts microseconds to ticks, rounding down.
    pub const fn us_to_ticks(&self, us: u64) -> Tick {
        us * self.ticks_per_ms as u64 / 1000
    }
}
