//! Ostinato Schedule - low-latency schedule domains
//!
//! A schedule domain is a periodic trigger source, a hardware timer or DMA
//! completion, that pipeline scheduling components register against. Each
//! interrupt the low-latency scheduler asks the domain which of its tasks
//! are due.
//!
//! # Core Abstractions
//!
//! - [`ScheduleDomain`] - Shared bookkeeping: task count, per-core
//!   registered/enabled flags, armed and staged deadlines
//! - [`DomainBackend`] - Interrupt-source specific register/unregister,
//!   enable/disable, arm/disarm and pending queries
//! - [`TimerBackend`] - Per-core timer interrupt handlers over a
//!   [`HardwareTimer`]
//! - [`DmaMultiChannelBackend`] / [`DmaSingleChannelBackend`] - DMA
//!   completion over [`DmaController`]s
//! - [`SoftTimer`] / [`SimDmac`] - Host implementations for tests and tools
//!
//! # Concurrency
//!
//! Every method takes `&self`. Counters are atomics; per-core enable
//! transitions and backend handler tables run inside
//! [`critical_section::with`]. Enable the `std` feature (default) for the
//! host critical-section implementation; firmware links its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use ostinato_schedule::{ClockSource, ScheduleDomain, SoftTimer, Task, TimerBackend};
//!
//! let timer = Arc::new(SoftTimer::new(0));
//! let domain = ScheduleDomain::new(TimerBackend::new(timer.clone()), ClockSource::new(0, 1000), false);
//! domain.register(core, &Task::timer(id, core, 1000), Arc::new(|| run_ll_tasks()))?;
//! domain.enable(core);
//! domain.arm(1000);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod dma;
pub mod domain;
pub mod task;
pub mod timer;

pub use dma::{
    DmaController, DmaMultiChannelBackend, DmaSingleChannelBackend, IrqLine, SharedDmac, SimDmac,
};
pub use domain::{BackendCaps, DomainBackend, DomainKind, Pending, ScheduleDomain};
pub use task::{ClockSource, Task, TaskHandler, TaskTrigger, Tick, UNARMED};
pub use timer::{HardwareTimer, SoftTimer, TimerBackend};
