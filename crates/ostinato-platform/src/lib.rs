//! Ostinato Platform - runtime context and host multicore simulation
//!
//! This crate ties the graph registry, the driver catalog and the schedule
//! domains together into one explicitly constructed runtime.
//!
//! # Core Abstractions
//!
//! - [`PlatformConfig`] - Core count, timer rate, memory and DMA sizing
//! - [`PlatformContext`] - Graph registry plus one schedule domain per
//!   trigger type, built once at startup and passed to every caller
//! - [`HostCores`] - One worker thread and mailbox per core; forwarded
//!   requests run on the owning core
//!
//! # Reply Codes
//!
//! Every control request answers `0` on completion, [`Dispatch::FORWARDED`]
//! when it was routed to another core, or a negative errno-style code.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ostinato_core::{CompDescriptor, ComponentType, ControlRequest, EntryId, PipelineId};
//! use ostinato_platform::{HostCores, PlatformConfig, PlatformContext};
//!
//! let ctx = PlatformContext::with_builtin_drivers(PlatformConfig::default()).unwrap();
//! let cores = HostCores::start(Arc::new(ctx)).unwrap();
//!
//! let mixer = CompDescriptor::new(EntryId(1), ComponentType::MIXER, PipelineId(1), 1);
//! let done = cores.submit(ControlRequest::ComponentNew(mixer)).unwrap();
//! assert_eq!(done.reply_code(), 0);
//! ```

mod config;
mod context;
mod cores;
mod error;

pub use config::{POOL_BASE, PlatformConfig};
pub use context::{PIPELINE_DMAC, PlatformContext, ScheduledPipeline};
pub use cores::{Completion, HostCores};
pub use error::PlatformError;

pub use ostinato_core::Dispatch;
