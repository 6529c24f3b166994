//! Ostinato Core - pipeline graph registry for a multicore audio DSP runtime
//!
//! This crate holds everything the control path needs to build and tear down
//! audio topologies: the registry of components, buffers and pipelines, the
//! driver lookup table, and the translation from raw construction
//! descriptors to driver-agnostic configuration.
//!
//! # Core Abstractions
//!
//! ## Graph
//!
//! - [`GraphRegistry`] - Authoritative set of entries keyed by [`EntryId`]
//! - [`Component`] / [`Buffer`] / [`Pipeline`] - Entry payloads
//! - [`Dispatch`] - Completed locally or forwarded to the owning core
//!
//! ## Drivers
//!
//! - [`DriverList`] - Ordered table resolving type codes and [`TypeUuid`]s
//! - [`ComponentOps`] - Driver-defined behavior hooks
//! - [`build_config`] - Descriptor to [`ComponentConfig`] translation
//!
//! ## Platform Collaborators
//!
//! - [`Allocator`] - Zoned memory with capability flags
//! - [`CacheOps`] - Publish/acquire for state read by other cores
//!
//! # no_std Support
//!
//! Disable the default `std` feature for firmware builds:
//!
//! ```toml
//! [dependencies]
//! ostinato-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ostinato_core::{CoreId, GraphRegistry, ConnectDescriptor};
//!
//! let mut graph = GraphRegistry::new(drivers, allocator, cache);
//! graph.create_component(&volume)?;
//! graph.create_buffer(&buffer)?;
//! match graph.connect(CoreId::PRIMARY, &link)? {
//!     Dispatch::Completed => {}
//!     Dispatch::Forwarded(core) => resend_on(core),
//! }
//! ```
//!
//! # Design Principles
//!
//! - **Ids, not pointers**: entries link through the registry
//! - **All or nothing**: a failed operation leaves the registry unchanged
//! - **Owner executes**: per-entry work runs on the entry's core

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod buffer;
pub mod component;
pub mod config;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod graph;
pub mod ids;
pub mod memory;
pub mod pipeline;
pub mod stream;

// Re-export main types at crate root
pub use buffer::{BUFFER_META_SIZE, Buffer};
pub use component::{Component, ComponentOps, ComponentState, LL_TIMER_PERIOD_US, Trigger};
pub use config::{
    AsrcConfig, CommonConfig, ComponentConfig, ComponentType, DaiConfig, FileConfig, HostConfig,
    ProcessConfig, SpecificConfig, SrcConfig, ToneConfig, VolumeConfig, build_config,
};
pub use descriptor::{
    BUF_OVERRUN_PERMITTED, BUF_UNDERRUN_PERMITTED, BufferDescriptor, COMP_CONFIG_SIZE,
    COMP_HEADER_SIZE, CompDescriptor, ConfigBlock, ConnectDescriptor, ControlRequest, Dispatch,
    KindFields, PipelineDescriptor, TimeDomain, reply_code,
};
pub use driver::{ComponentFactory, DriverInfo, DriverList};
pub use error::{Error, Result, errno};
pub use graph::{EndpointSide, Entry, EntryHeader, EntryKind, EntrySummary, GraphRegistry};
pub use ids::{CoreId, EntryId, MAX_CORES, PipelineId, TypeUuid, UUID_SIZE};
pub use memory::{
    Allocator, CacheOps, CountingCache, DCACHE_LINE_SIZE, MemCaps, MemZone, PoolAllocator, Region,
};
pub use pipeline::{Pipeline, PipelineStatus, ScheduleParams};
pub use stream::{BufferFormat, FrameFormat, ParamFlags, StreamDirection, StreamParams};
