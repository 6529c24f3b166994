//! The pipeline graph registry.
//!
//! [`GraphRegistry`] owns every component, buffer and pipeline, keyed by
//! [`EntryId`] in one ordered map. Iteration follows id order, so re-reads
//! are deterministic regardless of creation order.
//!
//! Per-entry operations take the calling core. When the entry is owned by a
//! different core the operation does not touch the registry and returns
//! [`Dispatch::Forwarded`]; the caller re-issues it on the owning core.
//! Creation requests carry their own core and are not routed.

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
#[cfg(feature = "std")]
use std::{collections::BTreeMap, sync::Arc};

use crate::buffer::{BUFFER_META_SIZE, Buffer};
use crate::component::{Component, ComponentState, Trigger};
use crate::config::{ComponentType, build_config};
use crate::descriptor::{
    BufferDescriptor, CompDescriptor, ConnectDescriptor, ControlRequest, Dispatch,
    PipelineDescriptor,
};
use crate::driver::DriverList;
use crate::error::{Error, Result};
use crate::ids::{CoreId, EntryId, MAX_CORES, PipelineId};
use crate::memory::{Allocator, CacheOps, DCACHE_LINE_SIZE, MemCaps, MemZone};
use crate::pipeline::{PIPELINE_OBJ_SIZE, Pipeline, PipelineStatus};
use crate::stream::{ParamFlags, StreamDirection, StreamParams};

use super::entry::{Entry, EntryKind, EntrySummary};

/// Bytes reserved for a component object.
pub const COMP_OBJ_SIZE: usize = 256;

/// Which end of a pipeline to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointSide {
    /// First component whose upstream buffers all belong to other pipelines.
    Source,
    /// First component whose downstream buffers all belong to other pipelines.
    Sink,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LinkDir {
    CompToBuffer,
    BufferToComp,
}

/// Authoritative collection of components, buffers and pipelines.
pub struct GraphRegistry {
    entries: BTreeMap<EntryId, Entry>,
    drivers: DriverList,
    allocator: Arc<dyn Allocator>,
    cache: Arc<dyn CacheOps>,
    core_count: usize,
}

impl GraphRegistry {
    /// Creates an empty registry using `drivers` for component construction.
    pub fn new(drivers: DriverList, allocator: Arc<dyn Allocator>, cache: Arc<dyn CacheOps>) -> Self {
        Self {
            entries: BTreeMap::new(),
            drivers,
            allocator,
            cache,
            core_count: MAX_CORES,
        }
    }

    /// Limits the cores entries may be created on.
    pub fn with_core_count(mut self, core_count: usize) -> Self {
        self.core_count = core_count.clamp(1, MAX_CORES);
        self
    }

    /// Number of cores entries may be created on.
    pub fn core_count(&self) -> usize {
        self.core_count
    }

    /// Driver table used for component construction.
    pub fn drivers(&self) -> &DriverList {
        &self.drivers
    }

    // --- Lookup ---

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: EntryId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Entry for `id`.
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    /// All entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Number of entries of `kind`.
    pub fn count(&self, kind: EntryKind) -> usize {
        self.iter().filter(|e| e.kind() == kind).count()
    }

    /// Component `id`, if registered as a component.
    pub fn component(&self, id: EntryId) -> Option<&Component> {
        self.get(id).and_then(Entry::as_component)
    }

    /// Buffer `id`, if registered as a buffer.
    pub fn buffer(&self, id: EntryId) -> Option<&Buffer> {
        self.get(id).and_then(Entry::as_buffer)
    }

    /// Pipeline `id`, if registered as a pipeline.
    pub fn pipeline(&self, id: EntryId) -> Option<&Pipeline> {
        self.get(id).and_then(Entry::as_pipeline)
    }

    /// All components in id order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.iter().filter_map(Entry::as_component)
    }

    /// Comparable snapshot of every entry in id order.
    pub fn summaries(&self) -> Vec<EntrySummary> {
        self.iter().map(Entry::summary).collect()
    }

    /// Pipeline number of any entry.
    pub fn pipe_id(&self, id: EntryId) -> Result<PipelineId> {
        self.get(id).map(Entry::pipeline_id).ok_or(Error::NotFound(id))
    }

    /// Resolves the source or sink endpoint component of a pipeline.
    ///
    /// A component is an endpoint when it has no buffers on that side, or
    /// when every buffer on that side belongs to another pipeline. The first
    /// match in id order wins.
    pub fn pipeline_endpoint(&self, pipeline_id: PipelineId, side: EndpointSide) -> Option<EntryId> {
        self.components()
            .filter(|c| c.pipeline_id() == pipeline_id)
            .find(|c| {
                let buffers = match side {
                    EndpointSide::Source => c.sources(),
                    EndpointSide::Sink => c.sinks(),
                };
                buffers
                    .iter()
                    .all(|&b| self.buffer(b).is_none_or(|buf| buf.pipeline_id() != pipeline_id))
            })
            .map(Component::id)
    }

    // --- Creation ---

    /// Creates a component from a descriptor.
    ///
    /// Validates the core and id, resolves the driver, validates the common
    /// configuration block, translates the descriptor and runs the driver
    /// factory. Nothing is registered unless every step succeeds.
    pub fn create_component(&mut self, desc: &CompDescriptor) -> Result<EntryId> {
        let core = self.validate_core(desc.core)?;
        self.ensure_absent(desc.id)?;

        let driver = *self.drivers.resolve(desc)?;
        if desc.comp_type != ComponentType::BUFFER {
            desc.validate_config_block()?;
        }
        let config = build_config(desc, core)?;

        let region = self
            .allocator
            .alloc(MemZone::Runtime, MemCaps::RAM, COMP_OBJ_SIZE, DCACHE_LINE_SIZE)
            .ok_or(Error::OutOfMemory)?;
        let ops = match (driver.factory)(&config) {
            Ok(ops) => ops,
            Err(e) => {
                self.allocator.free(region);
                return Err(e);
            }
        };

        let comp = Component::new(
            config.common,
            config.specific,
            driver.uuid,
            driver.name,
            region,
            ops,
        );
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "comp_new: {} {} ({}) pipe {} on {core}",
            desc.id,
            desc.comp_type,
            driver.name,
            desc.pipeline_id
        );
        self.entries.insert(desc.id, Entry::Component(comp));
        Ok(desc.id)
    }

    /// Creates a pipeline.
    ///
    /// Fails [`Error::DuplicateId`] when either the entry id or the pipeline
    /// number is already in use.
    pub fn create_pipeline(&mut self, desc: &PipelineDescriptor) -> Result<()> {
        self.ensure_absent(desc.comp_id)?;
        if let Some(existing) = self
            .iter()
            .filter_map(Entry::as_pipeline)
            .find(|p| p.pipeline_id() == desc.pipeline_id)
        {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "pipeline_new: {} already used by {}",
                desc.pipeline_id,
                existing.id()
            );
            return Err(Error::DuplicateId(existing.id()));
        }
        let core = self.validate_core(desc.core)?;

        let region = self
            .allocator
            .alloc(MemZone::Runtime, MemCaps::RAM, PIPELINE_OBJ_SIZE, DCACHE_LINE_SIZE)
            .ok_or(Error::OutOfMemory)?;
        let pipeline = Pipeline::new(desc, core, region);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "pipeline_new: {} {} sched {} period {}us xrun {}us on {core}",
            desc.comp_id,
            desc.pipeline_id,
            desc.sched_id,
            desc.period,
            desc.xrun_limit_usecs
        );
        self.entries.insert(desc.comp_id, Entry::Pipeline(pipeline));
        Ok(())
    }

    /// Creates a buffer and publishes its metadata.
    pub fn create_buffer(&mut self, desc: &BufferDescriptor) -> Result<()> {
        self.ensure_absent(desc.id)?;
        let core = self.validate_core(desc.core)?;
        if desc.size == 0 {
            return Err(Error::InvalidDescriptor);
        }

        let meta = self
            .allocator
            .alloc(
                MemZone::RuntimeShared,
                MemCaps::RAM,
                BUFFER_META_SIZE,
                DCACHE_LINE_SIZE,
            )
            .ok_or(Error::OutOfMemory)?;
        let Some(data) = self.allocator.alloc(
            MemZone::Buffer,
            desc.caps,
            desc.size as usize,
            DCACHE_LINE_SIZE,
        ) else {
            self.allocator.free(meta);
            return Err(Error::OutOfMemory);
        };

        let buffer = Buffer::new(desc, core, meta, data);
        self.cache.publish(&meta);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "buffer_new: {} size {} flags {:#x} pipe {} on {core}",
            desc.id,
            desc.size,
            desc.flags,
            desc.pipeline_id
        );
        self.entries.insert(desc.id, Entry::Buffer(buffer));
        Ok(())
    }

    // --- Per-entry operations ---

    /// Resolves the scheduling, source and sink components of a pipeline.
    ///
    /// All three must be components on the pipeline's core. On success every
    /// component of the pipeline is attached to it and takes its period.
    pub fn complete_pipeline(&mut self, cpu: CoreId, id: EntryId) -> Result<Dispatch> {
        let pipe = self.expect_pipeline(id)?;
        let core = pipe.core();
        if core != cpu {
            return Ok(forward("pipeline_complete", id, core));
        }
        let pipeline_id = pipe.pipeline_id();
        let sched_id = pipe.sched_id();
        let period = pipe.params().period;

        if self.expect_component(sched_id)?.core() != core {
            return Err(Error::InvalidState(sched_id));
        }
        let source = self
            .pipeline_endpoint(pipeline_id, EndpointSide::Source)
            .ok_or(Error::NotFound(id))?;
        let sink = self
            .pipeline_endpoint(pipeline_id, EndpointSide::Sink)
            .ok_or(Error::NotFound(id))?;
        for endpoint in [source, sink] {
            if self.expect_component(endpoint)?.core() != core {
                return Err(Error::InvalidState(endpoint));
            }
        }

        let pipe = self.pipeline_mut(id)?;
        pipe.sched_comp = Some(sched_id);
        pipe.source_comp = Some(source);
        pipe.sink_comp = Some(sink);
        pipe.status = PipelineStatus::Complete;

        for entry in self.entries.values_mut() {
            if let Entry::Component(c) = entry {
                if c.pipeline_id() == pipeline_id {
                    c.pipeline = Some(id);
                    if period != 0 {
                        c.period_us = period;
                    }
                }
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("pipeline_complete: {id} sched {sched_id} source {source} sink {sink}");
        Ok(Dispatch::Completed)
    }

    /// Connects a component and a buffer in either direction.
    ///
    /// Runs on the component's core. When the buffer lives on another core
    /// it is marked inter-core and the component is promoted to shared
    /// memory once. The buffer metadata is published afterwards.
    pub fn connect(&mut self, cpu: CoreId, desc: &ConnectDescriptor) -> Result<Dispatch> {
        let source = self.kind_of(desc.source_id)?;
        let sink = self.kind_of(desc.sink_id)?;
        match (source, sink) {
            (EntryKind::Component, EntryKind::Buffer) => {
                self.link(cpu, desc.source_id, desc.sink_id, LinkDir::CompToBuffer)
            }
            (EntryKind::Buffer, EntryKind::Component) => {
                self.link(cpu, desc.sink_id, desc.source_id, LinkDir::BufferToComp)
            }
            _ => Err(Error::InvalidConnection),
        }
    }

    /// Frees a buffer.
    ///
    /// Fails [`Error::Busy`] if both its source and sink components are
    /// active. Otherwise the buffer is disconnected from the single active
    /// end, if any, and released.
    pub fn free_buffer(&mut self, cpu: CoreId, id: EntryId) -> Result<Dispatch> {
        let buffer = self.expect_buffer(id)?;
        if buffer.core() != cpu {
            return Ok(forward("buffer_free", id, buffer.core()));
        }
        let (meta, inter_core) = (buffer.meta, buffer.inter_core);
        if inter_core {
            self.cache.acquire(&meta);
        }
        let buffer = self.expect_buffer(id)?;
        let active = |end: Option<EntryId>| {
            end.and_then(|c| self.component(c))
                .filter(|c| c.state().is_active())
                .map(Component::id)
        };
        let source = active(buffer.source);
        let sink = active(buffer.sink);

        if source.is_some() && sink.is_some() {
            #[cfg(feature = "tracing")]
            tracing::warn!("buffer_free: {id} has two active ends");
            return Err(Error::Busy(id));
        }
        if let Some(comp) = sink {
            self.disconnect(comp, id, LinkDir::BufferToComp);
        }
        if let Some(comp) = source {
            self.disconnect(comp, id, LinkDir::CompToBuffer);
        }

        self.release_buffer(id);
        Ok(Dispatch::Completed)
    }

    /// Frees a component in the `Ready` state.
    ///
    /// Pipeline references to the component and buffer endpoint references
    /// are cleared first.
    pub fn free_component(&mut self, cpu: CoreId, id: EntryId) -> Result<Dispatch> {
        let comp = self.expect_component(id)?;
        if comp.core() != cpu {
            return Ok(forward("comp_free", id, comp.core()));
        }
        if comp.state() != ComponentState::Ready {
            return Err(Error::InvalidState(id));
        }

        for entry in self.entries.values_mut() {
            match entry {
                Entry::Pipeline(p) => {
                    if p.forget(id) {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("comp_free: cleared {id} from pipeline {}", p.id());
                    }
                }
                Entry::Buffer(b) => {
                    let mut touched = false;
                    if b.source == Some(id) {
                        b.source = None;
                        touched = true;
                    }
                    if b.sink == Some(id) {
                        b.sink = None;
                        touched = true;
                    }
                    if touched && b.inter_core {
                        self.cache.publish(&b.meta);
                    }
                }
                Entry::Component(_) => {}
            }
        }

        if let Some(Entry::Component(mut comp)) = self.entries.remove(&id) {
            comp.ops.free();
            self.allocator.free(comp.region);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("comp_free: {id}");
        Ok(Dispatch::Completed)
    }

    /// Frees a pipeline and detaches its components from it.
    pub fn free_pipeline(&mut self, cpu: CoreId, id: EntryId) -> Result<Dispatch> {
        let pipe = self.expect_pipeline(id)?;
        if pipe.core() != cpu {
            return Ok(forward("pipeline_free", id, pipe.core()));
        }
        for entry in self.entries.values_mut() {
            if let Entry::Component(c) = entry {
                if c.pipeline == Some(id) {
                    c.pipeline = None;
                }
            }
        }
        if let Some(Entry::Pipeline(pipe)) = self.entries.remove(&id) {
            self.allocator.free(pipe.region);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("pipeline_free: {id}");
        Ok(Dispatch::Completed)
    }

    /// Drives a component lifecycle transition.
    pub fn trigger(&mut self, cpu: CoreId, id: EntryId, trigger: Trigger) -> Result<Dispatch> {
        let comp = self.expect_component(id)?;
        if comp.core() != cpu {
            return Ok(forward("comp_trigger", id, comp.core()));
        }
        let _state = self.component_mut(id)?.trigger(trigger)?;
        #[cfg(feature = "tracing")]
        tracing::debug!("comp_trigger: {id} {trigger:?} -> {}", _state.name());
        Ok(Dispatch::Completed)
    }

    /// Sets a buffer's stream parameters unless they are already configured.
    pub fn set_buffer_params(&mut self, id: EntryId, params: &StreamParams) -> Result<()> {
        let buffer = self.buffer_mut(id)?;
        buffer.set_params(params, false);
        let (meta, inter_core) = (buffer.meta, buffer.inter_core);
        if inter_core {
            self.cache.publish(&meta);
        }
        Ok(())
    }

    /// Negotiates stream parameters between a component and its buffers.
    ///
    /// An endpoint component (buffers on one side only) adopts the fields
    /// selected by `flags` from its single buffer and writes the result back.
    /// Other components do the same with every buffer in their data
    /// direction. Frames per period are then derived from the buffer rate.
    pub fn verify_params(
        &mut self,
        id: EntryId,
        flags: ParamFlags,
        params: &mut StreamParams,
    ) -> Result<()> {
        let comp = self.expect_component(id)?;
        let sources = comp.sources.clone();
        let sinks = comp.sinks.clone();
        let direction = comp.direction();

        let rate = if sources.is_empty() != sinks.is_empty() {
            let buffer = if sources.is_empty() { sinks[0] } else { sources[0] };
            self.impose_params(buffer, flags, params)?
        } else {
            let buffers = match direction {
                StreamDirection::Playback => &sinks,
                StreamDirection::Capture => &sources,
            };
            if buffers.is_empty() {
                return Err(Error::InvalidState(id));
            }
            for &buffer in buffers {
                self.impose_params(buffer, flags, params)?;
            }
            let first_sink = sinks.first().ok_or(Error::InvalidState(id))?;
            self.expect_buffer(*first_sink)?.stream().rate
        };

        let comp = self.component_mut(id)?;
        comp.set_period_frames(rate);
        comp.ops.params(params)
    }

    /// Executes a decoded control request on `cpu`.
    ///
    /// Creation requests always complete locally.
    pub fn apply(&mut self, cpu: CoreId, request: &ControlRequest) -> Result<Dispatch> {
        match request {
            ControlRequest::ComponentNew(desc) => {
                self.create_component(desc).map(|_| Dispatch::Completed)
            }
            ControlRequest::BufferNew(desc) => self.create_buffer(desc).map(|()| Dispatch::Completed),
            ControlRequest::PipelineNew(desc) => {
                self.create_pipeline(desc).map(|()| Dispatch::Completed)
            }
            ControlRequest::Connect(desc) => self.connect(cpu, desc),
            ControlRequest::PipelineComplete(id) => self.complete_pipeline(cpu, *id),
            ControlRequest::ComponentFree(id) => self.free_component(cpu, *id),
            ControlRequest::BufferFree(id) => self.free_buffer(cpu, *id),
            ControlRequest::PipelineFree(id) => self.free_pipeline(cpu, *id),
            ControlRequest::Trigger(id, trigger) => self.trigger(cpu, *id, *trigger),
        }
    }

    // --- Internals ---

    fn impose_params(
        &mut self,
        buffer: EntryId,
        flags: ParamFlags,
        params: &mut StreamParams,
    ) -> Result<u32> {
        let buf = self.buffer_mut(buffer)?;
        buf.overlay(flags, params);
        buf.set_params(params, true);
        let (meta, inter_core, rate) = (buf.meta, buf.inter_core, buf.stream.rate);
        if inter_core {
            self.cache.publish(&meta);
        }
        Ok(rate)
    }

    fn link(&mut self, cpu: CoreId, comp_id: EntryId, buf_id: EntryId, dir: LinkDir) -> Result<Dispatch> {
        let comp = self.expect_component(comp_id)?;
        let comp_core = comp.core();
        if comp_core != cpu {
            return Ok(forward("connect", comp_id, comp_core));
        }
        let shared = comp.is_shared();

        let buffer = self.expect_buffer(buf_id)?;
        let occupied = match dir {
            LinkDir::CompToBuffer => buffer.source,
            LinkDir::BufferToComp => buffer.sink,
        };
        if occupied.is_some() {
            return Err(Error::InvalidConnection);
        }
        let meta = buffer.meta;
        let crosses = buffer.core() != comp_core;

        if crosses {
            self.cache.acquire(&meta);
            if !shared {
                self.make_shared(comp_id)?;
            }
        }

        let buffer = self.buffer_mut(buf_id)?;
        if crosses {
            buffer.inter_core = true;
        }
        match dir {
            LinkDir::CompToBuffer => buffer.source = Some(comp_id),
            LinkDir::BufferToComp => buffer.sink = Some(comp_id),
        }
        let comp = self.component_mut(comp_id)?;
        match dir {
            LinkDir::CompToBuffer => comp.sinks.push(buf_id),
            LinkDir::BufferToComp => comp.sources.push(buf_id),
        }

        self.cache.publish(&meta);
        #[cfg(feature = "tracing")]
        tracing::debug!("connect: {comp_id} {dir:?} {buf_id} inter_core={crosses}");
        Ok(Dispatch::Completed)
    }

    fn make_shared(&mut self, id: EntryId) -> Result<()> {
        let Some(Entry::Component(comp)) = self.entries.get_mut(&id) else {
            return Err(Error::NotFound(id));
        };
        let shared = self
            .allocator
            .alloc(
                MemZone::RuntimeShared,
                MemCaps::RAM,
                comp.region.size,
                DCACHE_LINE_SIZE,
            )
            .ok_or(Error::OutOfMemory)?;
        let private = core::mem::replace(&mut comp.region, shared);
        comp.is_shared = true;
        self.allocator.free(private);
        self.cache.publish(&shared);
        #[cfg(feature = "tracing")]
        tracing::debug!("comp_make_shared: {id} moved to {:#x}", shared.addr);
        Ok(())
    }

    fn disconnect(&mut self, comp_id: EntryId, buf_id: EntryId, dir: LinkDir) {
        if let Some(Entry::Component(comp)) = self.entries.get_mut(&comp_id) {
            match dir {
                LinkDir::CompToBuffer => comp.sinks.retain(|&b| b != buf_id),
                LinkDir::BufferToComp => comp.sources.retain(|&b| b != buf_id),
            }
        }
        if let Some(Entry::Buffer(buf)) = self.entries.get_mut(&buf_id) {
            match dir {
                LinkDir::CompToBuffer => buf.source = None,
                LinkDir::BufferToComp => buf.sink = None,
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("disconnect: {comp_id} {dir:?} {buf_id}");
    }

    fn release_buffer(&mut self, id: EntryId) {
        let Some(Entry::Buffer(buffer)) = self.entries.remove(&id) else {
            return;
        };
        for end in [buffer.source, buffer.sink].into_iter().flatten() {
            if let Some(Entry::Component(comp)) = self.entries.get_mut(&end) {
                comp.unlink(id);
            }
        }
        self.allocator.free(buffer.data);
        self.allocator.free(buffer.meta);
        #[cfg(feature = "tracing")]
        tracing::debug!("buffer_free: {id}");
    }

    fn validate_core(&self, raw: u32) -> Result<CoreId> {
        CoreId::new(raw)
            .filter(|c| c.index() < self.core_count)
            .ok_or(Error::InvalidCore(raw))
    }

    fn ensure_absent(&self, id: EntryId) -> Result<()> {
        if self.entries.contains_key(&id) {
            #[cfg(feature = "tracing")]
            tracing::warn!("{id} already exists");
            return Err(Error::DuplicateId(id));
        }
        Ok(())
    }

    fn kind_of(&self, id: EntryId) -> Result<EntryKind> {
        self.get(id).map(Entry::kind).ok_or(Error::NotFound(id))
    }

    fn expect_component(&self, id: EntryId) -> Result<&Component> {
        match self.entries.get(&id) {
            Some(Entry::Component(c)) => Ok(c),
            Some(_) => Err(Error::InvalidState(id)),
            None => Err(Error::NotFound(id)),
        }
    }

    fn expect_buffer(&self, id: EntryId) -> Result<&Buffer> {
        match self.entries.get(&id) {
            Some(Entry::Buffer(b)) => Ok(b),
            Some(_) => Err(Error::InvalidState(id)),
            None => Err(Error::NotFound(id)),
        }
    }

    fn expect_pipeline(&self, id: EntryId) -> Result<&Pipeline> {
        match self.entries.get(&id) {
            Some(Entry::Pipeline(p)) => Ok(p),
            Some(_) => Err(Error::InvalidState(id)),
            None => Err(Error::NotFound(id)),
        }
    }

    fn component_mut(&mut self, id: EntryId) -> Result<&mut Component> {
        match self.entries.get_mut(&id) {
            Some(Entry::Component(c)) => Ok(c),
            Some(_) => Err(Error::InvalidState(id)),
            None => Err(Error::NotFound(id)),
        }
    }

    fn buffer_mut(&mut self, id: EntryId) -> Result<&mut Buffer> {
        match self.entries.get_mut(&id) {
            Some(Entry::Buffer(b)) => Ok(b),
            Some(_) => Err(Error::InvalidState(id)),
            None => Err(Error::NotFound(id)),
        }
    }

    fn pipeline_mut(&mut self, id: EntryId) -> Result<&mut Pipeline> {
        match self.entries.get_mut(&id) {
            Some(Entry::Pipeline(p)) => Ok(p),
            Some(_) => Err(Error::InvalidState(id)),
            None => Err(Error::NotFound(id)),
        }
    }
}

impl core::fmt::Debug for GraphRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphRegistry")
            .field("entries", &self.entries.len())
            .field("drivers", &self.drivers.len())
            .field("core_count", &self.core_count)
            .finish()
    }
}

fn forward(_op: &str, _id: EntryId, core: CoreId) -> Dispatch {
    #[cfg(feature = "tracing")]
    tracing::debug!("{_op}: {_id} owned by {core}, forwarding");
    Dispatch::Forwarded(core)
}
