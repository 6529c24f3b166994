//! Data buffers joining one producing and one consuming component.

use crate::descriptor::{BUF_OVERRUN_PERMITTED, BUF_UNDERRUN_PERMITTED, BufferDescriptor};
use crate::ids::{CoreId, EntryId, PipelineId};
use crate::memory::{MemCaps, Region};
use crate::stream::{ParamFlags, StreamParams};

/// Bytes reserved for buffer metadata in shared memory.
pub const BUFFER_META_SIZE: usize = 128;

/// A cache-aligned audio buffer.
///
/// Metadata lives in the shared runtime zone so either endpoint core can
/// read it after an acquire; sample data lives in the buffer zone.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub(crate) id: EntryId,
    pub(crate) core: CoreId,
    pub(crate) pipeline_id: PipelineId,
    pub(crate) size: u32,
    pub(crate) caps: MemCaps,
    pub(crate) meta: Region,
    pub(crate) data: Region,
    pub(crate) stream: StreamParams,
    pub(crate) underrun_permitted: bool,
    pub(crate) overrun_permitted: bool,
    pub(crate) source: Option<EntryId>,
    pub(crate) sink: Option<EntryId>,
    pub(crate) inter_core: bool,
    pub(crate) hw_params_configured: bool,
}

impl Buffer {
    pub(crate) fn new(desc: &BufferDescriptor, core: CoreId, meta: Region, data: Region) -> Self {
        Self {
            id: desc.id,
            core,
            pipeline_id: desc.pipeline_id,
            size: desc.size,
            caps: desc.caps,
            meta,
            data,
            stream: StreamParams::default(),
            underrun_permitted: desc.flags & BUF_UNDERRUN_PERMITTED != 0,
            overrun_permitted: desc.flags & BUF_OVERRUN_PERMITTED != 0,
            source: None,
            sink: None,
            inter_core: false,
            hw_params_configured: false,
        }
    }

    /// Entry id.
    #[inline]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Owning core.
    #[inline]
    pub fn core(&self) -> CoreId {
        self.core
    }

    /// Owning pipeline.
    #[inline]
    pub fn pipeline_id(&self) -> PipelineId {
        self.pipeline_id
    }

    /// Data size in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Capabilities of the data region.
    pub fn caps(&self) -> MemCaps {
        self.caps
    }

    /// Metadata region, the target of publish/acquire.
    pub fn meta_region(&self) -> Region {
        self.meta
    }

    /// Sample data region.
    pub fn data_region(&self) -> Region {
        self.data
    }

    /// Stream parameters.
    pub fn stream(&self) -> &StreamParams {
        &self.stream
    }

    /// Whether running dry is tolerated.
    pub fn underrun_permitted(&self) -> bool {
        self.underrun_permitted
    }

    /// Whether overflowing is tolerated.
    pub fn overrun_permitted(&self) -> bool {
        self.overrun_permitted
    }

    /// Producing component.
    pub fn source(&self) -> Option<EntryId> {
        self.source
    }

    /// Consuming component.
    pub fn sink(&self) -> Option<EntryId> {
        self.sink
    }

    /// Whether an endpoint runs on a different core than the buffer.
    pub fn is_inter_core(&self) -> bool {
        self.inter_core
    }

    /// Sets stream parameters.
    ///
    /// Once parameters are configured they only change when `force` is set.
    pub fn set_params(&mut self, params: &StreamParams, force: bool) {
        if self.hw_params_configured && !force {
            return;
        }
        self.stream = *params;
        self.hw_params_configured = true;
    }

    /// Copies the fields selected by `flags` from this buffer into `params`.
    pub fn overlay(&self, flags: ParamFlags, params: &mut StreamParams) {
        flags.apply(&self.stream, params);
    }
}
