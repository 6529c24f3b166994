//! Control request descriptors.
//!
//! These carry the fields the registry consumes from decoded control
//! messages. Framing and decoding happen elsewhere; sizes that the wire
//! format declares (`size`, config block size, extension length) are kept so
//! they can be validated here.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::component::Trigger;
use crate::config::{
    AsrcConfig, ComponentType, DaiConfig, FileConfig, HostConfig, SrcConfig, ToneConfig,
    VolumeConfig,
};
use crate::error::{Error, Result};
use crate::ids::{CoreId, EntryId, PipelineId, TypeUuid, UUID_SIZE};
use crate::memory::MemCaps;
use crate::stream::FrameFormat;

/// Size of the command header preceding every request.
pub const CMD_HEADER_SIZE: u32 = 8;

/// Size of the generic create-component header (command header, id, type,
/// pipeline id, core, extension length).
pub const COMP_HEADER_SIZE: u32 = CMD_HEADER_SIZE + 5 * 4;

/// Declared size of a well-formed common configuration block.
pub const COMP_CONFIG_SIZE: u32 = CMD_HEADER_SIZE + 7 * 4;

/// Common configuration block of a create-component request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigBlock {
    /// Declared block size; must equal [`COMP_CONFIG_SIZE`].
    pub size: u32,
    /// Periods in the sink buffer.
    pub periods_sink: u32,
    /// Periods in the source buffer.
    pub periods_source: u32,
    /// Frame format.
    pub frame_fmt: FrameFormat,
    /// Action on xrun.
    pub xrun_action: u32,
}

impl Default for ConfigBlock {
    fn default() -> Self {
        Self {
            size: COMP_CONFIG_SIZE,
            periods_sink: 2,
            periods_source: 2,
            frame_fmt: FrameFormat::default(),
            xrun_action: 0,
        }
    }
}

/// Kind-specific fields of a create-component request.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum KindFields {
    /// No kind-specific fields.
    #[default]
    None,
    /// Host endpoint fields.
    Host(HostConfig),
    /// DAI endpoint fields.
    Dai(DaiConfig),
    /// Volume fields.
    Volume(VolumeConfig),
    /// Sample-rate converter fields.
    Src(SrcConfig),
    /// Asynchronous sample-rate converter fields.
    Asrc(AsrcConfig),
    /// Tone generator fields.
    Tone(ToneConfig),
    /// Opaque processing blob.
    Process(Vec<u8>),
    /// Test-bench file endpoint fields.
    File(FileConfig),
}

/// Create-component request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompDescriptor {
    /// Declared total size of the request.
    pub size: u32,
    /// Entry id for the new component.
    pub id: EntryId,
    /// Type code.
    pub comp_type: ComponentType,
    /// Pipeline the component belongs to.
    pub pipeline_id: PipelineId,
    /// Raw owning core index.
    pub core: u32,
    /// Extension data; starts with a type identifier when non-empty.
    pub ext_data: Vec<u8>,
    /// Common configuration block.
    pub config: ConfigBlock,
    /// Kind-specific fields.
    pub fields: KindFields,
}

impl CompDescriptor {
    /// Creates a request with no extension data and a default config block.
    pub fn new(id: EntryId, comp_type: ComponentType, pipeline_id: PipelineId, core: u32) -> Self {
        Self {
            size: COMP_HEADER_SIZE,
            id,
            comp_type,
            pipeline_id,
            core,
            ext_data: Vec::new(),
            config: ConfigBlock::default(),
            fields: KindFields::None,
        }
    }

    /// Embeds a type identifier as extension data.
    pub fn with_uuid(mut self, uuid: TypeUuid) -> Self {
        self.ext_data = uuid.as_bytes().to_vec();
        self.size = COMP_HEADER_SIZE + self.ext_data_length();
        self
    }

    /// Sets the kind-specific fields.
    pub fn with_fields(mut self, fields: KindFields) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the common configuration block.
    pub fn with_config(mut self, config: ConfigBlock) -> Self {
        self.config = config;
        self
    }

    /// Declared extension length in bytes.
    pub fn ext_data_length(&self) -> u32 {
        self.ext_data.len() as u32
    }

    /// Validates the declared sizes and returns the embedded type identifier,
    /// if any.
    ///
    /// The request must be at least header plus extension long, and a
    /// non-empty extension must hold a full identifier.
    pub fn type_uuid(&self) -> Result<Option<TypeUuid>> {
        let ext_len = self.ext_data_length();
        if ext_len == 0 {
            return Ok(None);
        }
        if self.size < COMP_HEADER_SIZE + ext_len {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "comp {}: size {} shorter than header + ext {}",
                self.id,
                self.size,
                ext_len
            );
            return Err(Error::InvalidDescriptor);
        }
        if (ext_len as usize) < UUID_SIZE {
            return Err(Error::InvalidDescriptor);
        }
        Ok(TypeUuid::from_slice(&self.ext_data))
    }

    /// Checks the declared size of the common configuration block.
    pub fn validate_config_block(&self) -> Result<()> {
        if self.config.size == COMP_CONFIG_SIZE {
            Ok(())
        } else {
            Err(Error::InvalidDescriptor)
        }
    }
}

/// Buffer may run dry without an xrun.
pub const BUF_UNDERRUN_PERMITTED: u32 = 1 << 1;
/// Buffer may overflow without an xrun.
pub const BUF_OVERRUN_PERMITTED: u32 = 1 << 0;

/// Create-buffer request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Entry id for the new buffer.
    pub id: EntryId,
    /// Raw owning core index.
    pub core: u32,
    /// Pipeline the buffer belongs to.
    pub pipeline_id: PipelineId,
    /// Data size in bytes.
    pub size: u32,
    /// Memory capabilities requested for the data region.
    pub caps: MemCaps,
    /// [`BUF_UNDERRUN_PERMITTED`] / [`BUF_OVERRUN_PERMITTED`] flags.
    pub flags: u32,
}

impl BufferDescriptor {
    /// Creates a request for a RAM buffer with no xrun permissions.
    pub fn new(id: EntryId, pipeline_id: PipelineId, core: u32, size: u32) -> Self {
        Self {
            id,
            core,
            pipeline_id,
            size,
            caps: MemCaps::RAM,
            flags: 0,
        }
    }
}

/// Clock that drives a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimeDomain {
    /// DMA completion interrupts.
    Dma,
    /// Platform timer.
    #[default]
    Timer,
}

impl TimeDomain {
    /// Decodes the wire code.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Dma),
            1 => Some(Self::Timer),
            _ => None,
        }
    }
}

/// Create-pipeline request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineDescriptor {
    /// Entry id of the pipeline itself.
    pub comp_id: EntryId,
    /// Pipeline number.
    pub pipeline_id: PipelineId,
    /// Entry id of the scheduling component.
    pub sched_id: EntryId,
    /// Raw owning core index.
    pub core: u32,
    /// Scheduling priority, lower runs first.
    pub priority: u32,
    /// Period in microseconds.
    pub period: u32,
    /// Worst-case MIPS per period.
    pub period_mips: u32,
    /// Frames processed per scheduling run.
    pub frames_per_sched: u32,
    /// Clock that drives the pipeline.
    pub time_domain: TimeDomain,
    /// Tolerated xrun time before the pipeline reports, in microseconds.
    pub xrun_limit_usecs: u32,
}

impl PipelineDescriptor {
    /// Creates a timer-driven pipeline request with a 1 ms period.
    pub fn new(comp_id: EntryId, pipeline_id: PipelineId, sched_id: EntryId, core: u32) -> Self {
        Self {
            comp_id,
            pipeline_id,
            sched_id,
            core,
            priority: 0,
            period: 1000,
            period_mips: 0,
            frames_per_sched: 0,
            time_domain: TimeDomain::Timer,
            xrun_limit_usecs: 0,
        }
    }
}

/// Connect request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectDescriptor {
    /// Upstream entry.
    pub source_id: EntryId,
    /// Downstream entry.
    pub sink_id: EntryId,
}

/// A decoded control request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlRequest {
    /// Create a component.
    ComponentNew(CompDescriptor),
    /// Create a buffer.
    BufferNew(BufferDescriptor),
    /// Create a pipeline.
    PipelineNew(PipelineDescriptor),
    /// Connect a component and a buffer.
    Connect(ConnectDescriptor),
    /// Finalize a pipeline.
    PipelineComplete(EntryId),
    /// Free a component.
    ComponentFree(EntryId),
    /// Free a buffer.
    BufferFree(EntryId),
    /// Free a pipeline.
    PipelineFree(EntryId),
    /// Drive a component lifecycle transition.
    Trigger(EntryId, Trigger),
}

impl ControlRequest {
    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ComponentNew(_) => "component-new",
            Self::BufferNew(_) => "buffer-new",
            Self::PipelineNew(_) => "pipeline-new",
            Self::Connect(_) => "connect",
            Self::PipelineComplete(_) => "pipeline-complete",
            Self::ComponentFree(_) => "component-free",
            Self::BufferFree(_) => "buffer-free",
            Self::PipelineFree(_) => "pipeline-free",
            Self::Trigger(..) => "trigger",
        }
    }
}

/// Where a per-entry operation ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Executed on the calling core.
    Completed,
    /// Not executed; must be re-issued on the owning core.
    Forwarded(CoreId),
}

impl Dispatch {
    /// Reply code sent back while a forwarded request is in flight.
    pub const FORWARDED: i32 = 1;

    /// Reply code for this outcome.
    pub const fn reply_code(self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::Forwarded(_) => Self::FORWARDED,
        }
    }
}

/// Reply code for an operation outcome.
pub fn reply_code(result: &Result<Dispatch>) -> i32 {
    match result {
        Ok(d) => d.reply_code(),
        Err(e) => e.errno(),
    }
}
