//! Pipelines: scheduling parameters plus resolved endpoint references.

use crate::descriptor::{PipelineDescriptor, TimeDomain};
use crate::ids::{CoreId, EntryId, PipelineId};
use crate::memory::Region;

/// Bytes reserved for a pipeline object.
pub const PIPELINE_OBJ_SIZE: usize = 192;

/// Pipeline construction status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStatus {
    /// Created, endpoints not yet resolved.
    Created,
    /// Scheduling, source and sink components resolved.
    Complete,
}

/// Scheduling parameters of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleParams {
    /// Owning core.
    pub core: CoreId,
    /// Priority, lower runs first.
    pub priority: u32,
    /// Period in microseconds.
    pub period: u32,
    /// Worst-case MIPS per period.
    pub period_mips: u32,
    /// Frames per scheduling run.
    pub frames_per_sched: u32,
    /// Driving clock.
    pub time_domain: TimeDomain,
}

/// A pipeline entry.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub(crate) comp_id: EntryId,
    pub(crate) pipeline_id: PipelineId,
    pub(crate) sched_id: EntryId,
    pub(crate) params: ScheduleParams,
    pub(crate) xrun_limit_usecs: u32,
    pub(crate) region: Region,
    pub(crate) status: PipelineStatus,
    pub(crate) sched_comp: Option<EntryId>,
    pub(crate) source_comp: Option<EntryId>,
    pub(crate) sink_comp: Option<EntryId>,
}

impl Pipeline {
    pub(crate) fn new(desc: &PipelineDescriptor, core: CoreId, region: Region) -> Self {
        Self {
            comp_id: desc.comp_id,
            pipeline_id: desc.pipeline_id,
            sched_id: desc.sched_id,
            params: ScheduleParams {
                core,
                priority: desc.priority,
                period: desc.period,
                period_mips: desc.period_mips,
                frames_per_sched: desc.frames_per_sched,
                time_domain: desc.time_domain,
            },
            xrun_limit_usecs: desc.xrun_limit_usecs,
            region,
            status: PipelineStatus::Created,
            sched_comp: None,
            source_comp: None,
            sink_comp: None,
        }
    }

    /// Entry id.
    #[inline]
    pub fn id(&self) -> EntryId {
        self.comp_id
    }

    /// Pipeline number.
    #[inline]
    pub fn pipeline_id(&self) -> PipelineId {
        self.pipeline_id
    }

    /// Owning core.
    #[inline]
    pub fn core(&self) -> CoreId {
        self.params.core
    }

    /// Id of the component that drives scheduling.
    pub fn sched_id(&self) -> EntryId {
        self.sched_id
    }

    /// Scheduling parameters.
    pub fn params(&self) -> &ScheduleParams {
        &self.params
    }

    /// Xrun budget in microseconds.
    pub fn xrun_limit_usecs(&self) -> u32 {
        self.xrun_limit_usecs
    }

    /// Construction status.
    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    /// Resolved scheduling component.
    pub fn sched_comp(&self) -> Option<EntryId> {
        self.sched_comp
    }

    /// Resolved source endpoint component.
    pub fn source_comp(&self) -> Option<EntryId> {
        self.source_comp
    }

    /// Resolved sink endpoint component.
    pub fn sink_comp(&self) -> Option<EntryId> {
        self.sink_comp
    }

    /// Drops every reference to `comp`.
    pub(crate) fn forget(&mut self, comp: EntryId) -> bool {
        let mut hit = false;
        for slot in [&mut self.sched_comp, &mut self.source_comp, &mut self.sink_comp] {
            if *slot == Some(comp) {
                *slot = None;
                hit = true;
            }
        }
        hit
    }
}
