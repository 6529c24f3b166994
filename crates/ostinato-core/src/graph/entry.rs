//! Registry entries: one tagged payload per entry kind behind a common header.

use crate::buffer::Buffer;
use crate::component::{Component, ComponentState};
use crate::ids::{CoreId, EntryId, PipelineId};
use crate::pipeline::Pipeline;

/// Kind of a registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Processing component.
    Component,
    /// Data buffer.
    Buffer,
    /// Pipeline.
    Pipeline,
}

impl EntryKind {
    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Buffer => "buffer",
            Self::Pipeline => "pipeline",
        }
    }
}

/// Fields shared by every entry kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryHeader {
    /// Entry id.
    pub id: EntryId,
    /// Owning core.
    pub core: CoreId,
    /// Entry kind.
    pub kind: EntryKind,
}

/// A registry entry.
#[derive(Debug)]
pub enum Entry {
    /// Processing component.
    Component(Component),
    /// Data buffer.
    Buffer(Buffer),
    /// Pipeline.
    Pipeline(Pipeline),
}

impl Entry {
    /// Common header.
    pub fn header(&self) -> EntryHeader {
        match self {
            Self::Component(c) => EntryHeader {
                id: c.id(),
                core: c.core(),
                kind: EntryKind::Component,
            },
            Self::Buffer(b) => EntryHeader {
                id: b.id(),
                core: b.core(),
                kind: EntryKind::Buffer,
            },
            Self::Pipeline(p) => EntryHeader {
                id: p.id(),
                core: p.core(),
                kind: EntryKind::Pipeline,
            },
        }
    }

    /// Entry kind.
    #[inline]
    pub fn kind(&self) -> EntryKind {
        self.header().kind
    }

    /// Owning core.
    #[inline]
    pub fn core(&self) -> CoreId {
        self.header().core
    }

    /// Pipeline the entry belongs to.
    pub fn pipeline_id(&self) -> PipelineId {
        match self {
            Self::Component(c) => c.pipeline_id(),
            Self::Buffer(b) => b.pipeline_id(),
            Self::Pipeline(p) => p.pipeline_id(),
        }
    }

    /// Component payload, if this is a component.
    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Self::Component(c) => Some(c),
            _ => None,
        }
    }

    /// Buffer payload, if this is a buffer.
    pub fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Self::Buffer(b) => Some(b),
            _ => None,
        }
    }

    /// Pipeline payload, if this is a pipeline.
    pub fn as_pipeline(&self) -> Option<&Pipeline> {
        match self {
            Self::Pipeline(p) => Some(p),
            _ => None,
        }
    }

    /// Point-in-time summary used for inspection and comparison.
    pub fn summary(&self) -> EntrySummary {
        let header = self.header();
        let mut summary = EntrySummary {
            header,
            pipeline_id: self.pipeline_id(),
            state: None,
            is_shared: false,
            inter_core: false,
            links: [None, None],
            upstream: 0,
            downstream: 0,
        };
        match self {
            Self::Component(c) => {
                summary.state = Some(c.state());
                summary.is_shared = c.is_shared();
                summary.upstream = c.sources().len();
                summary.downstream = c.sinks().len();
            }
            Self::Buffer(b) => {
                summary.inter_core = b.is_inter_core();
                summary.links = [b.source(), b.sink()];
            }
            Self::Pipeline(p) => {
                summary.links = [p.source_comp(), p.sink_comp()];
            }
        }
        summary
    }
}

/// Comparable snapshot of one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntrySummary {
    /// Common header.
    pub header: EntryHeader,
    /// Pipeline the entry belongs to.
    pub pipeline_id: PipelineId,
    /// Component lifecycle state.
    pub state: Option<ComponentState>,
    /// Component promoted to shared memory.
    pub is_shared: bool,
    /// Buffer crosses cores.
    pub inter_core: bool,
    /// Buffer source/sink or pipeline source/sink component.
    pub links: [Option<EntryId>; 2],
    /// Component upstream buffer count.
    pub upstream: usize,
    /// Component downstream buffer count.
    pub downstream: usize,
}
