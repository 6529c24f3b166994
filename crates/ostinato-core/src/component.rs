//! Processing components and their lifecycle.
//!
//! A [`Component`] wraps driver-defined behavior ([`ComponentOps`]) with the
//! bookkeeping the registry needs: owning core, lifecycle state, shared
//! promotion and the upstream/downstream buffer lists.
//!
//! # Lifecycle
//!
//! ```text
//!            Prepare         Start
//!   Ready ──────────▶ Prepare ─────▶ Active ◀──┐
//!     ▲                  ▲             │       │ Release
//!     │ Reset            │ Stop/Xrun   │ Pause │
//!     │ (any state)      └─────────────┤       │
//!                                      ▼       │
//!                                    Paused ───┘
//! ```
//!
//! Every state except [`ComponentState::Ready`] counts as active for buffer
//! teardown decisions. Destructive operations require `Ready`.

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

use crate::config::{CommonConfig, ComponentType, SpecificConfig};
use crate::error::{Error, Result};
use crate::ids::{CoreId, EntryId, PipelineId, TypeUuid};
use crate::memory::Region;
use crate::stream::{StreamDirection, StreamParams, period_frames};

/// Default scheduling period in microseconds.
pub const LL_TIMER_PERIOD_US: u32 = 1000;

/// Component lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentState {
    /// Constructed, not yet usable.
    Init,
    /// Idle and safe to free.
    Ready,
    /// Parameters applied, ready to start.
    Prepare,
    /// Processing.
    Active,
    /// Suspended mid-stream.
    Paused,
}

impl ComponentState {
    /// Returns `true` for every state except [`Ready`](Self::Ready).
    #[inline]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Ready)
    }

    /// Computes the state reached by `trigger`.
    pub const fn apply(self, trigger: Trigger) -> Option<Self> {
        use ComponentState::{Active, Paused, Prepare, Ready};
        match (trigger, self) {
            (Trigger::Reset, _) => Some(Ready),
            (Trigger::Prepare, Ready) => Some(Prepare),
            (Trigger::Start, Prepare) | (Trigger::Release, Paused) => Some(Active),
            (Trigger::Pause, Active) => Some(Paused),
            (Trigger::Stop | Trigger::Xrun, Active | Paused) => Some(Prepare),
            _ => None,
        }
    }

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Ready => "ready",
            Self::Prepare => "prepare",
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }
}

/// Lifecycle trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Apply parameters.
    Prepare,
    /// Start processing.
    Start,
    /// Pause processing.
    Pause,
    /// Resume after pause.
    Release,
    /// Stop processing.
    Stop,
    /// Recover from an xrun.
    Xrun,
    /// Return to idle.
    Reset,
}

impl Trigger {
    /// Looks up a trigger by lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "prepare" => Self::Prepare,
            "start" => Self::Start,
            "pause" => Self::Pause,
            "release" => Self::Release,
            "stop" => Self::Stop,
            "xrun" => Self::Xrun,
            "reset" => Self::Reset,
            _ => return None,
        })
    }
}

/// Driver-defined component behavior.
///
/// Signal processing lives behind this trait and is opaque to the registry.
/// Every hook has a no-op default.
pub trait ComponentOps: Send {
    /// Called before a lifecycle transition commits. An error aborts it.
    fn trigger(&mut self, _trigger: Trigger) -> Result<()> {
        Ok(())
    }

    /// Called when stream parameters are negotiated.
    fn params(&mut self, _params: &StreamParams) -> Result<()> {
        Ok(())
    }

    /// Called once before the component is released.
    fn free(&mut self) {}
}

/// A processing node owned by the registry.
pub struct Component {
    pub(crate) config: CommonConfig,
    pub(crate) specific: SpecificConfig,
    pub(crate) uuid: TypeUuid,
    pub(crate) driver: &'static str,
    pub(crate) state: ComponentState,
    pub(crate) is_shared: bool,
    pub(crate) region: Region,
    pub(crate) direction: StreamDirection,
    pub(crate) period_us: u32,
    pub(crate) frames: u32,
    pub(crate) pipeline: Option<EntryId>,
    /// Upstream buffers, in connection order.
    pub(crate) sources: Vec<EntryId>,
    /// Downstream buffers, in connection order.
    pub(crate) sinks: Vec<EntryId>,
    pub(crate) ops: Box<dyn ComponentOps>,
}

impl Component {
    pub(crate) fn new(
        config: CommonConfig,
        specific: SpecificConfig,
        uuid: TypeUuid,
        driver: &'static str,
        region: Region,
        ops: Box<dyn ComponentOps>,
    ) -> Self {
        let direction = specific.direction().unwrap_or_default();
        Self {
            config,
            specific,
            uuid,
            driver,
            state: ComponentState::Ready,
            is_shared: false,
            region,
            direction,
            period_us: LL_TIMER_PERIOD_US,
            frames: 0,
            pipeline: None,
            sources: Vec::new(),
            sinks: Vec::new(),
            ops,
        }
    }

    /// Entry id.
    #[inline]
    pub fn id(&self) -> EntryId {
        self.config.id
    }

    /// Owning core.
    #[inline]
    pub fn core(&self) -> CoreId {
        self.config.core
    }

    /// Pipeline this component was created for.
    #[inline]
    pub fn pipeline_id(&self) -> PipelineId {
        self.config.pipeline_id
    }

    /// Type code.
    #[inline]
    pub fn comp_type(&self) -> ComponentType {
        self.config.comp_type
    }

    /// Generic construction parameters.
    pub fn config(&self) -> &CommonConfig {
        &self.config
    }

    /// Kind-specific construction parameters.
    pub fn specific(&self) -> &SpecificConfig {
        &self.specific
    }

    /// Type identifier of the driver that built the component.
    pub fn uuid(&self) -> TypeUuid {
        self.uuid
    }

    /// Name of the driver that built the component.
    pub fn driver_name(&self) -> &'static str {
        self.driver
    }

    /// Lifecycle state.
    #[inline]
    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// Whether the component has been promoted to shared memory.
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.is_shared
    }

    /// Backing memory.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Data direction.
    pub fn direction(&self) -> StreamDirection {
        self.direction
    }

    /// Frames per scheduling period.
    pub fn period_frames(&self) -> u32 {
        self.frames
    }

    /// Pipeline entry this component was completed into.
    pub fn pipeline(&self) -> Option<EntryId> {
        self.pipeline
    }

    /// Upstream buffers.
    pub fn sources(&self) -> &[EntryId] {
        &self.sources
    }

    /// Downstream buffers.
    pub fn sinks(&self) -> &[EntryId] {
        &self.sinks
    }

    /// Applies a lifecycle trigger through the driver.
    pub(crate) fn trigger(&mut self, trigger: Trigger) -> Result<ComponentState> {
        let next = self
            .state
            .apply(trigger)
            .ok_or(Error::InvalidState(self.id()))?;
        self.ops.trigger(trigger)?;
        self.state = next;
        Ok(next)
    }

    /// Recomputes frames per period from a stream rate.
    pub(crate) fn set_period_frames(&mut self, rate: u32) {
        self.frames = period_frames(rate, self.period_us);
    }

    /// Removes `buffer` from both buffer lists.
    pub(crate) fn unlink(&mut self, buffer: EntryId) {
        self.sources.retain(|&b| b != buffer);
        self.sinks.retain(|&b| b != buffer);
    }
}

impl core::fmt::Debug for Component {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.config.id)
            .field("core", &self.config.core)
            .field("type", &self.config.comp_type)
            .field("state", &self.state)
            .field("is_shared", &self.is_shared)
            .field("sources", &self.sources)
            .field("sinks", &self.sinks)
            .finish_non_exhaustive()
    }
}
