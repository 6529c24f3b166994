//! The schedule domain wrapper and its backend contract.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               ScheduleDomain                │
//! │  total_tasks · registered[] · enabled[]     │
//! │  next_tick · new_target_tick                │
//! └──────────────────────┬──────────────────────┘
//!                        │ Box<dyn DomainBackend>
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//!  TimerBackend   DmaSingleChannel   DmaMultiChannel
//! ```
//!
//! Counters and per-core flags live here, never in a backend. Backends own
//! the interrupt plumbing and answer `is_pending`.
//!
//! ## Unregister ordering
//!
//! Some backends tear down the calling execution context inside
//! `unregister` and never return. The wrapper therefore updates its
//! bookkeeping first and only reverts it when the backend returns an error.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, sync::Arc};
#[cfg(feature = "std")]
use std::sync::Arc;

use ostinato_core::{CoreId, EntryId, Error, MAX_CORES, Result};

use crate::task::{ClockSource, Task, TaskHandler, Tick, UNARMED};

/// Interrupt source family of a domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainKind {
    /// Hardware timer interrupt.
    Timer,
    /// Completion of the shortest-period DMA channel.
    DmaSingleChannel,
    /// Completion of any bound DMA channel.
    DmaMultiChannel,
}

impl DomainKind {
    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::DmaSingleChannel => "dma-single",
            Self::DmaMultiChannel => "dma-multi",
        }
    }
}

/// Optional transitions a backend implements.
///
/// A missing `enable`/`disable` makes the wrapper's call a no-op; a missing
/// `arm`/`disarm` leaves deadline handling to the wrapper alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackendCaps {
    /// Backend reacts to per-core enable.
    pub enable: bool,
    /// Backend reacts to per-core disable.
    pub disable: bool,
    /// Backend programs deadlines itself.
    pub arm: bool,
    /// Backend clears its interrupt source on disarm.
    pub disarm: bool,
}

impl BackendCaps {
    /// Every transition implemented.
    pub const ALL: Self = Self {
        enable: true,
        disable: true,
        arm: true,
        disarm: true,
    };
}

/// Result of a pending query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pending {
    /// Task's trigger condition holds now.
    pub pending: bool,
    /// Component that produced the condition, for DMA-class backends.
    pub source: Option<EntryId>,
}

impl Pending {
    /// Not due.
    pub const IDLE: Self = Self {
        pending: false,
        source: None,
    };

    /// Due, with an optional producing component.
    pub const fn due(source: Option<EntryId>) -> Self {
        Self {
            pending: true,
            source,
        }
    }
}

/// Interrupt-source specific half of a schedule domain.
///
/// All methods take `&self`; backends are shared across cores and guard
/// their own state.
pub trait DomainBackend: Send + Sync {
    /// Interrupt source family.
    fn kind(&self) -> DomainKind;

    /// Optional transitions implemented by this backend.
    fn caps(&self) -> BackendCaps;

    /// Hooks `task` into the interrupt source on `core`.
    fn register(&self, core: CoreId, task: &Task, handler: TaskHandler) -> Result<()>;

    /// Unhooks `task`; `remaining` is the number of tasks `core` keeps.
    ///
    /// May not return on some platforms.
    fn unregister(&self, core: CoreId, task: &Task, remaining: u32) -> Result<()>;

    /// Unmasks the interrupt source for `core`.
    fn enable(&self, _core: CoreId) {}

    /// Masks the interrupt source for `core`.
    fn disable(&self, _core: CoreId) {}

    /// Programs the next interrupt; returns the tick actually programmed.
    fn arm(&self, deadline: Tick) -> Tick {
        deadline
    }

    /// Cancels or acknowledges the armed interrupt.
    fn disarm(&self) {}

    /// Whether `task` is due given the armed deadline `next_tick`.
    fn is_pending(&self, task: &Task, next_tick: Tick) -> Pending;
}

impl<B: DomainBackend + ?Sized> DomainBackend for Arc<B> {
    fn kind(&self) -> DomainKind {
        (**self).kind()
    }

    fn caps(&self) -> BackendCaps {
        (**self).caps()
    }

    fn register(&self, core: CoreId, task: &Task, handler: TaskHandler) -> Result<()> {
        (**self).register(core, task, handler)
    }

    fn unregister(&self, core: CoreId, task: &Task, remaining: u32) -> Result<()> {
        (**self).unregister(core, task, remaining)
    }

    fn enable(&self, core: CoreId) {
        (**self).enable(core);
    }

    fn disable(&self, core: CoreId) {
        (**self).disable(core);
    }

    fn arm(&self, deadline: Tick) -> Tick {
        (**self).arm(deadline)
    }

    fn disarm(&self) {
        (**self).disarm();
    }

    fn is_pending(&self, task: &Task, next_tick: Tick) -> Pending {
        (**self).is_pending(task, next_tick)
    }
}

/// Shared bookkeeping wrapped around one backend.
///
/// One instance per trigger type is created at platform init and shared by
/// every core for the lifetime of the runtime.
pub struct ScheduleDomain {
    backend: Box<dyn DomainBackend>,
    clock: ClockSource,
    synchronous: bool,
    full_sync: AtomicBool,
    next_tick: AtomicU64,
    new_target_tick: AtomicU64,
    total_tasks: AtomicI32,
    enabled_cores: AtomicU32,
    registered: [AtomicBool; MAX_CORES],
    enabled: [AtomicBool; MAX_CORES],
}

impl ScheduleDomain {
    /// Wraps `backend`, with nothing armed and no tasks.
    pub fn new(backend: impl DomainBackend + 'static, clock: ClockSource, synchronous: bool) -> Self {
        Self {
            backend: Box::new(backend),
            clock,
            synchronous,
            full_sync: AtomicBool::new(false),
            next_tick: AtomicU64::new(UNARMED),
            new_target_tick: AtomicU64::new(UNARMED),
            total_tasks: AtomicI32::new(0),
            enabled_cores: AtomicU32::new(0),
            registered: [const { AtomicBool::new(false) }; MAX_CORES],
            enabled: [const { AtomicBool::new(false) }; MAX_CORES],
        }
    }

    /// Registers `task` on `core` with its interrupt handler.
    ///
    /// On success the live task count grows by one and `core` is marked
    /// registered. A backend error leaves the domain untouched and is
    /// reported as [`Error::BackendFailure`].
    pub fn register(&self, core: CoreId, task: &Task, handler: TaskHandler) -> Result<()> {
        if let Err(_e) = self.backend.register(core, task, handler) {
            #[cfg(feature = "tracing")]
            tracing::warn!("{} register: task {} on {core} failed: {_e}", self.kind().name(), task.id);
            return Err(Error::BackendFailure);
        }
        self.total_tasks.fetch_add(1, Ordering::AcqRel);
        if !self.registered[core.index()].swap(true, Ordering::AcqRel) {
            #[cfg(feature = "tracing")]
            tracing::debug!("{} register: first task on {core}", self.kind().name());
        }
        Ok(())
    }

    /// Unregisters `task` from `core`, which keeps `remaining` tasks.
    ///
    /// The task count is decremented, and `core` unmarked when `remaining`
    /// is zero, before the backend runs. If the backend fails both are
    /// restored to the values captured on entry.
    pub fn unregister(&self, core: CoreId, task: &Task, remaining: u32) -> Result<()> {
        let flag = &self.registered[core.index()];
        let was_registered = flag.load(Ordering::Acquire);

        self.total_tasks.fetch_sub(1, Ordering::AcqRel);
        if remaining == 0 && was_registered {
            flag.store(false, Ordering::Release);
        }

        match self.backend.unregister(core, task, remaining) {
            Ok(()) => Ok(()),
            Err(_e) => {
                self.total_tasks.fetch_add(1, Ordering::AcqRel);
                if remaining == 0 {
                    flag.store(was_registered, Ordering::Release);
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "{} unregister: task {} on {core} failed ({_e}), rolled back",
                    self.kind().name(),
                    task.id
                );
                Err(Error::BackendFailure)
            }
        }
    }

    /// Enables the interrupt source on `core`. No-op if already enabled or
    /// if the backend has no enable transition.
    pub fn enable(&self, core: CoreId) {
        if !self.backend.caps().enable {
            return;
        }
        critical_section::with(|_| {
            let slot = &self.enabled[core.index()];
            if slot.load(Ordering::Acquire) {
                return;
            }
            self.backend.enable(core);
            slot.store(true, Ordering::Release);
            self.enabled_cores.fetch_add(1, Ordering::AcqRel);
        });
        #[cfg(feature = "tracing")]
        tracing::debug!("{} enable: {core}", self.kind().name());
    }

    /// Disables the interrupt source on `core`. No-op unless enabled.
    pub fn disable(&self, core: CoreId) {
        if !self.backend.caps().disable {
            return;
        }
        critical_section::with(|_| {
            let slot = &self.enabled[core.index()];
            if !slot.load(Ordering::Acquire) {
                return;
            }
            self.backend.disable(core);
            slot.store(false, Ordering::Release);
            self.enabled_cores.fetch_sub(1, Ordering::AcqRel);
        });
        #[cfg(feature = "tracing")]
        tracing::debug!("{} disable: {core}", self.kind().name());
    }

    /// Arms the next interrupt at `deadline`.
    pub fn arm(&self, deadline: Tick) {
        let programmed = if self.backend.caps().arm {
            self.backend.arm(deadline)
        } else {
            deadline
        };
        self.next_tick.store(programmed, Ordering::Release);
    }

    /// Clears the armed interrupt and resets the deadline to [`UNARMED`].
    pub fn disarm(&self) {
        if self.backend.caps().disarm {
            self.backend.disarm();
        }
        self.next_tick.store(UNARMED, Ordering::Release);
    }

    /// Whether `task` is due now, and which component made it so.
    pub fn is_pending(&self, task: &Task) -> Pending {
        self.backend.is_pending(task, self.next_tick())
    }

    /// Offers `tick` as the next deadline during a reschedule pass.
    ///
    /// The earliest offer wins. Nothing is visible to interrupt readers until
    /// [`commit_target`](Self::commit_target).
    pub fn stage_target(&self, tick: Tick) {
        self.new_target_tick.fetch_min(tick, Ordering::AcqRel);
    }

    /// Arms the staged deadline, if any, and clears the stage.
    pub fn commit_target(&self) -> Option<Tick> {
        let staged = self.new_target_tick.swap(UNARMED, Ordering::AcqRel);
        if staged == UNARMED {
            return None;
        }
        self.arm(staged);
        Some(self.next_tick())
    }

    // --- Observers ---

    /// Interrupt source family.
    pub fn kind(&self) -> DomainKind {
        self.backend.kind()
    }

    /// Armed deadline, [`UNARMED`] if none.
    pub fn next_tick(&self) -> Tick {
        self.next_tick.load(Ordering::Acquire)
    }

    /// Staged deadline, [`UNARMED`] if none.
    pub fn new_target_tick(&self) -> Tick {
        self.new_target_tick.load(Ordering::Acquire)
    }

    /// Whether an interrupt is armed.
    pub fn is_armed(&self) -> bool {
        self.next_tick() != UNARMED
    }

    /// Live registrations across all cores.
    pub fn total_tasks(&self) -> i32 {
        self.total_tasks.load(Ordering::Acquire)
    }

    /// Number of cores with the interrupt source enabled.
    pub fn enabled_cores(&self) -> u32 {
        self.enabled_cores.load(Ordering::Acquire)
    }

    /// Whether `core` has at least one registered task.
    pub fn is_registered(&self, core: CoreId) -> bool {
        self.registered[core.index()].load(Ordering::Acquire)
    }

    /// Whether the interrupt source is enabled on `core`.
    pub fn is_enabled(&self, core: CoreId) -> bool {
        self.enabled[core.index()].load(Ordering::Acquire)
    }

    /// Clock feeding the domain.
    pub fn clock(&self) -> ClockSource {
        self.clock
    }

    /// Ticks per millisecond of the domain clock.
    pub fn ticks_per_ms(&self) -> u32 {
        self.clock.ticks_per_ms
    }

    /// Whether tasks on all cores fire in lockstep.
    pub fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    /// Whether lockstep ignores time alignment.
    pub fn full_sync(&self) -> bool {
        self.full_sync.load(Ordering::Acquire)
    }

    /// Sets full synchronization.
    pub fn set_full_sync(&self, full_sync: bool) {
        self.full_sync.store(full_sync, Ordering::Release);
    }

    /// Wrapped backend.
    pub fn backend(&self) -> &dyn DomainBackend {
        self.backend.as_ref()
    }
}

impl core::fmt::Debug for ScheduleDomain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScheduleDomain")
            .field("kind", &self.kind())
            .field("next_tick", &self.next_tick())
            .field("total_tasks", &self.total_tasks())
            .field("enabled_cores", &self.enabled_cores())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Mock {
        fail_register: AtomicBool,
        fail_unregister: AtomicBool,
        enables: AtomicUsize,
        disables: AtomicUsize,
    }

    impl DomainBackend for Mock {
        fn kind(&self) -> DomainKind {
            DomainKind::Timer
        }

        fn caps(&self) -> BackendCaps {
            BackendCaps {
                arm: false,
                ..BackendCaps::ALL
            }
        }

        fn register(&self, _: CoreId, _: &Task, _: TaskHandler) -> Result<()> {
            if self.fail_register.load(Ordering::Relaxed) {
                Err(Error::InvalidState(EntryId(0)))
            } else {
                Ok(())
            }
        }

        fn unregister(&self, _: CoreId, _: &Task, _: u32) -> Result<()> {
            if self.fail_unregister.load(Ordering::Relaxed) {
                Err(Error::BackendFailure)
            } else {
                Ok(())
            }
        }

        fn enable(&self, _: CoreId) {
            self.enables.fetch_add(1, Ordering::Relaxed);
        }

        fn disable(&self, _: CoreId) {
            self.disables.fetch_add(1, Ordering::Relaxed);
        }

        fn is_pending(&self, task: &Task, next_tick: Tick) -> Pending {
            if next_tick != UNARMED && task.start <= next_tick {
                Pending::due(None)
            } else {
                Pending::IDLE
            }
        }
    }

    fn domain() -> (ScheduleDomain, Arc<Mock>) {
        let mock = Arc::new(Mock::default());
        let d = ScheduleDomain::new(mock.clone(), ClockSource::new(0, 1000), false);
        (d, mock)
    }

    fn task() -> Task {
        Task::timer(EntryId(1), CoreId::PRIMARY, 1000)
    }

    fn noop() -> TaskHandler {
        Arc::new(|| {})
    }

    #[test]
    fn register_marks_core() {
        let (d, _) = domain();
        let core = CoreId::new(2).unwrap();
        d.register(core, &task(), noop()).unwrap();
        d.register(core, &task(), noop()).unwrap();
        assert_eq!(d.total_tasks(), 2);
        assert!(d.is_registered(core));
        assert!(!d.is_registered(CoreId::PRIMARY));
    }

    #[test]
    fn failed_register_changes_nothing() {
        let (d, mock) = domain();
        mock.fail_register.store(true, Ordering::Relaxed);
        assert_eq!(d.register(CoreId::PRIMARY, &task(), noop()), Err(Error::BackendFailure));
        assert_eq!(d.total_tasks(), 0);
        assert!(!d.is_registered(CoreId::PRIMARY));
    }

    #[test]
    fn unregister_last_task_clears_core() {
        let (d, _) = domain();
        d.register(CoreId::PRIMARY, &task(), noop()).unwrap();
        d.register(CoreId::PRIMARY, &task(), noop()).unwrap();
        d.unregister(CoreId::PRIMARY, &task(), 1).unwrap();
        assert!(d.is_registered(CoreId::PRIMARY));
        d.unregister(CoreId::PRIMARY, &task(), 0).unwrap();
        assert!(!d.is_registered(CoreId::PRIMARY));
        assert_eq!(d.total_tasks(), 0);
    }

    #[test]
    fn failed_unregister_rolls_back() {
        let (d, mock) = domain();
        d.register(CoreId::PRIMARY, &task(), noop()).unwrap();
        mock.fail_unregister.store(true, Ordering::Relaxed);
        assert_eq!(
            d.unregister(CoreId::PRIMARY, &task(), 0),
            Err(Error::BackendFailure)
        );
        assert_eq!(d.total_tasks(), 1);
        assert!(d.is_registered(CoreId::PRIMARY));
    }

    #[test]
    fn enable_disable_are_idempotent() {
        let (d, mock) = domain();
        let c1 = CoreId::new(1).unwrap();
        d.enable(c1);
        d.enable(c1);
        d.enable(CoreId::PRIMARY);
        assert_eq!(d.enabled_cores(), 2);
        assert_eq!(mock.enables.load(Ordering::Relaxed), 2);

        d.disable(CoreId::new(3).unwrap());
        assert_eq!(mock.disables.load(Ordering::Relaxed), 0);
        d.disable(c1);
        d.disable(c1);
        assert_eq!(d.enabled_cores(), 1);
        assert!(!d.is_enabled(c1));
        assert_eq!(mock.disables.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn arm_without_backend_override_records_deadline() {
        let (d, _) = domain();
        assert!(!d.is_armed());
        d.arm(500);
        assert_eq!(d.next_tick(), 500);
        d.disarm();
        assert_eq!(d.next_tick(), UNARMED);
        d.disarm();
        assert_eq!(d.next_tick(), UNARMED);
    }

    #[test]
    fn staged_target_is_invisible_until_commit() {
        let (d, _) = domain();
        d.arm(100);
        d.stage_target(900);
        d.stage_target(700);
        d.stage_target(800);
        assert_eq!(d.next_tick(), 100);
        assert_eq!(d.new_target_tick(), 700);
        assert_eq!(d.commit_target(), Some(700));
        assert_eq!(d.next_tick(), 700);
        assert_eq!(d.new_target_tick(), UNARMED);
        assert_eq!(d.commit_target(), None);
        assert_eq!(d.next_tick(), 700);
    }
}
