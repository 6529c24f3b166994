//! Timer-interrupt backend.
//!
//! One interrupt handler per core. The first registration on a core installs
//! its handler; later registrations on that core share it. The handler is
//! removed when the core's last task unregisters.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use critical_section::Mutex;
use ostinato_core::{CoreId, MAX_CORES, Result};

use crate::domain::{BackendCaps, DomainBackend, DomainKind, Pending};
use crate::task::{Task, TaskHandler, Tick, UNARMED};

/// Platform timer used by [`TimerBackend`].
pub trait HardwareTimer: Send + Sync {
    /// Current tick.
    fn now(&self) -> Tick;

    /// Programs the compare value; returns the tick actually programmed.
    fn program(&self, deadline: Tick) -> Tick;

    /// Cancels the programmed compare value.
    fn cancel(&self);

    /// Unmasks the timer interrupt on `core`.
    fn enable_irq(&self, core: CoreId);

    /// Masks the timer interrupt on `core`.
    fn disable_irq(&self, core: CoreId);
}

impl<T: HardwareTimer + ?Sized> HardwareTimer for Arc<T> {
    fn now(&self) -> Tick {
        (**self).now()
    }

    fn program(&self, deadline: Tick) -> Tick {
        (**self).program(deadline)
    }

    fn cancel(&self) {
        (**self).cancel();
    }

    fn enable_irq(&self, core: CoreId) {
        (**self).enable_irq(core);
    }

    fn disable_irq(&self, core: CoreId) {
        (**self).disable_irq(core);
    }
}

/// Software timer for hosts and tests.
///
/// Time only moves when [`advance`](Self::advance) or
/// [`set_now`](Self::set_now) is called. Programming a deadline closer than
/// `min_delta` ticks pushes it out to `now + min_delta`.
#[derive(Debug)]
pub struct SoftTimer {
    now: AtomicU64,
    compare: AtomicU64,
    min_delta: Tick,
    irq: [AtomicBool; MAX_CORES],
}

impl SoftTimer {
    /// Timer at tick 0 with nothing programmed.
    pub const fn new(min_delta: Tick) -> Self {
        Self {
            now: AtomicU64::new(0),
            compare: AtomicU64::new(UNARMED),
            min_delta,
            irq: [const { AtomicBool::new(false) }; MAX_CORES],
        }
    }

    /// Moves time forward by `ticks`.
    pub fn advance(&self, ticks: Tick) -> Tick {
        self.now.fetch_add(ticks, Ordering::AcqRel) + ticks
    }

    /// Sets the current tick.
    pub fn set_now(&self, tick: Tick) {
        self.now.store(tick, Ordering::Release);
    }

    /// Programmed compare value, [`UNARMED`] if none.
    pub fn compare(&self) -> Tick {
        self.compare.load(Ordering::Acquire)
    }

    /// Whether the programmed compare value has been reached.
    pub fn expired(&self) -> bool {
        let compare = self.compare();
        compare != UNARMED && self.now() >= compare
    }

    /// Whether the interrupt is unmasked on `core`.
    pub fn irq_enabled(&self, core: CoreId) -> bool {
        self.irq[core.index()].load(Ordering::Acquire)
    }
}

impl Default for SoftTimer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl HardwareTimer for SoftTimer {
    fn now(&self) -> Tick {
        self.now.load(Ordering::Acquire)
    }

    fn program(&self, deadline: Tick) -> Tick {
        let earliest = self.now().saturating_add(self.min_delta);
        let programmed = deadline.max(earliest);
        self.compare.store(programmed, Ordering::Release);
        programmed
    }

    fn cancel(&self) {
        self.compare.store(UNARMED, Ordering::Release);
    }

    fn enable_irq(&self, core: CoreId) {
        self.irq[core.index()].store(true, Ordering::Release);
    }

    fn disable_irq(&self, core: CoreId) {
        self.irq[core.index()].store(false, Ordering::Release);
    }
}

/// Schedule domain backend driven by a [`HardwareTimer`].
pub struct TimerBackend<T> {
    timer: T,
    handlers: Mutex<RefCell<[Option<TaskHandler>; MAX_CORES]>>,
}

impl<T: HardwareTimer> TimerBackend<T> {
    /// Wraps `timer` with no handlers installed.
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            handlers: Mutex::new(RefCell::new([const { None }; MAX_CORES])),
        }
    }

    /// Underlying timer.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Whether `core` has an interrupt handler installed.
    pub fn has_handler(&self, core: CoreId) -> bool {
        critical_section::with(|cs| self.handlers.borrow(cs).borrow()[core.index()].is_some())
    }

    /// Runs `core`'s interrupt handler, as the timer interrupt would.
    ///
    /// Returns `false` if no handler is installed.
    pub fn fire(&self, core: CoreId) -> bool {
        let handler =
            critical_section::with(|cs| self.handlers.borrow(cs).borrow()[core.index()].clone());
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

impl<T: HardwareTimer> DomainBackend for TimerBackend<T> {
    fn kind(&self) -> DomainKind {
        DomainKind::Timer
    }

    fn caps(&self) -> BackendCaps {
        BackendCaps::ALL
    }

    fn register(&self, core: CoreId, _task: &Task, handler: TaskHandler) -> Result<()> {
        critical_section::with(|cs| {
            let mut slots = self.handlers.borrow(cs).borrow_mut();
            let slot = &mut slots[core.index()];
            if slot.is_none() {
                *slot = Some(handler);
                #[cfg(feature = "tracing")]
                tracing::debug!("timer: handler installed on {core}");
            }
        });
        Ok(())
    }

    fn unregister(&self, core: CoreId, _task: &Task, remaining: u32) -> Result<()> {
        if remaining > 0 {
            return Ok(());
        }
        critical_section::with(|cs| {
            self.handlers.borrow(cs).borrow_mut()[core.index()] = None;
        });
        #[cfg(feature = "tracing")]
        tracing::debug!("timer: handler removed from {core}");
        Ok(())
    }

    fn enable(&self, core: CoreId) {
        self.timer.enable_irq(core);
    }

    fn disable(&self, core: CoreId) {
        self.timer.disable_irq(core);
    }

    fn arm(&self, deadline: Tick) -> Tick {
        self.timer.program(deadline)
    }

    fn disarm(&self) {
        self.timer.cancel();
    }

    fn is_pending(&self, task: &Task, next_tick: Tick) -> Pending {
        let now = self.timer.now();
        if next_tick != UNARMED && now >= next_tick && task.start <= now {
            Pending::due(None)
        } else {
            Pending::IDLE
        }
    }
}

impl<T> core::fmt::Debug for TimerBackend<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerBackend").finish_non_exhaustive()
    }
}
