//! DMA-completion backends.
//!
//! Tasks bind to a (controller, channel) pair through
//! [`TaskTrigger::DmaChannel`](crate::TaskTrigger::DmaChannel).
//!
//! - [`DmaMultiChannelBackend`]: every bound channel raises its own
//!   completion; one interrupt may make several tasks due, and `is_pending`
//!   reports which upstream component produced the completion.
//! - [`DmaSingleChannelBackend`]: the bound channel with the shortest period
//!   drives the whole domain; its completion makes every task due.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[cfg(not(feature = "std"))]
use alloc::{sync::Arc, vec::Vec};
#[cfg(feature = "std")]
use std::sync::Arc;

use critical_section::Mutex;
use ostinato_core::{CoreId, EntryId, Error, Result};

use crate::domain::{BackendCaps, DomainBackend, DomainKind, Pending};
use crate::task::{Task, TaskHandler, Tick};

/// Interrupt line of a DMA controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IrqLine {
    /// One line shared by every channel of the controller.
    Aggregated,
    /// Dedicated line of one channel.
    Channel(usize),
}

/// DMA controller as seen by the schedule domain.
pub trait DmaController: Send + Sync {
    /// Number of channels.
    fn channel_count(&self) -> usize;

    /// Whether `channel` has a completion pending.
    fn status(&self, channel: usize) -> bool;

    /// Acknowledges the completion on `channel`.
    fn clear(&self, channel: usize);

    /// Unmasks an interrupt line.
    fn enable_irq(&self, line: IrqLine);

    /// Masks an interrupt line.
    fn disable_irq(&self, line: IrqLine);
}

/// Simulated controller with up to 32 channels.
#[derive(Debug)]
pub struct SimDmac {
    channels: usize,
    status: AtomicU32,
    channel_irq: AtomicU32,
    aggregated_irq: AtomicBool,
}

impl SimDmac {
    /// Controller with `channels` channels, capped at 32.
    pub const fn new(channels: usize) -> Self {
        Self {
            channels: if channels > 32 { 32 } else { channels },
            status: AtomicU32::new(0),
            channel_irq: AtomicU32::new(0),
            aggregated_irq: AtomicBool::new(false),
        }
    }

    /// Raises a completion on `channel`.
    pub fn complete(&self, channel: usize) {
        if channel < self.channels {
            self.status.fetch_or(1 << channel, Ordering::AcqRel);
        }
    }

    /// Whether `line` is unmasked.
    pub fn irq_enabled(&self, line: IrqLine) -> bool {
        match line {
            IrqLine::Aggregated => self.aggregated_irq.load(Ordering::Acquire),
            IrqLine::Channel(ch) => {
                ch < self.channels && self.channel_irq.load(Ordering::Acquire) & (1 << ch) != 0
            }
        }
    }
}

impl DmaController for SimDmac {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn status(&self, channel: usize) -> bool {
        channel < self.channels && self.status.load(Ordering::Acquire) & (1 << channel) != 0
    }

    fn clear(&self, channel: usize) {
        if channel < self.channels {
            self.status.fetch_and(!(1 << channel), Ordering::AcqRel);
        }
    }

    fn enable_irq(&self, line: IrqLine) {
        match line {
            IrqLine::Aggregated => self.aggregated_irq.store(true, Ordering::Release),
            IrqLine::Channel(ch) if ch < self.channels => {
                self.channel_irq.fetch_or(1 << ch, Ordering::AcqRel);
            }
            IrqLine::Channel(_) => {}
        }
    }

    fn disable_irq(&self, line: IrqLine) {
        match line {
            IrqLine::Aggregated => self.aggregated_irq.store(false, Ordering::Release),
            IrqLine::Channel(ch) if ch < self.channels => {
                self.channel_irq.fetch_and(!(1 << ch), Ordering::AcqRel);
            }
            IrqLine::Channel(_) => {}
        }
    }
}

/// Controller handle shared with the platform.
pub type SharedDmac = Arc<dyn DmaController>;

#[derive(Clone)]
struct Binding {
    task: EntryId,
    core: CoreId,
    period: Tick,
    dma: usize,
    channel: usize,
    source: EntryId,
    handler: TaskHandler,
}

fn binding(dmacs: &[SharedDmac], core: CoreId, task: &Task, handler: TaskHandler) -> Result<Binding> {
    let (dma, channel, source) = task.dma_binding().ok_or(Error::InvalidDescriptor)?;
    let dmac = dmacs.get(dma).ok_or(Error::InvalidDescriptor)?;
    if channel >= dmac.channel_count() {
        return Err(Error::InvalidDescriptor);
    }
    Ok(Binding {
        task: task.id,
        core,
        period: task.period,
        dma,
        channel,
        source,
        handler,
    })
}

// ---------------------------------------------------------------------------
// Multi-channel
// ---------------------------------------------------------------------------

/// Backend where each bound channel completion is an interrupt source.
pub struct DmaMultiChannelBackend {
    dmacs: Vec<SharedDmac>,
    aggregated_irq: bool,
    bindings: Mutex<RefCell<Vec<Binding>>>,
}

impl DmaMultiChannelBackend {
    /// Backend over `dmacs`. With `aggregated_irq` one line per controller
    /// serves all of its channels.
    pub fn new(dmacs: Vec<SharedDmac>, aggregated_irq: bool) -> Self {
        Self {
            dmacs,
            aggregated_irq,
            bindings: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Whether one line per controller is used.
    pub fn aggregated_irq(&self) -> bool {
        self.aggregated_irq
    }

    /// Number of bound channels.
    pub fn bound_channels(&self) -> usize {
        critical_section::with(|cs| self.bindings.borrow(cs).borrow().len())
    }

    /// Runs the handler bound to `channel` of controller `dma`.
    pub fn fire(&self, dma: usize, channel: usize) -> bool {
        let handler = critical_section::with(|cs| {
            self.bindings
                .borrow(cs)
                .borrow()
                .iter()
                .find(|b| b.dma == dma && b.channel == channel)
                .map(|b| b.handler.clone())
        });
        handler.map(|h| h()).is_some()
    }

    fn line(&self, channel: usize) -> IrqLine {
        if self.aggregated_irq {
            IrqLine::Aggregated
        } else {
            IrqLine::Channel(channel)
        }
    }

    fn set_lines(&self, core: CoreId, on: bool) {
        let lines: Vec<(usize, IrqLine)> = critical_section::with(|cs| {
            self.bindings
                .borrow(cs)
                .borrow()
                .iter()
                .filter(|b| b.core == core)
                .map(|b| (b.dma, self.line(b.channel)))
                .collect()
        });
        for (dma, line) in lines {
            if let Some(dmac) = self.dmacs.get(dma) {
                if on {
                    dmac.enable_irq(line);
                } else {
                    dmac.disable_irq(line);
                }
            }
        }
    }
}

impl DomainBackend for DmaMultiChannelBackend {
    fn kind(&self) -> DomainKind {
        DomainKind::DmaMultiChannel
    }

    fn caps(&self) -> BackendCaps {
        BackendCaps {
            enable: true,
            disable: true,
            arm: false,
            disarm: false,
        }
    }

    fn register(&self, core: CoreId, task: &Task, handler: TaskHandler) -> Result<()> {
        let new = binding(&self.dmacs, core, task, handler)?;
        let (dma, channel) = (new.dma, new.channel);
        let first_on_dmac = critical_section::with(|cs| {
            let mut bindings = self.bindings.borrow(cs).borrow_mut();
            if bindings.iter().any(|b| b.dma == dma && b.channel == channel) {
                return Err(Error::Busy(task.id));
            }
            let first = !bindings.iter().any(|b| b.dma == dma);
            bindings.push(new);
            Ok(first)
        })?;
        if !self.aggregated_irq || first_on_dmac {
            self.dmacs[dma].enable_irq(self.line(channel));
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("dma-multi: task {} bound to dma{dma} ch{channel} on {core}", task.id);
        Ok(())
    }

    fn unregister(&self, _core: CoreId, task: &Task, _remaining: u32) -> Result<()> {
        let (dma, channel, last_on_dmac) = critical_section::with(|cs| {
            let mut bindings = self.bindings.borrow(cs).borrow_mut();
            let pos = bindings
                .iter()
                .position(|b| b.task == task.id)
                .ok_or(Error::NotFound(task.id))?;
            let gone = bindings.remove(pos);
            let last = !bindings.iter().any(|b| b.dma == gone.dma);
            Ok::<_, Error>((gone.dma, gone.channel, last))
        })?;
        if !self.aggregated_irq || last_on_dmac {
            self.dmacs[dma].disable_irq(self.line(channel));
        }
        self.dmacs[dma].clear(channel);
        #[cfg(feature = "tracing")]
        tracing::debug!("dma-multi: task {} released dma{dma} ch{channel}", task.id);
        Ok(())
    }

    fn enable(&self, core: CoreId) {
        self.set_lines(core, true);
    }

    fn disable(&self, core: CoreId) {
        self.set_lines(core, false);
    }

    fn is_pending(&self, task: &Task, _next_tick: Tick) -> Pending {
        let Some((dma, channel, source)) = task.dma_binding() else {
            return Pending::IDLE;
        };
        let Some(dmac) = self.dmacs.get(dma) else {
            return Pending::IDLE;
        };
        if !dmac.status(channel) {
            return Pending::IDLE;
        }
        dmac.clear(channel);
        Pending::due(Some(source))
    }
}

impl core::fmt::Debug for DmaMultiChannelBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DmaMultiChannelBackend")
            .field("dmacs", &self.dmacs.len())
            .field("aggregated_irq", &self.aggregated_irq)
            .field("bound", &self.bound_channels())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Single-channel
// ---------------------------------------------------------------------------

/// Backend driven by the shortest-period bound channel.
pub struct DmaSingleChannelBackend {
    dmacs: Vec<SharedDmac>,
    bindings: Mutex<RefCell<Vec<Binding>>>,
}

impl DmaSingleChannelBackend {
    /// Backend over `dmacs`.
    pub fn new(dmacs: Vec<SharedDmac>) -> Self {
        Self {
            dmacs,
            bindings: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Controller and channel currently driving the domain.
    pub fn driver(&self) -> Option<(usize, usize)> {
        critical_section::with(|cs| {
            Self::shortest(&self.bindings.borrow(cs).borrow()).map(|b| (b.dma, b.channel))
        })
    }

    /// Runs every handler, as the driving channel's interrupt would.
    ///
    /// Returns the number of handlers run.
    pub fn fire(&self) -> usize {
        let handlers: Vec<TaskHandler> = critical_section::with(|cs| {
            self.bindings
                .borrow(cs)
                .borrow()
                .iter()
                .map(|b| b.handler.clone())
                .collect()
        });
        for h in &handlers {
            h();
        }
        handlers.len()
    }

    fn shortest(bindings: &[Binding]) -> Option<&Binding> {
        bindings.iter().min_by_key(|b| b.period)
    }

    fn retarget(&self, from: Option<(usize, usize)>, to: Option<(usize, usize)>) {
        if from == to {
            return;
        }
        if let Some((dma, ch)) = from {
            self.dmacs[dma].disable_irq(IrqLine::Channel(ch));
        }
        if let Some((dma, ch)) = to {
            self.dmacs[dma].enable_irq(IrqLine::Channel(ch));
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("dma-single: driver {from:?} -> {to:?}");
    }
}

impl DomainBackend for DmaSingleChannelBackend {
    fn kind(&self) -> DomainKind {
        DomainKind::DmaSingleChannel
    }

    fn caps(&self) -> BackendCaps {
        BackendCaps {
            enable: false,
            disable: false,
            arm: false,
            disarm: true,
        }
    }

    fn register(&self, core: CoreId, task: &Task, handler: TaskHandler) -> Result<()> {
        let new = binding(&self.dmacs, core, task, handler)?;
        let (from, to) = critical_section::with(|cs| {
            let mut bindings = self.bindings.borrow(cs).borrow_mut();
            let from = Self::shortest(&bindings).map(|b| (b.dma, b.channel));
            bindings.push(new);
            let to = Self::shortest(&bindings).map(|b| (b.dma, b.channel));
            (from, to)
        });
        self.retarget(from, to);
        Ok(())
    }

    fn unregister(&self, _core: CoreId, task: &Task, _remaining: u32) -> Result<()> {
        let (from, to) = critical_section::with(|cs| {
            let mut bindings = self.bindings.borrow(cs).borrow_mut();
            let from = Self::shortest(&bindings).map(|b| (b.dma, b.channel));
            let pos = bindings
                .iter()
                .position(|b| b.task == task.id)
                .ok_or(Error::NotFound(task.id))?;
            bindings.remove(pos);
            let to = Self::shortest(&bindings).map(|b| (b.dma, b.channel));
            Ok::<_, Error>((from, to))
        })?;
        self.retarget(from, to);
        Ok(())
    }

    fn disarm(&self) {
        if let Some((dma, ch)) = self.driver() {
            self.dmacs[dma].clear(ch);
        }
    }

    fn is_pending(&self, _task: &Task, _next_tick: Tick) -> Pending {
        let driving = critical_section::with(|cs| {
            Self::shortest(&self.bindings.borrow(cs).borrow()).map(|b| (b.dma, b.channel, b.source))
        });
        match driving {
            Some((dma, ch, source)) if self.dmacs[dma].status(ch) => Pending::due(Some(source)),
            _ => Pending::IDLE,
        }
    }
}

impl core::fmt::Debug for DmaSingleChannelBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DmaSingleChannelBackend")
            .field("dmacs", &self.dmacs.len())
            .field("driver", &self.driver())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScheduleDomain;
    use crate::task::ClockSource;
    use std::sync::atomic::AtomicUsize;

    fn noop() -> TaskHandler {
        Arc::new(|| {})
    }

    fn dmacs() -> (Arc<SimDmac>, Arc<SimDmac>, Vec<SharedDmac>) {
        let a = Arc::new(SimDmac::new(8));
        let b = Arc::new(SimDmac::new(8));
        let shared: Vec<SharedDmac> = vec![a.clone(), b.clone()];
        (a, b, shared)
    }

    const C0: CoreId = CoreId::PRIMARY;

    #[test]
    fn multi_channel_reports_source_and_acknowledges() {
        let (a, _b, shared) = dmacs();
        let d = ScheduleDomain::new(
            DmaMultiChannelBackend::new(shared, false),
            ClockSource::new(1, 1000),
            false,
        );
        let t1 = Task::dma(EntryId(10), C0, 1000, 0, 2, EntryId(4));
        let t2 = Task::dma(EntryId(11), C0, 1000, 0, 5, EntryId(6));
        d.register(C0, &t1, noop()).unwrap();
        d.register(C0, &t2, noop()).unwrap();
        assert!(a.irq_enabled(IrqLine::Channel(2)));
        assert!(a.irq_enabled(IrqLine::Channel(5)));

        assert_eq!(d.is_pending(&t1), Pending::IDLE);
        a.complete(2);
        assert_eq!(d.is_pending(&t2), Pending::IDLE);
        assert_eq!(d.is_pending(&t1), Pending::due(Some(EntryId(4))));
        // Acknowledged by the first query.
        assert_eq!(d.is_pending(&t1), Pending::IDLE);
    }

    #[test]
    fn aggregated_irq_uses_one_line_per_controller() {
        let (a, b, shared) = dmacs();
        let backend = DmaMultiChannelBackend::new(shared, true);
        let t1 = Task::dma(EntryId(10), C0, 1000, 0, 1, EntryId(4));
        let t2 = Task::dma(EntryId(11), C0, 1000, 0, 3, EntryId(6));
        backend.register(C0, &t1, noop()).unwrap();
        backend.register(C0, &t2, noop()).unwrap();
        assert!(a.irq_enabled(IrqLine::Aggregated));
        assert!(!a.irq_enabled(IrqLine::Channel(1)));
        assert!(!b.irq_enabled(IrqLine::Aggregated));

        backend.unregister(C0, &t1, 1).unwrap();
        assert!(a.irq_enabled(IrqLine::Aggregated));
        backend.unregister(C0, &t2, 0).unwrap();
        assert!(!a.irq_enabled(IrqLine::Aggregated));
    }

    #[test]
    fn multi_channel_rejects_bad_bindings() {
        let (_a, _b, shared) = dmacs();
        let backend = DmaMultiChannelBackend::new(shared, false);
        let timer_task = Task::timer(EntryId(1), C0, 1000);
        assert_eq!(backend.register(C0, &timer_task, noop()), Err(Error::InvalidDescriptor));
        let bad_dma = Task::dma(EntryId(1), C0, 1000, 7, 0, EntryId(2));
        assert_eq!(backend.register(C0, &bad_dma, noop()), Err(Error::InvalidDescriptor));
        let bad_ch = Task::dma(EntryId(1), C0, 1000, 0, 8, EntryId(2));
        assert_eq!(backend.register(C0, &bad_ch, noop()), Err(Error::InvalidDescriptor));
        let ok = Task::dma(EntryId(1), C0, 1000, 0, 0, EntryId(2));
        backend.register(C0, &ok, noop()).unwrap();
        let clash = Task::dma(EntryId(2), C0, 1000, 0, 0, EntryId(3));
        assert_eq!(backend.register(C0, &clash, noop()), Err(Error::Busy(EntryId(2))));
        assert_eq!(backend.unregister(C0, &clash, 0), Err(Error::NotFound(EntryId(2))));
    }

    #[test]
    fn fire_runs_bound_handler() {
        let (_a, _b, shared) = dmacs();
        let backend = DmaMultiChannelBackend::new(shared, false);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let task = Task::dma(EntryId(1), C0, 1000, 1, 4, EntryId(2));
        backend
            .register(
                C0,
                &task,
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }),
            )
            .unwrap();
        assert!(backend.fire(1, 4));
        assert!(!backend.fire(1, 5));
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn single_channel_follows_shortest_period() {
        let (a, b, shared) = dmacs();
        let d = ScheduleDomain::new(
            DmaSingleChannelBackend::new(shared),
            ClockSource::new(1, 1000),
            true,
        );
        let slow = Task::dma(EntryId(10), C0, 2000, 0, 1, EntryId(4));
        let fast = Task::dma(EntryId(11), C0, 500, 1, 3, EntryId(6));
        d.register(C0, &slow, noop()).unwrap();
        assert!(a.irq_enabled(IrqLine::Channel(1)));
        d.register(C0, &fast, noop()).unwrap();
        assert!(!a.irq_enabled(IrqLine::Channel(1)));
        assert!(b.irq_enabled(IrqLine::Channel(3)));

        // Completion on a non-driving channel does nothing.
        a.complete(1);
        assert_eq!(d.is_pending(&slow), Pending::IDLE);

        b.complete(3);
        assert_eq!(d.is_pending(&slow), Pending::due(Some(EntryId(6))));
        assert_eq!(d.is_pending(&fast), Pending::due(Some(EntryId(6))));
        d.disarm();
        assert_eq!(d.is_pending(&fast), Pending::IDLE);

        d.unregister(C0, &fast, 1).unwrap();
        assert!(a.irq_enabled(IrqLine::Channel(1)));
        assert!(!b.irq_enabled(IrqLine::Channel(3)));
        assert_eq!(d.is_pending(&slow), Pending::due(Some(EntryId(4))));
    }
}
