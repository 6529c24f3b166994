//! Integration tests for ostinato-schedule.
//!
//! Exercises the domain bookkeeping from several threads at once (one thread
//! per simulated core) and runs a timer domain through a few periods the way
//! the low-latency scheduler drives it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use ostinato_core::{CoreId, EntryId, Error, MAX_CORES, Result};
use ostinato_schedule::{
    BackendCaps, ClockSource, DomainBackend, DomainKind, Pending, ScheduleDomain, SoftTimer, Task,
    TaskHandler, Tick, TimerBackend, UNARMED,
};

/// Backend whose unregister fails while `refuse` is set.
#[derive(Default)]
struct Flaky {
    refuse: AtomicBool,
    unregisters: AtomicUsize,
}

impl DomainBackend for Flaky {
    fn kind(&self) -> DomainKind {
        DomainKind::Timer
    }

    fn caps(&self) -> BackendCaps {
        BackendCaps::ALL
    }

    fn register(&self, _: CoreId, _: &Task, _: TaskHandler) -> Result<()> {
        Ok(())
    }

    fn unregister(&self, _: CoreId, _: &Task, _: u32) -> Result<()> {
        self.unregisters.fetch_add(1, Ordering::Relaxed);
        if self.refuse.load(Ordering::Relaxed) {
            Err(Error::BackendFailure)
        } else {
            Ok(())
        }
    }

    fn is_pending(&self, _: &Task, _: Tick) -> Pending {
        Pending::IDLE
    }
}

fn noop() -> TaskHandler {
    Arc::new(|| {})
}

#[test]
fn concurrent_register_unregister_balances() {
    const PER_CORE: u32 = 200;
    let flaky = Arc::new(Flaky::default());
    let domain = Arc::new(ScheduleDomain::new(flaky.clone(), ClockSource::new(0, 1000), false));
    let done = Arc::new(AtomicBool::new(false));

    let observer = {
        let domain = domain.clone();
        let done = done.clone();
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                let n = domain.total_tasks();
                assert!((0..=(PER_CORE * MAX_CORES as u32) as i32).contains(&n), "count {n}");
            }
        })
    };

    let workers: Vec<_> = CoreId::all()
        .map(|core| {
            let domain = domain.clone();
            thread::spawn(move || {
                let task = Task::timer(EntryId(core.index() as u32), core, 1000);
                for _ in 0..PER_CORE {
                    domain.register(core, &task, noop()).unwrap();
                    assert!(domain.is_registered(core));
                }
                for remaining in (0..PER_CORE).rev() {
                    domain.unregister(core, &task, remaining).unwrap();
                }
                assert!(!domain.is_registered(core));
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    done.store(true, Ordering::Release);
    observer.join().unwrap();

    assert_eq!(domain.total_tasks(), 0);
    assert_eq!(
        flaky.unregisters.load(Ordering::Relaxed),
        PER_CORE as usize * MAX_CORES
    );
}

#[test]
fn concurrent_enable_counts_each_core_once() {
    let domain = Arc::new(ScheduleDomain::new(
        Arc::new(Flaky::default()),
        ClockSource::new(0, 1000),
        false,
    ));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let domain = domain.clone();
            thread::spawn(move || {
                for core in CoreId::all() {
                    if (i + core.index()) % 2 == 0 {
                        domain.enable(core);
                    } else {
                        domain.enable(core);
                        domain.disable(core);
                        domain.enable(core);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(domain.enabled_cores(), MAX_CORES as u32);
    assert!(CoreId::all().all(|c| domain.is_enabled(c)));
}

#[test]
fn failed_unregister_restores_captured_state() {
    let flaky = Arc::new(Flaky::default());
    let domain = ScheduleDomain::new(flaky.clone(), ClockSource::new(0, 1000), false);
    let core = CoreId::new(1).unwrap();
    let task = Task::timer(EntryId(3), core, 1000);

    domain.register(core, &task, noop()).unwrap();
    flaky.refuse.store(true, Ordering::Relaxed);
    assert_eq!(domain.unregister(core, &task, 0), Err(Error::BackendFailure));
    assert_eq!(domain.total_tasks(), 1);
    assert!(domain.is_registered(core));

    // Core never registered: rollback must not mark it.
    let other = CoreId::new(2).unwrap();
    assert_eq!(domain.unregister(other, &task, 0), Err(Error::BackendFailure));
    assert!(!domain.is_registered(other));
    assert_eq!(domain.total_tasks(), 1);

    flaky.refuse.store(false, Ordering::Relaxed);
    domain.unregister(core, &task, 0).unwrap();
    assert_eq!(domain.total_tasks(), 0);
    assert!(!domain.is_registered(core));
}

#[test]
fn timer_domain_runs_periods() {
    let timer = Arc::new(SoftTimer::new(0));
    let backend = Arc::new(TimerBackend::new(timer.clone()));
    let clock = ClockSource::new(0, 1000);
    let domain = ScheduleDomain::new(backend.clone(), clock, false);
    let core = CoreId::PRIMARY;
    let period = clock.us_to_ticks(1000);

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let task = Task::timer(EntryId(7), core, period);
    domain
        .register(
            core,
            &task,
            Arc::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        )
        .unwrap();
    domain.enable(core);
    domain.arm(period);

    for n in 1..=5u64 {
        timer.advance(period);
        assert!(timer.expired());
        assert!(domain.is_pending(&task).pending);
        assert!(backend.fire(core));
        domain.stage_target(n * period + period);
        domain.commit_target();
        assert!(!domain.is_pending(&task).pending);
    }
    assert_eq!(runs.load(Ordering::Relaxed), 5);
    assert_eq!(domain.next_tick(), 6 * period);

    domain.disarm();
    assert_eq!(domain.next_tick(), UNARMED);
    domain.disable(core);
    domain.unregister(core, &task, 0).unwrap();
    assert!(!domain.is_registered(core));
    assert_eq!(domain.enabled_cores(), 0);
}

