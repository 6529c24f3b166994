//! Memory and cache-maintenance collaborators.
//!
//! The registry never owns raw memory. Every object it creates is backed by a
//! [`Region`] handed out by an [`Allocator`], and every metadata write that
//! another core may observe goes through a [`CacheOps`] implementation.
//!
//! # Cache protocol
//!
//! Cores do not share a coherent data cache. The contract is explicit:
//!
//! - a writer calls [`CacheOps::publish`] (write-back + invalidate) after
//!   mutating a region another core reads;
//! - a reader calls [`CacheOps::acquire`] (invalidate) before trusting
//!   metadata another core wrote.
//!
//! Ordering between a remote write and a local read holds only when both
//! sides follow this pair.
//!
//! # Host implementations
//!
//! [`PoolAllocator`] hands out address ranges from a fixed-capacity pool and
//! counts allocations per [`MemZone`]. [`CountingCache`] performs no
//! maintenance but records how many publish/acquire operations were issued,
//! which host tests use to observe the protocol.

use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Data-cache line size. Buffers are aligned to it.
pub const DCACHE_LINE_SIZE: usize = 64;

/// Rounds `value` up to the next multiple of `align` (a power of two).
#[inline]
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Allocation zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemZone {
    /// Objects living for the whole runtime.
    System,
    /// Per-core runtime objects.
    Runtime,
    /// Runtime objects reachable from more than one core.
    RuntimeShared,
    /// Audio data buffers.
    Buffer,
}

impl MemZone {
    const COUNT: usize = 4;

    const fn slot(self) -> usize {
        match self {
            Self::System => 0,
            Self::Runtime => 1,
            Self::RuntimeShared => 2,
            Self::Buffer => 3,
        }
    }
}

/// Memory capability flags requested for an allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct MemCaps(pub u32);

impl MemCaps {
    /// General purpose RAM.
    pub const RAM: Self = Self(1 << 0);
    /// Read-only memory.
    pub const ROM: Self = Self(1 << 1);
    /// External memory.
    pub const EXT: Self = Self(1 << 2);
    /// Low-power memory.
    pub const LP: Self = Self(1 << 3);
    /// High-performance memory.
    pub const HP: Self = Self(1 << 4);
    /// DMA-reachable memory.
    pub const DMA: Self = Self(1 << 5);
    /// Cacheable memory.
    pub const CACHE: Self = Self(1 << 6);

    /// Returns `true` if every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for MemCaps {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An allocated address range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// Start address.
    pub addr: usize,
    /// Length in bytes.
    pub size: usize,
    /// Zone the range was allocated from.
    pub zone: MemZone,
}

/// Heap collaborator.
///
/// `alloc` returns `None` when the request cannot be met; callers turn that
/// into [`Error::OutOfMemory`](crate::Error::OutOfMemory).
pub trait Allocator: Send + Sync {
    /// Allocates `size` bytes aligned to `align` from `zone` with `caps`.
    fn alloc(&self, zone: MemZone, caps: MemCaps, size: usize, align: usize) -> Option<Region>;

    /// Returns a region to the allocator.
    fn free(&self, region: Region);
}

/// Cache-maintenance collaborator.
pub trait CacheOps: Send + Sync {
    /// Writes dirty lines covering `region` back to memory and invalidates them.
    fn write_back_invalidate(&self, region: &Region);

    /// Discards cached lines covering `region`.
    fn invalidate(&self, region: &Region);

    /// Makes local writes to `region` visible to other cores.
    #[inline]
    fn publish(&self, region: &Region) {
        self.write_back_invalidate(region);
    }

    /// Drops stale local copies of `region` before reading remote writes.
    #[inline]
    fn acquire(&self, region: &Region) {
        self.invalidate(region);
    }
}

/// Fixed-capacity address pool for hosts without a firmware heap.
///
/// Addresses are handed out monotonically; freed bytes return to the
/// capacity budget but addresses are not reused.
#[derive(Debug)]
pub struct PoolAllocator {
    base: usize,
    capacity: usize,
    next: AtomicUsize,
    in_use: AtomicUsize,
    per_zone: [AtomicUsize; MemZone::COUNT],
}

impl PoolAllocator {
    /// Creates a pool of `capacity` bytes starting at `base`.
    pub const fn new(base: usize, capacity: usize) -> Self {
        Self {
            base,
            capacity,
            next: AtomicUsize::new(base),
            in_use: AtomicUsize::new(0),
            per_zone: [
                AtomicUsize::new(0),
                AtomicUsize::new(0),
                AtomicUsize::new(0),
                AtomicUsize::new(0),
            ],
        }
    }

    /// Bytes currently allocated.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Total number of successful allocations made from `zone`.
    pub fn allocations(&self, zone: MemZone) -> usize {
        self.per_zone[zone.slot()].load(Ordering::Acquire)
    }

    /// Pool capacity in bytes.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Base address of the pool.
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl Allocator for PoolAllocator {
    fn alloc(&self, zone: MemZone, _caps: MemCaps, size: usize, align: usize) -> Option<Region> {
        let align = align.max(1).next_power_of_two();
        let reserved = self
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(size).filter(|&total| total <= self.capacity)
            });
        if reserved.is_err() {
            return None;
        }
        let addr = match self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                align_up(next, align).checked_add(size)
            }) {
            Ok(prev) => align_up(prev, align),
            Err(_) => {
                self.in_use.fetch_sub(size, Ordering::AcqRel);
                return None;
            }
        };
        self.per_zone[zone.slot()].fetch_add(1, Ordering::AcqRel);
        Some(Region { addr, size, zone })
    }

    fn free(&self, region: Region) {
        self.in_use.fetch_sub(region.size, Ordering::AcqRel);
    }
}

/// Cache implementation for coherent hosts that counts maintenance calls.
#[derive(Debug, Default)]
pub struct CountingCache {
    write_backs: AtomicU64,
    invalidates: AtomicU64,
}

impl CountingCache {
    /// Creates a cache with zeroed counters.
    pub const fn new() -> Self {
        Self {
            write_backs: AtomicU64::new(0),
            invalidates: AtomicU64::new(0),
        }
    }

    /// Number of write-back-and-invalidate operations issued.
    pub fn write_backs(&self) -> u64 {
        self.write_backs.load(Ordering::Acquire)
    }

    /// Number of invalidate-only operations issued.
    pub fn invalidates(&self) -> u64 {
        self.invalidates.load(Ordering::Acquire)
    }
}

impl CacheOps for CountingCache {
    fn write_back_invalidate(&self, _region: &Region) {
        self.write_backs.fetch_add(1, Ordering::AcqRel);
    }

    fn invalidate(&self, _region: &Region) {
        self.invalidates.fetch_add(1, Ordering::AcqRel);
    }
}
