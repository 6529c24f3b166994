//! Runtime platform configuration.

use ostinato_core::MAX_CORES;

use crate::error::PlatformError;

/// Base address of the simulated memory pool.
pub const POOL_BASE: usize = 0xbe00_0000;

/// Settings consumed by [`PlatformContext::new`](crate::PlatformContext::new).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Number of DSP cores, at most [`MAX_CORES`].
    pub core_count: usize,
    /// Platform timer ticks per millisecond.
    pub timer_ticks_per_ms: u32,
    /// Bytes available to the allocator.
    pub memory_capacity: usize,
    /// Channels on the simulated DMA controller.
    pub dma_channels: usize,
    /// Serve all DMA channels from one interrupt line.
    pub aggregated_irq: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            core_count: 2,
            timer_ticks_per_ms: 1000,
            memory_capacity: 4 << 20,
            dma_channels: 8,
            aggregated_irq: true,
        }
    }
}

impl PlatformConfig {
    /// Sets the core count.
    pub fn with_cores(mut self, core_count: usize) -> Self {
        self.core_count = core_count;
        self
    }

    /// Rejects settings no platform could run with.
    pub fn validate(&self) -> Result<(), PlatformError> {
        if self.core_count == 0 || self.core_count > MAX_CORES {
            return Err(PlatformError::InvalidConfig(format!(
                "core count {} outside 1..={MAX_CORES}",
                self.core_count
            )));
        }
        if self.timer_ticks_per_ms == 0 {
            return Err(PlatformError::InvalidConfig(
                "timer must tick at least once per millisecond".into(),
            ));
        }
        if self.memory_capacity == 0 {
            return Err(PlatformError::InvalidConfig("no memory".into()));
        }
        if self.dma_channels == 0 {
            return Err(PlatformError::InvalidConfig("no DMA channels".into()));
        }
        Ok(())
    }
}
