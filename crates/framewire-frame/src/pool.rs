//! Tiered pool of reusable byte buffers.
//!
//! Three size classes are kept: 2 KiB, 4 KiB and 8 KiB. A request is served
//! from the smallest class that fits; anything above 8 KiB is allocated
//! directly and never comes back into the pool. A returned buffer is
//! classified purely by its capacity, so a buffer whose capacity does not
//! exactly match a class is simply dropped.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::trace;

use crate::config::PoolConfig;

/// Small size class: 2 KiB.
pub const SMALL_BUFFER_SIZE: usize = 2 * 1024;
/// Medium size class: 4 KiB.
pub const MEDIUM_BUFFER_SIZE: usize = 4 * 1024;
/// Large size class: 8 KiB.
pub const LARGE_BUFFER_SIZE: usize = 8 * 1024;

/// Size classes in ascending order.
pub const SIZE_CLASSES: [usize; 3] = [SMALL_BUFFER_SIZE, MEDIUM_BUFFER_SIZE, LARGE_BUFFER_SIZE];

struct Tier {
    capacity: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl Tier {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: Mutex::new(Vec::new()),
        }
    }

    fn take(&self) -> Vec<u8> {
        let reused = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        reused.unwrap_or_else(|| Vec::with_capacity(self.capacity))
    }

    fn give(&self, mut buf: Vec<u8>, max_retained: usize) {
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < max_retained {
            free.push(buf);
        }
    }

    fn idle(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A size-classed free list of byte buffers, safe to share across threads.
///
/// The pool is an ordinary value: construct one per connection, per worker
/// or per process and hand it to encoders and decoders explicitly.
/// [`BufferPool::shared`] returns a lazily created process-wide handle for
/// callers that want a single pool.
pub struct BufferPool {
    tiers: [Tier; 3],
    config: PoolConfig,
}

impl BufferPool {
    /// Create an empty pool with default configuration.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty pool with explicit configuration.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            tiers: SIZE_CLASSES.map(Tier::new),
            config,
        }
    }

    /// Process-wide pool handle.
    pub fn shared() -> Arc<BufferPool> {
        static SHARED: OnceLock<Arc<BufferPool>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(BufferPool::new())))
    }

    /// Get an empty buffer whose capacity is at least `size`.
    ///
    /// Sizes above [`LARGE_BUFFER_SIZE`] bypass the pool and are allocated
    /// with exactly `size` bytes of capacity.
    pub fn get(&self, size: usize) -> Vec<u8> {
        match self.tier_for_size(size) {
            Some(tier) => tier.take(),
            None => {
                trace!(size, "oversized buffer request bypasses pool");
                Vec::with_capacity(size)
            }
        }
    }

    /// Return a buffer to the pool.
    ///
    /// Only buffers whose capacity exactly matches a size class are kept.
    pub fn put(&self, buf: Vec<u8>) {
        if let Some(tier) = self.tiers.iter().find(|t| t.capacity == buf.capacity()) {
            tier.give(buf, self.config.max_retained_per_class);
        }
    }

    /// True if `capacity` is exactly one of the pool's size classes.
    pub fn is_class_capacity(capacity: usize) -> bool {
        SIZE_CLASSES.contains(&capacity)
    }

    /// Number of idle buffers currently held for the class of `class_size`.
    ///
    /// Returns 0 for sizes that are not a size class.
    pub fn idle(&self, class_size: usize) -> usize {
        self.tiers
            .iter()
            .find(|t| t.capacity == class_size)
            .map_or(0, Tier::idle)
    }

    /// Active configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn tier_for_size(&self, size: usize) -> Option<&Tier> {
        self.tiers.iter().find(|t| size <= t.capacity)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("small_idle", &self.tiers[0].idle())
            .field("medium_idle", &self.tiers[1].idle())
            .field("large_idle", &self.tiers[2].idle())
            .field("config", &self.config)
            .finish()
    }
}
