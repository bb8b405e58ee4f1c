use crate::codec::{HEADER_LENGTH, MAX_MESSAGE_LENGTH};

/// Default upper bound on bytes a stream decoder may hold: one maximal frame.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = MAX_MESSAGE_LENGTH + HEADER_LENGTH;

/// Configuration for [`StreamDecoder`](crate::StreamDecoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Maximum number of pending bytes. `feed` rejects input beyond this. Default: 1 MiB + 7.
    pub max_buffer_size: usize,
    /// Capacity of a freshly created decoder buffer. Default: 1 KiB.
    pub initial_capacity: usize,
    /// Bytes requested per `read` call in `decode_from_reader`. Default: 1 KiB.
    pub read_chunk_size: usize,
    /// After a frame is extracted, a non-empty tail smaller than
    /// `capacity / reclaim_divisor` is moved into a right-sized buffer. Default: 4.
    pub reclaim_divisor: usize,
}

impl StreamConfig {
    /// Default configuration with a custom buffer cap. A cap of 0 keeps the default.
    pub fn with_max_buffer_size(max_buffer_size: usize) -> Self {
        if max_buffer_size == 0 {
            return Self::default();
        }
        Self {
            max_buffer_size,
            ..Self::default()
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            initial_capacity: 1024,
            read_chunk_size: 1024,
            reclaim_divisor: 4,
        }
    }
}

/// Configuration for [`BufferPool`](crate::BufferPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Idle buffers kept per size class; extra returns are dropped. Default: 64.
    pub max_retained_per_class: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_retained_per_class: 64,
        }
    }
}
