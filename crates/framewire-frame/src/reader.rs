use std::io::{ErrorKind, Read};
use std::sync::Arc;

use crate::config::StreamConfig;
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::pool::BufferPool;
use crate::stream::StreamDecoder;

/// Reads complete frames from any `Read` stream.
///
/// Partial reads are buffered internally; callers only ever see complete frames.
pub struct FrameReader<T> {
    inner: T,
    decoder: StreamDecoder,
    chunk: Vec<u8>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, StreamConfig::default(), Arc::new(BufferPool::new()))
    }

    /// Create a new frame reader with explicit configuration and buffer pool.
    pub fn with_config(inner: T, config: StreamConfig, pool: Arc<BufferPool>) -> Self {
        Self {
            inner,
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            decoder: StreamDecoder::with_config(config, pool),
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached,
    /// whether or not a partial frame was pending.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.decoder.try_decode()? {
                return Ok(frame);
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.decoder.feed(&self.chunk[..read])?;
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    ///
    /// Bytes still pending in the decoder are dropped.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Decoder holding bytes read but not yet returned as a frame.
    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }
}
