//! Incremental frame reassembly over a byte stream.
//!
//! A [`StreamDecoder`] accepts arbitrary chunks via [`feed`](StreamDecoder::feed)
//! and hands back complete frames via [`try_decode`](StreamDecoder::try_decode),
//! keeping any trailing partial frame for the next call. Whether it is waiting
//! for a header, waiting for a body, or holding a ready frame is implied by the
//! number of pending bytes; no separate state is tracked.
//!
//! "Not enough data yet" is `Ok(None)`, never an error, so a caller can loop
//! `feed` + `try_decode` on a live connection without treating a slow peer as
//! a protocol violation.

use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace, warn};

use crate::codec::{decode_frame, is_supported_version, unsupported_version, FrameHeader};
use crate::codec::MAX_MESSAGE_LENGTH;
use crate::config::StreamConfig;
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::pool::{BufferPool, SMALL_BUFFER_SIZE};

/// Reassembles frames from a byte stream.
///
/// Intended for one logical connection; all mutating methods take `&mut self`.
pub struct StreamDecoder {
    buf: Vec<u8>,
    /// Start of unconsumed bytes within `buf`.
    start: usize,
    config: StreamConfig,
    pool: Arc<BufferPool>,
}

enum ReadStep {
    Frame(Frame),
    NeedMore,
    Eof,
}

impl StreamDecoder {
    /// Create a decoder with default configuration and its own buffer pool.
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default(), Arc::new(BufferPool::new()))
    }

    /// Create a decoder with a custom buffer cap and its own buffer pool.
    pub fn with_max_buffer_size(max_buffer_size: usize) -> Self {
        Self::with_config(
            StreamConfig::with_max_buffer_size(max_buffer_size),
            Arc::new(BufferPool::new()),
        )
    }

    /// Create a decoder with explicit configuration, drawing storage from `pool`.
    pub fn with_config(config: StreamConfig, pool: Arc<BufferPool>) -> Self {
        Self {
            buf: Vec::with_capacity(config.initial_capacity),
            start: 0,
            config,
            pool,
        }
    }

    /// Append a chunk of stream data.
    ///
    /// Fails with [`FrameError::MessageTooLong`] if the pending data would
    /// exceed the configured maximum; in that case nothing is appended.
    pub fn feed(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let pending = self.buffered();
        let needed = pending + data.len();
        if needed > self.config.max_buffer_size {
            warn!(
                pending,
                incoming = data.len(),
                max = self.config.max_buffer_size,
                "rejecting stream data over buffer limit"
            );
            return Err(FrameError::MessageTooLong {
                size: needed,
                max: self.config.max_buffer_size,
            });
        }

        if self.buf.capacity() - self.buf.len() < data.len() {
            self.grow(needed);
        }

        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn grow(&mut self, needed: usize) {
        let new_cap = (self.capacity() * 2)
            .max(needed)
            .min(self.config.max_buffer_size);

        let mut next = self.pool.get(new_cap);
        next.extend_from_slice(&self.buf[self.start..]);
        debug!(
            from = self.capacity(),
            to = next.capacity(),
            pending = next.len(),
            "growing stream buffer"
        );

        let old = std::mem::replace(&mut self.buf, next);
        self.start = 0;
        self.pool.put(old);
    }

    /// Extract the next complete frame, if one is buffered.
    ///
    /// Returns `Ok(None)` while the header or body is incomplete. The header
    /// version and declared body length are checked as soon as the header is
    /// available, so a hostile header is rejected before more data is buffered.
    ///
    /// A frame whose header is acceptable but whose contents fail to decode is
    /// consumed before the error is returned; the next call continues with the
    /// following frame.
    pub fn try_decode(&mut self) -> Result<Option<Frame>> {
        let Some(header) = FrameHeader::parse(self.pending()) else {
            return Ok(None);
        };

        if !is_supported_version(header.version) {
            return Err(unsupported_version(header.version));
        }

        let body_length = header.body_length as usize;
        if body_length > MAX_MESSAGE_LENGTH {
            return Err(FrameError::MessageTooLong {
                size: body_length,
                max: MAX_MESSAGE_LENGTH,
            });
        }

        let frame_length = header.frame_length();
        if self.buffered() < frame_length {
            return Ok(None);
        }

        let end = self.start + frame_length;
        let decoded = decode_frame(&self.buf[self.start..end]);
        self.consume(frame_length);

        let frame = decoded?;
        trace!(
            version = frame.version(),
            frame_type = %frame.frame_type(),
            body_length = frame.body_length(),
            "decoded frame from stream"
        );
        Ok(Some(frame))
    }

    fn consume(&mut self, n: usize) {
        let capacity = self.capacity();
        let remaining = self.buffered() - n;

        if remaining == 0 {
            self.buf.clear();
            self.start = 0;
        } else if remaining < capacity / self.config.reclaim_divisor.max(1) {
            let mut tail = Vec::with_capacity(remaining);
            tail.extend_from_slice(&self.buf[self.start + n..]);
            debug!(remaining, capacity, "reclaiming stream buffer");
            let old = std::mem::replace(&mut self.buf, tail);
            self.start = 0;
            self.pool.put(old);
        } else {
            self.start += n;
        }
    }

    /// Decode one frame, reading a single chunk from `reader` if nothing is buffered.
    ///
    /// Returns [`FrameError::EndOfStream`] only if `reader` is exhausted and no
    /// bytes are pending. If it is exhausted with a partial frame pending, the
    /// result is `Ok(None)`.
    pub fn decode_from_reader<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<Frame>> {
        match self.read_step(reader)? {
            ReadStep::Frame(frame) => Ok(Some(frame)),
            ReadStep::NeedMore => Ok(None),
            ReadStep::Eof if self.is_empty() => Err(FrameError::EndOfStream),
            ReadStep::Eof => Ok(None),
        }
    }

    fn read_step<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<ReadStep> {
        if let Some(frame) = self.try_decode()? {
            return Ok(ReadStep::Frame(frame));
        }

        let mut chunk = self.pool.get(self.config.read_chunk_size);
        chunk.resize(self.config.read_chunk_size, 0);

        let read = loop {
            match reader.read(&mut chunk) {
                Ok(n) => break Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => break Err(FrameError::Io(err)),
            }
        };

        let step = match read {
            Ok(0) => Ok(ReadStep::Eof),
            Ok(n) => self.feed_and_decode(&chunk[..n]),
            Err(err) => Err(err),
        };

        self.pool.put(chunk);
        step
    }

    fn feed_and_decode(&mut self, data: &[u8]) -> Result<ReadStep> {
        self.feed(data)?;
        Ok(match self.try_decode()? {
            Some(frame) => ReadStep::Frame(frame),
            None => ReadStep::NeedMore,
        })
    }

    /// Decode every frame from `reader` until it is exhausted, pushing them into `frames`.
    ///
    /// Returns the number of frames added. On error, frames decoded before the
    /// failure remain in `frames`. If the stream ends inside a frame, the
    /// partial bytes stay pending and the call still succeeds.
    pub fn read_frames_from_stream<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
        frames: &mut Vec<Frame>,
    ) -> Result<usize> {
        let before = frames.len();
        loop {
            match self.read_step(reader)? {
                ReadStep::Frame(frame) => frames.push(frame),
                ReadStep::NeedMore => {}
                ReadStep::Eof => {
                    if !self.is_empty() {
                        warn!(
                            pending = self.buffered(),
                            "stream ended with an incomplete frame"
                        );
                    }
                    return Ok(frames.len() - before);
                }
            }
        }
    }

    /// Discard pending data and start over on a small buffer.
    pub fn reset(&mut self) {
        let old = std::mem::replace(&mut self.buf, self.pool.get(SMALL_BUFFER_SIZE));
        self.start = 0;
        self.pool.put(old);
    }

    /// Reset and hand this decoder back to `pool` for reuse.
    pub fn release(self, pool: &DecoderPool) {
        pool.release(self);
    }

    /// Number of pending bytes.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.start
    }

    /// Usable capacity from the current read position.
    pub fn capacity(&self) -> usize {
        self.buf.capacity() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.buffered() == 0
    }

    /// Borrowed view of pending bytes.
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    /// Owned copy of pending bytes.
    pub fn peek(&self) -> Vec<u8> {
        self.pending().to_vec()
    }

    /// Write pending bytes to `w` without consuming them.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize> {
        let pending = self.pending();
        w.write_all(pending)?;
        Ok(pending.len())
    }

    pub fn max_buffer_size(&self) -> usize {
        self.config.max_buffer_size
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Shared buffer pool backing this decoder.
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StreamDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("buffered", &self.buffered())
            .field("capacity", &self.capacity())
            .field("max_buffer_size", &self.config.max_buffer_size)
            .finish()
    }
}

/// Idle decoders a [`DecoderPool`] keeps by default.
pub const DEFAULT_MAX_IDLE_DECODERS: usize = 64;

/// A reuse pool of [`StreamDecoder`] instances sharing one [`BufferPool`].
///
/// Released decoders are reset onto a small buffer, so an idle decoder never
/// pins storage it grew while in use.
pub struct DecoderPool {
    idle: Mutex<Vec<StreamDecoder>>,
    config: StreamConfig,
    buffers: Arc<BufferPool>,
    max_idle: usize,
}

impl DecoderPool {
    /// Create a pool whose decoders use `config` and draw storage from `buffers`.
    pub fn new(config: StreamConfig, buffers: Arc<BufferPool>) -> Self {
        Self::with_max_idle(config, buffers, DEFAULT_MAX_IDLE_DECODERS)
    }

    /// Like [`new`](Self::new), keeping at most `max_idle` released decoders.
    pub fn with_max_idle(config: StreamConfig, buffers: Arc<BufferPool>, max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            config,
            buffers,
            max_idle,
        }
    }

    /// Take a decoder with the pool's configuration.
    pub fn acquire(&self) -> StreamDecoder {
        self.acquire_with_max(self.config.max_buffer_size)
    }

    /// Take a decoder with a specific buffer cap. A cap of 0 keeps the pool's default.
    pub fn acquire_with_max(&self, max_buffer_size: usize) -> StreamDecoder {
        let max_buffer_size = if max_buffer_size == 0 {
            self.config.max_buffer_size
        } else {
            max_buffer_size
        };
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        match reused {
            Some(mut decoder) => {
                debug!("reusing pooled stream decoder");
                decoder.config.max_buffer_size = max_buffer_size;
                decoder
            }
            None => StreamDecoder::with_config(
                StreamConfig {
                    max_buffer_size,
                    ..self.config
                },
                Arc::clone(&self.buffers),
            ),
        }
    }

    /// Reset `decoder` and keep it for a later [`acquire`](Self::acquire).
    ///
    /// The decoder is rebound to this pool's buffers and configuration,
    /// whichever pool it was built on.
    pub fn release(&self, mut decoder: StreamDecoder) {
        if !Arc::ptr_eq(&decoder.pool, &self.buffers) {
            let old = std::mem::take(&mut decoder.buf);
            decoder.pool.put(old);
            decoder.start = 0;
            decoder.pool = Arc::clone(&self.buffers);
        }
        decoder.reset();
        decoder.config = self.config;
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(decoder);
        }
    }

    /// Number of idle decoders held.
    pub fn idle(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for DecoderPool {
    fn default() -> Self {
        Self::new(StreamConfig::default(), BufferPool::shared())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{HEADER_LENGTH, PROTOCOL_VERSION_V2};
    use crate::config::DEFAULT_MAX_BUFFER_SIZE;
    use crate::frame::{FrameOptions, FrameType};
    use crate::pool::MEDIUM_BUFFER_SIZE;

    fn wire(frame_type: FrameType, body: &[u8]) -> Vec<u8> {
        Frame::new(frame_type, body)
            .unwrap()
            .encode(&BufferPool::new())
            .unwrap()
    }

    #[test]
    fn partial_hello_then_rest() {
        let mut decoder = StreamDecoder::new();
        decoder
            .feed(&[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x68])
            .unwrap();
        assert!(decoder.try_decode().unwrap().is_none());
        assert_eq!(decoder.buffered(), 8);

        decoder.feed(&[0x65, 0x6c, 0x6c, 0x6f]).unwrap();
        let frame = decoder.try_decode().unwrap().unwrap();
        assert_eq!(frame.body(), b"hello");
        assert_eq!(frame.frame_type(), FrameType::Json);
        assert!(decoder.is_empty());
    }

    #[test]
    fn short_input_never_errors() {
        let mut decoder = StreamDecoder::new();
        for byte in [0xFFu8; HEADER_LENGTH - 1] {
            decoder.feed(&[byte]).unwrap();
            assert!(decoder.try_decode().unwrap().is_none());
        }
        assert!(decoder.try_decode().unwrap().is_none());
    }

    #[test]
    fn multiple_frames_in_one_chunk_come_out_in_order() {
        let mut stream = Vec::new();
        for i in 0..5u8 {
            stream.extend(wire(FrameType::Json, &[i; 3]));
        }

        let mut decoder = StreamDecoder::new();
        decoder.feed(&stream).unwrap();
        for i in 0..5u8 {
            let frame = decoder.try_decode().unwrap().unwrap();
            assert_eq!(frame.body(), &[i; 3]);
        }
        assert!(decoder.try_decode().unwrap().is_none());
        assert!(decoder.is_empty());
    }

    #[test]
    fn any_chunking_yields_same_frames() {
        let bodies: Vec<Vec<u8>> = (0..12usize)
            .map(|i| (0..(i * 37) % 300).map(|b| (b + i) as u8).collect())
            .collect();
        let mut stream = Vec::new();
        for (i, body) in bodies.iter().enumerate() {
            let opts = FrameOptions::default()
                .version(if i % 2 == 0 { 1 } else { PROTOCOL_VERSION_V2 })
                .sub_version(i as u8);
            let frame =
                Frame::with_options(FrameType::MsgPack, body.clone(), opts).unwrap();
            stream.extend(frame.encode(&BufferPool::new()).unwrap());
        }

        for chunk_size in [1, 2, 3, 6, 7, 8, 13, 64, 1000, stream.len()] {
            let mut decoder = StreamDecoder::new();
            let mut decoded = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                decoder.feed(chunk).unwrap();
                while let Some(frame) = decoder.try_decode().unwrap() {
                    decoded.push(frame);
                }
            }
            assert_eq!(decoded.len(), bodies.len(), "chunk size {chunk_size}");
            for (i, frame) in decoded.iter().enumerate() {
                assert_eq!(frame.body(), bodies[i].as_slice());
                assert_eq!(frame.sub_version(), i as u8);
            }
            assert!(decoder.is_empty());
        }
    }

    #[test]
    fn feed_over_limit_is_rejected_without_mutation() {
        let mut decoder = StreamDecoder::with_max_buffer_size(10);
        decoder.feed(&[1, 0, 1, 0]).unwrap();
        let err = decoder.feed(&[0; 7]).unwrap_err();
        assert!(matches!(err, FrameError::MessageTooLong { size: 11, max: 10 }));
        assert_eq!(decoder.peek(), vec![1, 0, 1, 0]);
    }

    #[test]
    fn empty_feed_is_noop() {
        let mut decoder = StreamDecoder::with_max_buffer_size(0);
        decoder.feed(&[]).unwrap();
        assert!(decoder.is_empty());
    }

    #[test]
    fn unsupported_version_in_header_is_rejected_early() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(&[99, 0, 1, 0, 0, 0, 100]).unwrap();
        let err = decoder.try_decode().unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedVersion { actual: 99, .. }));
    }

    #[test]
    fn oversized_declared_length_is_rejected_early() {
        let mut decoder = StreamDecoder::new();
        let len = (MAX_MESSAGE_LENGTH as u32 + 1).to_be_bytes();
        decoder
            .feed(&[1, 0, 1, len[0], len[1], len[2], len[3]])
            .unwrap();
        let err = decoder.try_decode().unwrap_err();
        assert!(matches!(err, FrameError::MessageTooLong { .. }));
    }

    #[test]
    fn bad_type_frame_is_skipped() {
        let mut bad = wire(FrameType::Json, b"bad");
        bad[2] = 77;
        let mut stream = bad;
        stream.extend(wire(FrameType::Protobuf, b"good"));

        let mut decoder = StreamDecoder::new();
        decoder.feed(&stream).unwrap();
        let err = decoder.try_decode().unwrap_err();
        assert!(matches!(err, FrameError::InvalidFrameType { actual: 77, .. }));
        let frame = decoder.try_decode().unwrap().unwrap();
        assert_eq!(frame.body(), b"good");
    }

    #[test]
    fn growth_draws_from_pool_classes() {
        let pool = Arc::new(BufferPool::new());
        let mut decoder =
            StreamDecoder::with_config(StreamConfig::default(), Arc::clone(&pool));
        assert_eq!(decoder.capacity(), 1024);

        decoder.feed(&[1u8; 1500]).unwrap();
        assert_eq!(decoder.capacity(), SMALL_BUFFER_SIZE);

        decoder.feed(&[1u8; 1000]).unwrap();
        assert_eq!(decoder.capacity(), MEDIUM_BUFFER_SIZE);
        // The outgrown small buffer went back to the pool.
        assert_eq!(pool.idle(SMALL_BUFFER_SIZE), 1);
    }

    #[test]
    fn growth_is_capped_at_max_buffer_size() {
        let mut decoder = StreamDecoder::with_max_buffer_size(1500);
        decoder.feed(&[1u8; 1200]).unwrap();
        assert!(decoder.capacity() >= 1200);
        decoder.feed(&[1u8; 300]).unwrap();
        assert_eq!(decoder.buffered(), 1500);
    }

    #[test]
    fn small_tail_is_reclaimed_into_fresh_buffer() {
        let big = wire(FrameType::Json, &[7u8; 3000]);
        let small = wire(FrameType::Json, b"x");
        let mut stream = big;
        stream.extend_from_slice(&small[..4]);

        let mut decoder = StreamDecoder::new();
        decoder.feed(&stream).unwrap();
        let before = decoder.capacity();
        assert!(before >= 3000);

        decoder.try_decode().unwrap().unwrap();
        assert_eq!(decoder.buffered(), 4);
        assert_eq!(decoder.capacity(), 4);

        decoder.feed(&small[4..]).unwrap();
        assert_eq!(decoder.try_decode().unwrap().unwrap().body(), b"x");
    }

    #[test]
    fn large_tail_advances_in_place() {
        let first = wire(FrameType::Json, b"ab");
        let second = wire(FrameType::Json, &[9u8; 600]);
        let mut stream = first.clone();
        stream.extend_from_slice(&second);

        let mut decoder = StreamDecoder::new();
        decoder.feed(&stream).unwrap();
        let ptr = decoder.pending().as_ptr();
        decoder.try_decode().unwrap().unwrap();
        assert_eq!(decoder.pending().as_ptr(), ptr.wrapping_add(first.len()));
        assert_eq!(decoder.try_decode().unwrap().unwrap().body(), &[9u8; 600][..]);
    }

    #[test]
    fn peek_is_a_copy() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(b"\x01\x00").unwrap();
        let mut copy = decoder.peek();
        copy[0] = 0xFF;
        assert_eq!(decoder.pending(), b"\x01\x00");
    }

    #[test]
    fn reset_discards_pending() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(&[1, 0, 1, 0, 0]).unwrap();
        decoder.reset();
        assert!(decoder.is_empty());
        assert_eq!(decoder.capacity(), SMALL_BUFFER_SIZE);
        decoder.feed(&wire(FrameType::Json, b"again")).unwrap();
        assert_eq!(decoder.try_decode().unwrap().unwrap().body(), b"again");
    }

    #[test]
    fn write_to_copies_pending_bytes() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(b"abc").unwrap();
        let mut out = Vec::new();
        assert_eq!(decoder.write_to(&mut out).unwrap(), 3);
        assert_eq!(out, b"abc");
        assert_eq!(decoder.buffered(), 3);
    }

    #[test]
    fn decode_from_reader_reads_when_needed() {
        let mut stream = wire(FrameType::Json, b"one");
        stream.extend(wire(FrameType::Json, b"two"));
        let mut reader = Cursor::new(stream);

        let mut decoder = StreamDecoder::new();
        let first = decoder.decode_from_reader(&mut reader).unwrap().unwrap();
        assert_eq!(first.body(), b"one");
        // Second frame is already buffered; no read needed.
        let second = decoder.decode_from_reader(&mut reader).unwrap().unwrap();
        assert_eq!(second.body(), b"two");

        let err = decoder.decode_from_reader(&mut reader).unwrap_err();
        assert!(matches!(err, FrameError::EndOfStream));
    }

    #[test]
    fn decode_from_reader_partial_at_eof_is_not_an_error() {
        let stream = wire(FrameType::Json, b"truncated");
        let mut reader = Cursor::new(stream[..10].to_vec());

        let mut decoder = StreamDecoder::new();
        assert!(decoder.decode_from_reader(&mut reader).unwrap().is_none());
        assert!(decoder.decode_from_reader(&mut reader).unwrap().is_none());
        assert_eq!(decoder.buffered(), 10);
    }

    #[test]
    fn decode_from_reader_retries_interrupted() {
        let mut reader = InterruptedThenData {
            interrupted: false,
            data: Cursor::new(wire(FrameType::Json, b"ok")),
        };
        let mut decoder = StreamDecoder::new();
        let frame = decoder.decode_from_reader(&mut reader).unwrap().unwrap();
        assert_eq!(frame.body(), b"ok");
    }

    #[test]
    fn decode_from_reader_propagates_io_error() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(ErrorKind::ConnectionReset))
            }
        }

        let mut decoder = StreamDecoder::new();
        let err = decoder.decode_from_reader(&mut Failing).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::ConnectionReset));
    }

    #[test]
    fn read_frames_from_stream_drains_source() {
        let mut stream = Vec::new();
        for i in 0..20u8 {
            stream.extend(wire(FrameType::Protobuf, &vec![i; i as usize * 50]));
        }
        let mut reader = ByteByByteReader {
            bytes: stream,
            pos: 0,
        };

        let mut decoder = StreamDecoder::new();
        let mut frames = Vec::new();
        let n = decoder
            .read_frames_from_stream(&mut reader, &mut frames)
            .unwrap();
        assert_eq!(n, 20);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.body(), vec![i as u8; i * 50].as_slice());
        }
        assert!(decoder.is_empty());
    }

    #[test]
    fn read_frames_from_stream_keeps_frames_before_error() {
        let mut stream = wire(FrameType::Json, b"first");
        stream.extend(wire(FrameType::Json, b"second"));
        stream.extend_from_slice(&[42, 0, 1, 0, 0, 0, 1, 0]);
        let mut reader = Cursor::new(stream);

        let mut decoder = StreamDecoder::new();
        let mut frames = Vec::new();
        let err = decoder
            .read_frames_from_stream(&mut reader, &mut frames)
            .unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedVersion { actual: 42, .. }));
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].body(), b"second");
    }

    #[test]
    fn read_frames_from_stream_stops_on_trailing_partial() {
        let mut stream = wire(FrameType::Json, b"whole");
        let partial = wire(FrameType::Json, b"partial");
        stream.extend_from_slice(&partial[..9]);
        let mut reader = Cursor::new(stream);

        let mut decoder = StreamDecoder::new();
        let mut frames = Vec::new();
        let n = decoder
            .read_frames_from_stream(&mut reader, &mut frames)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(decoder.peek(), partial[..9].to_vec());
    }

    #[test]
    fn read_frames_from_empty_stream() {
        let mut decoder = StreamDecoder::new();
        let mut frames = Vec::new();
        let n = decoder
            .read_frames_from_stream(&mut Cursor::new(Vec::<u8>::new()), &mut frames)
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn decoder_pool_reuses_instances() {
        let pool = DecoderPool::new(StreamConfig::default(), Arc::new(BufferPool::new()));
        let mut decoder = pool.acquire_with_max(64);
        assert_eq!(decoder.max_buffer_size(), 64);
        decoder.feed(b"leftover").unwrap();
        decoder.release(&pool);
        assert_eq!(pool.idle(), 1);

        let decoder = pool.acquire();
        assert!(decoder.is_empty());
        assert_eq!(
            decoder.max_buffer_size(),
            StreamConfig::default().max_buffer_size
        );
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn released_decoder_drops_grown_storage() {
        let pool = DecoderPool::new(StreamConfig::default(), Arc::new(BufferPool::new()));
        let mut decoder = pool.acquire();
        decoder.feed(&vec![0u8; 512 * 1024]).unwrap();
        assert!(decoder.capacity() >= 512 * 1024);
        decoder.release(&pool);

        let decoder = pool.acquire();
        assert!(decoder.is_empty());
        assert!(decoder.capacity() <= SMALL_BUFFER_SIZE);
    }

    #[test]
    fn zero_buffer_cap_means_default() {
        let pool = DecoderPool::new(StreamConfig::default(), Arc::new(BufferPool::new()));
        let mut decoder = pool.acquire_with_max(0);
        assert_eq!(decoder.max_buffer_size(), DEFAULT_MAX_BUFFER_SIZE);
        decoder.feed(&wire(FrameType::Json, b"{}")).unwrap();
        assert_eq!(decoder.try_decode().unwrap().unwrap().body(), b"{}");

        decoder.release(&pool);
        let reused = pool.acquire_with_max(0);
        assert_eq!(reused.max_buffer_size(), DEFAULT_MAX_BUFFER_SIZE);

        let mut standalone = StreamDecoder::with_max_buffer_size(0);
        assert_eq!(standalone.max_buffer_size(), DEFAULT_MAX_BUFFER_SIZE);
        standalone.feed(&[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]).unwrap();
        assert!(standalone.try_decode().unwrap().is_some());
    }

    #[test]
    fn decoder_pool_honours_idle_cap() {
        let pool = DecoderPool::with_max_idle(
            StreamConfig::default(),
            Arc::new(BufferPool::new()),
            1,
        );
        let first = pool.acquire();
        let second = pool.acquire();
        first.release(&pool);
        second.release(&pool);
        assert_eq!(pool.idle(), 1);

        let default_pool = DecoderPool::default();
        for decoder in (0..DEFAULT_MAX_IDLE_DECODERS + 2)
            .map(|_| default_pool.acquire())
            .collect::<Vec<_>>()
        {
            decoder.release(&default_pool);
        }
        assert_eq!(default_pool.idle(), DEFAULT_MAX_IDLE_DECODERS);
    }

    #[test]
    fn release_rebinds_foreign_decoder_to_pool_buffers() {
        let buffers = Arc::new(BufferPool::new());
        let pool = DecoderPool::new(StreamConfig::default(), Arc::clone(&buffers));

        let foreign_buffers = Arc::new(BufferPool::new());
        let mut foreign = StreamDecoder::with_config(
            StreamConfig::with_max_buffer_size(32),
            Arc::clone(&foreign_buffers),
        );
        foreign.feed(b"pending").unwrap();
        foreign.release(&pool);

        let decoder = pool.acquire();
        assert!(Arc::ptr_eq(decoder.pool(), &buffers));
        assert!(decoder.is_empty());
        assert_eq!(decoder.max_buffer_size(), DEFAULT_MAX_BUFFER_SIZE);
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        data: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.read(buf)
        }
    }
}
