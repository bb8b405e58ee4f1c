use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;

use crate::error::Result;
use crate::frame::{Frame, FrameOptions, FrameType};
use crate::pool::BufferPool;

/// A [`Frame`] behind a read/write lock, shareable across threads.
///
/// Reads return owned copies; no caller ever holds a reference into the
/// wrapped frame outside of [`with_shared`](Self::with_shared) and
/// [`with_exclusive`](Self::with_exclusive).
pub struct SyncFrame {
    inner: RwLock<Frame>,
}

impl SyncFrame {
    /// Construct and wrap a new frame. See [`Frame::with_options`].
    pub fn new(
        frame_type: impl Into<u8>,
        body: impl Into<Bytes>,
        options: FrameOptions,
    ) -> Result<Self> {
        Frame::with_options(frame_type, body, options).map(Self::from)
    }

    /// Decode wire bytes into a new wrapper.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Frame::decode(data).map(Self::from)
    }

    fn read(&self) -> RwLockReadGuard<'_, Frame> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Frame> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the body.
    pub fn body(&self) -> Vec<u8> {
        self.read().body().to_vec()
    }

    pub fn frame_type(&self) -> FrameType {
        self.read().frame_type()
    }

    pub fn version(&self) -> u8 {
        self.read().version()
    }

    pub fn sub_version(&self) -> u8 {
        self.read().sub_version()
    }

    pub fn body_length(&self) -> u32 {
        self.read().body_length()
    }

    pub fn set_body(&self, body: impl Into<Bytes>) {
        let body = body.into();
        self.write().set_body(body);
    }

    /// Set the type tag. On error the frame is left unchanged.
    pub fn set_type(&self, frame_type: impl Into<u8>) -> Result<()> {
        self.write().set_type(frame_type)
    }

    pub fn set_version(&self, version: u8) {
        self.write().set_version(version);
    }

    pub fn set_sub_version(&self, sub_version: u8) {
        self.write().set_sub_version(sub_version);
    }

    /// Encode a snapshot of the frame.
    ///
    /// The lock is held only while the fields are copied; validation and
    /// encoding run without it.
    pub fn encode(&self, pool: &BufferPool) -> Result<Vec<u8>> {
        let snapshot = self.snapshot();
        snapshot.encode(pool)
    }

    /// Deep copy of the wrapped frame.
    pub fn snapshot(&self) -> Frame {
        self.read().clone()
    }

    /// Run `f` with exclusive access for compound updates.
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut Frame) -> R) -> R {
        f(&mut *self.write())
    }

    /// Run `f` with shared access for compound reads.
    pub fn with_shared<R>(&self, f: impl FnOnce(&Frame) -> R) -> R {
        f(&*self.read())
    }

    pub fn into_inner(self) -> Frame {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Frame> for SyncFrame {
    fn from(frame: Frame) -> Self {
        Self {
            inner: RwLock::new(frame),
        }
    }
}

/// Deep copy with its own lock.
impl Clone for SyncFrame {
    fn clone(&self) -> Self {
        Self::from(self.snapshot())
    }
}

impl std::fmt::Debug for SyncFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SyncFrame").field(&*self.read()).finish()
    }
}
