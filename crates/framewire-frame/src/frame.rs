use std::fmt;
use std::io::Write;

use bytes::{Bytes, BytesMut};

use crate::codec::{self, is_supported_version, unsupported_version, CURRENT_PROTOCOL_VERSION};
use crate::error::{FrameError, Result};
use crate::pool::BufferPool;

/// Body serialization tag carried in the header.
///
/// The body itself is opaque to this crate; the tag is a hint for consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Json = 1,
    Protobuf = 2,
    MsgPack = 3,
}

impl FrameType {
    /// Every valid type tag.
    pub const ALL_TAGS: &'static [u8] = &[1, 2, 3];

    /// Human-readable name of the format.
    pub fn name(self) -> &'static str {
        match self {
            FrameType::Json => "JSON",
            FrameType::Protobuf => "Protobuf",
            FrameType::MsgPack => "MsgPack",
        }
    }
}

impl TryFrom<u8> for FrameType {
    type Error = FrameError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(FrameType::Json),
            2 => Ok(FrameType::Protobuf),
            3 => Ok(FrameType::MsgPack),
            other => Err(FrameError::InvalidFrameType {
                actual: other,
                supported: FrameType::ALL_TAGS,
            }),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(frame_type: FrameType) -> Self {
        frame_type as u8
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", *self as u8, self.name())
    }
}

/// Options applied when constructing a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    /// Protocol version. Default: [`CURRENT_PROTOCOL_VERSION`].
    pub version: u8,
    /// Minor format tag. Default: 0.
    pub sub_version: u8,
    /// Deep-copy the body on construction. Default: true.
    ///
    /// When false, the frame shares the caller's [`Bytes`] storage. `Bytes`
    /// is immutable and reference counted, so sharing is always sound; it
    /// only means the backing allocation lives as long as either holder.
    pub copy_body: bool,
}

impl FrameOptions {
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn sub_version(mut self, sub_version: u8) -> Self {
        self.sub_version = sub_version;
        self
    }

    pub fn copy_body(mut self, copy: bool) -> Self {
        self.copy_body = copy;
        self
    }

    /// Inverse of [`copy_body`](Self::copy_body).
    pub fn zero_copy(mut self, zero_copy: bool) -> Self {
        self.copy_body = !zero_copy;
        self
    }
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            version: CURRENT_PROTOCOL_VERSION,
            sub_version: 0,
            copy_body: true,
        }
    }
}

/// One protocol message: header fields plus an opaque body.
///
/// The body length is always derived from the body. A `Frame` is not
/// synchronized; wrap it in [`SyncFrame`](crate::SyncFrame) to share it
/// between threads for mutation.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame {
    version: u8,
    sub_version: u8,
    frame_type: FrameType,
    body: Bytes,
}

impl Frame {
    /// Create a frame with default options, copying `body`.
    pub fn new(frame_type: impl Into<u8>, body: &[u8]) -> Result<Self> {
        Self::with_options(
            frame_type,
            Bytes::copy_from_slice(body),
            FrameOptions::default().copy_body(false),
        )
    }

    /// Create a frame with explicit options.
    ///
    /// The type is validated first, then the version.
    pub fn with_options(
        frame_type: impl Into<u8>,
        body: impl Into<Bytes>,
        options: FrameOptions,
    ) -> Result<Self> {
        let frame_type = FrameType::try_from(frame_type.into())?;
        if !is_supported_version(options.version) {
            return Err(unsupported_version(options.version));
        }

        let body = body.into();
        let body = if options.copy_body {
            Bytes::copy_from_slice(&body)
        } else {
            body
        };

        Ok(Self::from_parts(
            options.version,
            options.sub_version,
            frame_type,
            body,
        ))
    }

    pub(crate) fn from_parts(
        version: u8,
        sub_version: u8,
        frame_type: FrameType,
        body: Bytes,
    ) -> Self {
        Self {
            version,
            sub_version,
            frame_type,
            body,
        }
    }

    /// Decode a frame from wire bytes. See [`codec::decode_frame`].
    pub fn decode(data: &[u8]) -> Result<Self> {
        codec::decode_frame(data)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn sub_version(&self) -> u8 {
        self.sub_version
    }

    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    /// Body length as carried in the header.
    pub fn body_length(&self) -> u32 {
        u32::try_from(self.body.len()).unwrap_or(u32::MAX)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as shared [`Bytes`].
    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Total encoded size (header + body).
    pub fn wire_size(&self) -> usize {
        codec::HEADER_LENGTH + self.body.len()
    }

    /// Set the protocol version.
    ///
    /// Not validated here; an unsupported version is reported by the next encode.
    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    pub fn set_sub_version(&mut self, sub_version: u8) {
        self.sub_version = sub_version;
    }

    /// Set the type tag. On error the frame is left unchanged.
    pub fn set_type(&mut self, frame_type: impl Into<u8>) -> Result<()> {
        self.frame_type = FrameType::try_from(frame_type.into())?;
        Ok(())
    }

    /// Replace the body. The body length follows automatically.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Encode into a new buffer, using `pool` for scratch space.
    pub fn encode(&self, pool: &BufferPool) -> Result<Vec<u8>> {
        codec::encode_frame(self, pool)
    }

    /// Write header then body to `w`, returning bytes written.
    pub fn encode_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<usize> {
        codec::encode_frame_to(self, w)
    }

    /// Encode into `buf` without allocating.
    pub fn encode_to_bytes(&self, buf: &mut [u8]) -> Result<usize> {
        codec::encode_frame_to_slice(self, buf)
    }

    /// Append the encoded frame to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<()> {
        codec::encode_frame_into(self, dst)
    }
}

/// Deep copy: the clone never shares body storage with the original.
impl Clone for Frame {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            sub_version: self.sub_version,
            frame_type: self.frame_type,
            body: Bytes::copy_from_slice(&self.body),
        }
    }
}

const DISPLAY_BODY_LIMIT: usize = 64;

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = String::from_utf8_lossy(&self.body);
        let preview: String = text.chars().take(DISPLAY_BODY_LIMIT).collect();
        let ellipsis = if text.chars().count() > DISPLAY_BODY_LIMIT {
            "..."
        } else {
            ""
        };
        write!(
            f,
            "Frame {{ version: {}, sub_version: {}, type: {}, body_length: {}, body: {:?}{} }}",
            self.version,
            self.sub_version,
            self.frame_type,
            self.body.len(),
            preview,
            ellipsis
        )
    }
}
