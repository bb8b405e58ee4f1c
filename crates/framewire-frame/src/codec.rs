use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::frame::{Frame, FrameType};
use crate::pool::BufferPool;

/// Frame header: version (1) + sub-version (1) + type (1) + body length (4) = 7 bytes.
pub const HEADER_LENGTH: usize = 7;

/// Maximum body length accepted or produced: 1 MiB.
pub const MAX_MESSAGE_LENGTH: usize = 1024 * 1024;

/// Initial protocol version.
pub const PROTOCOL_VERSION_V1: u8 = 1;

/// Second protocol version. Same layout as v1 today.
pub const PROTOCOL_VERSION_V2: u8 = 2;

/// Version stamped on new frames unless overridden.
pub const CURRENT_PROTOCOL_VERSION: u8 = PROTOCOL_VERSION_V1;

/// Every version this implementation can encode and decode.
pub const SUPPORTED_VERSIONS: &[u8] = &[PROTOCOL_VERSION_V1, PROTOCOL_VERSION_V2];

/// Returns true if `version` is in [`SUPPORTED_VERSIONS`].
pub fn is_supported_version(version: u8) -> bool {
    SUPPORTED_VERSIONS.contains(&version)
}

/// On-wire layout selected by the version byte.
///
/// Adding a version with a different layout means adding a variant here and
/// one arm in [`Layout::for_version`]; callers of [`decode_frame`] and the
/// encode functions do not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Fixed 7-byte big-endian header followed by the body.
    Base,
}

impl Layout {
    /// Resolve the layout for a version byte.
    pub fn for_version(version: u8) -> Result<Self> {
        match version {
            PROTOCOL_VERSION_V1 | PROTOCOL_VERSION_V2 => Ok(Layout::Base),
            other => Err(unsupported_version(other)),
        }
    }
}

/// Decoded frame header.
///
/// Wire format:
/// ```text
/// ┌─────────┬─────────────┬──────────┬──────────────┬──────────────────┐
/// │ Version │ Sub-version │ Type     │ Body length  │ Body             │
/// │ (1B)    │ (1B)        │ (1B)     │ (4B BE)      │ (length bytes)   │
/// └─────────┴─────────────┴──────────┴──────────────┴──────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub sub_version: u8,
    pub frame_type: u8,
    pub body_length: u32,
}

impl FrameHeader {
    /// Read a header from the first [`HEADER_LENGTH`] bytes of `buf`.
    ///
    /// Returns `None` if `buf` is too short. No field is validated.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LENGTH {
            return None;
        }
        Some(Self {
            version: buf[0],
            sub_version: buf[1],
            frame_type: buf[2],
            body_length: u32::from_be_bytes([buf[3], buf[4], buf[5], buf[6]]),
        })
    }

    /// Write the header into the first [`HEADER_LENGTH`] bytes of `buf`.
    pub fn write_to(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_LENGTH);
        buf[0] = self.version;
        buf[1] = self.sub_version;
        buf[2] = self.frame_type;
        buf[3..HEADER_LENGTH].copy_from_slice(&self.body_length.to_be_bytes());
    }

    /// Header bytes as an array.
    pub fn to_bytes(&self) -> [u8; HEADER_LENGTH] {
        let mut buf = [0u8; HEADER_LENGTH];
        self.write_to(&mut buf);
        buf
    }

    /// Total length of the frame this header describes.
    pub fn frame_length(&self) -> usize {
        HEADER_LENGTH + self.body_length as usize
    }
}

/// Validate a frame for encoding and return its header.
fn prepare(frame: &Frame) -> Result<(Layout, FrameHeader)> {
    let layout = Layout::for_version(frame.version())?;
    let body_len = frame.body().len();
    if body_len > MAX_MESSAGE_LENGTH {
        return Err(FrameError::MessageTooLong {
            size: body_len,
            max: MAX_MESSAGE_LENGTH,
        });
    }
    let header = FrameHeader {
        version: frame.version(),
        sub_version: frame.sub_version(),
        frame_type: frame.frame_type().into(),
        body_length: body_len as u32,
    };
    Ok((layout, header))
}

/// Encode a frame into a freshly allocated buffer, using `pool` for scratch space.
pub fn encode_frame(frame: &Frame, pool: &BufferPool) -> Result<Vec<u8>> {
    let (layout, header) = prepare(frame)?;
    let total = header.frame_length();

    let mut scratch = pool.get(total);
    match layout {
        Layout::Base => {
            scratch.extend_from_slice(&header.to_bytes());
            scratch.extend_from_slice(frame.body());
        }
    }

    let out = scratch[..total].to_vec();
    pool.put(scratch);
    Ok(out)
}

/// Append an encoded frame to `dst`.
pub fn encode_frame_into(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    let (layout, header) = prepare(frame)?;
    dst.reserve(header.frame_length());
    match layout {
        Layout::Base => {
            dst.put_slice(&header.to_bytes());
            dst.put_slice(frame.body());
        }
    }
    Ok(())
}

/// Write an encoded frame straight to `w`, returning bytes written.
///
/// Sink errors are returned as [`FrameError::Io`] with the original error.
pub fn encode_frame_to<W: Write + ?Sized>(frame: &Frame, w: &mut W) -> Result<usize> {
    let (layout, header) = prepare(frame)?;
    match layout {
        Layout::Base => {
            w.write_all(&header.to_bytes())?;
            w.write_all(frame.body())?;
        }
    }
    Ok(header.frame_length())
}

/// Encode into caller-provided storage without allocating.
pub fn encode_frame_to_slice(frame: &Frame, buf: &mut [u8]) -> Result<usize> {
    let (layout, header) = prepare(frame)?;
    let total = header.frame_length();
    if buf.len() < total {
        return Err(FrameError::BufferTooSmall {
            needed: total,
            available: buf.len(),
        });
    }
    match layout {
        Layout::Base => {
            header.write_to(buf);
            buf[HEADER_LENGTH..total].copy_from_slice(frame.body());
        }
    }
    Ok(total)
}

/// Decode one frame from the start of `data`.
///
/// Trailing bytes after the frame are ignored. The body is always copied out
/// of `data`.
pub fn decode_frame(data: &[u8]) -> Result<Frame> {
    let Some(header) = FrameHeader::parse(data) else {
        return Err(FrameError::invalid_frame(format!(
            "data length {} is less than header length {HEADER_LENGTH}",
            data.len()
        )));
    };

    match Layout::for_version(header.version)? {
        Layout::Base => decode_base(header, data),
    }
}

fn decode_base(header: FrameHeader, data: &[u8]) -> Result<Frame> {
    let expected = header.frame_length();
    if data.len() < expected {
        return Err(FrameError::invalid_frame(format!(
            "data length {} is less than expected {expected} (header + body)",
            data.len()
        )));
    }

    let frame_type = FrameType::try_from(header.frame_type)?;
    let body = Bytes::copy_from_slice(&data[HEADER_LENGTH..expected]);

    Ok(Frame::from_parts(
        header.version,
        header.sub_version,
        frame_type,
        body,
    ))
}

pub(crate) fn unsupported_version(version: u8) -> FrameError {
    FrameError::UnsupportedVersion {
        actual: version,
        supported: SUPPORTED_VERSIONS,
    }
}
