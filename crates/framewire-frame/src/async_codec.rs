//! `tokio_util::codec` adapter, for use with `Framed`, `FramedRead` and `FramedWrite`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::codec::{
    decode_frame, is_supported_version, unsupported_version, FrameHeader, MAX_MESSAGE_LENGTH,
};
use crate::error::{FrameError, Result};
use crate::frame::Frame;

/// Frame codec over `BytesMut`.
///
/// Decoding applies the same early header checks as
/// [`StreamDecoder::try_decode`](crate::StreamDecoder::try_decode): an
/// unsupported version or an oversized declared length is rejected before
/// the body is buffered.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        let Some(header) = FrameHeader::parse(&src[..]) else {
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
        if src.len() < frame_length {
            src.reserve(frame_length - src.len());
            return Ok(None);
        }

        let raw = src.split_to(frame_length);
        let frame = decode_frame(&raw)?;
        trace!(
            frame_type = %frame.frame_type(),
            body_length = frame.body_length(),
            "decoded frame from async stream"
        );
        Ok(Some(frame))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        frame.encode_into(dst)
    }
}

impl Encoder<&Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: &Frame, dst: &mut BytesMut) -> Result<()> {
        frame.encode_into(dst)
    }
}
