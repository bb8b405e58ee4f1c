//! Versioned fixed-header message framing with stream reassembly.
//!
//! Every message is framed with a 7-byte big-endian header:
//! - 1 byte protocol version (1 or 2)
//! - 1 byte sub-version, passed through untouched
//! - 1 byte body serialization tag (JSON, Protobuf, MessagePack)
//! - 4 byte body length, at most 1 MiB
//!
//! followed by the body. [`StreamDecoder`] recovers frame boundaries from an
//! arbitrarily chunked byte stream; [`BufferPool`] recycles the buffers used
//! for encoding and reassembly.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod pool;
pub mod reader;
pub mod stream;
pub mod sync;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{
    decode_frame, encode_frame, encode_frame_into, encode_frame_to, encode_frame_to_slice,
    is_supported_version, FrameHeader, Layout, CURRENT_PROTOCOL_VERSION, HEADER_LENGTH,
    MAX_MESSAGE_LENGTH, PROTOCOL_VERSION_V1, PROTOCOL_VERSION_V2, SUPPORTED_VERSIONS,
};
pub use config::{PoolConfig, StreamConfig, DEFAULT_MAX_BUFFER_SIZE};
pub use error::{ErrorCode, FrameError, Result};
pub use frame::{Frame, FrameOptions, FrameType};
pub use pool::{BufferPool, LARGE_BUFFER_SIZE, MEDIUM_BUFFER_SIZE, SMALL_BUFFER_SIZE};
pub use reader::FrameReader;
pub use stream::{DecoderPool, StreamDecoder, DEFAULT_MAX_IDLE_DECODERS};
pub use sync::SyncFrame;
pub use writer::FrameWriter;
