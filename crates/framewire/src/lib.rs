//! Versioned message framing for byte streams.
//!
//! framewire puts a 7-byte header (version, sub-version, body type, body
//! length) in front of every message and recovers message boundaries from
//! arbitrarily chunked input.
//!
//! # Crate Structure
//!
//! - [`frame`]: frame model, wire codec, stream reassembly and buffer pooling

/// Re-export frame types.
pub mod frame {
    pub use framewire_frame::*;
}
