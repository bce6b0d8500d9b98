//! Lossy frame codec abstraction.
//!
//! The `FrameEncoder`/`FrameDecoder` traits are the seam between the
//! pipeline and the actual compression engine. `&mut self` expresses that
//! codecs are stateful: decoders rely on packet continuity and must be fed
//! packets produced by a matching encoder configuration.
//!
//! The default backend is the deterministic [`PassthroughEncoder`]/
//! [`PassthroughDecoder`] pair; the real Opus backend lives behind the
//! `codec-opus` feature.

pub mod passthrough;

#[cfg(feature = "codec-opus")]
pub mod opus;

#[cfg(feature = "codec-opus")]
pub use self::opus::{OpusFrameDecoder, OpusFrameEncoder};

pub use passthrough::{PassthroughDecoder, PassthroughEncoder};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Upper bound on one encoded frame. Matches the 4000-byte packet ceiling
/// libopus recommends for repacketizable output.
pub const MAX_ENCODED_FRAME_BYTES: usize = 4000;

/// Perceptual tuning requested from the encoder.
///
/// The two modes trade packet size against perceptual quality and are
/// mutually exclusive per encoder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecApplication {
    /// Optimize for intelligible low-bitrate speech (communication mode).
    Voice,
    /// Favor perceptual fidelity for music/stream mixes over packet size.
    Streaming,
}

/// Contract for lossy frame encoders.
///
/// Implementations assume a constant sample rate, frame duration, and
/// channel count for their lifetime.
pub trait FrameEncoder: Send + 'static {
    /// Encode one 16-bit PCM frame into `out`, returning the number of
    /// bytes written. Encoded length is codec-determined and unrelated to
    /// the frame length.
    ///
    /// # Errors
    /// Codec failures are surfaced unchanged as `VoiceLinkError::Codec`.
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize>;
}

/// Contract for lossy frame decoders.
pub trait FrameDecoder: Send + 'static {
    /// Decode one packet into `out`, returning the number of samples
    /// written across all channels.
    ///
    /// # Errors
    /// Malformed packets and configuration mismatches are surfaced
    /// unchanged as `VoiceLinkError::Codec`.
    fn decode(&mut self, packet: &[u8], out: &mut [i16]) -> Result<usize>;
}
