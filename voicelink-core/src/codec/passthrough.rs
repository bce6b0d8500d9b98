//! Deterministic passthrough codec — packets are raw little-endian PCM.
//!
//! Used as the default backend when `codec-opus` is disabled, and by the
//! integration tests: encode → decode is a bit-exact identity, so pipeline
//! stage ordering can be asserted without a native codec toolchain.

use tracing::debug;

use crate::codec::{FrameDecoder, FrameEncoder};
use crate::convert;
use crate::error::{Result, VoiceLinkError};

/// Encoder that packs PCM samples straight into the packet buffer.
#[derive(Debug, Default)]
pub struct PassthroughEncoder;

impl PassthroughEncoder {
    pub fn new() -> Self {
        debug!("passthrough encoder — packets are uncompressed PCM");
        Self
    }
}

impl FrameEncoder for PassthroughEncoder {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize> {
        let bytes = pcm.len() * 2;
        if out.len() < bytes {
            return Err(VoiceLinkError::Codec(format!(
                "packet buffer too small: {} < {bytes}",
                out.len()
            )));
        }

        convert::samples_to_pcm16_bytes(pcm, &mut out[..bytes]);
        Ok(bytes)
    }
}

/// Decoder matching [`PassthroughEncoder`].
#[derive(Debug, Default)]
pub struct PassthroughDecoder;

impl PassthroughDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for PassthroughDecoder {
    fn decode(&mut self, packet: &[u8], out: &mut [i16]) -> Result<usize> {
        if packet.len() % 2 != 0 {
            return Err(VoiceLinkError::Codec(format!(
                "packet length {} is not sample-aligned",
                packet.len()
            )));
        }

        let samples = packet.len() / 2;
        if out.len() < samples {
            return Err(VoiceLinkError::Codec(format!(
                "frame buffer too small: {} < {samples}",
                out.len()
            )));
        }

        convert::pcm16_bytes_to_samples(packet, &mut out[..samples]);
        Ok(samples)
    }
}
