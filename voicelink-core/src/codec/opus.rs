//! Opus codec backend (`codec-opus` feature).
//!
//! Wraps the `opus` bindings with the pipeline's fixed-configuration
//! contract: constant bitrate, application mode chosen once from the
//! streaming-favoring flag, channel layout fixed at construction.

use opus::{Application, Bitrate, Channels, Decoder, Encoder};
use tracing::debug;

use crate::codec::{CodecApplication, FrameDecoder, FrameEncoder};
use crate::error::{Result, VoiceLinkError};

fn codec_err(context: &str, e: opus::Error) -> VoiceLinkError {
    VoiceLinkError::Codec(format!("{context}: {e}"))
}

fn channel_layout(stereo: bool) -> Channels {
    if stereo {
        Channels::Stereo
    } else {
        Channels::Mono
    }
}

/// Opus encoder bound to a fixed sample rate, channel layout, and bitrate.
pub struct OpusFrameEncoder {
    inner: Encoder,
}

impl OpusFrameEncoder {
    /// Create an encoder. Constant bitrate is forced, matching wire
    /// compatibility with deployments that assume fixed packet pacing.
    ///
    /// # Errors
    /// `VoiceLinkError::Codec` when libopus rejects the configuration
    /// (unsupported sample rate, out-of-range bitrate).
    pub fn new(
        sample_rate: u32,
        stereo: bool,
        bitrate: u32,
        application: CodecApplication,
    ) -> Result<Self> {
        let mode = match application {
            CodecApplication::Voice => Application::Voip,
            CodecApplication::Streaming => Application::Audio,
        };

        let mut inner = Encoder::new(sample_rate, channel_layout(stereo), mode)
            .map_err(|e| codec_err("opus encoder init", e))?;
        inner
            .set_bitrate(Bitrate::Bits(bitrate as i32))
            .map_err(|e| codec_err("opus set_bitrate", e))?;
        inner
            .set_vbr(false)
            .map_err(|e| codec_err("opus set_vbr", e))?;

        debug!(sample_rate, stereo, bitrate, ?application, "opus encoder ready");
        Ok(Self { inner })
    }
}

impl FrameEncoder for OpusFrameEncoder {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize> {
        self.inner
            .encode(pcm, out)
            .map_err(|e| codec_err("opus encode", e))
    }
}

/// Opus decoder bound to a fixed sample rate and channel layout.
pub struct OpusFrameDecoder {
    inner: Decoder,
    channels: usize,
}

impl OpusFrameDecoder {
    /// # Errors
    /// `VoiceLinkError::Codec` when libopus rejects the configuration.
    pub fn new(sample_rate: u32, stereo: bool) -> Result<Self> {
        let inner = Decoder::new(sample_rate, channel_layout(stereo))
            .map_err(|e| codec_err("opus decoder init", e))?;

        Ok(Self {
            inner,
            channels: if stereo { 2 } else { 1 },
        })
    }
}

impl FrameDecoder for OpusFrameDecoder {
    fn decode(&mut self, packet: &[u8], out: &mut [i16]) -> Result<usize> {
        // libopus reports samples per channel; the trait contract is total.
        let per_channel = self
            .inner
            .decode(packet, out, false)
            .map_err(|e| codec_err("opus decode", e))?;
        Ok(per_channel * self.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_frame_encodes_to_nonzero_packet() {
        let mut encoder =
            OpusFrameEncoder::new(48_000, false, 16_000, CodecApplication::Voice).unwrap();
        let pcm = vec![0i16; 960];
        let mut packet = vec![0u8; 4000];
        let written = encoder.encode(&pcm, &mut packet).unwrap();
        assert!(written > 0);
        assert!(written < 960);
    }

    #[test]
    fn encode_decode_round_trip_keeps_frame_length() {
        let mut encoder =
            OpusFrameEncoder::new(48_000, false, 16_000, CodecApplication::Voice).unwrap();
        let mut decoder = OpusFrameDecoder::new(48_000, false).unwrap();

        let pcm: Vec<i16> = (0..960)
            .map(|n| ((n as f32 * 0.05).sin() * 8_000.0) as i16)
            .collect();
        let mut packet = vec![0u8; 4000];
        let written = encoder.encode(&pcm, &mut packet).unwrap();

        let mut decoded = vec![0i16; 960];
        let samples = decoder.decode(&packet[..written], &mut decoded).unwrap();
        assert_eq!(samples, 960);
    }

    #[test]
    fn stereo_decoder_reports_total_samples() {
        let mut encoder =
            OpusFrameEncoder::new(48_000, true, 32_000, CodecApplication::Streaming).unwrap();
        let mut decoder = OpusFrameDecoder::new(48_000, true).unwrap();

        let pcm = vec![0i16; 1920];
        let mut packet = vec![0u8; 4000];
        let written = encoder.encode(&pcm, &mut packet).unwrap();

        let mut decoded = vec![0i16; 1920];
        let samples = decoder.decode(&packet[..written], &mut decoded).unwrap();
        assert_eq!(samples, 1920);
    }
}
