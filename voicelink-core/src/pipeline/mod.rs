//! `VoicePipeline` — one full processing cycle per frame.
//!
//! ## Stage ordering
//!
//! ```text
//! Outbound: pcm16 frame ─► [noise suppression]* ─► encode ─► packet
//!                            (÷32768 → f32, denoise, ×32767 → pcm16)
//! Inbound:  packet ─► decode ─► [soft clip]* ─► pcm16 frame
//! Query:    pcm16 frame ─► [stereo downmix]* ─► VAD ─► bool
//!           (* = configuration-dependent)
//! ```
//!
//! The pipeline owns its codec/DSP engine handles and scratch buffers,
//! all sized once at construction and reused every call — no per-frame
//! allocation beyond the returned output.
//!
//! ## Threading
//!
//! Every call mutates scratch and engine state; a pipeline instance must
//! be driven from a single thread. Callers needing parallelism use one
//! instance per stream.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::codec::{CodecApplication, FrameDecoder, FrameEncoder, MAX_ENCODED_FRAME_BYTES};
use crate::convert;
use crate::dsp::{clip, soft_clip, Denoiser, RnnoiseDenoiser};
use crate::error::{Result, VoiceLinkError};
use crate::vad::{VadMode, VoiceActivityDetector, WebRtcVad};

#[cfg(feature = "codec-opus")]
use crate::codec::{OpusFrameDecoder, OpusFrameEncoder};

#[cfg(not(feature = "codec-opus"))]
use crate::codec::{PassthroughDecoder, PassthroughEncoder};

/// Immutable pipeline configuration, fixed for the life of an instance.
///
/// The single exception is the noise-suppression flag, which seeds the
/// pipeline's mutable toggle ([`VoicePipeline::set_noise_suppression`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Sample rate in Hz. Default: 48 000 (native Opus/RNNoise rate).
    pub sample_rate: u32,
    /// Frame duration in milliseconds. Default: 20.
    pub frame_duration_ms: u32,
    /// Stereo (interleaved) frames when true, mono otherwise.
    pub stereo: bool,
    /// Encoder bitrate in bits per second. Default: 16 000.
    pub bitrate: u32,
    /// Whether outbound frames are denoised before encoding.
    pub noise_suppression: bool,
    /// Favor perceptual streaming quality over packet size. Selects the
    /// codec application mode; mutually exclusive with communication
    /// tuning per instance.
    pub favor_audio_streaming: bool,
    /// Whether decoded frames are soft-clipped.
    pub soft_clip: bool,
    /// Saturation knee for the soft clipper, in normalized full-scale
    /// units. Default: 1.0.
    pub soft_clip_threshold: f32,
    /// Detector operating mode. `None` keeps the detector default.
    pub vad_mode: Option<VadMode>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            frame_duration_ms: 20,
            stereo: false,
            bitrate: 16_000,
            noise_suppression: true,
            favor_audio_streaming: false,
            soft_clip: true,
            soft_clip_threshold: clip::DEFAULT_CLIP_THRESHOLD,
            vad_mode: None,
        }
    }
}

impl PipelineConfig {
    /// Channel count derived from the stereo flag.
    pub fn channels(&self) -> usize {
        if self.stereo {
            2
        } else {
            1
        }
    }

    /// Bytes in one 16-bit PCM frame at this configuration.
    pub fn frame_byte_size(&self) -> usize {
        convert::frame_byte_size(self.sample_rate, self.frame_duration_ms, self.channels(), false)
    }

    /// Samples (across all channels) in one frame.
    pub fn samples_per_frame(&self) -> usize {
        self.frame_byte_size() / 2
    }

    /// Codec application mode derived from the streaming-favoring flag.
    pub fn codec_application(&self) -> CodecApplication {
        if self.favor_audio_streaming {
            CodecApplication::Streaming
        } else {
            CodecApplication::Voice
        }
    }
}

/// Frame-oriented voice pipeline: denoise → encode outbound,
/// decode → soft-clip inbound, plus a voice-activity query.
pub struct VoicePipeline {
    config: PipelineConfig,
    encoder: Box<dyn FrameEncoder>,
    decoder: Box<dyn FrameDecoder>,
    denoiser: Box<dyn Denoiser>,
    vad: Box<dyn VoiceActivityDetector>,
    /// The one mutable configuration flag.
    noise_suppression: bool,
    /// One frame of normalized samples for the denoise stage.
    float_scratch: Vec<f32>,
    /// One frame of 16-bit samples (outbound + VAD paths).
    sample_scratch: Vec<i16>,
    /// One frame of decoded samples (inbound path).
    decode_scratch: Vec<i16>,
    /// Downmixed frame for the mono-only detector (stereo configs).
    mono_scratch: Vec<i16>,
    /// Encoded packet staging.
    encoded_scratch: Vec<u8>,
}

impl VoicePipeline {
    /// Create a pipeline with the default engine stack: Opus when the
    /// `codec-opus` feature is enabled (passthrough otherwise), RNNoise
    /// suppression, and the WebRTC detector at the configured mode.
    ///
    /// # Errors
    /// `VoiceLinkError::InvalidConfig` for rejected parameters and
    /// `VoiceLinkError::Codec`/`Dsp` when an engine refuses the
    /// configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        #[cfg(feature = "codec-opus")]
        let (encoder, decoder): (Box<dyn FrameEncoder>, Box<dyn FrameDecoder>) = (
            Box::new(OpusFrameEncoder::new(
                config.sample_rate,
                config.stereo,
                config.bitrate,
                config.codec_application(),
            )?),
            Box::new(OpusFrameDecoder::new(config.sample_rate, config.stereo)?),
        );

        #[cfg(not(feature = "codec-opus"))]
        let (encoder, decoder): (Box<dyn FrameEncoder>, Box<dyn FrameDecoder>) = (
            Box::new(PassthroughEncoder::new()),
            Box::new(PassthroughDecoder::new()),
        );

        let denoiser = Box::new(RnnoiseDenoiser::new());
        let vad = Box::new(WebRtcVad::new(
            config.sample_rate,
            config.vad_mode.unwrap_or_default(),
        )?);

        Self::with_engines(config, encoder, decoder, denoiser, vad)
    }

    /// Create a pipeline from caller-supplied engines.
    ///
    /// This is the seam for custom codec/DSP backends and for test
    /// doubles; the engines must already match the configuration's sample
    /// rate, frame duration, and channel count.
    ///
    /// # Errors
    /// `VoiceLinkError::InvalidConfig` when the configuration itself is
    /// unusable (zero bitrate or degenerate frame geometry).
    pub fn with_engines(
        config: PipelineConfig,
        encoder: Box<dyn FrameEncoder>,
        decoder: Box<dyn FrameDecoder>,
        denoiser: Box<dyn Denoiser>,
        vad: Box<dyn VoiceActivityDetector>,
    ) -> Result<Self> {
        if config.bitrate == 0 {
            return Err(VoiceLinkError::InvalidConfig("bitrate must be positive".into()));
        }

        let samples = config.samples_per_frame();
        if samples == 0 {
            return Err(VoiceLinkError::InvalidConfig(format!(
                "degenerate frame geometry: {} Hz × {} ms",
                config.sample_rate, config.frame_duration_ms
            )));
        }

        debug!(
            sample_rate = config.sample_rate,
            frame_duration_ms = config.frame_duration_ms,
            channels = config.channels(),
            bitrate = config.bitrate,
            frame_bytes = config.frame_byte_size(),
            noise_suppression = config.noise_suppression,
            soft_clip = config.soft_clip,
            "voice pipeline ready"
        );

        Ok(Self {
            noise_suppression: config.noise_suppression,
            float_scratch: vec![0.0; samples],
            sample_scratch: vec![0; samples],
            decode_scratch: vec![0; samples],
            mono_scratch: vec![0; samples / config.channels()],
            encoded_scratch: vec![0; MAX_ENCODED_FRAME_BYTES],
            config,
            encoder,
            decoder,
            denoiser,
            vad,
        })
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Bytes expected in every submitted frame.
    pub fn frame_byte_size(&self) -> usize {
        self.config.frame_byte_size()
    }

    /// Whether outbound frames are currently denoised.
    pub fn noise_suppression(&self) -> bool {
        self.noise_suppression
    }

    /// Toggle noise suppression. Takes effect on the next outbound frame.
    pub fn set_noise_suppression(&mut self, enabled: bool) {
        self.noise_suppression = enabled;
    }

    /// Process one outbound frame: optional noise suppression, then
    /// encoding. Returns the encoded packet (codec-determined length).
    ///
    /// # Errors
    /// - `VoiceLinkError::InvalidFrameSize` if `pcm` is not exactly one
    ///   configured frame.
    /// - `VoiceLinkError::Dsp` / `Codec` surfaced from the engines.
    pub fn submit_audio_data(&mut self, pcm: &[u8]) -> Result<Vec<u8>> {
        self.check_frame_len(pcm.len())?;
        convert::pcm16_bytes_to_samples(pcm, &mut self.sample_scratch);

        if self.noise_suppression {
            convert::pcm16_to_f32(&self.sample_scratch, &mut self.float_scratch);
            self.denoiser.denoise(&mut self.float_scratch)?;
            convert::f32_to_pcm16(&self.float_scratch, &mut self.sample_scratch);
        }

        let written = self
            .encoder
            .encode(&self.sample_scratch, &mut self.encoded_scratch)?;

        trace!(
            frame_bytes = pcm.len(),
            encoded_bytes = written,
            denoised = self.noise_suppression,
            "outbound frame encoded"
        );
        Ok(self.encoded_scratch[..written].to_vec())
    }

    /// Process one inbound packet: decoding, then optional soft clipping.
    /// Returns the decoded 16-bit PCM frame as little-endian bytes.
    ///
    /// Decoding is stateful and relies on codec continuity — packet loss
    /// and reordering are the transport's responsibility.
    ///
    /// # Errors
    /// `VoiceLinkError::Codec` surfaced from the decoder unchanged.
    pub fn when_data_received(&mut self, packet: &[u8]) -> Result<Vec<u8>> {
        let samples = self.decoder.decode(packet, &mut self.decode_scratch)?;
        let frame = &mut self.decode_scratch[..samples];

        if self.config.soft_clip {
            soft_clip(frame, self.config.soft_clip_threshold);
        }

        let mut out = vec![0u8; samples * 2];
        convert::samples_to_pcm16_bytes(frame, &mut out);

        trace!(
            packet_bytes = packet.len(),
            decoded_bytes = out.len(),
            clipped = self.config.soft_clip,
            "inbound packet decoded"
        );
        Ok(out)
    }

    /// Whether the detector classifies this frame as containing speech.
    ///
    /// Stereo frames are downmixed to mono first — the WebRTC detector
    /// analyses a single channel.
    ///
    /// # Errors
    /// - `VoiceLinkError::InvalidFrameSize` if `pcm` is not exactly one
    ///   configured frame.
    /// - `VoiceLinkError::Dsp` surfaced from the detector.
    pub fn is_speaking(&mut self, pcm: &[u8]) -> Result<bool> {
        self.check_frame_len(pcm.len())?;
        convert::pcm16_bytes_to_samples(pcm, &mut self.sample_scratch);

        if self.config.stereo {
            for (slot, pair) in self.mono_scratch.iter_mut().zip(self.sample_scratch.chunks_exact(2))
            {
                *slot = ((i32::from(pair[0]) + i32::from(pair[1])) / 2) as i16;
            }
            self.vad.has_speech(&self.mono_scratch)
        } else {
            self.vad.has_speech(&self.sample_scratch)
        }
    }

    fn check_frame_len(&self, got: usize) -> Result<()> {
        let expected = self.config.frame_byte_size();
        if got != expected {
            return Err(VoiceLinkError::InvalidFrameSize { got, expected });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    /// Encoder double that records every frame it sees and emits a
    /// two-byte marker packet.
    struct RecordingEncoder {
        frames: Arc<Mutex<Vec<Vec<i16>>>>,
    }

    impl FrameEncoder for RecordingEncoder {
        fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize> {
            self.frames.lock().unwrap().push(pcm.to_vec());
            out[0] = 0xAB;
            out[1] = 0xCD;
            Ok(2)
        }
    }

    /// Decoder double that always produces a fixed frame.
    struct FixedDecoder {
        samples: Vec<i16>,
    }

    impl FrameDecoder for FixedDecoder {
        fn decode(&mut self, _packet: &[u8], out: &mut [i16]) -> Result<usize> {
            out[..self.samples.len()].copy_from_slice(&self.samples);
            Ok(self.samples.len())
        }
    }

    /// Denoiser double with an observable effect: halves every sample.
    struct HalvingDenoiser;

    impl Denoiser for HalvingDenoiser {
        fn denoise(&mut self, frame: &mut [f32]) -> Result<()> {
            for sample in frame.iter_mut() {
                *sample *= 0.5;
            }
            Ok(())
        }

        fn reset(&mut self) {}
    }

    /// Detector double that records frames and replays scripted answers.
    struct ScriptedVad {
        answers: Vec<bool>,
        idx: usize,
        frames: Arc<Mutex<Vec<Vec<i16>>>>,
    }

    impl VoiceActivityDetector for ScriptedVad {
        fn has_speech(&mut self, frame: &[i16]) -> Result<bool> {
            self.frames.lock().unwrap().push(frame.to_vec());
            let answer = self.answers.get(self.idx).copied().unwrap_or(false);
            self.idx += 1;
            Ok(answer)
        }

        fn reset(&mut self) {
            self.idx = 0;
        }
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            // Tiny frames keep the fixtures readable: 1 kHz × 4 ms = 4 samples.
            sample_rate: 1_000,
            frame_duration_ms: 4,
            ..PipelineConfig::default()
        }
    }

    struct Doubles {
        encoded_frames: Arc<Mutex<Vec<Vec<i16>>>>,
        vad_frames: Arc<Mutex<Vec<Vec<i16>>>>,
    }

    fn build_pipeline(config: PipelineConfig, decoded: Vec<i16>, answers: Vec<bool>) -> (VoicePipeline, Doubles) {
        let encoded_frames = Arc::new(Mutex::new(Vec::new()));
        let vad_frames = Arc::new(Mutex::new(Vec::new()));

        let pipeline = VoicePipeline::with_engines(
            config,
            Box::new(RecordingEncoder {
                frames: Arc::clone(&encoded_frames),
            }),
            Box::new(FixedDecoder { samples: decoded }),
            Box::new(HalvingDenoiser),
            Box::new(ScriptedVad {
                answers,
                idx: 0,
                frames: Arc::clone(&vad_frames),
            }),
        )
        .unwrap();

        (
            pipeline,
            Doubles {
                encoded_frames,
                vad_frames,
            },
        )
    }

    fn frame_bytes(samples: &[i16]) -> Vec<u8> {
        let mut bytes = vec![0u8; samples.len() * 2];
        convert::samples_to_pcm16_bytes(samples, &mut bytes);
        bytes
    }

    #[test]
    fn submit_skips_denoiser_when_suppression_disabled() {
        let config = PipelineConfig {
            noise_suppression: false,
            ..test_config()
        };
        let (mut pipeline, doubles) = build_pipeline(config, vec![], vec![]);

        let pcm = frame_bytes(&[1_000, -1_000, 2_000, -2_000]);
        let packet = pipeline.submit_audio_data(&pcm).unwrap();

        assert_eq!(packet, vec![0xAB, 0xCD]);
        let seen = doubles.encoded_frames.lock().unwrap();
        assert_eq!(seen[0], vec![1_000, -1_000, 2_000, -2_000]);
    }

    #[test]
    fn submit_runs_denoiser_before_encoding_when_enabled() {
        let (mut pipeline, doubles) = build_pipeline(test_config(), vec![], vec![]);
        assert!(pipeline.noise_suppression());

        let pcm = frame_bytes(&[1_000, -1_000, 2_000, -2_000]);
        pipeline.submit_audio_data(&pcm).unwrap();

        // Halved by the denoiser double, modulo the ÷32768/×32767 round trip.
        let seen = doubles.encoded_frames.lock().unwrap();
        for (&out, &expected) in seen[0].iter().zip(&[500i16, -500, 1_000, -1_000]) {
            assert!((i32::from(out) - i32::from(expected)).abs() <= 1, "{out} vs {expected}");
        }
    }

    #[test]
    fn noise_suppression_toggle_takes_effect_per_call() {
        let (mut pipeline, doubles) = build_pipeline(test_config(), vec![], vec![]);
        let pcm = frame_bytes(&[8_000, 8_000, 8_000, 8_000]);

        pipeline.submit_audio_data(&pcm).unwrap();
        pipeline.set_noise_suppression(false);
        pipeline.submit_audio_data(&pcm).unwrap();

        let seen = doubles.encoded_frames.lock().unwrap();
        assert!(seen[0][0] < 5_000); // denoised
        assert_eq!(seen[1][0], 8_000); // untouched
    }

    #[test]
    fn submit_rejects_wrong_frame_length() {
        let (mut pipeline, _) = build_pipeline(test_config(), vec![], vec![]);
        let err = pipeline.submit_audio_data(&[0u8; 6]).unwrap_err();
        assert!(matches!(
            err,
            VoiceLinkError::InvalidFrameSize { got: 6, expected: 8 }
        ));
    }

    #[test]
    fn receive_applies_soft_clip_only_when_enabled() {
        let decoded = vec![i16::MAX, i16::MIN, 100, -100];

        let clipped_config = test_config();
        let (mut clipped, _) = build_pipeline(clipped_config, decoded.clone(), vec![]);
        let out = clipped.when_data_received(&[0u8; 2]).unwrap();
        let mut samples = vec![0i16; 4];
        convert::pcm16_bytes_to_samples(&out, &mut samples);
        assert!(samples[0] < i16::MAX);
        assert!(samples[1] > i16::MIN);

        let raw_config = PipelineConfig {
            soft_clip: false,
            ..test_config()
        };
        let (mut raw, _) = build_pipeline(raw_config, decoded, vec![]);
        let out = raw.when_data_received(&[0u8; 2]).unwrap();
        convert::pcm16_bytes_to_samples(&out, &mut samples);
        assert_eq!(samples, vec![i16::MAX, i16::MIN, 100, -100]);
    }

    #[test]
    fn is_speaking_delegates_to_detector() {
        let (mut pipeline, _) = build_pipeline(test_config(), vec![], vec![true, false]);
        let pcm = frame_bytes(&[0, 0, 0, 0]);

        assert!(pipeline.is_speaking(&pcm).unwrap());
        assert!(!pipeline.is_speaking(&pcm).unwrap());
    }

    #[test]
    fn is_speaking_downmixes_stereo_frames() {
        let config = PipelineConfig {
            stereo: true,
            ..test_config()
        };
        let (mut pipeline, doubles) = build_pipeline(config, vec![], vec![true]);

        // Stereo doubles the frame: 8 interleaved samples.
        let pcm = frame_bytes(&[1_000, 3_000, 1_000, 3_000, -1_000, -3_000, -1_000, -3_000]);
        pipeline.is_speaking(&pcm).unwrap();

        let seen = doubles.vad_frames.lock().unwrap();
        assert_eq!(seen[0], vec![2_000, 2_000, -2_000, -2_000]);
    }

    #[test]
    fn zero_bitrate_is_rejected() {
        let config = PipelineConfig {
            bitrate: 0,
            ..test_config()
        };
        let result = VoicePipeline::with_engines(
            config,
            Box::new(RecordingEncoder {
                frames: Arc::new(Mutex::new(Vec::new())),
            }),
            Box::new(FixedDecoder { samples: vec![] }),
            Box::new(HalvingDenoiser),
            Box::new(ScriptedVad {
                answers: vec![],
                idx: 0,
                frames: Arc::new(Mutex::new(Vec::new())),
            }),
        );

        assert!(matches!(
            result.err(),
            Some(VoiceLinkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_serializes_with_snake_case_fields() {
        let config = PipelineConfig {
            vad_mode: Some(VadMode::VeryAggressive),
            ..PipelineConfig::default()
        };

        let json = serde_json::to_value(&config).expect("serialize pipeline config");
        assert_eq!(json["sample_rate"], 48_000);
        assert_eq!(json["favor_audio_streaming"], false);
        assert_eq!(json["vad_mode"], "very_aggressive");

        let back: PipelineConfig = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.vad_mode, Some(VadMode::VeryAggressive));
    }
}
