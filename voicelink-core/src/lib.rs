//! # voicelink-core
//!
//! Frame-oriented real-time voice-audio pipeline SDK.
//!
//! ## Architecture
//!
//! ```text
//! Capture → VoicePipeline::submit_audio_data → encoded packet → wire
//!               (denoise? → encode)
//!
//! wire → VoicePipeline::when_data_received → CircularChunkBuffer → playback
//!               (decode → soft clip?)
//! ```
//!
//! Everything is synchronous and single-threaded by design: no operation
//! suspends, blocks, or performs I/O. Capture devices, transport, and the
//! concrete codec/DSP engines live behind narrow trait contracts
//! ([`FrameEncoder`], [`FrameDecoder`], [`Denoiser`],
//! [`VoiceActivityDetector`]) and are not part of this crate's core.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod buffering;
pub mod codec;
pub mod convert;
pub mod dsp;
pub mod error;
pub mod pipeline;
pub mod vad;

// Convenience re-exports for downstream crates
pub use buffering::{CircularChunkBuffer, RECOMMENDED_CHUNK_CAPACITY};
pub use codec::{CodecApplication, FrameDecoder, FrameEncoder};
pub use dsp::Denoiser;
pub use error::{Result, VoiceLinkError};
pub use pipeline::{PipelineConfig, VoicePipeline};
pub use vad::{VadMode, VoiceActivityDetector};

#[cfg(feature = "codec-opus")]
pub use codec::{OpusFrameDecoder, OpusFrameEncoder};
