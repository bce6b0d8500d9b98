//! Voice activity detection (VAD) abstraction.
//!
//! The `VoiceActivityDetector` trait is the extensibility seam: swap in
//! [`WebRtcVad`] (default) or [`EnergyVad`] without touching the pipeline.

pub mod energy;
pub mod webrtc;

pub use energy::EnergyVad;
pub use webrtc::WebRtcVad;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Detector sensitivity / operating mode, set at construction only.
///
/// Maps onto the WebRTC VAD aggressiveness profiles: `Quality` flags the
/// most audio as speech, `VeryAggressive` the least.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VadMode {
    #[default]
    Quality,
    LowBitrate,
    Aggressive,
    VeryAggressive,
}

/// Trait for all VAD implementations.
///
/// Implementors are stateful (hangover counters, GMM noise estimates) and
/// tuned to a fixed frame duration and sample rate.
pub trait VoiceActivityDetector: Send + 'static {
    /// Classify one 16-bit PCM frame: does it contain speech?
    ///
    /// # Errors
    /// `VoiceLinkError::Dsp` when the detector rejects the frame geometry.
    fn has_speech(&mut self, frame: &[i16]) -> Result<bool>;

    /// Reset internal state (e.g. between streams).
    fn reset(&mut self);
}
