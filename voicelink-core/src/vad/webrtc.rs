//! WebRTC voice activity detection via `earshot`.
//!
//! The GMM-based WebRTC detector accepts mono 16-bit frames of 10, 20 or
//! 30 ms at 8, 16, 32 or 48 kHz. Sensitivity is fixed at construction
//! through [`VadMode`].

use earshot::{VoiceActivityDetector as Earshot, VoiceActivityProfile};
use tracing::debug;

use crate::error::{Result, VoiceLinkError};
use crate::vad::{VadMode, VoiceActivityDetector};

fn profile(mode: VadMode) -> VoiceActivityProfile {
    match mode {
        VadMode::Quality => VoiceActivityProfile::QUALITY,
        VadMode::LowBitrate => VoiceActivityProfile::LBR,
        VadMode::Aggressive => VoiceActivityProfile::AGGRESSIVE,
        VadMode::VeryAggressive => VoiceActivityProfile::VERY_AGGRESSIVE,
    }
}

/// WebRTC-style voice activity detector bound to one sample rate.
pub struct WebRtcVad {
    inner: Earshot,
    mode: VadMode,
    sample_rate: u32,
}

impl WebRtcVad {
    /// Create a detector for `sample_rate` with the given operating mode.
    ///
    /// # Errors
    /// `VoiceLinkError::Dsp` if the sample rate is not one of
    /// 8/16/32/48 kHz.
    pub fn new(sample_rate: u32, mode: VadMode) -> Result<Self> {
        if !matches!(sample_rate, 8_000 | 16_000 | 32_000 | 48_000) {
            return Err(VoiceLinkError::Dsp(format!(
                "webrtc vad does not support {sample_rate} Hz"
            )));
        }

        debug!(sample_rate, ?mode, "webrtc vad ready");
        Ok(Self {
            inner: Earshot::new(profile(mode)),
            mode,
            sample_rate,
        })
    }
}

impl VoiceActivityDetector for WebRtcVad {
    fn has_speech(&mut self, frame: &[i16]) -> Result<bool> {
        // The GMM model only supports 10/20/30 ms windows; anything else
        // must be rejected here because the backend does not check lengths
        // and indexes past the end of shorter frames.
        let samples_per_ms = self.sample_rate as usize / 1_000;
        if frame.len() % samples_per_ms != 0
            || ![10, 20, 30].contains(&(frame.len() / samples_per_ms))
        {
            return Err(VoiceLinkError::Dsp(format!(
                "webrtc vad expects a 10/20/30 ms mono frame at {} Hz, got {} samples",
                self.sample_rate,
                frame.len()
            )));
        }

        let prediction = match self.sample_rate {
            8_000 => self.inner.predict_8khz(frame),
            16_000 => self.inner.predict_16khz(frame),
            32_000 => self.inner.predict_32khz(frame),
            _ => self.inner.predict_48khz(frame),
        };

        prediction.map_err(|e| VoiceLinkError::Dsp(format!("webrtc vad rejected frame: {e:?}")))
    }

    fn reset(&mut self) {
        self.inner = Earshot::new(profile(self.mode));
    }
}
