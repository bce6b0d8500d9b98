//! Energy-based VAD using RMS threshold + hangover counter.
//!
//! ## Algorithm
//!
//! 1. Compute RMS of the incoming frame.
//! 2. If RMS ≥ `threshold` → speech, reset hangover counter.
//! 3. If RMS < `threshold` and hangover counter > 0 → still speech,
//!    decrement counter (prevents clipping syllable endings).
//! 4. Otherwise → silence.

use crate::error::Result;
use crate::vad::VoiceActivityDetector;

/// A simple energy-based voice activity detector.
///
/// Cheaper and cruder than [`crate::vad::WebRtcVad`]; useful when the
/// frame geometry falls outside what the WebRTC detector accepts.
#[derive(Debug, Clone)]
pub struct EnergyVad {
    /// RMS amplitude threshold in normalized units. Frames above this are
    /// considered speech. Typical range: 0.01–0.05 for a quiet microphone.
    threshold: f32,
    /// How many consecutive below-threshold frames still count as speech
    /// after real speech ends.
    hangover_frames: u32,
    /// Current hangover countdown.
    hangover_counter: u32,
}

impl EnergyVad {
    /// Create a new `EnergyVad`.
    ///
    /// # Parameters
    /// - `threshold`: RMS level above which a frame is considered speech.
    ///   Default: `0.02`.
    /// - `hangover_frames`: Number of silent frames to extend speech
    ///   detection. Default: `8` (≈ 160 ms at a 20 ms frame stride).
    pub fn new(threshold: f32, hangover_frames: u32) -> Self {
        Self {
            threshold,
            hangover_frames,
            hangover_counter: 0,
        }
    }

    /// Root-mean-square of a 16-bit frame, normalized to [0.0, 1.0].
    fn rms(frame: &[i16]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = frame
            .iter()
            .map(|&s| {
                let x = f32::from(s) / 32768.0;
                x * x
            })
            .sum();
        (sum_sq / frame.len() as f32).sqrt()
    }
}

impl Default for EnergyVad {
    fn default() -> Self {
        Self::new(0.02, 8)
    }
}

impl VoiceActivityDetector for EnergyVad {
    fn has_speech(&mut self, frame: &[i16]) -> Result<bool> {
        let rms = Self::rms(frame);

        if rms >= self.threshold {
            // Active speech detected — reset hangover
            self.hangover_counter = self.hangover_frames;
            Ok(true)
        } else if self.hangover_counter > 0 {
            // Within hangover window — still report speech
            self.hangover_counter -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn reset(&mut self) {
        self.hangover_counter = 0;
    }
}
