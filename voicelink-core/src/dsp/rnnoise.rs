//! RNNoise-based noise suppression via `nnnoiseless`.
//!
//! RNNoise is trained on 48 kHz audio and consumes fixed 480-sample
//! (10 ms) blocks, so a 20 ms pipeline frame is processed as consecutive
//! blocks. The network also expects samples in the 16-bit integer range;
//! the pipeline contract is normalized floats, so samples are rescaled on
//! the way in and out.

use nnnoiseless::DenoiseState;

use crate::dsp::Denoiser;
use crate::error::{Result, VoiceLinkError};

/// RNNoise operating range is i16-scaled floats.
const RNNOISE_SCALE: f32 = 32768.0;

/// In-place RNNoise suppressor.
///
/// Stereo frames are processed as interleaved blocks through the single
/// mono network, matching the reference implementation's behavior.
pub struct RnnoiseDenoiser {
    state: Box<DenoiseState<'static>>,
    scaled: Vec<f32>,
    denoised: Vec<f32>,
}

impl RnnoiseDenoiser {
    pub fn new() -> Self {
        Self {
            state: DenoiseState::new(),
            scaled: vec![0.0; DenoiseState::FRAME_SIZE],
            denoised: vec![0.0; DenoiseState::FRAME_SIZE],
        }
    }
}

impl Default for RnnoiseDenoiser {
    fn default() -> Self {
        Self::new()
    }
}

impl Denoiser for RnnoiseDenoiser {
    fn denoise(&mut self, frame: &mut [f32]) -> Result<()> {
        if frame.is_empty() || frame.len() % DenoiseState::FRAME_SIZE != 0 {
            return Err(VoiceLinkError::Dsp(format!(
                "rnnoise requires a multiple of {} samples, got {}",
                DenoiseState::FRAME_SIZE,
                frame.len()
            )));
        }

        for block in frame.chunks_exact_mut(DenoiseState::FRAME_SIZE) {
            for (slot, &sample) in self.scaled.iter_mut().zip(block.iter()) {
                *slot = sample * RNNOISE_SCALE;
            }
            self.state.process_frame(&mut self.denoised, &self.scaled);
            for (sample, &clean) in block.iter_mut().zip(self.denoised.iter()) {
                *sample = clean / RNNOISE_SCALE;
            }
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.state = DenoiseState::new();
    }
}
