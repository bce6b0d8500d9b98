//! Signal-processing stages that surround the codec.
//!
//! The `Denoiser` trait is the noise-suppression seam: swap in
//! [`RnnoiseDenoiser`] (default) or any other in-place suppressor without
//! touching the pipeline. Post-decode peak taming lives in [`clip`].

pub mod clip;
pub mod rnnoise;

pub use clip::soft_clip;
pub use rnnoise::RnnoiseDenoiser;

use crate::error::Result;

/// Noise suppression over exactly one frame of normalized f32 samples.
///
/// Implementors may be stateful (spectral history, RNN hidden states) —
/// a denoiser must see frames from one stream only, in order.
pub trait Denoiser: Send + 'static {
    /// Suppress noise in `frame` in place. Samples are normalized to
    /// [-1.0, 1.0].
    ///
    /// # Errors
    /// `VoiceLinkError::Dsp` when the frame geometry is unsupported.
    fn denoise(&mut self, frame: &mut [f32]) -> Result<()>;

    /// Reset internal state (e.g. between streams).
    fn reset(&mut self);
}
