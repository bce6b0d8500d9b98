//! Soft clipping — exponential saturation of decoded peaks.
//!
//! Lossy codecs can overshoot full scale on reconstruction; hard
//! truncation of those peaks is audible. The curve
//! `threshold * (1 - e^(-|x|/threshold))` (sign of the input) compresses
//! peaks smoothly instead: near zero it is the identity, at full scale it
//! stays strictly below the threshold.

/// Default saturation knee in normalized full-scale units.
pub const DEFAULT_CLIP_THRESHOLD: f32 = 1.0;

/// Soft-clip a 16-bit frame in place.
///
/// Each sample is normalized by the int16 maximum, shaped through the
/// saturation curve, and written back as 16-bit. `threshold` is in
/// normalized full-scale units and must be positive.
pub fn soft_clip(frame: &mut [i16], threshold: f32) {
    debug_assert!(threshold > 0.0);

    for sample in frame.iter_mut() {
        let x = f32::from(*sample) / f32::from(i16::MAX);
        let shaped = threshold * (1.0 - (-x.abs() / threshold).exp());
        let y = if x < 0.0 { -shaped } else { shaped };
        *sample = (y * f32::from(i16::MAX)) as i16;
    }
}
