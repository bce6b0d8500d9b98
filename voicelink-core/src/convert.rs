//! Pure PCM sample conversions.
//!
//! Everything here is stateless: frame-size arithmetic plus the
//! 16-bit ⇄ float32 conversions the pipeline runs around its DSP stages.
//!
//! ## Scaling
//!
//! The forward conversion divides by 32768 while the inverse multiplies by
//! 32767 and truncates toward zero. The asymmetry is kept deliberately so
//! frames are bit-identical to existing deployments; round trips stay
//! within ±1 LSB for every representable 16-bit sample.
//!
//! Length relationships between input and output slices are documented
//! preconditions, checked with `debug_assert!` only.

use byteorder::{ByteOrder, LittleEndian};

/// Bytes needed for one frame of audio.
///
/// `float32` samples count half — the halving is applied as a trailing
/// divisor after the channel multiply, matching the integer truncation of
/// the reference formula exactly.
///
/// ```
/// use voicelink_core::convert::frame_byte_size;
///
/// assert_eq!(frame_byte_size(48_000, 20, 1, false), 1920);
/// assert_eq!(frame_byte_size(48_000, 20, 2, false), 3840);
/// assert_eq!(frame_byte_size(48_000, 20, 1, true), 960);
/// ```
pub fn frame_byte_size(
    sample_rate: u32,
    frame_duration_ms: u32,
    channels: usize,
    float32: bool,
) -> usize {
    let pcm16_bytes =
        (sample_rate as f32 * (16.0 / 8.0) * (frame_duration_ms as f32 / 1000.0)) as usize;
    pcm16_bytes * channels / if float32 { 2 } else { 1 }
}

/// Convert little-endian 16-bit PCM bytes into normalized float32 samples.
///
/// Precondition: `input.len() == output.len() * 2`.
pub fn pcm16_bytes_to_f32(input: &[u8], output: &mut [f32]) {
    debug_assert_eq!(input.len(), output.len() * 2);

    for (n, slot) in output.iter_mut().enumerate() {
        let sample = LittleEndian::read_i16(&input[n * 2..]);
        *slot = f32::from(sample) / 32768.0;
    }
}

/// Convert normalized float32 samples into little-endian 16-bit PCM bytes.
///
/// Out-of-range samples saturate; in-range samples truncate toward zero.
///
/// Precondition: `output.len() == input.len() * 2`.
pub fn f32_to_pcm16_bytes(input: &[f32], output: &mut [u8]) {
    debug_assert_eq!(output.len(), input.len() * 2);

    for (n, &sample) in input.iter().enumerate() {
        let packed = (sample * 32767.0) as i16;
        LittleEndian::write_i16(&mut output[n * 2..], packed);
    }
}

/// Sample-domain twin of [`pcm16_bytes_to_f32`].
///
/// Precondition: `input.len() == output.len()`.
pub fn pcm16_to_f32(input: &[i16], output: &mut [f32]) {
    debug_assert_eq!(input.len(), output.len());

    for (slot, &sample) in output.iter_mut().zip(input) {
        *slot = f32::from(sample) / 32768.0;
    }
}

/// Sample-domain twin of [`f32_to_pcm16_bytes`].
///
/// Precondition: `input.len() == output.len()`.
pub fn f32_to_pcm16(input: &[f32], output: &mut [i16]) {
    debug_assert_eq!(input.len(), output.len());

    for (slot, &sample) in output.iter_mut().zip(input) {
        *slot = (sample * 32767.0) as i16;
    }
}

/// Unpack little-endian PCM bytes into 16-bit samples.
///
/// Precondition: `input.len() == output.len() * 2`.
pub fn pcm16_bytes_to_samples(input: &[u8], output: &mut [i16]) {
    debug_assert_eq!(input.len(), output.len() * 2);
    LittleEndian::read_i16_into(input, output);
}

/// Pack 16-bit samples into little-endian PCM bytes.
///
/// Precondition: `output.len() == input.len() * 2`.
pub fn samples_to_pcm16_bytes(input: &[i16], output: &mut [u8]) {
    debug_assert_eq!(output.len(), input.len() * 2);
    LittleEndian::write_i16_into(input, output);
}
