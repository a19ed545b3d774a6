/// Audio-related types
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// Common sample rates
    pub const CD_QUALITY: Self = Self(44_100);
    pub const DVD_QUALITY: Self = Self(48_000);
    pub const HIGH_RES_88: Self = Self(88_200);
    pub const HIGH_RES_96: Self = Self(96_000);

    /// Create a new sample rate
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        self.0
    }
}

/// Output bit depth for PCM encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    /// 16-bit signed integer samples
    #[default]
    Sixteen,
    /// 24-bit signed integer samples
    TwentyFour,
}

impl BitDepth {
    /// Bits per sample
    pub fn bits(&self) -> u16 {
        match self {
            Self::Sixteen => 16,
            Self::TwentyFour => 24,
        }
    }

    /// Bytes per sample
    pub fn bytes(&self) -> u16 {
        self.bits() / 8
    }

    /// Largest representable positive amplitude (2^(bits-1) - 1)
    pub fn max_amplitude(&self) -> f32 {
        match self {
            Self::Sixteen => 32_767.0,
            Self::TwentyFour => 8_388_607.0,
        }
    }

    /// Parse from a bit count
    #[must_use]
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            16 => Some(Self::Sixteen),
            24 => Some(Self::TwentyFour),
            _ => None,
        }
    }
}

impl std::fmt::Display for BitDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Audio buffer containing decoded samples
///
/// Samples are stored as f32 in the range [-1.0, 1.0], interleaved
/// (`[L, R, L, R, ...]` for stereo). Fields are private so the structural
/// invariant (1 or 2 channels, all channels the same length) holds for the
/// lifetime of the buffer; processing stages produce new buffers rather
/// than mutating one they don't own.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: SampleRate,
}

impl SampleBuffer {
    /// Create a new sample buffer from interleaved samples
    ///
    /// # Errors
    /// Returns an error if the channel count is not 1 or 2, the sample rate
    /// is zero, or the sample count does not divide evenly by the channel
    /// count.
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: SampleRate) -> Result<Self> {
        if !(1..=2).contains(&channels) {
            return Err(CoreError::invalid_buffer(format!(
                "channel count must be 1 or 2, got {channels}"
            )));
        }
        if sample_rate.as_hz() == 0 {
            return Err(CoreError::invalid_buffer("sample rate must be positive"));
        }
        if samples.len() % channels as usize != 0 {
            return Err(CoreError::invalid_buffer(format!(
                "sample count {} is not divisible by channel count {}",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Create a silent buffer of the given length
    #[must_use]
    pub fn silent(frames: usize, channels: u16, sample_rate: SampleRate) -> Self {
        Self {
            samples: vec![0.0; frames * channels as usize],
            channels: channels.clamp(1, 2),
            sample_rate,
        }
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the buffer, returning its interleaved samples
    #[must_use]
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Number of channels (1 or 2)
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.as_hz())
    }

    /// Total sample count across all channels
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }

    /// Build a new buffer with the same layout from processed samples
    ///
    /// # Errors
    /// Returns an error if the sample count does not match this buffer's
    /// channel layout.
    pub fn with_samples(&self, samples: Vec<f32>) -> Result<Self> {
        Self::new(samples, self.channels, self.sample_rate)
    }

    /// Produce a new buffer by applying `f` to every sample
    ///
    /// The layout is preserved, so the structural invariant holds without
    /// revalidation.
    #[must_use]
    pub fn map_samples(&self, f: impl FnMut(f32) -> f32) -> Self {
        Self {
            samples: self.samples.iter().copied().map(f).collect(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_rate_common_values() {
        assert_eq!(SampleRate::CD_QUALITY.as_hz(), 44_100);
        assert_eq!(SampleRate::DVD_QUALITY.as_hz(), 48_000);
    }

    #[test]
    fn buffer_frames_calculation() {
        let buffer = SampleBuffer::new(vec![0.0; 8], 2, SampleRate::CD_QUALITY).unwrap();
        assert_eq!(buffer.frames(), 4);
    }

    #[test]
    fn buffer_duration() {
        let buffer = SampleBuffer::new(vec![0.0; 88_200], 2, SampleRate::new(44_100)).unwrap();
        assert!((buffer.duration_secs() - 1.0).abs() < 0.01);
    }

    #[test]
    fn buffer_rejects_bad_channel_count() {
        assert!(SampleBuffer::new(vec![0.0; 12], 3, SampleRate::CD_QUALITY).is_err());
        assert!(SampleBuffer::new(vec![0.0; 12], 0, SampleRate::CD_QUALITY).is_err());
    }

    #[test]
    fn buffer_rejects_misaligned_length() {
        assert!(SampleBuffer::new(vec![0.0; 5], 2, SampleRate::CD_QUALITY).is_err());
    }

    #[test]
    fn buffer_rejects_zero_sample_rate() {
        assert!(SampleBuffer::new(vec![0.0; 4], 2, SampleRate::new(0)).is_err());
    }

    #[test]
    fn buffer_peak() {
        let buffer =
            SampleBuffer::new(vec![0.1, -0.7, 0.3, 0.2], 2, SampleRate::CD_QUALITY).unwrap();
        assert!((buffer.peak() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn bit_depth_values() {
        assert_eq!(BitDepth::Sixteen.bits(), 16);
        assert_eq!(BitDepth::TwentyFour.bytes(), 3);
        assert_eq!(BitDepth::from_bits(24), Some(BitDepth::TwentyFour));
        assert_eq!(BitDepth::from_bits(32), None);
        assert_eq!(BitDepth::Sixteen.max_amplitude(), 32_767.0);
    }
}
