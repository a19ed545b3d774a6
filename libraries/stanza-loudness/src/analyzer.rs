//! Integrated loudness measurement per ITU-R BS.1770-4
//!
//! The pipeline: K-weight every channel independently (high-shelf then
//! high-pass), partition the weighted signal into overlapping 400 ms blocks
//! at a 100 ms hop, gate out silent and low-relative-energy blocks, and
//! average what survives. Pure function of the buffer; no side effects.

use stanza_core::SampleBuffer;
use stanza_dsp::{Biquad, BiquadCoeffs};
use tracing::debug;

/// K-weighting high-shelf center frequency (Hz)
const K_SHELF_HZ: f32 = 1681.97;
/// K-weighting high-shelf gain (dB)
const K_SHELF_GAIN_DB: f32 = 4.0;
/// K-weighting high-shelf Q
const K_SHELF_Q: f32 = 0.7071;
/// K-weighting high-pass corner frequency (Hz)
const K_HIGHPASS_HZ: f32 = 38.14;
/// K-weighting high-pass Q
const K_HIGHPASS_Q: f32 = 0.5;

/// Measurement block length (seconds)
const BLOCK_SECS: f64 = 0.4;
/// Hop between block starts (seconds); 75% overlap
const HOP_SECS: f64 = 0.1;

/// Absolute gate: blocks below this mean-square power are discarded
/// (~ -70 LUFS)
const ABSOLUTE_GATE_POWER: f64 = 1e-7;
/// Relative gate: blocks below this fraction of the surviving mean are
/// discarded (~ -10 LU)
const RELATIVE_GATE_RATIO: f64 = 0.1;

/// LUFS calibration offset from BS.1770
const LUFS_OFFSET: f64 = -0.691;

/// Result of an integrated loudness measurement
///
/// `integrated_lufs` is `f64::NEG_INFINITY` when loudness is undefined
/// (silence, or a buffer shorter than one measurement block).
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessMeasurement {
    /// Integrated loudness in LUFS; negative infinity when undefined
    pub integrated_lufs: f64,

    /// Largest absolute sample value in the (unweighted) buffer
    pub sample_peak: f32,

    /// Number of blocks that survived both gates
    pub gated_block_count: usize,

    /// Number of measurement blocks before gating
    pub total_block_count: usize,

    /// Sample rate of the analyzed audio
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u16,
}

impl LoudnessMeasurement {
    /// Whether the measurement produced a usable loudness value
    pub fn is_defined(&self) -> bool {
        self.integrated_lufs.is_finite()
    }

    /// Sample peak in dBFS; negative infinity for silence
    pub fn sample_peak_dbfs(&self) -> f64 {
        if self.sample_peak > 0.0 {
            20.0 * f64::from(self.sample_peak).log10()
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Whether applying `gain_db` would push the sample peak past full scale
    pub fn will_clip_at_gain(&self, gain_db: f64) -> bool {
        self.sample_peak_dbfs() + gain_db > 0.0
    }

    /// Largest gain that keeps the sample peak at or below full scale
    pub fn max_safe_gain_db(&self) -> f64 {
        -self.sample_peak_dbfs()
    }

    fn undefined(buffer: &SampleBuffer, total_block_count: usize) -> Self {
        Self {
            integrated_lufs: f64::NEG_INFINITY,
            sample_peak: buffer.peak(),
            gated_block_count: 0,
            total_block_count,
            sample_rate: buffer.sample_rate().as_hz(),
            channels: buffer.channels(),
        }
    }
}

/// Measure the integrated loudness of a buffer
///
/// Block power is the channel-summed mean square normalized by
/// blockFrames x channelCount, so mono and identical-channel stereo
/// material measure the same.
pub fn measure(buffer: &SampleBuffer) -> LoudnessMeasurement {
    let sample_rate = buffer.sample_rate().as_hz();
    let channels = usize::from(buffer.channels());
    let frames = buffer.frames();

    let block_frames = (f64::from(sample_rate) * BLOCK_SECS).round() as usize;
    let hop_frames = (f64::from(sample_rate) * HOP_SECS).round() as usize;

    if block_frames == 0 || hop_frames == 0 || frames < block_frames {
        debug!(frames, block_frames, "buffer shorter than one measurement block");
        return LoudnessMeasurement::undefined(buffer, 0);
    }

    // K-weighting cascade, independent state per channel
    let sr = sample_rate as f32;
    let mut shelf = Biquad::new(BiquadCoeffs::high_shelf(
        sr,
        K_SHELF_HZ,
        K_SHELF_Q,
        K_SHELF_GAIN_DB,
    ));
    let mut highpass = Biquad::new(BiquadCoeffs::high_pass(sr, K_HIGHPASS_HZ, K_HIGHPASS_Q));

    // Prefix sums of per-frame weighted energy make every block power an
    // O(1) lookup
    let mut prefix = Vec::with_capacity(frames + 1);
    prefix.push(0.0_f64);
    let mut acc = 0.0_f64;
    for frame in buffer.samples().chunks_exact(channels) {
        let mut frame_energy = 0.0_f64;
        for (channel, &sample) in frame.iter().enumerate() {
            let weighted = highpass.process_channel(channel, shelf.process_channel(channel, sample));
            frame_energy += f64::from(weighted) * f64::from(weighted);
        }
        acc += frame_energy;
        prefix.push(acc);
    }

    let norm = (block_frames * channels) as f64;
    let mut block_powers = Vec::new();
    let mut start = 0;
    while start + block_frames <= frames {
        let energy = prefix[start + block_frames] - prefix[start];
        block_powers.push(energy / norm);
        start += hop_frames;
    }
    let total_block_count = block_powers.len();

    // Absolute gate
    let surviving: Vec<f64> = block_powers
        .iter()
        .copied()
        .filter(|&p| p >= ABSOLUTE_GATE_POWER)
        .collect();
    if surviving.is_empty() {
        debug!(total_block_count, "all blocks below the absolute gate");
        return LoudnessMeasurement::undefined(buffer, total_block_count);
    }

    // Relative gate against the surviving mean
    let mean = surviving.iter().sum::<f64>() / surviving.len() as f64;
    let relative_threshold = mean * RELATIVE_GATE_RATIO;
    let gated: Vec<f64> = surviving
        .into_iter()
        .filter(|&p| p >= relative_threshold)
        .collect();
    if gated.is_empty() {
        return LoudnessMeasurement::undefined(buffer, total_block_count);
    }

    let final_mean = gated.iter().sum::<f64>() / gated.len() as f64;
    let integrated_lufs = LUFS_OFFSET + 10.0 * final_mean.log10();

    LoudnessMeasurement {
        integrated_lufs,
        sample_peak: buffer.peak(),
        gated_block_count: gated.len(),
        total_block_count,
        sample_rate,
        channels: buffer.channels(),
    }
}

/// Combined K-weighting power gain at a frequency
///
/// Exposed for calibration: tests compare measured loudness of a sine
/// against the value this response predicts.
pub fn k_weighting_gain_at(frequency: f32, sample_rate: f32) -> f64 {
    let shelf = BiquadCoeffs::high_shelf(sample_rate, K_SHELF_HZ, K_SHELF_Q, K_SHELF_GAIN_DB);
    let highpass = BiquadCoeffs::high_pass(sample_rate, K_HIGHPASS_HZ, K_HIGHPASS_Q);
    let magnitude =
        f64::from(shelf.magnitude_at(frequency, sample_rate)) * f64::from(highpass.magnitude_at(frequency, sample_rate));
    magnitude * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_core::SampleRate;

    const SR: u32 = 44_100;

    fn stereo_sine(freq: f32, amplitude: f32, secs: f32) -> SampleBuffer {
        let frames = (SR as f32 * secs) as usize;
        let samples: Vec<f32> = (0..frames)
            .flat_map(|i| {
                let t = i as f32 / SR as f32;
                let s = amplitude * (2.0 * std::f32::consts::PI * freq * t).sin();
                [s, s]
            })
            .collect();
        SampleBuffer::new(samples, 2, SampleRate::new(SR)).unwrap()
    }

    #[test]
    fn silence_is_undefined() {
        let buffer = SampleBuffer::silent(SR as usize * 2, 2, SampleRate::new(SR));
        let info = measure(&buffer);
        assert!(!info.is_defined());
        assert_eq!(info.integrated_lufs, f64::NEG_INFINITY);
        assert_eq!(info.gated_block_count, 0);
    }

    #[test]
    fn short_buffer_is_undefined() {
        // 100 ms, shorter than one 400 ms block
        let buffer = stereo_sine(440.0, 0.5, 0.1);
        assert!(!measure(&buffer).is_defined());
    }

    #[test]
    fn sine_matches_predicted_loudness() {
        let amplitude = 0.5_f32;
        let freq = 997.0_f32;
        let buffer = stereo_sine(freq, amplitude, 3.0);

        let info = measure(&buffer);
        assert!(info.is_defined());

        // Predicted: mean square of the sine times the K-weighting power
        // gain at its frequency
        let mean_square = f64::from(amplitude) * f64::from(amplitude) / 2.0;
        let expected = -0.691 + 10.0 * (mean_square * k_weighting_gain_at(freq, SR as f32)).log10();
        assert!(
            (info.integrated_lufs - expected).abs() < 0.1,
            "expected {expected:.2} LUFS, got {:.2}",
            info.integrated_lufs
        );
    }

    #[test]
    fn identical_mono_and_stereo_measure_the_same() {
        let frames = SR as usize * 2;
        let mono: Vec<f32> = (0..frames)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / SR as f32).sin())
            .collect();
        let stereo: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();

        let mono_info = measure(&SampleBuffer::new(mono, 1, SampleRate::new(SR)).unwrap());
        let stereo_info = measure(&SampleBuffer::new(stereo, 2, SampleRate::new(SR)).unwrap());
        assert!(
            (mono_info.integrated_lufs - stereo_info.integrated_lufs).abs() < 0.05,
            "channel-count normalization should make these equal"
        );
    }

    #[test]
    fn gating_ignores_long_silence() {
        let tone = stereo_sine(440.0, 0.1, 1.0);
        let mut padded_samples = tone.samples().to_vec();
        padded_samples.extend(std::iter::repeat(0.0).take(SR as usize * 2 * 2));
        let padded = SampleBuffer::new(padded_samples, 2, SampleRate::new(SR)).unwrap();

        let pure = measure(&tone).integrated_lufs;
        let gated = measure(&padded).integrated_lufs;

        // An ungated average over 3 s would sit ~4.8 dB lower; the gate
        // keeps the measurement near the tone's own loudness
        assert!(
            (gated - pure).abs() < 1.0,
            "gated {gated:.2} should stay near {pure:.2}"
        );
        let naive = pure + 10.0 * (1.0_f64 / 3.0).log10();
        assert!(gated > naive + 2.0, "gate should beat the naive average");
    }

    #[test]
    fn peak_reporting_and_safe_gain() {
        let buffer = stereo_sine(440.0, 0.5, 1.0);
        let info = measure(&buffer);
        assert!((f64::from(info.sample_peak) - 0.5).abs() < 0.01);
        // -6 dB peak allows ~+6 dB of safe gain
        assert!((info.max_safe_gain_db() - 6.0).abs() < 0.1);
        assert!(info.will_clip_at_gain(8.0));
        assert!(!info.will_clip_at_gain(4.0));
    }

    #[test]
    fn louder_signal_measures_louder() {
        let quiet = measure(&stereo_sine(440.0, 0.05, 2.0)).integrated_lufs;
        let loud = measure(&stereo_sine(440.0, 0.5, 2.0)).integrated_lufs;
        // 20 dB of amplitude is 20 LU of loudness
        assert!((loud - quiet - 20.0).abs() < 0.1);
    }
}
