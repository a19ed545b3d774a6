//! Loudness normalization
//!
//! Computes and applies a static gain that moves a buffer's integrated
//! loudness to a target level. When the measurement is undefined (silence
//! or too-short input) normalization is skipped and the caller gets an
//! explicit outcome rather than a silently unchanged buffer.

use stanza_core::SampleBuffer;
use tracing::{info, warn};

use crate::analyzer::measure;

/// What the normalization stage did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizationOutcome {
    /// Gain was computed and applied
    Applied {
        /// The gain that was applied, in dB
        gain_db: f64,
    },
    /// Measurement was undefined; the buffer passed through unchanged
    Skipped,
}

impl NormalizationOutcome {
    /// Whether a gain was applied
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// The applied gain in dB, if any
    pub fn gain_db(&self) -> Option<f64> {
        match self {
            Self::Applied { gain_db } => Some(*gain_db),
            Self::Skipped => None,
        }
    }
}

/// Gain in dB that moves `measured_lufs` to `target_lufs`
///
/// Returns `None` when the measurement is not finite.
pub fn normalization_gain_db(measured_lufs: f64, target_lufs: f64) -> Option<f64> {
    if measured_lufs.is_finite() {
        Some(target_lufs - measured_lufs)
    } else {
        None
    }
}

/// Apply a static gain, producing a new buffer
pub fn apply_gain_db(buffer: &SampleBuffer, gain_db: f64) -> SampleBuffer {
    let gain = 10.0_f64.powf(gain_db / 20.0) as f32;
    buffer.map_samples(|s| s * gain)
}

/// Measure a buffer and normalize it to the target loudness
///
/// The original buffer is never mutated; a skipped normalization returns a
/// clone plus [`NormalizationOutcome::Skipped`] so the caller can surface
/// the warning condition.
pub fn normalize_to_target(
    buffer: &SampleBuffer,
    target_lufs: f64,
) -> (SampleBuffer, NormalizationOutcome) {
    let measurement = measure(buffer);
    match normalization_gain_db(measurement.integrated_lufs, target_lufs) {
        Some(gain_db) => {
            info!(
                measured_lufs = measurement.integrated_lufs,
                target_lufs, gain_db, "normalizing loudness"
            );
            (
                apply_gain_db(buffer, gain_db),
                NormalizationOutcome::Applied { gain_db },
            )
        }
        None => {
            warn!("loudness undefined (silence or too-short input); normalization skipped");
            (buffer.clone(), NormalizationOutcome::Skipped)
        }
    }
}
