//! Stanza Master DSP
//!
//! The mastering signal chain: biquad filter design and state, the fixed
//! filter cascade (cleanup high-pass, 5-band EQ, polish filters), the shared
//! dynamics model (glue compression and true-peak limiting), and mid/side
//! stereo width. All stages operate on interleaved f32 samples in
//! [-1.0, 1.0].
//!
//! The chain is organized as an ordered list of stage parameters resolved
//! from one [`MasteringSettings`](stanza_core::MasteringSettings) snapshot,
//! plus one mutable state arena per running graph ([`MasterChain`]). Preview
//! and offline render both drive the same [`MasterChain::process_block`],
//! which is what makes the two modes sample-identical.
//!
//! # Example
//!
//! ```rust
//! use stanza_core::MasteringSettings;
//! use stanza_dsp::MasterChain;
//!
//! let settings = MasteringSettings::default();
//! let mut chain = MasterChain::new(44_100, 2, &settings);
//!
//! let mut block = vec![0.0_f32; 1024]; // interleaved stereo
//! chain.process_block(&mut block);
//! ```

#![forbid(unsafe_code)]

mod biquad;
mod chain;
mod dynamics;
mod stereo;

pub use biquad::{Biquad, BiquadCoeffs};
pub use chain::MasterChain;
pub use dynamics::{Dynamics, DynamicsParams};
pub use stereo::StereoWidth;

#[cfg(test)]
mod tests {
    /// Generate an interleaved stereo sine wave for testing
    pub(crate) fn generate_sine(freq: f32, sample_rate: u32, duration_secs: f32) -> Vec<f32> {
        let num_samples = (sample_rate as f32 * duration_secs) as usize;
        let mut samples = Vec::with_capacity(num_samples * 2);

        for i in 0..num_samples {
            let t = i as f32 / sample_rate as f32;
            let sample = (2.0 * std::f32::consts::PI * freq * t).sin();
            samples.push(sample); // Left
            samples.push(sample); // Right
        }

        samples
    }
}
