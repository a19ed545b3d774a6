//! Deterministic sample-rate conversion
//!
//! Sinc-interpolated resampling via rubato with a fixed quality profile, so
//! repeated renders of the same material are byte-identical. The offline
//! engine processes at the source rate and converts once at the end; the
//! conversion is delay-compensated and sized to exactly
//! round(frames x ratio) output frames.

use rubato::{
    Resampler as RubatoResamplerTrait, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use stanza_core::{SampleBuffer, SampleRate};
use thiserror::Error;
use tracing::debug;

/// Resampling errors
#[derive(Error, Debug)]
pub enum ResampleError {
    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// Resampler construction failed
    #[error("Resampler initialization failed: {0}")]
    InitializationFailed(String),

    /// Resampler processing failed
    #[error("Resampling failed: {0}")]
    ProcessingFailed(String),
}

/// Input chunk size in frames fed to the sinc resampler
const CHUNK_FRAMES: usize = 1024;

/// Fixed sinc profile: one deterministic quality for every render
fn sinc_params() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

fn deinterleave(interleaved: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = interleaved.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            planar[ch].push(sample);
        }
    }
    planar
}

fn interleave(planar: &[Vec<f32>], start: usize, frames: usize) -> Vec<f32> {
    let channels = planar.len();
    let mut interleaved = Vec::with_capacity(frames * channels);
    for frame_idx in start..start + frames {
        for channel in planar {
            interleaved.push(channel[frame_idx]);
        }
    }
    interleaved
}

/// Resample a whole buffer to `output_rate`
///
/// A matching rate is a pass-through clone. Otherwise the buffer runs
/// through a sinc resampler in fixed chunks (zero-padded past the end so
/// the filter tail drains), the startup delay is trimmed, and the output
/// is cut to exactly round(frames x ratio) frames.
pub fn resample_buffer(buffer: &SampleBuffer, output_rate: u32) -> Result<SampleBuffer, ResampleError> {
    let input_rate = buffer.sample_rate().as_hz();
    if output_rate == 0 {
        return Err(ResampleError::InvalidSampleRate(output_rate));
    }
    if output_rate == input_rate {
        return Ok(buffer.clone());
    }

    let channels = usize::from(buffer.channels());
    let frames = buffer.frames();
    let ratio = f64::from(output_rate) / f64::from(input_rate);
    let expected_frames = (frames as f64 * ratio).round() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, sinc_params(), CHUNK_FRAMES, channels)
        .map_err(|e| ResampleError::InitializationFailed(e.to_string()))?;
    let delay_frames = resampler.output_delay();

    debug!(input_rate, output_rate, frames, expected_frames, "resampling buffer");

    let planar_in = deinterleave(buffer.samples(), channels);
    let mut planar_out: Vec<Vec<f32>> = vec![Vec::with_capacity(expected_frames + delay_frames); channels];

    let mut consumed = 0;
    let mut chunk = vec![vec![0.0_f32; CHUNK_FRAMES]; channels];
    // Feed real input, then silence, until the delayed tail has drained
    while planar_out[0].len() < delay_frames + expected_frames {
        for (ch, lane) in chunk.iter_mut().enumerate() {
            for (i, slot) in lane.iter_mut().enumerate() {
                let idx = consumed + i;
                *slot = if idx < frames { planar_in[ch][idx] } else { 0.0 };
            }
        }
        consumed += CHUNK_FRAMES;

        let output = resampler
            .process(&chunk, None)
            .map_err(|e| ResampleError::ProcessingFailed(e.to_string()))?;
        for (ch, lane) in output.into_iter().enumerate() {
            planar_out[ch].extend_from_slice(&lane);
        }
    }

    let samples = interleave(&planar_out, delay_frames, expected_frames);
    SampleBuffer::new(samples, buffer.channels(), SampleRate::new(output_rate))
        .map_err(|e| ResampleError::ProcessingFailed(e.to_string()))
}
