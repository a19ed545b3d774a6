//! Offline render engine
//!
//! Takes one immutable settings snapshot and its own copy of the source
//! buffer, runs the shared mastering chain start-to-finish, resamples to
//! the requested output rate, and encodes to PCM bytes. Progress is
//! reported at coarse milestones; cancellation is cooperative, checked
//! between blocks and stages only, and never leaves partial output.
//!
//! The engine itself never touches the filesystem: it returns encoded
//! bytes for the host's file-writer collaborator, so cancelled and failed
//! renders trivially leave the filesystem untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stanza_core::{BitDepth, MasteringSettings, SampleBuffer};
use stanza_dsp::MasterChain;
use stanza_loudness::{measure, normalization_gain_db, NormalizationOutcome};
use tracing::{info, warn};

use crate::encoder::encode_wav;
use crate::error::{RenderError, Result};
use crate::resample::resample_buffer;

/// Frames per processing block; cancellation and fault checks run at this
/// granularity
const BLOCK_FRAMES: usize = 4096;

/// Progress sink: monotone percent 0-100 plus a status label
pub type ProgressCallback = Box<dyn Fn(u8, &str) + Send + Sync>;

/// Cooperative cancellation flag shared between the caller and a render
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect at the next block/stage boundary
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Lifecycle of one render invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No render started yet
    Idle,
    /// Validating input and resolving settings
    Configuring,
    /// Processing blocks
    Running,
    /// Finished successfully
    Completed,
    /// Terminated by cooperative cancellation
    Cancelled,
    /// Terminated by an error
    Failed,
}

/// A finished render: encoded bytes plus the format they carry
pub struct RenderOutput {
    /// Complete RIFF/WAVE byte stream
    pub data: Vec<u8>,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output bit depth
    pub bit_depth: BitDepth,
    /// Channel count
    pub channels: u16,
    /// What the normalization stage did (surfaced, never silent)
    pub normalization: NormalizationOutcome,
}

/// One-shot offline renderer
///
/// ```text
/// Idle -> Configuring -> Running -> Completed | Cancelled | Failed
/// ```
pub struct OfflineRenderer {
    state: RenderState,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl OfflineRenderer {
    /// Create a renderer with no progress sink
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RenderState::Idle,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a progress sink (builder style)
    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Token the caller can use to cancel this render from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> RenderState {
        self.state
    }

    fn report(&self, percent: u8, label: &str) {
        if let Some(callback) = &self.progress {
            callback(percent, label);
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Record the terminal state implied by a pipeline result
    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {}
            Err(RenderError::Cancelled) => {
                info!("render cancelled");
                self.state = RenderState::Cancelled;
            }
            Err(err) => {
                warn!(%err, "render failed");
                self.state = RenderState::Failed;
            }
        }
        result
    }

    fn run_pipeline(
        &mut self,
        source: Option<&SampleBuffer>,
        settings: &MasteringSettings,
    ) -> Result<(SampleBuffer, NormalizationOutcome)> {
        self.state = RenderState::Configuring;
        let source = source.ok_or(RenderError::NoAudioLoaded)?;
        let settings = settings.clamped();

        self.report(0, "preparing buffer");
        self.check_cancelled()?;

        // The engine works on its own copy; the caller's buffer is never
        // mutated and stays valid for further renders
        let mut working = source.samples().to_vec();
        let sample_rate = source.sample_rate().as_hz();
        let channels = source.channels();

        let normalization = if settings.normalize_loudness {
            let measurement = measure(source);
            match normalization_gain_db(measurement.integrated_lufs, settings.target_lufs) {
                Some(gain_db) => {
                    info!(
                        measured_lufs = measurement.integrated_lufs,
                        gain_db, "loudness normalization gain computed"
                    );
                    NormalizationOutcome::Applied { gain_db }
                }
                None => {
                    warn!("loudness undefined; normalization skipped for this render");
                    NormalizationOutcome::Skipped
                }
            }
        } else {
            NormalizationOutcome::Skipped
        };
        self.report(10, "buffer prepared");
        self.check_cancelled()?;

        let mut chain = MasterChain::new(sample_rate, channels, &settings);
        if let Some(gain_db) = normalization.gain_db() {
            chain.set_normalization_gain_db(gain_db as f32);
        }

        self.state = RenderState::Running;
        self.report(20, "render started");

        let block_len = BLOCK_FRAMES * usize::from(channels);
        for (block_idx, block) in working.chunks_mut(block_len).enumerate() {
            self.check_cancelled()?;
            chain.process_block(block);
            if block.iter().any(|s| !s.is_finite()) {
                return Err(RenderError::NumericFault { block: block_idx });
            }
        }
        self.report(70, "render complete");

        let processed = source.with_samples(working)?;
        let output = if settings.output_sample_rate_hz != sample_rate {
            self.check_cancelled()?;
            let resampled = resample_buffer(&processed, settings.output_sample_rate_hz)?;
            self.report(85, "resample complete");
            resampled
        } else {
            processed
        };

        Ok((output, normalization))
    }

    /// Run the processing pipeline and return the pre-encode buffer
    ///
    /// Exposes the exact samples the encoder would receive, which is how
    /// hosts (and tests) verify preview/offline equivalence.
    pub fn render_buffer(
        &mut self,
        source: Option<&SampleBuffer>,
        settings: &MasteringSettings,
    ) -> Result<(SampleBuffer, NormalizationOutcome)> {
        let result = self.run_pipeline(source, settings);
        let result = self.finish(result);
        if result.is_ok() {
            self.state = RenderState::Completed;
        }
        result
    }

    /// Run the full render: process, resample, and encode to WAV bytes
    pub fn render(
        &mut self,
        source: Option<&SampleBuffer>,
        settings: &MasteringSettings,
    ) -> Result<RenderOutput> {
        let pipeline = self.run_pipeline(source, settings);
        let (buffer, normalization) = self.finish(pipeline)?;

        let cancelled = self.check_cancelled();
        self.finish(cancelled)?;

        let settings = settings.clamped();
        let data = encode_wav(&buffer, settings.output_bit_depth);
        self.report(95, "encode complete");

        self.state = RenderState::Completed;
        self.report(100, "complete");
        info!(bytes = data.len(), "render completed");

        Ok(RenderOutput {
            data,
            sample_rate: buffer.sample_rate().as_hz(),
            bit_depth: settings.output_bit_depth,
            channels: buffer.channels(),
            normalization,
        })
    }
}

impl Default for OfflineRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a render running on a background worker thread
pub struct RenderHandle {
    cancel: CancellationToken,
    worker: std::thread::JoinHandle<Result<RenderOutput>>,
}

impl RenderHandle {
    /// Token for cancelling the running render
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the render to finish and return its result
    pub fn join(self) -> Result<RenderOutput> {
        self.worker
            .join()
            .map_err(|_| RenderError::Worker("render thread panicked".into()))?
    }
}

/// Run an offline render on a worker thread
///
/// Long renders must not occupy a UI-responsive thread; this helper owns
/// its copy of the source so the caller keeps theirs.
pub fn spawn_render(
    source: SampleBuffer,
    settings: MasteringSettings,
    progress: Option<ProgressCallback>,
) -> RenderHandle {
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();
    let worker = std::thread::spawn(move || {
        let mut renderer = OfflineRenderer {
            state: RenderState::Idle,
            progress,
            cancel: worker_cancel,
        };
        renderer.render(Some(&source), &settings)
    });
    RenderHandle { cancel, worker }
}
