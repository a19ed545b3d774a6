//! Stanza Master Render
//!
//! The two faces of the mastering engine over one signal path:
//!
//! - [`PreviewEngine`]: continuous processing on the host's audio callback
//!   with live settings snapshots, bypass, and seek.
//! - [`OfflineRenderer`]: one-shot batch render of a full buffer with
//!   progress milestones, cooperative cancellation, sample-rate
//!   conversion, and PCM/WAVE encoding.
//!
//! Both modes drive the same `MasterChain`, so a preview is sample-exact
//! against the export for the same settings.
//!
//! # Example: offline render
//!
//! ```rust,no_run
//! use stanza_core::{MasteringSettings, SampleBuffer};
//! use stanza_render::OfflineRenderer;
//!
//! # fn example(source: &SampleBuffer) -> stanza_render::Result<()> {
//! let mut renderer = OfflineRenderer::new()
//!     .on_progress(Box::new(|pct, label| println!("{pct:3}% {label}")));
//!
//! let output = renderer.render(Some(source), &MasteringSettings::default())?;
//! // Hand output.data to the host's file writer
//! # let _ = output;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod encoder;
mod engine;
mod error;
mod preview;
mod resample;

pub use encoder::encode_wav;
pub use engine::{
    spawn_render, CancellationToken, OfflineRenderer, ProgressCallback, RenderHandle,
    RenderOutput, RenderState,
};
pub use error::{RenderError, Result};
pub use preview::{PreviewController, PreviewEngine};
pub use resample::{resample_buffer, ResampleError};
