//! Error types for rendering

use thiserror::Error;

use crate::resample::ResampleError;

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors (and the cancellation marker) a render can terminate with
#[derive(Error, Debug)]
pub enum RenderError {
    /// Render was requested with no input buffer
    #[error("No audio loaded for rendering")]
    NoAudioLoaded,

    /// A non-finite sample was produced while processing
    #[error("Numeric fault in block {block}: non-finite sample produced")]
    NumericFault {
        /// Index of the processing block that faulted
        block: usize,
    },

    /// Cooperative cancellation; distinct from failure, no partial output
    #[error("Render cancelled")]
    Cancelled,

    /// Sample-rate conversion failed
    #[error(transparent)]
    Resample(#[from] ResampleError),

    /// Invalid buffer or settings input
    #[error(transparent)]
    Core(#[from] stanza_core::CoreError),

    /// The background render worker terminated abnormally
    #[error("Render worker failed: {0}")]
    Worker(String),
}

impl RenderError {
    /// Whether this terminal value is the cancellation marker
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
