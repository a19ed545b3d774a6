//! Stanza Master Core
//!
//! Foundational types and error handling for the Stanza mastering engine.
//!
//! This crate defines:
//! - **Audio Types**: `SampleBuffer`, `SampleRate`, `BitDepth`
//! - **Settings**: `MasteringSettings` snapshots with range clamping and
//!   named `EqPreset`s
//! - **Error Handling**: unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use stanza_core::{MasteringSettings, SampleBuffer, SampleRate};
//!
//! // A decoded buffer handed over by the host's decoder
//! let buffer = SampleBuffer::new(vec![0.0; 88_200], 2, SampleRate::new(44_100)).unwrap();
//! assert_eq!(buffer.frames(), 44_100);
//!
//! // A settings snapshot for one render
//! let settings = MasteringSettings::default().clamped();
//! assert!(settings.normalize_loudness);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::{
    BitDepth, EqPreset, MasteringSettings, SampleBuffer, SampleRate, BROADCAST_TARGET_LUFS,
    STREAMING_TARGET_LUFS,
};
