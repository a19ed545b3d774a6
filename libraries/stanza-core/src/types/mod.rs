/// Type definitions for the mastering core
mod audio;
mod settings;

pub use audio::{BitDepth, SampleBuffer, SampleRate};
pub use settings::{EqPreset, MasteringSettings, BROADCAST_TARGET_LUFS, STREAMING_TARGET_LUFS};
