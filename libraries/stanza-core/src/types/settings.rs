/// Mastering settings snapshot
///
/// A flat, copyable configuration read once per render request (offline)
/// or once per block boundary (preview). Every numeric field has a
/// documented range; `clamped()` is applied before any value is used so a
/// malformed snapshot degrades to the nearest legal one instead of raising.
use serde::{Deserialize, Serialize};

use super::audio::BitDepth;

/// Streaming loudness target in LUFS (common across streaming platforms)
pub const STREAMING_TARGET_LUFS: f64 = -14.0;

/// EBU R128 broadcast loudness target in LUFS
pub const BROADCAST_TARGET_LUFS: f64 = -23.0;

/// One mastering configuration snapshot
///
/// Immutable for the duration of one offline render; preview swaps in
/// whole snapshots at block boundaries, never individual fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasteringSettings {
    /// Input gain in dB (-12 to +12)
    pub input_gain_db: f32,

    /// Normalize integrated loudness to `target_lufs`
    pub normalize_loudness: bool,

    /// Loudness target in LUFS when normalization is enabled
    pub target_lufs: f64,

    /// Enable the true-peak limiter
    pub true_peak_limit: bool,

    /// Limiter ceiling in dB (-6 to 0)
    pub ceiling_db: f32,

    /// High-pass cleanup of sub-bass rumble (30 Hz corner when enabled)
    pub clean_low_end: bool,

    /// Gentle bus compression for cohesion
    pub glue_compression: bool,

    /// Cut boxy low-mids around 250 Hz
    pub cut_mud: bool,

    /// High-shelf sheen above 12 kHz
    pub add_air: bool,

    /// Tame harsh presence around 5 kHz
    pub tame_harsh: bool,

    /// EQ low band gain in dB, 80 Hz shelf (-12 to +12)
    pub eq_low_db: f32,
    /// EQ low-mid band gain in dB, 250 Hz peaking (-12 to +12)
    pub eq_low_mid_db: f32,
    /// EQ mid band gain in dB, 1 kHz peaking (-12 to +12)
    pub eq_mid_db: f32,
    /// EQ high-mid band gain in dB, 4 kHz peaking (-12 to +12)
    pub eq_high_mid_db: f32,
    /// EQ high band gain in dB, 12 kHz shelf (-12 to +12)
    pub eq_high_db: f32,

    /// Stereo width in percent (0 = mono, 100 = unity, 200 = double side)
    pub stereo_width_percent: f32,

    /// Output sample rate in Hz for export
    pub output_sample_rate_hz: u32,

    /// Output bit depth for export
    pub output_bit_depth: BitDepth,
}

impl Default for MasteringSettings {
    fn default() -> Self {
        Self {
            input_gain_db: 0.0,
            normalize_loudness: true,
            target_lufs: STREAMING_TARGET_LUFS,
            true_peak_limit: true,
            ceiling_db: -1.0,
            clean_low_end: true,
            glue_compression: false,
            cut_mud: false,
            add_air: false,
            tame_harsh: false,
            eq_low_db: 0.0,
            eq_low_mid_db: 0.0,
            eq_mid_db: 0.0,
            eq_high_mid_db: 0.0,
            eq_high_db: 0.0,
            stereo_width_percent: 100.0,
            output_sample_rate_hz: 44_100,
            output_bit_depth: BitDepth::Sixteen,
        }
    }
}

impl MasteringSettings {
    /// Return a copy with every numeric field clamped to its legal range
    #[must_use]
    pub fn clamped(&self) -> Self {
        let mut s = *self;
        s.input_gain_db = s.input_gain_db.clamp(-12.0, 12.0);
        s.target_lufs = s.target_lufs.clamp(-36.0, -6.0);
        s.ceiling_db = s.ceiling_db.clamp(-6.0, 0.0);
        s.eq_low_db = s.eq_low_db.clamp(-12.0, 12.0);
        s.eq_low_mid_db = s.eq_low_mid_db.clamp(-12.0, 12.0);
        s.eq_mid_db = s.eq_mid_db.clamp(-12.0, 12.0);
        s.eq_high_mid_db = s.eq_high_mid_db.clamp(-12.0, 12.0);
        s.eq_high_db = s.eq_high_db.clamp(-12.0, 12.0);
        s.stereo_width_percent = s.stereo_width_percent.clamp(0.0, 200.0);
        if s.output_sample_rate_hz == 0 {
            s.output_sample_rate_hz = 44_100;
        }
        s
    }

    /// The bypass snapshot: every stage at its neutral/identity parameters,
    /// input gain and stereo width at unity, normalization off
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            input_gain_db: 0.0,
            normalize_loudness: false,
            target_lufs: STREAMING_TARGET_LUFS,
            true_peak_limit: false,
            ceiling_db: -1.0,
            clean_low_end: false,
            glue_compression: false,
            cut_mud: false,
            add_air: false,
            tame_harsh: false,
            eq_low_db: 0.0,
            eq_low_mid_db: 0.0,
            eq_mid_db: 0.0,
            eq_high_mid_db: 0.0,
            eq_high_db: 0.0,
            stereo_width_percent: 100.0,
            output_sample_rate_hz: 44_100,
            output_bit_depth: BitDepth::Sixteen,
        }
    }

    /// The five EQ band gains in ascending frequency order
    pub fn eq_gains_db(&self) -> [f32; 5] {
        [
            self.eq_low_db,
            self.eq_low_mid_db,
            self.eq_mid_db,
            self.eq_high_mid_db,
            self.eq_high_db,
        ]
    }

    /// Set all five EQ band gains at once
    pub fn set_eq_gains_db(&mut self, gains: [f32; 5]) {
        self.eq_low_db = gains[0];
        self.eq_low_mid_db = gains[1];
        self.eq_mid_db = gains[2];
        self.eq_high_mid_db = gains[3];
        self.eq_high_db = gains[4];
    }

    /// Stereo width as a linear factor (0.0 to 2.0)
    pub fn stereo_width(&self) -> f32 {
        self.stereo_width_percent / 100.0
    }
}

/// Named EQ curves applied atomically to all five bands
///
/// Selecting a preset overwrites every band value; moving any single band
/// afterwards makes `matching()` return `None`, which is all the UI needs
/// to drop its preset indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EqPreset {
    /// All bands flat
    Flat,
    /// Lifted highs and high-mids
    Bright,
    /// Low-end weight, softened top
    Warm,
    /// Scooped low-mids with presence
    Punchy,
}

impl EqPreset {
    /// All selectable presets
    pub const ALL: [Self; 4] = [Self::Flat, Self::Bright, Self::Warm, Self::Punchy];

    /// Band gains for this preset (low, low-mid, mid, high-mid, high) in dB
    pub fn gains_db(&self) -> [f32; 5] {
        match self {
            Self::Flat => [0.0, 0.0, 0.0, 0.0, 0.0],
            Self::Bright => [-1.0, 0.0, 0.0, 1.5, 3.0],
            Self::Warm => [2.0, 1.0, 0.0, -1.0, -1.5],
            Self::Punchy => [1.5, -2.0, 0.0, 2.0, 1.0],
        }
    }

    /// Apply this preset's band gains to a settings snapshot
    pub fn apply_to(&self, settings: &mut MasteringSettings) {
        settings.set_eq_gains_db(self.gains_db());
    }

    /// Find the preset whose band values exactly match the snapshot, if any
    #[must_use]
    pub fn matching(settings: &MasteringSettings) -> Option<Self> {
        let gains = settings.eq_gains_db();
        Self::ALL.into_iter().find(|p| p.gains_db() == gains)
    }

    /// Preset name for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Bright => "bright",
            Self::Warm => "warm",
            Self::Punchy => "punchy",
        }
    }
}

impl std::fmt::Display for EqPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
