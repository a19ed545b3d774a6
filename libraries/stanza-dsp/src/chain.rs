/// The mastering signal chain
///
/// One ordered list of stage parameters resolved from a settings snapshot,
/// plus one mutable state arena (filter histories, envelope states) owned
/// by the running graph instance. Preview and offline render both drive
/// [`MasterChain::process_block`], so the two modes are sample-identical by
/// construction.
///
/// Stage order is load-bearing: head gain (normalization x input gain) ->
/// cleanup high-pass -> 5-band EQ -> mud cut -> harshness tame -> air boost
/// -> glue compressor -> true-peak limiter -> stereo width. The polish
/// filters sit after the user EQ so presets stay predictable regardless of
/// the polish toggles.
use stanza_core::MasteringSettings;
use tracing::debug;

use crate::biquad::{Biquad, BiquadCoeffs};
use crate::dynamics::{Dynamics, DynamicsParams};
use crate::stereo::StereoWidth;

/// Number of second-order sections in the filter cascade
const CASCADE_LEN: usize = 9;

// Cleanup high-pass: present in both states, corner swapped so disabling
// never changes the topology
const HIGHPASS_OFF_HZ: f32 = 1.0;
const HIGHPASS_ON_HZ: f32 = 30.0;
const HIGHPASS_Q: f32 = 0.7;

// 5-band EQ layout
const EQ_LOW_HZ: f32 = 80.0;
const EQ_LOW_MID_HZ: f32 = 250.0;
const EQ_MID_HZ: f32 = 1000.0;
const EQ_HIGH_MID_HZ: f32 = 4000.0;
const EQ_HIGH_HZ: f32 = 12_000.0;
const EQ_BAND_Q: f32 = 1.0;
const SHELF_Q: f32 = 0.707;

// Polish filters
const MUD_HZ: f32 = 250.0;
const MUD_Q: f32 = 1.5;
const MUD_CUT_DB: f32 = -3.0;
const HARSH_HZ: f32 = 5000.0;
const HARSH_Q: f32 = 2.0;
const HARSH_CUT_DB: f32 = -2.0;
const AIR_HZ: f32 = 12_000.0;
const AIR_BOOST_DB: f32 = 2.5;

/// Resolve the filter cascade coefficients for a clamped settings snapshot
///
/// Pure function of (settings, sample rate): both render modes share it.
fn cascade_coeffs(settings: &MasteringSettings, sample_rate: f32) -> [BiquadCoeffs; CASCADE_LEN] {
    let highpass_hz = if settings.clean_low_end {
        HIGHPASS_ON_HZ
    } else {
        HIGHPASS_OFF_HZ
    };

    [
        BiquadCoeffs::high_pass(sample_rate, highpass_hz, HIGHPASS_Q),
        BiquadCoeffs::low_shelf(sample_rate, EQ_LOW_HZ, SHELF_Q, settings.eq_low_db),
        BiquadCoeffs::peaking(sample_rate, EQ_LOW_MID_HZ, EQ_BAND_Q, settings.eq_low_mid_db),
        BiquadCoeffs::peaking(sample_rate, EQ_MID_HZ, EQ_BAND_Q, settings.eq_mid_db),
        BiquadCoeffs::peaking(sample_rate, EQ_HIGH_MID_HZ, EQ_BAND_Q, settings.eq_high_mid_db),
        BiquadCoeffs::high_shelf(sample_rate, EQ_HIGH_HZ, SHELF_Q, settings.eq_high_db),
        BiquadCoeffs::peaking(
            sample_rate,
            MUD_HZ,
            MUD_Q,
            if settings.cut_mud { MUD_CUT_DB } else { 0.0 },
        ),
        BiquadCoeffs::peaking(
            sample_rate,
            HARSH_HZ,
            HARSH_Q,
            if settings.tame_harsh { HARSH_CUT_DB } else { 0.0 },
        ),
        BiquadCoeffs::high_shelf(
            sample_rate,
            AIR_HZ,
            SHELF_Q,
            if settings.add_air { AIR_BOOST_DB } else { 0.0 },
        ),
    ]
}

/// One running instance of the mastering graph
///
/// Owns all mutable per-stage state exclusively. `process_block` allocates
/// nothing and never blocks, so it is safe on a real-time audio path.
pub struct MasterChain {
    sample_rate: u32,
    channels: usize,

    /// Normalization gain folded with input gain into one head multiply
    normalization_gain_db: f32,
    input_gain_db: f32,
    head_gain: f32,

    cascade: [Biquad; CASCADE_LEN],
    glue: Dynamics,
    limiter: Dynamics,
    width: StereoWidth,
}

impl MasterChain {
    /// Create a chain for the given stream layout and settings snapshot
    #[must_use]
    pub fn new(sample_rate: u32, channels: u16, settings: &MasteringSettings) -> Self {
        let settings = settings.clamped();
        let coeffs = cascade_coeffs(&settings, sample_rate as f32);

        let mut chain = Self {
            sample_rate,
            channels: usize::from(channels.clamp(1, 2)),
            normalization_gain_db: 0.0,
            input_gain_db: settings.input_gain_db,
            head_gain: 1.0,
            cascade: std::array::from_fn(|i| Biquad::new(coeffs[i])),
            glue: Dynamics::new(DynamicsParams::glue(settings.glue_compression), sample_rate),
            limiter: Dynamics::new(
                DynamicsParams::limiter(settings.true_peak_limit, settings.ceiling_db),
                sample_rate,
            ),
            width: StereoWidth::new(settings.stereo_width()),
        };
        chain.update_head_gain();
        chain
    }

    /// Apply a new settings snapshot in place
    ///
    /// Recomputes every stage's parameters while preserving filter delay
    /// lines and envelope state, so a change between blocks never injects a
    /// transient. Values out of range are clamped, never rejected.
    pub fn apply_settings(&mut self, settings: &MasteringSettings) {
        let settings = settings.clamped();
        debug!(input_gain_db = settings.input_gain_db, "updating chain parameters");

        let coeffs = cascade_coeffs(&settings, self.sample_rate as f32);
        for (filter, c) in self.cascade.iter_mut().zip(coeffs.iter()) {
            filter.set_coeffs(*c);
        }

        self.glue
            .set_params(DynamicsParams::glue(settings.glue_compression));
        self.limiter.set_params(DynamicsParams::limiter(
            settings.true_peak_limit,
            settings.ceiling_db,
        ));
        self.width.set_width(settings.stereo_width());

        self.input_gain_db = settings.input_gain_db;
        self.update_head_gain();
    }

    /// Set the loudness-normalization gain computed by the analyzer
    pub fn set_normalization_gain_db(&mut self, gain_db: f32) {
        self.normalization_gain_db = gain_db;
        self.update_head_gain();
    }

    /// The current normalization gain in dB
    pub fn normalization_gain_db(&self) -> f32 {
        self.normalization_gain_db
    }

    fn update_head_gain(&mut self) {
        self.head_gain = 10.0_f32.powf((self.normalization_gain_db + self.input_gain_db) / 20.0);
    }

    /// Sample rate this chain was built for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count this chain was built for
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Process one interleaved block in place
    ///
    /// The block length must be a multiple of the channel count; a trailing
    /// partial frame is left untouched.
    pub fn process_block(&mut self, block: &mut [f32]) {
        let channels = self.channels;
        for frame in block.chunks_exact_mut(channels) {
            for sample in frame.iter_mut() {
                *sample *= self.head_gain;
            }

            for filter in &mut self.cascade {
                filter.process_frame(frame);
            }

            self.glue.process_frame(frame);
            self.limiter.process_frame(frame);
            self.width.process_frame(frame);
        }
    }

    /// Reset all filter and envelope state (seek / discontinuous jump)
    pub fn reset(&mut self) {
        for filter in &mut self.cascade {
            filter.reset();
        }
        self.glue.reset();
        self.limiter.reset();
    }
}
