/// Shared dynamic range processor
///
/// One feed-forward gain-computer + smoothing model parametrized per use:
/// the glue compressor and the true-peak limiter are the same code with
/// different parameters. A disabled instance runs with threshold 0 dB and
/// ratio 1:1 instead of leaving the signal path, so the processing topology
/// is identical whether a stage is enabled or not.

/// Ratio at or above which an instance behaves as a brick-wall limiter and
/// enforces its ceiling with a final per-frame guard
const BRICKWALL_RATIO: f32 = 20.0;

/// Peak detector release time; long enough to hold peaks across waveform
/// cycles for a stable level estimate
const PEAK_RELEASE_MS: f32 = 50.0;

/// Level considered silence by the detector
const NOISE_FLOOR_DB: f32 = -120.0;

/// Dynamics parameters (threshold, ratio, knee, attack, release)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsParams {
    /// Threshold in dB (-60 to 0)
    pub threshold_db: f32,
    /// Compression ratio (1.0 = pass-through, 20.0 = brick-wall)
    pub ratio: f32,
    /// Knee width in dB (0 = hard knee)
    pub knee_db: f32,
    /// Attack time in milliseconds
    pub attack_ms: f32,
    /// Release time in milliseconds
    pub release_ms: f32,
}

impl DynamicsParams {
    /// Glue compressor: gentle cohesion on the mix bus
    ///
    /// Disabled keeps the stage in place at threshold 0 dB / ratio 1:1.
    pub fn glue(enabled: bool) -> Self {
        if enabled {
            Self {
                threshold_db: -18.0,
                ratio: 3.0,
                knee_db: 10.0,
                attack_ms: 20.0,
                release_ms: 250.0,
            }
        } else {
            Self {
                threshold_db: 0.0,
                ratio: 1.0,
                knee_db: 10.0,
                attack_ms: 20.0,
                release_ms: 250.0,
            }
        }
    }

    /// True-peak limiter at the given ceiling
    ///
    /// Disabled keeps the stage in place at threshold 0 dB / ratio 1:1.
    pub fn limiter(enabled: bool, ceiling_db: f32) -> Self {
        if enabled {
            Self {
                threshold_db: ceiling_db.clamp(-6.0, 0.0),
                ratio: BRICKWALL_RATIO,
                knee_db: 0.0,
                attack_ms: 1.0,
                release_ms: 50.0,
            }
        } else {
            Self {
                threshold_db: 0.0,
                ratio: 1.0,
                knee_db: 0.0,
                attack_ms: 1.0,
                release_ms: 50.0,
            }
        }
    }

    /// Clamp all fields to safe ranges
    pub fn validate(&mut self) {
        self.threshold_db = self.threshold_db.clamp(-60.0, 0.0);
        self.ratio = self.ratio.clamp(1.0, 20.0);
        self.knee_db = self.knee_db.clamp(0.0, 10.0);
        self.attack_ms = self.attack_ms.clamp(0.1, 100.0);
        self.release_ms = self.release_ms.clamp(10.0, 1000.0);
    }

    /// Whether this instance enforces its threshold as a hard ceiling
    pub fn is_brickwall(&self) -> bool {
        self.ratio >= BRICKWALL_RATIO
    }
}

/// Feed-forward dynamics processor with linked-stereo detection
///
/// Two-stage envelope design:
/// 1. Peak level detection with instant attack and slow release, holding
///    peaks across waveform cycles for a stable level estimate.
/// 2. Gain-reduction smoothing with the configured attack/release times.
///
/// The two are independent: the peak detector governs level accuracy, the
/// gain smoother governs timing.
#[derive(Debug, Clone)]
pub struct Dynamics {
    params: DynamicsParams,

    // Peak level detector (dB), instant attack / slow release
    peak_level_db: f32,
    // Smoothed gain reduction (dB, negative = attenuating)
    gain_reduction_db: f32,

    // Coefficient cache
    peak_release_coeff: f32,
    gr_attack_coeff: f32,
    gr_release_coeff: f32,
    threshold_linear: f32,

    sample_rate: u32,
}

impl Dynamics {
    /// Create a processor for the given parameters and sample rate
    #[must_use]
    pub fn new(mut params: DynamicsParams, sample_rate: u32) -> Self {
        params.validate();
        let mut dynamics = Self {
            params,
            peak_level_db: NOISE_FLOOR_DB,
            gain_reduction_db: 0.0,
            peak_release_coeff: 0.0,
            gr_attack_coeff: 0.0,
            gr_release_coeff: 0.0,
            threshold_linear: 1.0,
            sample_rate,
        };
        dynamics.update_coefficients();
        dynamics
    }

    /// Current parameters
    pub fn params(&self) -> DynamicsParams {
        self.params
    }

    /// Swap in new parameters, preserving the envelope state
    pub fn set_params(&mut self, mut params: DynamicsParams) {
        params.validate();
        if params != self.params {
            self.params = params;
            self.update_coefficients();
        }
    }

    fn update_coefficients(&mut self) {
        let sr = self.sample_rate as f32;

        let peak_release_samples = PEAK_RELEASE_MS * sr / 1000.0;
        self.peak_release_coeff = (-1.0 / peak_release_samples).exp();

        // coeff = exp(-1 / (time_ms * sr / 1000)) gives 63.2% response at
        // the configured time
        let attack_samples = self.params.attack_ms * sr / 1000.0;
        let release_samples = self.params.release_ms * sr / 1000.0;
        self.gr_attack_coeff = (-1.0 / attack_samples).exp();
        self.gr_release_coeff = (-1.0 / release_samples).exp();

        self.threshold_linear = 10.0_f32.powf(self.params.threshold_db / 20.0);
    }

    /// Desired output level for a given input level (dB in, dB out)
    #[inline]
    fn compute_output_level(&self, input_db: f32) -> f32 {
        let threshold = self.params.threshold_db;
        let ratio = self.params.ratio;
        let knee = self.params.knee_db;

        if knee <= 0.0 {
            if input_db <= threshold {
                input_db
            } else {
                threshold + (input_db - threshold) / ratio
            }
        } else {
            let half_knee = knee / 2.0;
            if input_db <= threshold - half_knee {
                input_db
            } else if input_db >= threshold + half_knee {
                threshold + (input_db - threshold) / ratio
            } else {
                // Quadratic transition through the knee region
                let x = input_db - (threshold - half_knee);
                let slope_change = (1.0 - 1.0 / ratio) / (2.0 * knee);
                input_db - slope_change * x * x
            }
        }
    }

    /// Gain reduction in dB for a given input level (negative = attenuate)
    #[inline]
    fn compute_gain_reduction(&self, input_db: f32) -> f32 {
        self.compute_output_level(input_db) - input_db
    }

    #[inline]
    fn update_peak_level(&mut self, input_db: f32) {
        if input_db > self.peak_level_db {
            // Instant attack
            self.peak_level_db = input_db;
        } else {
            // Decay toward the noise floor, not the input, which can be
            // -inf at zero crossings
            self.peak_level_db =
                self.peak_release_coeff * (self.peak_level_db - NOISE_FLOOR_DB) + NOISE_FLOOR_DB;
        }
    }

    #[inline]
    fn smooth_gain_reduction(&mut self, target_gr_db: f32) {
        let coeff = if target_gr_db < self.gain_reduction_db {
            self.gr_attack_coeff
        } else {
            self.gr_release_coeff
        };
        self.gain_reduction_db = coeff * self.gain_reduction_db + (1.0 - coeff) * target_gr_db;
    }

    /// Process one interleaved frame in place (one sample per channel)
    ///
    /// Gain is computed from the loudest channel and applied to all
    /// channels equally, preserving the stereo image. At brick-wall ratios
    /// a final guard clamps residual overshoot to the threshold, so the
    /// ceiling bound holds even during the attack transient.
    #[inline]
    pub fn process_frame(&mut self, frame: &mut [f32]) {
        let peak = frame.iter().map(|s| s.abs()).fold(0.0_f32, f32::max);

        let input_db = if peak > 1e-10 {
            20.0 * peak.log10()
        } else {
            -200.0
        };

        self.update_peak_level(input_db);
        let target_gr_db = self.compute_gain_reduction(self.peak_level_db);
        self.smooth_gain_reduction(target_gr_db);

        let gain = 10.0_f32.powf(self.gain_reduction_db / 20.0);
        for sample in frame.iter_mut() {
            *sample *= gain;
        }

        if self.params.is_brickwall() {
            for sample in frame.iter_mut() {
                *sample = sample.clamp(-self.threshold_linear, self.threshold_linear);
            }
        }
    }

    /// Clear the envelope state
    pub fn reset(&mut self) {
        self.peak_level_db = NOISE_FLOOR_DB;
        self.gain_reduction_db = 0.0;
    }

    /// Current gain reduction in dB (0 = none)
    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }
}
