//! Preview engine
//!
//! Continuous processing driven by the host's real-time audio callback.
//! The engine owns a [`MasterChain`] exclusively; a [`PreviewController`]
//! on the UI side sends whole [`MasteringSettings`] snapshots through a
//! channel that the audio thread drains once per block. Updates therefore
//! land atomically at block boundaries - never torn mid-block - and the
//! audio path never blocks or allocates.
//!
//! The preview path runs the identical per-sample chain the offline
//! renderer uses, so what you hear is what exports.

use crossbeam::channel::{unbounded, Receiver, Sender};
use stanza_core::MasteringSettings;
use stanza_dsp::MasterChain;
use tracing::debug;

/// UI-side handle for pushing settings snapshots to a running preview
#[derive(Debug, Clone)]
pub struct PreviewController {
    tx: Sender<MasteringSettings>,
}

impl PreviewController {
    /// Queue a whole settings snapshot; it takes effect on the next block
    ///
    /// Sending never blocks. If the engine is gone the snapshot is simply
    /// dropped.
    pub fn update(&self, settings: MasteringSettings) {
        let _ = self.tx.send(settings);
    }
}

/// Real-time preview processor
pub struct PreviewEngine {
    chain: MasterChain,
    settings_rx: Receiver<MasteringSettings>,
    /// Last snapshot applied (or queued for when bypass lifts)
    active: MasteringSettings,
    /// Normalization gain to restore when bypass lifts
    normalization_gain_db: f32,
    bypass: bool,
}

impl PreviewEngine {
    /// Create a preview engine and its UI-side controller
    #[must_use]
    pub fn new(
        sample_rate: u32,
        channels: u16,
        settings: MasteringSettings,
    ) -> (Self, PreviewController) {
        let (tx, settings_rx) = unbounded();
        let engine = Self {
            chain: MasterChain::new(sample_rate, channels, &settings),
            settings_rx,
            active: settings.clamped(),
            normalization_gain_db: 0.0,
            bypass: false,
        };
        (engine, PreviewController { tx })
    }

    /// Set the loudness-normalization gain measured for the loaded source
    pub fn set_normalization_gain_db(&mut self, gain_db: f32) {
        self.normalization_gain_db = gain_db;
        if !self.bypass {
            self.chain.set_normalization_gain_db(gain_db);
        }
    }

    /// The snapshot currently driving the chain (or queued behind bypass)
    pub fn settings(&self) -> MasteringSettings {
        self.active
    }

    /// Whether the engine is bypassed
    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// Force every stage to its neutral parameters (true) or restore the
    /// active snapshot (false)
    ///
    /// Bypass keeps the whole topology in place - including input gain and
    /// width at unity and normalization at 0 dB - so toggling it compares
    /// processed against untouched audio on the same signal path.
    pub fn set_bypass(&mut self, bypass: bool) {
        if bypass == self.bypass {
            return;
        }
        self.bypass = bypass;
        if bypass {
            debug!("preview bypassed");
            self.chain.apply_settings(&MasteringSettings::neutral());
            self.chain.set_normalization_gain_db(0.0);
        } else {
            debug!("preview bypass lifted");
            self.chain.apply_settings(&self.active);
            self.chain.set_normalization_gain_db(self.normalization_gain_db);
        }
    }

    /// Process one interleaved block in place
    ///
    /// Drains queued settings snapshots first (keeping only the latest), so
    /// every update lands exactly at a block boundary.
    pub fn process_block(&mut self, block: &mut [f32]) {
        let mut latest = None;
        while let Ok(settings) = self.settings_rx.try_recv() {
            latest = Some(settings);
        }
        if let Some(settings) = latest {
            self.active = settings.clamped();
            if !self.bypass {
                self.chain.apply_settings(&self.active);
            }
        }

        self.chain.process_block(block);
    }

    /// Notify the engine of a discontinuous position change
    ///
    /// Filter and envelope state is reset so stale history never rings
    /// into the new position as a click.
    pub fn seek(&mut self) {
        debug!("preview seek: resetting chain state");
        self.chain.reset();
    }
}
