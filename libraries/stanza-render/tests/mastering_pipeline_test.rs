//! End-to-end pipeline verification: the headline scenario (normalize a
//! quiet sine to the streaming target under a peak ceiling), preview vs
//! offline equivalence, and mid-render cancellation.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stanza_core::{MasteringSettings, SampleBuffer, SampleRate};
use stanza_loudness::measure;
use stanza_render::{OfflineRenderer, PreviewEngine, RenderError};

const SR: u32 = 44_100;

fn stereo_sine(amplitude: f32, secs: f32) -> SampleBuffer {
    let frames = (SR as f32 * secs) as usize;
    let samples: Vec<f32> = (0..frames)
        .flat_map(|i| {
            let t = i as f32 / SR as f32;
            let s = amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            [s, s]
        })
        .collect();
    SampleBuffer::new(samples, 2, SampleRate::new(SR)).unwrap()
}

fn decode_to_buffer(bytes: &[u8]) -> SampleBuffer {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    let scale = match spec.bits_per_sample {
        16 => 32_767.0_f32,
        24 => 8_388_607.0,
        other => panic!("unexpected bit depth {other}"),
    };
    let samples: Vec<f32> = reader
        .samples::<i32>()
        .map(|s| s.unwrap() as f32 / scale)
        .collect();
    SampleBuffer::new(samples, spec.channels, SampleRate::new(spec.sample_rate)).unwrap()
}

#[test]
fn quiet_sine_masters_to_streaming_target() {
    // 2-second stereo sine at -20 dBFS, every setting at its default
    let source = stereo_sine(0.1, 2.0);
    let settings = MasteringSettings::default();

    let mut renderer = OfflineRenderer::new();
    let output = renderer.render(Some(&source), &settings).unwrap();
    assert!(output.normalization.is_applied());

    let decoded = decode_to_buffer(&output.data);
    assert_eq!(decoded.sample_rate().as_hz(), 44_100);
    assert_eq!(decoded.channels(), 2);

    let loudness = measure(&decoded).integrated_lufs;
    assert!(
        (loudness - -14.0).abs() < 0.3,
        "expected -14 LUFS +/- 0.3, got {loudness:.2}"
    );

    // Ceiling -1 dB: no sample exceeds it (plus overshoot tolerance)
    let ceiling = 10.0_f32.powf((-1.0 + 0.3) / 20.0);
    assert!(decoded.peak() <= ceiling, "peak {} over ceiling", decoded.peak());
}

#[test]
fn hot_signal_is_held_under_the_ceiling() {
    // Drive a full-scale sine 6 dB over the ceiling with normalization off
    let source = stereo_sine(0.5, 1.0);
    let mut settings = MasteringSettings::default();
    settings.normalize_loudness = false;
    settings.input_gain_db = 6.0;
    settings.ceiling_db = -1.0;

    let mut renderer = OfflineRenderer::new();
    let output = renderer.render(Some(&source), &settings).unwrap();
    let decoded = decode_to_buffer(&output.data);

    let ceiling = 10.0_f32.powf((-1.0 + 0.3) / 20.0);
    assert!(
        decoded.peak() <= ceiling,
        "peak {} exceeds -1 dB ceiling", decoded.peak()
    );
}

#[test]
fn preview_and_offline_render_identically() {
    let source = stereo_sine(0.1, 1.0);
    let mut settings = MasteringSettings::default();
    settings.glue_compression = true;
    settings.cut_mud = true;
    settings.add_air = true;
    settings.stereo_width_percent = 140.0;

    // Offline: pre-encode buffer plus the normalization gain it measured
    let mut renderer = OfflineRenderer::new();
    let (offline, outcome) = renderer.render_buffer(Some(&source), &settings).unwrap();
    let gain_db = outcome.gain_db().unwrap();

    // Preview: same settings, same gain, deliberately awkward block size
    let (mut engine, _controller) = PreviewEngine::new(SR, 2, settings);
    engine.set_normalization_gain_db(gain_db as f32);
    let mut live = source.samples().to_vec();
    for block in live.chunks_mut(666) {
        engine.process_block(block);
    }

    assert_eq!(live.len(), offline.len());
    for (i, (a, b)) in live.iter().zip(offline.samples().iter()).enumerate() {
        assert_eq!(a, b, "preview and offline diverge at sample {i}");
    }
}

#[test]
fn mid_render_cancellation_yields_cancelled_not_output() {
    let source = stereo_sine(0.1, 2.0);

    let cancelled_flag = Arc::new(AtomicBool::new(false));
    let mut renderer = OfflineRenderer::new();
    let token = renderer.cancellation_token();
    let flag = Arc::clone(&cancelled_flag);
    renderer = renderer.on_progress(Box::new(move |pct, _| {
        if pct >= 20 {
            token.cancel();
            flag.store(true, Ordering::Relaxed);
        }
    }));

    let result = renderer.render(Some(&source), &MasteringSettings::default());
    assert!(cancelled_flag.load(Ordering::Relaxed), "cancel hook never fired");
    assert!(matches!(result, Err(RenderError::Cancelled)));
}

#[test]
fn mono_source_renders_end_to_end() {
    let frames = SR as usize;
    let samples: Vec<f32> = (0..frames)
        .map(|i| 0.1 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / SR as f32).sin())
        .collect();
    let source = SampleBuffer::new(samples, 1, SampleRate::new(SR)).unwrap();

    let mut renderer = OfflineRenderer::new();
    let output = renderer.render(Some(&source), &MasteringSettings::default()).unwrap();
    assert_eq!(output.channels, 1);

    let decoded = decode_to_buffer(&output.data);
    let loudness = measure(&decoded).integrated_lufs;
    assert!((loudness - -14.0).abs() < 0.3, "mono normalization off target: {loudness:.2}");
}

#[test]
fn export_resamples_to_requested_rate() {
    let source = stereo_sine(0.1, 1.0);
    let mut settings = MasteringSettings::default();
    settings.output_sample_rate_hz = 48_000;

    let mut renderer = OfflineRenderer::new();
    let output = renderer.render(Some(&source), &settings).unwrap();
    assert_eq!(output.sample_rate, 48_000);

    let decoded = decode_to_buffer(&output.data);
    let expected_frames = (source.frames() as f64 * 48_000.0 / 44_100.0).round() as usize;
    assert_eq!(decoded.frames(), expected_frames);
    // Loudness survives the rate change
    let loudness = measure(&decoded).integrated_lufs;
    assert!((loudness - -14.0).abs() < 0.4, "loudness after resample: {loudness:.2}");
}

#[test]
fn neutral_render_passes_input_through() {
    let source = stereo_sine(0.25, 1.0);
    let mut renderer = OfflineRenderer::new();
    let (processed, outcome) = renderer
        .render_buffer(Some(&source), &MasteringSettings::neutral())
        .unwrap();
    assert!(!outcome.is_applied());

    for (a, b) in source.samples().iter().zip(processed.samples().iter()) {
        assert!(
            (a - b).abs() < 0.01,
            "neutral settings must pass audio through: {a} vs {b}"
        );
    }
}
