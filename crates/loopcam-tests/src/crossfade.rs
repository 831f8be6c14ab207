//! Track manager driving the software mixer.

use loopcam_audio::wav;
use loopcam_audio::{
    Mixer, MixerBackend, MixerConfig, PlaybackState, SharedMixer, TrackManager,
    TrackManagerConfig,
};
use loopcam_core::{AssetMetadata, AudioAsset, InstrumentTag, LoopCamError};
use std::sync::Arc;
use std::time::Duration;

fn setup(max_voices: usize) -> (TrackManager, SharedMixer) {
    let mixer = Mixer::shared(MixerConfig {
        sample_rate: 1_000,
        max_voices,
        master_gain_db: 0.0,
        limiter_enabled: false,
        ..Default::default()
    });
    let tracks = TrackManager::new(
        TrackManagerConfig {
            crossfade_ms: 500,
            default_gain_db: 0.0,
            gain_smoothing_ms: 0,
        },
        Arc::new(MixerBackend::new(Arc::clone(&mixer))),
    );
    (tracks, mixer)
}

fn constant(tag: &str, value: f32) -> AudioAsset {
    let params = wav::AudioContainerParams::new(1_000, 1, 16, 0.25).unwrap();
    AudioAsset::new(
        tag.into(),
        wav::encode_mono(&params, |_| value).unwrap(),
        AssetMetadata::new(None, None, 0.25).unwrap(),
    )
}

fn render(mixer: &SharedMixer, frames: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; frames * 2];
    mixer.lock().render(&mut out);
    out
}

#[tokio::test(start_paused = true)]
async fn new_track_fades_in() {
    let (tracks, mixer) = setup(4);
    tracks.submit("DRUMS".into(), constant("DRUMS", 0.5)).await.unwrap();

    let out = render(&mixer, 500);
    assert!(out[0].abs() < 0.01);
    assert!((out[2 * 250] - 0.25).abs() < 0.01);
    assert!((out[2 * 499] - 0.5).abs() < 0.01);
}

#[tokio::test(start_paused = true)]
async fn replacement_crossfades_and_frees_old_voice() {
    let (tracks, mixer) = setup(4);
    let tag = InstrumentTag::new("DRUMS");
    tracks.submit(tag.clone(), constant("DRUMS", 0.5)).await.unwrap();
    render(&mixer, 500);

    let b = constant("DRUMS", 0.25);
    tracks.submit(tag.clone(), b.clone()).await.unwrap();
    assert_eq!(mixer.lock().voice_count(), 2);

    // Old voice ramps 0.5 -> 0, new one plays at 0.25 from the start.
    let out = render(&mixer, 500);
    assert!((out[0] - 0.75).abs() < 0.01);
    assert!((out[2 * 250] - 0.5).abs() < 0.01);
    assert!((out[2 * 499] - 0.25).abs() < 0.01);

    tokio::time::sleep(Duration::from_millis(501)).await;
    assert_eq!(mixer.lock().voice_count(), 1);
    let snap = tracks.snapshot(&tag).await.unwrap();
    assert_eq!(snap.asset_id, b.id());
}

#[tokio::test(start_paused = true)]
async fn voice_limit_reports_exhaustion_and_keeps_track() {
    let (tracks, mixer) = setup(2);
    let tag = InstrumentTag::new("BASS");
    let first = tracks.submit(tag.clone(), constant("BASS", 0.1)).await.unwrap();
    tracks.submit("KEYS".into(), constant("KEYS", 0.1)).await.unwrap();

    let err = tracks.submit(tag.clone(), constant("BASS", 0.2)).await.unwrap_err();
    assert!(matches!(err, LoopCamError::ResourceExhausted(_)));
    assert_eq!(tracks.snapshot(&tag).await.unwrap(), first);
    assert_eq!(mixer.lock().voice_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_all_frees_every_voice() {
    let (tracks, mixer) = setup(8);
    for tag in ["DRUMS", "BASS", "FX"] {
        tracks.submit(tag.into(), constant(tag, 0.1)).await.unwrap();
    }
    tracks.submit("FX".into(), constant("FX", 0.2)).await.unwrap();
    assert_eq!(mixer.lock().voice_count(), 4);

    tracks.stop_all().await;
    assert_eq!(mixer.lock().voice_count(), 0);
    assert!(render(&mixer, 16).iter().all(|s| *s == 0.0));
    assert!(tracks
        .snapshots()
        .await
        .iter()
        .all(|s| s.playback_state == PlaybackState::Stopped));
}

#[tokio::test(start_paused = true)]
async fn muted_track_is_silent_but_keeps_gain() {
    let (tracks, mixer) = setup(4);
    let tag = InstrumentTag::new("VOCALS");
    tracks.submit(tag.clone(), constant("VOCALS", 0.5)).await.unwrap();
    render(&mixer, 600);

    tracks.set_mute(&tag, true).await.unwrap();
    assert!(render(&mixer, 16).iter().all(|s| *s == 0.0));

    let snap = tracks.set_mute(&tag, false).await.unwrap();
    assert_eq!(snap.gain_db, 0.0);
    assert!((render(&mixer, 1)[0] - 0.5).abs() < 0.01);
}
