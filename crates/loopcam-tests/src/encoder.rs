//! Encoder output played through the mixer.

use loopcam_audio::wav::{self, AudioContainerParams};
use loopcam_audio::{Mixer, MixerConfig};
use std::sync::Arc;

fn quiet_mixer() -> Mixer {
    Mixer::new(MixerConfig {
        sample_rate: 44_100,
        master_gain_db: 0.0,
        limiter_enabled: false,
        ..Default::default()
    })
}

#[test]
fn placeholder_tone_is_audible_in_mixer() {
    let clip = wav::decode(&wav::placeholder_tone(Some(120.0), 1.0)).unwrap();
    let mut mixer = quiet_mixer();
    let voice = mixer.add_voice(Arc::new(clip)).unwrap();
    mixer.start_voice(voice);

    let mut out = vec![0.0f32; 2 * 22_050];
    mixer.render(&mut out);
    let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.4 && peak <= 0.5 + 1e-3, "peak {peak}");
}

#[test]
fn fallback_silence_renders_silence() {
    let clip = wav::decode(&wav::fallback_silence()).unwrap();
    let mut mixer = quiet_mixer();
    let voice = mixer.add_voice(Arc::new(clip)).unwrap();
    mixer.start_voice(voice);

    let mut out = vec![1.0f32; 512];
    mixer.render(&mut out);
    assert!(out.iter().all(|s| *s == 0.0));
}

#[test]
fn stereo_24_bit_clip_keeps_channels_apart() {
    let params = AudioContainerParams::new(44_100, 2, 24, 0.01).unwrap();
    let bytes = wav::encode(&params, |_, ch| if ch == 0 { 0.5 } else { -0.5 }).unwrap();
    let clip = wav::decode(&bytes).unwrap();
    assert_eq!(clip.frames(), 441);

    let mut mixer = quiet_mixer();
    let voice = mixer.add_voice(Arc::new(clip)).unwrap();
    mixer.start_voice(voice);
    let mut out = vec![0.0f32; 8];
    mixer.render(&mut out);
    for frame in out.chunks(2) {
        assert!((frame[0] - 0.5).abs() < 1e-3);
        assert!((frame[1] + 0.5).abs() < 1e-3);
    }
}
