//! Software mixer: loops decoded clips into an interleaved stereo output.
//!
//! Each voice carries its own gain envelope. A ramp is described once by a
//! target and a duration and then advanced per rendered frame, so fades are
//! sample-accurate and need no timer ticks.

use crate::gain::db_to_linear;
use crate::wav::DecodedAudio;
use loopcam_core::{LoopCamError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Mixer shared between the track manager and the output callback.
pub type SharedMixer = Arc<Mutex<Mixer>>;

/// Mixer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Output sample rate (Hz). The output device may override it.
    pub sample_rate: u32,
    /// Maximum simultaneous voices, including ones fading out.
    pub max_voices: usize,
    /// Master gain in dB.
    pub master_gain_db: f32,
    /// Whether the output hard limiter is active.
    pub limiter_enabled: bool,
    /// Limiter ceiling in dBFS.
    pub limiter_ceiling_db: f32,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            max_voices: 16,
            master_gain_db: -6.0,
            limiter_enabled: true,
            limiter_ceiling_db: -1.0,
        }
    }
}

/// Handle to a voice inside the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(u64);

struct Voice {
    id: VoiceId,
    clip: Arc<DecodedAudio>,
    /// Read position in source frames.
    position: f64,
    playing: bool,
    muted: bool,
    gain: f32,
    target: f32,
    increment: f32,
    ramp_remaining: u64,
}

impl Voice {
    fn new(id: VoiceId, clip: Arc<DecodedAudio>) -> Self {
        Self {
            id,
            clip,
            position: 0.0,
            playing: false,
            muted: false,
            gain: 1.0,
            target: 1.0,
            increment: 0.0,
            ramp_remaining: 0,
        }
    }

    fn ramp_to(&mut self, target: f32, frames: u64) {
        self.target = target;
        if frames == 0 {
            self.gain = target;
            self.increment = 0.0;
            self.ramp_remaining = 0;
        } else {
            self.increment = (target - self.gain) / frames as f32;
            self.ramp_remaining = frames;
        }
    }

    fn next_gain(&mut self) -> f32 {
        if self.ramp_remaining > 0 {
            self.ramp_remaining -= 1;
            self.gain = if self.ramp_remaining == 0 {
                self.target
            } else {
                self.gain + self.increment
            };
        }
        self.gain
    }

    /// Linearly interpolated stereo frame at the current position; loops.
    fn read(&self) -> (f32, f32) {
        let frames = self.clip.frames();
        let i = self.position as usize % frames;
        let frac = (self.position - self.position.floor()) as f32;
        let (l0, r0) = self.clip.stereo_frame(i);
        let (l1, r1) = self.clip.stereo_frame((i + 1) % frames);
        (l0 + (l1 - l0) * frac, r0 + (r1 - r0) * frac)
    }

    fn advance(&mut self, step: f64) {
        let frames = self.clip.frames() as f64;
        self.position += step;
        if self.position >= frames {
            self.position %= frames;
        }
    }
}

/// Audio mixer that combines looping voices into stereo output.
pub struct Mixer {
    config: MixerConfig,
    voices: Vec<Voice>,
    next_id: u64,
    master_gain: f32,
    limiter_ceiling: f32,
}

impl Mixer {
    /// Create an empty mixer.
    pub fn new(config: MixerConfig) -> Self {
        let master_gain = db_to_linear(config.master_gain_db);
        let limiter_ceiling = 10f32.powf(config.limiter_ceiling_db / 20.0);
        Self {
            config,
            voices: Vec::new(),
            next_id: 0,
            master_gain,
            limiter_ceiling,
        }
    }

    /// Create a mixer wrapped for sharing.
    pub fn shared(config: MixerConfig) -> SharedMixer {
        Arc::new(Mutex::new(Self::new(config)))
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Adopt the output device's rate. Running ramps keep their frame counts.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.config.sample_rate = sample_rate.max(1);
    }

    /// Number of allocated voices, playing or not.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn max_voices(&self) -> usize {
        self.config.max_voices
    }

    /// Allocate a stopped voice for `clip`.
    pub fn add_voice(&mut self, clip: Arc<DecodedAudio>) -> Result<VoiceId> {
        if self.voices.len() >= self.config.max_voices {
            return Err(LoopCamError::ResourceExhausted(format!(
                "all {} mixer voices in use",
                self.config.max_voices
            )));
        }
        if clip.frames() == 0 {
            return Err(LoopCamError::DecodeError("clip has no frames".into()));
        }
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        self.voices.push(Voice::new(id, clip));
        Ok(id)
    }

    /// Free a voice. Returns false if it was already gone.
    pub fn remove_voice(&mut self, id: VoiceId) -> bool {
        let before = self.voices.len();
        self.voices.retain(|v| v.id != id);
        self.voices.len() != before
    }

    fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.id == id)
    }

    fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id == id)
    }

    pub fn start_voice(&mut self, id: VoiceId) {
        if let Some(v) = self.voice_mut(id) {
            v.playing = true;
        }
    }

    /// Stop and rewind a voice.
    pub fn stop_voice(&mut self, id: VoiceId) {
        if let Some(v) = self.voice_mut(id) {
            v.playing = false;
            v.position = 0.0;
        }
    }

    /// Move a voice's gain to `target` over `ramp`.
    pub fn ramp_voice(&mut self, id: VoiceId, target: f32, ramp: Duration) {
        let frames = (ramp.as_secs_f64() * self.config.sample_rate as f64).round() as u64;
        if let Some(v) = self.voice_mut(id) {
            v.ramp_to(target.max(0.0), frames);
        }
    }

    pub fn set_voice_muted(&mut self, id: VoiceId, muted: bool) {
        if let Some(v) = self.voice_mut(id) {
            v.muted = muted;
        }
    }

    /// Current envelope gain of a voice (mute not applied).
    pub fn voice_gain(&self, id: VoiceId) -> Option<f32> {
        self.voice(id).map(|v| v.gain)
    }

    pub fn is_voice_playing(&self, id: VoiceId) -> bool {
        self.voice(id).is_some_and(|v| v.playing)
    }

    /// Render `out.len() / 2` interleaved stereo frames.
    pub fn render(&mut self, out: &mut [f32]) {
        for s in out.iter_mut() {
            *s = 0.0;
        }
        let frame_count = out.len() / 2;
        let out_rate = self.config.sample_rate as f64;

        for voice in self.voices.iter_mut().filter(|v| v.playing) {
            let step = voice.clip.params.sample_rate as f64 / out_rate;
            for frame in 0..frame_count {
                let gain = voice.next_gain();
                if !voice.muted && gain > 0.0 {
                    let (l, r) = voice.read();
                    out[frame * 2] += l * gain;
                    out[frame * 2 + 1] += r * gain;
                }
                voice.advance(step);
            }
        }

        for s in out.iter_mut() {
            *s *= self.master_gain;
        }

        if self.config.limiter_enabled {
            let ceiling = self.limiter_ceiling;
            for s in out.iter_mut() {
                *s = s.clamp(-ceiling, ceiling);
            }
        }
    }
}

/// Render from the audio thread without waiting on the lock.
///
/// Writes silence and returns false when another thread holds the mixer.
pub fn render_or_silence(mixer: &SharedMixer, out: &mut [f32]) -> bool {
    match mixer.try_lock() {
        Some(mut guard) => {
            guard.render(out);
            true
        }
        None => {
            out.fill(0.0);
            false
        }
    }
}
