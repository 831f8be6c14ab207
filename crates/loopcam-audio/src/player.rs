//! Playback capability and its two backends.
//!
//! The track manager only talks to [`Player`] handles obtained from a
//! [`PlayerBackend`] chosen when the manager is built:
//! - [`MixerBackend`]: voices in the software [`Mixer`](crate::mixer::Mixer)
//! - [`NullBackend`]: headless bookkeeping, used without an output device

use crate::mixer::{SharedMixer, VoiceId};
use crate::wav::DecodedAudio;
use loopcam_core::{LoopCamError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A playable, looping handle on one decoded clip.
///
/// `dispose` frees the underlying resource and must be idempotent; every
/// other call on a disposed player is a no-op.
pub trait Player: Send {
    /// Start (or continue) looped playback.
    fn start(&mut self);

    /// Stop and rewind.
    fn stop(&mut self);

    /// Move the linear gain to `gain` over `ramp`.
    fn set_gain(&mut self, gain: f32, ramp: Duration);

    /// Silence the output without touching the gain envelope.
    fn set_muted(&mut self, muted: bool);

    /// Release the playback resource.
    fn dispose(&mut self);

    /// Envelope gain right now.
    fn current_gain(&self) -> f32;

    fn is_playing(&self) -> bool;
}

/// Allocates players.
pub trait PlayerBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Allocate a stopped player for `clip`.
    ///
    /// Fails with `ResourceExhausted` when no playback resource is free.
    fn allocate(&self, clip: Arc<DecodedAudio>) -> Result<Box<dyn Player>>;
}

// ── Mixer backend ───────────────────────────────────────────────

/// Plays clips through the shared software mixer.
pub struct MixerBackend {
    mixer: SharedMixer,
}

impl MixerBackend {
    pub fn new(mixer: SharedMixer) -> Self {
        Self { mixer }
    }

    pub fn mixer(&self) -> &SharedMixer {
        &self.mixer
    }
}

impl PlayerBackend for MixerBackend {
    fn name(&self) -> &str {
        "mixer"
    }

    fn allocate(&self, clip: Arc<DecodedAudio>) -> Result<Box<dyn Player>> {
        let voice = self.mixer.lock().add_voice(clip)?;
        Ok(Box::new(MixerPlayer {
            mixer: Arc::clone(&self.mixer),
            voice,
            disposed: false,
        }))
    }
}

struct MixerPlayer {
    mixer: SharedMixer,
    voice: VoiceId,
    disposed: bool,
}

impl Player for MixerPlayer {
    fn start(&mut self) {
        if !self.disposed {
            self.mixer.lock().start_voice(self.voice);
        }
    }

    fn stop(&mut self) {
        if !self.disposed {
            self.mixer.lock().stop_voice(self.voice);
        }
    }

    fn set_gain(&mut self, gain: f32, ramp: Duration) {
        if !self.disposed {
            self.mixer.lock().ramp_voice(self.voice, gain, ramp);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        if !self.disposed {
            self.mixer.lock().set_voice_muted(self.voice, muted);
        }
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.mixer.lock().remove_voice(self.voice);
        }
    }

    fn current_gain(&self) -> f32 {
        if self.disposed {
            return 0.0;
        }
        self.mixer.lock().voice_gain(self.voice).unwrap_or(0.0)
    }

    fn is_playing(&self) -> bool {
        !self.disposed && self.mixer.lock().is_voice_playing(self.voice)
    }
}

impl Drop for MixerPlayer {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ── Null backend ────────────────────────────────────────────────

/// Headless backend: tracks player state and gain envelopes against the
/// tokio clock without producing sound.
#[derive(Default)]
pub struct NullBackend {
    limit: Option<usize>,
    live: Arc<AtomicUsize>,
    allocated: AtomicUsize,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that refuses allocation once `limit` players are live.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Players allocated and not yet disposed.
    pub fn live_players(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Players ever allocated.
    pub fn allocated_players(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }
}

impl PlayerBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn allocate(&self, _clip: Arc<DecodedAudio>) -> Result<Box<dyn Player>> {
        let live = self.live.fetch_add(1, Ordering::AcqRel);
        if self.limit.is_some_and(|limit| live >= limit) {
            self.live.fetch_sub(1, Ordering::AcqRel);
            return Err(LoopCamError::ResourceExhausted(format!(
                "{live} headless players in use"
            )));
        }
        self.allocated.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(NullPlayer {
            live: Arc::clone(&self.live),
            envelope: Envelope::at(1.0),
            playing: false,
            disposed: false,
        }))
    }
}

/// Linear ramp evaluated lazily against the clock.
#[derive(Debug, Clone, Copy)]
struct Envelope {
    from: f32,
    to: f32,
    start: Instant,
    ramp: Duration,
}

impl Envelope {
    fn at(gain: f32) -> Self {
        Self {
            from: gain,
            to: gain,
            start: Instant::now(),
            ramp: Duration::ZERO,
        }
    }

    fn value(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start);
        if self.ramp.is_zero() || elapsed >= self.ramp {
            return self.to;
        }
        let t = elapsed.as_secs_f32() / self.ramp.as_secs_f32();
        self.from + (self.to - self.from) * t
    }
}

struct NullPlayer {
    live: Arc<AtomicUsize>,
    envelope: Envelope,
    playing: bool,
    disposed: bool,
}

impl Player for NullPlayer {
    fn start(&mut self) {
        if !self.disposed {
            self.playing = true;
        }
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn set_gain(&mut self, gain: f32, ramp: Duration) {
        if self.disposed {
            return;
        }
        let now = Instant::now();
        self.envelope = Envelope {
            from: self.envelope.value(now),
            to: gain.max(0.0),
            start: now,
            ramp,
        };
    }

    fn set_muted(&mut self, _muted: bool) {}

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.playing = false;
            self.live.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn current_gain(&self) -> f32 {
        if self.disposed {
            return 0.0;
        }
        self.envelope.value(Instant::now())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

impl Drop for NullPlayer {
    fn drop(&mut self) {
        self.dispose();
    }
}
