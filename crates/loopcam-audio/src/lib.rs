//! LoopCam Audio - WAV codec and looping playback
//!
//! Turns generated clips into audible, looping tracks.
//!
//! Architecture:
//! - `wav`: Canonical 44-byte PCM WAV encoder and a chunk-walking decoder
//! - `Mixer`: Software mixer voices with per-sample gain ramps
//! - `Player` / `PlayerBackend`: Playback capability the track manager drives
//! - `TrackManager`: One track per instrument, replaced by crossfade
//! - `tempo`: BPM estimation for clips delivered without one
//! - `OutputStream`: Device output (`device` feature)

pub mod gain;
pub mod mixer;
#[cfg(feature = "device")]
pub mod output;
pub mod player;
pub mod tempo;
pub mod track_manager;
pub mod wav;

pub use mixer::{render_or_silence, Mixer, MixerConfig, SharedMixer};
#[cfg(feature = "device")]
pub use output::OutputStream;
pub use player::{MixerBackend, NullBackend, Player, PlayerBackend};
pub use tempo::{estimate_bpm, TempoEstimator};
pub use track_manager::{PlaybackState, TrackManager, TrackManagerConfig, TrackSnapshot};
pub use wav::{AudioContainerParams, DecodedAudio};
