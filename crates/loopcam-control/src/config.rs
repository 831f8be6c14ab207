//! Session settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for capture and generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Length requested from the audio generator, in seconds.
    pub clip_duration_seconds: f64,
    /// BPM used when neither the session nor the scene provides one.
    pub default_bpm: f32,
    /// Keep the first scale seen for every later prompt.
    pub lock_first_scale: bool,
    /// Keep the first generated clip's BPM for every later request.
    pub lock_first_bpm: bool,
    /// Genre forced into every prompt instead of the scene's genre.
    pub genre_override: Option<String>,
    /// Where exported clips are written.
    pub export_dir: PathBuf,
    /// Length of the test tone, in seconds.
    pub test_tone_seconds: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            clip_duration_seconds: 12.0,
            default_bpm: 120.0,
            lock_first_scale: true,
            lock_first_bpm: true,
            genre_override: None,
            export_dir: PathBuf::from("exports"),
            test_tone_seconds: 2.0,
        }
    }
}
