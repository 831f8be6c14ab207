//! Prompt construction for the audio generator.

use crate::config::SessionConfig;
use crate::scene::SceneDescription;
use loopcam_core::Instrument;
use serde::Serialize;
use tracing::info;

/// A request for the audio generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub bpm: f32,
    pub duration_seconds: f64,
}

/// Builds prompts and keeps the session's musical anchors (scale and BPM)
/// stable across captures.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    config: SessionConfig,
    locked_scale: Option<String>,
    session_bpm: Option<f32>,
}

impl PromptBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            locked_scale: None,
            session_bpm: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn locked_scale(&self) -> Option<&str> {
        self.locked_scale.as_deref()
    }

    pub fn session_bpm(&self) -> Option<f32> {
        self.session_bpm
    }

    /// Record the BPM of a generated clip. Only the first one sticks when
    /// BPM locking is on.
    pub fn observe_bpm(&mut self, bpm: Option<f32>) {
        if !self.config.lock_first_bpm || self.session_bpm.is_some() {
            return;
        }
        if let Some(bpm) = bpm.filter(|b| b.is_finite() && *b > 0.0) {
            info!(bpm, "Session BPM locked");
            self.session_bpm = Some(bpm);
        }
    }

    /// Build the generation request for `scene` on `instrument`.
    pub fn build(&mut self, scene: &SceneDescription, instrument: &Instrument) -> GenerationRequest {
        let scale = match (&self.locked_scale, &scene.scale) {
            (Some(locked), _) => Some(locked.clone()),
            (None, Some(scale)) => {
                if self.config.lock_first_scale {
                    info!(scale = %scale, "Session scale locked");
                    self.locked_scale = Some(scale.clone());
                }
                Some(scale.clone())
            }
            (None, None) => None,
        };

        let genre = self
            .config
            .genre_override
            .as_deref()
            .unwrap_or(&scene.genre)
            .trim();

        let mut parts: Vec<String> = Vec::with_capacity(4);
        parts.push(scene.description.trim().to_string());
        if !genre.is_empty() {
            parts.push(format!("{genre} style"));
        }
        if let Some(scale) = scale {
            parts.push(format!("in {scale} scale"));
        }
        parts.push(instrument.prompt_tail.to_string());
        parts.retain(|p| !p.is_empty());

        GenerationRequest {
            prompt: parts.join(", "),
            bpm: self
                .session_bpm
                .or(scene.bpm)
                .unwrap_or(self.config.default_bpm),
            duration_seconds: self.config.clip_duration_seconds,
        }
    }
}
