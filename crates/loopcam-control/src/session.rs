//! Session orchestration: turns controller commands into captures,
//! generations and track submissions.

use crate::commands::{ControlCommand, FilterKind};
use crate::config::SessionConfig;
use crate::generator::{generate_or_fallback, AudioGenerator, PlaceholderGenerator};
use crate::prompt::{GenerationRequest, PromptBuilder};
use crate::scene::{FrameSource, SceneDescriber, SceneDescription};
use loopcam_audio::{TrackManager, TrackSnapshot};
use loopcam_core::instrument::{self, Instrument};
use loopcam_core::{AudioAsset, InstrumentTag, LoopCamError, Result, INSTRUMENTS};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What a handled command changed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    InstrumentSelected(InstrumentTag),
    FilterChanged(FilterKind),
    Generated {
        instrument_tag: InstrumentTag,
        asset_id: Uuid,
        request: GenerationRequest,
    },
    Looped(TrackSnapshot),
    Exported(PathBuf),
    TestTone(TrackSnapshot),
}

/// External collaborators a session depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub frames: Arc<dyn FrameSource>,
    pub describer: Arc<dyn SceneDescriber>,
    pub generator: Arc<dyn AudioGenerator>,
}

pub struct Session {
    tracks: TrackManager,
    collaborators: Collaborators,
    prompts: PromptBuilder,
    selected: &'static Instrument,
    filter: FilterKind,
    last_generated: Option<AudioAsset>,
}

impl Session {
    pub fn new(config: SessionConfig, tracks: TrackManager, collaborators: Collaborators) -> Self {
        Self {
            tracks,
            collaborators,
            prompts: PromptBuilder::new(config),
            selected: &INSTRUMENTS[0],
            filter: FilterKind::default(),
            last_generated: None,
        }
    }

    pub fn tracks(&self) -> &TrackManager {
        &self.tracks
    }

    pub fn selected_instrument(&self) -> &'static Instrument {
        self.selected
    }

    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    pub fn last_generated(&self) -> Option<&AudioAsset> {
        self.last_generated.as_ref()
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Apply one controller command.
    pub async fn handle(&mut self, command: ControlCommand) -> Result<SessionEvent> {
        debug!(?command, "Handling command");
        match command {
            ControlCommand::SelectInstrument(slot) => self.select_instrument(slot),
            ControlCommand::CycleFilter(step) => {
                self.filter = self.filter.cycle(step);
                info!(filter = %self.filter, "Filter changed");
                Ok(SessionEvent::FilterChanged(self.filter))
            }
            ControlCommand::TriggerCapture => {
                let frame = self.collaborators.frames.grab()?;
                self.capture(&frame).await
            }
            ControlCommand::AddLastToLoop => self.add_last_to_loop().await.map(SessionEvent::Looped),
            ControlCommand::ExportLast => self.export_last().await.map(SessionEvent::Exported),
            ControlCommand::TestTone => self.play_test_tone().await.map(SessionEvent::TestTone),
        }
    }

    /// Select an instrument by its 1-based controller slot.
    pub fn select_instrument(&mut self, slot: u8) -> Result<SessionEvent> {
        let instrument = instrument::by_slot(slot)
            .ok_or_else(|| LoopCamError::NotFound(format!("instrument slot {slot}")))?;
        self.selected = instrument;
        info!(instrument = instrument.name, slot, "Instrument selected");
        Ok(SessionEvent::InstrumentSelected(instrument.tag()))
    }

    /// Select an instrument by its keyboard shortcut.
    pub fn select_key(&mut self, key: char) -> Result<SessionEvent> {
        let instrument = instrument::by_key(key)
            .ok_or_else(|| LoopCamError::NotFound(format!("instrument key {key:?}")))?;
        self.selected = instrument;
        info!(instrument = instrument.name, %key, "Instrument selected");
        Ok(SessionEvent::InstrumentSelected(instrument.tag()))
    }

    /// Describe `frame`, generate a clip for the selected instrument and keep
    /// it as the last generated asset.
    ///
    /// A failed description generates nothing. A failed generation yields a
    /// placeholder clip.
    pub async fn capture(&mut self, frame: &[u8]) -> Result<SessionEvent> {
        let reply = self.collaborators.describer.describe(frame).await?;
        let scene = SceneDescription::parse(&reply).map_err(|e| {
            warn!(error = %e, "Scene description rejected");
            e
        })?;

        let instrument = self.selected;
        let request = self.prompts.build(&scene, instrument);
        info!(instrument = instrument.name, prompt = %request.prompt, bpm = request.bpm, "Generating clip");

        let clip = generate_or_fallback(self.collaborators.generator.as_ref(), &request).await;
        self.prompts.observe_bpm(clip.metadata.bpm);

        let asset = AudioAsset::new(instrument.tag(), clip.bytes, clip.metadata);
        let event = SessionEvent::Generated {
            instrument_tag: instrument.tag(),
            asset_id: asset.id(),
            request,
        };
        self.last_generated = Some(asset);
        Ok(event)
    }

    /// Loop the last generated asset on its instrument's track.
    pub async fn add_last_to_loop(&mut self) -> Result<TrackSnapshot> {
        let asset = self
            .last_generated
            .clone()
            .ok_or_else(|| LoopCamError::NotFound("no generated clip yet".into()))?;
        self.tracks
            .submit(asset.instrument_tag().clone(), asset)
            .await
    }

    /// Write the last generated clip to `<export_dir>/<instrument>_generated.wav`,
    /// replacing an earlier export for the same instrument.
    pub async fn export_last(&self) -> Result<PathBuf> {
        let asset = self
            .last_generated
            .as_ref()
            .ok_or_else(|| LoopCamError::NotFound("no generated clip to export".into()))?;
        let dir = &self.prompts.config().export_dir;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!(
            "{}_generated.wav",
            asset.instrument_tag().as_str().to_lowercase()
        ));
        tokio::fs::write(&path, asset.container_bytes()).await?;
        info!(path = %path.display(), asset = %asset.id(), "Clip exported");
        Ok(path)
    }

    /// Loop a placeholder tone at the session tempo on the selected
    /// instrument's track.
    pub async fn play_test_tone(&self) -> Result<TrackSnapshot> {
        let config = self.prompts.config();
        let request = GenerationRequest {
            prompt: "test tone".into(),
            bpm: self.prompts.session_bpm().unwrap_or(config.default_bpm),
            duration_seconds: config.test_tone_seconds,
        };
        let clip = PlaceholderGenerator.clip(&request);
        let tag = self.selected.tag();
        info!(tag = %tag, bpm = request.bpm, "Playing test tone");
        self.tracks
            .submit(tag.clone(), AudioAsset::new(tag, clip.bytes, clip.metadata))
            .await
    }
}
