//! Generated audio assets.

use crate::error::{LoopCamError, Result};
use crate::instrument::InstrumentTag;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Musical metadata reported alongside a generated clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Tempo in beats per minute, when known.
    pub bpm: Option<f32>,
    /// Musical key of the clip, when known.
    pub key: Option<String>,
    /// Clip length in seconds.
    pub duration_seconds: f64,
}

impl AssetMetadata {
    /// Create metadata, discarding a non-positive BPM and rejecting a
    /// non-positive duration.
    pub fn new(bpm: Option<f32>, key: Option<String>, duration_seconds: f64) -> Result<Self> {
        if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
            return Err(LoopCamError::InvalidParameters(format!(
                "asset duration must be positive, got {duration_seconds}"
            )));
        }
        Ok(Self {
            bpm: bpm.filter(|b| b.is_finite() && *b > 0.0),
            key: key.filter(|k| !k.trim().is_empty()),
            duration_seconds,
        })
    }
}

/// An immutable audio container plus metadata, delivered to the track manager.
///
/// Cloning is cheap: the container bytes are shared.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    id: Uuid,
    instrument_tag: InstrumentTag,
    container_bytes: Arc<[u8]>,
    metadata: AssetMetadata,
}

impl AudioAsset {
    pub fn new(
        instrument_tag: InstrumentTag,
        container_bytes: impl Into<Arc<[u8]>>,
        metadata: AssetMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_tag,
            container_bytes: container_bytes.into(),
            metadata,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn instrument_tag(&self) -> &InstrumentTag {
        &self.instrument_tag
    }

    pub fn container_bytes(&self) -> &[u8] {
        &self.container_bytes
    }

    pub fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }
}
