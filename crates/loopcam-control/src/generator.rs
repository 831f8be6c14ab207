//! Audio generation collaborator and the encoder-backed fallback.

use crate::prompt::GenerationRequest;
use async_trait::async_trait;
use loopcam_audio::{tempo, wav};
use loopcam_core::{AssetMetadata, LoopCamError, Result};
use tracing::{debug, info, warn};

/// Key reported for placeholder clips.
pub const PLACEHOLDER_KEY: &str = "C Major";

/// Bytes and metadata returned by a generator.
#[derive(Debug, Clone)]
pub struct GeneratedClip {
    pub bytes: Vec<u8>,
    pub metadata: AssetMetadata,
}

/// Text-to-audio collaborator.
///
/// Implementations report an unreachable service as `UpstreamUnavailable`
/// and an unpaid account as `UpstreamPaymentRequired`.
#[async_trait]
pub trait AudioGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedClip>;
}

/// Synthesizes a sine tone at the requested BPM instead of calling a model.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderGenerator;

impl PlaceholderGenerator {
    /// Infallible: falls back to a short silence if the tone can't be built.
    pub fn clip(&self, request: &GenerationRequest) -> GeneratedClip {
        let bpm = Some(request.bpm).filter(|b| b.is_finite() && *b > 0.0);
        let bytes = wav::placeholder_tone(bpm, request.duration_seconds);
        let duration = wav::read_header(&bytes)
            .map(|h| h.params.duration_seconds)
            .unwrap_or(wav::FALLBACK_PARAMS.duration_seconds);
        let metadata = AssetMetadata::new(bpm, Some(PLACEHOLDER_KEY.to_string()), duration)
            .unwrap_or(AssetMetadata {
                bpm,
                key: None,
                duration_seconds: wav::FALLBACK_PARAMS.duration_seconds,
            });
        GeneratedClip { bytes, metadata }
    }
}

#[async_trait]
impl AudioGenerator for PlaceholderGenerator {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedClip> {
        Ok(self.clip(request))
    }
}

/// Generator that always fails with a fixed upstream error. Stands in for
/// an unconfigured service.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableGenerator {
    pub payment_required: bool,
}

#[async_trait]
impl AudioGenerator for UnavailableGenerator {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedClip> {
        if self.payment_required {
            Err(LoopCamError::UpstreamPaymentRequired("402 from generator".into()))
        } else {
            Err(LoopCamError::UpstreamUnavailable("generator not configured".into()))
        }
    }
}

/// Run `generator`, substituting a placeholder clip on any failure.
pub async fn generate_or_fallback(
    generator: &dyn AudioGenerator,
    request: &GenerationRequest,
) -> GeneratedClip {
    match generator.generate(request).await {
        Ok(clip) => {
            let clip = with_estimated_bpm(clip);
            info!(
                generator = generator.name(),
                bytes = clip.bytes.len(),
                bpm = ?clip.metadata.bpm,
                "Clip generated"
            );
            clip
        }
        Err(LoopCamError::UpstreamPaymentRequired(msg)) => {
            warn!(generator = generator.name(), %msg, "Generator needs payment, using placeholder");
            PlaceholderGenerator.clip(request)
        }
        Err(e) => {
            warn!(generator = generator.name(), error = %e, "Generation failed, using placeholder");
            PlaceholderGenerator.clip(request)
        }
    }
}

/// Fill in a missing BPM by analysing the clip itself.
pub fn with_estimated_bpm(mut clip: GeneratedClip) -> GeneratedClip {
    if clip.metadata.bpm.is_some() {
        return clip;
    }
    match wav::decode(&clip.bytes) {
        Ok(decoded) => {
            clip.metadata.bpm = tempo::estimate_bpm(&decoded);
            debug!(bpm = ?clip.metadata.bpm, "Estimated clip tempo");
        }
        Err(e) => debug!(error = %e, "Clip not analysable for tempo"),
    }
    clip
}
