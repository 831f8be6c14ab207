//! Scene descriptions from the vision collaborator.

use async_trait::async_trait;
use loopcam_core::{LoopCamError, Result};
use serde::{Deserialize, Serialize};

/// Placeholder descriptions the vision side returns instead of failing.
const FAILURE_DESCRIPTIONS: [&str; 2] = ["API Error", "Error parsing response"];

/// What the vision model saw, reduced to what the prompt needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDescription {
    pub description: String,
    pub genre: String,
    pub bpm: Option<f32>,
    pub scale: Option<String>,
}

#[derive(Deserialize)]
struct RawScene {
    #[serde(default)]
    description: String,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    bpm: Option<f64>,
    #[serde(default)]
    scale: Option<String>,
    /// Older responses name the scale `key`.
    #[serde(default)]
    key: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Remove a surrounding markdown code fence (the opening line may carry a
/// language tag).
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    if text.len() >= 6 && text.starts_with("```") && text.ends_with("```") {
        let inner = &text[3..text.len() - 3];
        return match inner.find('\n') {
            Some(nl) => inner[nl + 1..].trim(),
            None => inner.trim(),
        };
    }
    text
}

impl SceneDescription {
    /// Parse the vision collaborator's reply.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawScene = serde_json::from_str(strip_code_fence(text)).map_err(|e| {
            LoopCamError::UpstreamUnavailable(format!("unparseable scene description: {e}"))
        })?;

        let description = raw.description.trim().to_string();
        if FAILURE_DESCRIPTIONS.contains(&description.as_str()) {
            return Err(LoopCamError::UpstreamUnavailable(format!(
                "vision collaborator reported {description:?}"
            )));
        }

        Ok(Self {
            description,
            genre: non_blank(raw.genre).unwrap_or_default(),
            bpm: raw
                .bpm
                .filter(|b| b.is_finite() && *b > 0.0)
                .map(|b| b as f32),
            scale: non_blank(raw.scale).or_else(|| non_blank(raw.key)),
        })
    }
}

/// Vision collaborator: image in, JSON-ish text out.
#[async_trait]
pub trait SceneDescriber: Send + Sync {
    async fn describe(&self, frame: &[u8]) -> Result<String>;
}

/// Supplies the frame to describe on capture.
pub trait FrameSource: Send + Sync {
    fn grab(&self) -> Result<Vec<u8>>;
}

/// Describer that always answers with the same text. Used offline.
pub struct StaticDescriber {
    reply: String,
}

impl StaticDescriber {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for StaticDescriber {
    fn default() -> Self {
        Self::new(r#"{"description": "a quiet room", "genre": "lo-fi hip-hop", "bpm": 85, "scale": "C minor"}"#)
    }
}

#[async_trait]
impl SceneDescriber for StaticDescriber {
    async fn describe(&self, _frame: &[u8]) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Frame source returning fixed bytes, e.g. a still loaded from disk.
#[derive(Default)]
pub struct StillFrame {
    bytes: Vec<u8>,
}

impl StillFrame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl FrameSource for StillFrame {
    fn grab(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
