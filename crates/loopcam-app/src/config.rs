//! Application configuration and command-line arguments.

use anyhow::{Context, Result};
use loopcam_audio::{MixerConfig, TrackManagerConfig};
use loopcam_control::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything the binary can be configured with, loaded from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tracks: TrackManagerConfig,
    pub mixer: MixerConfig,
    pub session: SessionConfig,
    /// Fixed vision reply used while no vision service is wired in.
    pub scene_reply: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub headless: bool,
    /// Controller device node; stdin when absent.
    pub serial: Option<PathBuf>,
    /// Still image handed to the describer on capture.
    pub frame: Option<PathBuf>,
    /// Overrides `session.export_dir`.
    pub export_dir: Option<PathBuf>,
}

impl Args {
    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut a = Args::default();
        let mut it = args.into_iter();
        while let Some(s) = it.next() {
            let (flag, inline) = match s.split_once('=') {
                Some((f, v)) => (f.to_string(), Some(v.to_string())),
                None => (s.clone(), None),
            };
            match flag.as_str() {
                "--headless" => a.headless = true,
                "--config" | "--serial" | "--frame" | "--export-dir" => {
                    let Some(value) = inline.or_else(|| it.next()) else {
                        warn!(flag = %flag, "Missing value");
                        continue;
                    };
                    let value = Some(PathBuf::from(value));
                    match flag.as_str() {
                        "--config" => a.config = value,
                        "--serial" => a.serial = value,
                        "--export-dir" => a.export_dir = value,
                        _ => a.frame = value,
                    }
                }
                _ => warn!(arg = %s, "Unknown argument"),
            }
        }
        a
    }
}
