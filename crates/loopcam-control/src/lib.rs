//! LoopCam Control - input and orchestration
//!
//! Sits between the physical controller and the track manager:
//! - `ControlCommand`: Decoded controller lines
//! - `SceneDescription` / `PromptBuilder`: Vision reply to generation prompt
//! - `AudioGenerator`: Generation seam with an encoder-backed fallback
//! - `Session`: Selected instrument, filter and last generated clip

pub mod commands;
pub mod config;
pub mod controller;
pub mod generator;
pub mod prompt;
pub mod scene;
pub mod session;

pub use commands::{ControlCommand, FilterKind};
pub use config::SessionConfig;
pub use generator::{generate_or_fallback, AudioGenerator, GeneratedClip, PlaceholderGenerator};
pub use prompt::{GenerationRequest, PromptBuilder};
pub use scene::{FrameSource, SceneDescriber, SceneDescription, StaticDescriber, StillFrame};
pub use session::{Collaborators, Session, SessionEvent};
