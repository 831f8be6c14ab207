//! LoopCam Core - Foundation types
//!
//! This crate provides the types shared by the audio and control layers:
//! - Error taxonomy (`LoopCamError`)
//! - Instrument tags and the built-in instrument table
//! - Generated audio assets and their metadata

pub mod asset;
pub mod error;
pub mod instrument;

pub use asset::{AssetMetadata, AudioAsset};
pub use error::{LoopCamError, Result};
pub use instrument::{Instrument, InstrumentTag, INSTRUMENTS};
