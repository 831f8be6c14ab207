//! Controller commands and the live filter cycle.
//!
//! The physical controller prints short human-readable lines over serial.
//! Each line decodes once into a [`ControlCommand`]; anything unrecognized
//! is dropped.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete action requested by the controller or keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Select instrument slot `n` (1-based, controller order).
    SelectInstrument(u8),
    /// Step the camera filter forward (+1) or backward (-1).
    CycleFilter(i8),
    /// Capture a frame and generate a clip from it.
    TriggerCapture,
    /// Loop the most recently generated clip on its instrument's track.
    AddLastToLoop,
    /// Save the most recently generated clip to the export directory.
    ExportLast,
    /// Loop a placeholder tone on the selected instrument's track.
    TestTone,
}

impl ControlCommand {
    /// Decode one controller line. Matching is by substring, as the firmware
    /// decorates its messages.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line.contains("You took a photo!") {
            return Some(Self::TriggerCapture);
        }
        if line.contains("added the last generated sound") {
            return Some(Self::AddLastToLoop);
        }
        if line.contains("download") {
            return Some(Self::ExportLast);
        }
        if line.contains("test sound") {
            return Some(Self::TestTone);
        }
        if let Some(rest) = line.split("instrument ").nth(1) {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            if let Ok(n) = digits.parse::<u8>() {
                return Some(Self::SelectInstrument(n));
            }
        }
        if line.contains("Rewinding") {
            return Some(Self::CycleFilter(-1));
        }
        if line.contains("FastFW") {
            return Some(Self::CycleFilter(1));
        }
        None
    }
}

/// Live camera filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterKind {
    #[default]
    Normal,
    Gray,
    Threshold,
    Invert,
    Posterize,
    Blur,
}

impl FilterKind {
    /// Filters in cycle order.
    pub const ALL: [FilterKind; 6] = [
        FilterKind::Normal,
        FilterKind::Gray,
        FilterKind::Threshold,
        FilterKind::Invert,
        FilterKind::Posterize,
        FilterKind::Blur,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Normal => "NORMAL",
            FilterKind::Gray => "GRAY",
            FilterKind::Threshold => "THRESHOLD",
            FilterKind::Invert => "INVERT",
            FilterKind::Posterize => "POSTERIZE",
            FilterKind::Blur => "BLUR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    /// Step through the cycle, wrapping in both directions.
    pub fn cycle(self, step: i8) -> Self {
        let len = Self::ALL.len() as i64;
        let next = (self.index() as i64 + i64::from(step)).rem_euclid(len);
        Self::ALL[next as usize]
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
