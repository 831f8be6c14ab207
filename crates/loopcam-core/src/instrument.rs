//! Instrument tags and the built-in instrument table.
//!
//! An instrument tag names one logical mixer channel ("DRUMS", "BASS", ...).
//! Tags are normalized to upper case so that keyboard and controller input
//! resolve to the same channel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key identifying one logical mixer channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentTag(String);

impl InstrumentTag {
    /// Create a tag, normalizing to upper case.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One entry of the instrument table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    /// Channel name, used as the instrument tag.
    pub name: &'static str,
    /// Keyboard shortcut.
    pub key: char,
    /// Text appended to generation prompts for this instrument.
    pub prompt_tail: &'static str,
}

impl Instrument {
    pub fn tag(&self) -> InstrumentTag {
        InstrumentTag::new(self.name)
    }
}

/// Built-in instruments, in controller order (controller "instrument 1" is
/// the first entry).
pub static INSTRUMENTS: [Instrument; 6] = [
    Instrument {
        name: "DRUMS",
        key: 'q',
        prompt_tail: "boom-bap drums",
    },
    Instrument {
        name: "BASS",
        key: 'w',
        prompt_tail: "synth bassline",
    },
    Instrument {
        name: "GUITAR",
        key: 'e',
        prompt_tail: "clean electric guitar riff",
    },
    Instrument {
        name: "KEYS",
        key: 'r',
        prompt_tail: "dreamy pad chords",
    },
    Instrument {
        name: "VOCALS",
        key: 't',
        prompt_tail: "airy vocal chop",
    },
    Instrument {
        name: "FX",
        key: 'y',
        prompt_tail: "glitch fx sweep",
    },
];

/// Look up an instrument by keyboard shortcut (case-insensitive).
pub fn by_key(key: char) -> Option<&'static Instrument> {
    let key = key.to_ascii_lowercase();
    INSTRUMENTS.iter().find(|i| i.key == key)
}

/// Look up an instrument by 1-based controller slot.
pub fn by_slot(slot: u8) -> Option<&'static Instrument> {
    (slot as usize)
        .checked_sub(1)
        .and_then(|idx| INSTRUMENTS.get(idx))
}

/// Look up an instrument by tag.
pub fn by_tag(tag: &InstrumentTag) -> Option<&'static Instrument> {
    INSTRUMENTS.iter().find(|i| i.name == tag.as_str())
}
