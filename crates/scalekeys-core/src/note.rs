//! A pitch-class name bound to an octave

use serde::{Deserialize, Serialize};

use crate::pitch::{MIN_OCTAVE, PITCH_CLASSES};

/// Top octave a keyboard note may sit in.
pub const TOP_OCTAVE: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    name: String,
    pub octave: u8,
}

impl Note {
    /// Builds a note, normalising the name to its sharp spelling.
    pub fn new(name: &str, octave: u8) -> Self {
        Self {
            name: normalize_name(name),
            octave: octave.clamp(MIN_OCTAVE, TOP_OCTAVE),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inc_octave(&mut self) {
        if self.octave < TOP_OCTAVE {
            self.octave += 1;
        }
    }

    pub fn dec_octave(&mut self) {
        if self.octave > MIN_OCTAVE {
            self.octave -= 1;
        }
    }
}

/// `"A#/Bb" -> "A#"`, `"Bb" -> "A#"`, `" c " -> "C"`.
pub fn normalize_name(raw: &str) -> String {
    let first = raw.split('/').next().unwrap_or("").trim();
    let mut chars = first.chars();
    let Some(letter) = chars.next() else {
        return String::new();
    };
    let letter = letter.to_ascii_uppercase();
    match chars.next() {
        Some('#') => format!("{letter}#"),
        Some('b') => flat_to_sharp(letter),
        _ => letter.to_string(),
    }
}

fn flat_to_sharp(letter: char) -> String {
    let natural = letter.to_string();
    match PITCH_CLASSES.iter().position(|&p| p == natural) {
        Some(i) => PITCH_CLASSES[(i + 11) % 12].to_string(),
        None => natural,
    }
}
