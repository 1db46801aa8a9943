//! Append-only note pattern for the MIDI file writer

use scalekeys_core::PitchTable;
use tracing::warn;

/// Percussion fragment laid under a recording by the metronome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rhythm {
    pub layer: String,
    pub length: u32,
}

impl Rhythm {
    pub fn metronome() -> Self {
        Self { layer: "s.x.x.x.".to_string(), length: 15 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    Note(String),
    Rhythm(Rhythm),
}

impl PatternToken {
    fn render(&self) -> String {
        match self {
            Self::Note(token) => token.clone(),
            Self::Rhythm(rhythm) => format!("[{}]x{}", rhythm.layer, rhythm.length),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MidiAccumulator {
    table: PitchTable,
    tokens: Vec<PatternToken>,
    recording: bool,
}

impl MidiAccumulator {
    pub fn new(table: PitchTable) -> Self {
        Self { table, tokens: Vec::new(), recording: false }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Appends the token for a sounding pitch while recording.
    pub fn append_note(&mut self, code: u8) {
        if !self.recording {
            return;
        }
        match self.table.token(code) {
            Ok(token) => self.tokens.push(PatternToken::Note(token)),
            Err(e) => warn!(code, error = %e, "Pitch not recorded"),
        }
    }

    pub fn append_rhythm(&mut self, rhythm: Rhythm) {
        self.tokens.push(PatternToken::Rhythm(rhythm));
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    /// Space-separated pattern text handed to the file writer.
    pub fn pattern(&self) -> String {
        self.tokens.iter().map(PatternToken::render).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_records_when_enabled() {
        let mut midi = MidiAccumulator::new(PitchTable::new());
        midi.append_note(60);
        assert!(midi.tokens().is_empty());

        midi.set_recording(true);
        midi.append_note(60);
        midi.append_note(61);
        assert_eq!(midi.pattern(), "C5 C#5");
    }

    #[test]
    fn test_out_of_range_code_is_skipped() {
        let mut midi = MidiAccumulator::new(PitchTable::new());
        midi.set_recording(true);
        midi.append_note(3);
        assert!(midi.tokens().is_empty());
    }

    #[test]
    fn test_rhythm_fragment() {
        let mut midi = MidiAccumulator::new(PitchTable::new());
        midi.set_recording(true);
        midi.append_note(48);
        midi.append_rhythm(Rhythm::metronome());
        assert_eq!(midi.pattern(), "C4 [s.x.x.x.]x15");
    }
}
