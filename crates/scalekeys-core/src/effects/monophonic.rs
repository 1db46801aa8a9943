//! Monophonic limiter with last-note priority

use serde::{Deserialize, Serialize};

use super::NoteEvent;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonophonicFx {
    last_note: Option<u8>,
}

impl MonophonicFx {
    pub fn last_note(&self) -> Option<u8> {
        self.last_note
    }

    /// Silences the held note (if any) before sounding the new one.
    pub fn key_down(&mut self, code: u8) -> Vec<NoteEvent> {
        let mut events = Vec::with_capacity(2);
        if let Some(held) = self.last_note.replace(code) {
            events.push(NoteEvent::Off(held));
        }
        events.push(NoteEvent::On(code));
        events
    }

    /// Only releasing the sounding note produces an event.
    pub fn key_up(&mut self, code: u8) -> Option<NoteEvent> {
        if self.last_note == Some(code) {
            self.last_note = None;
            return Some(NoteEvent::Off(code));
        }
        None
    }

    pub fn reset(&mut self) {
        self.last_note = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_note_priority() {
        let mut mono = MonophonicFx::default();
        assert_eq!(mono.key_down(60), vec![NoteEvent::On(60)]);
        assert_eq!(mono.key_down(64), vec![NoteEvent::Off(60), NoteEvent::On(64)]);
        assert_eq!(mono.key_up(60), None);
        assert_eq!(mono.key_up(64), Some(NoteEvent::Off(64)));
        assert_eq!(mono.last_note(), None);
    }
}
