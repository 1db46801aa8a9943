//! Chordify: a key becomes the triad built on it from the scale

use serde::{Deserialize, Serialize};

use super::NoteEvent;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChordifyFx;

impl ChordifyFx {
    /// Root, third and fifth degree above `root` in the scale's pitch table.
    /// Degrees past the top of the table fall back to the root.
    pub fn triad(root: u8, table: &[u8]) -> [u8; 3] {
        let Some(index) = table.iter().position(|&c| c == root) else {
            return [root; 3];
        };
        let degree = |offset: usize| table.get(index + offset).copied().unwrap_or(root);
        [root, degree(2), degree(4)]
    }

    pub fn key_down(root: u8, table: &[u8]) -> Vec<NoteEvent> {
        Self::triad(root, table).into_iter().map(NoteEvent::On).collect()
    }

    pub fn key_up(root: u8, table: &[u8]) -> Vec<NoteEvent> {
        Self::triad(root, table).into_iter().map(NoteEvent::Off).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // C major, octaves 1 and 2
    const TABLE: [u8; 14] = [12, 14, 16, 17, 19, 21, 23, 24, 26, 28, 29, 31, 33, 35];

    #[test]
    fn test_triad_in_range() {
        assert_eq!(ChordifyFx::triad(12, &TABLE), [12, 16, 19]);
        assert_eq!(ChordifyFx::triad(14, &TABLE), [14, 17, 21]);
    }

    #[test]
    fn test_triad_falls_back_to_root_at_top() {
        assert_eq!(ChordifyFx::triad(33, &TABLE), [33, 33, 33]);
        assert_eq!(ChordifyFx::triad(31, &TABLE), [31, 35, 31]);
    }

    #[test]
    fn test_release_mirrors_press() {
        let on = ChordifyFx::key_down(17, &TABLE);
        let off = ChordifyFx::key_up(17, &TABLE);
        assert_eq!(on, vec![NoteEvent::On(17), NoteEvent::On(21), NoteEvent::On(24)]);
        assert_eq!(off, vec![NoteEvent::Off(17), NoteEvent::Off(21), NoteEvent::Off(24)]);
    }
}
