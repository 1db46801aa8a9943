//! Scales: one cycle of pitch names plus the flattened pitch-code table

use crate::error::{Result, ScaleKeysError};
use crate::note::{normalize_name, Note, TOP_OCTAVE};
use crate::pitch::{PitchTable, MIN_OCTAVE};

/// Number of octaves the flattened pitch table spans.
pub const TABLE_OCTAVES: u8 = TOP_OCTAVE - MIN_OCTAVE + 1;

/// An ordered cycle of notes for one root and mode.
///
/// `notes` ends with the root repeated as a wrap sentinel. Degrees whose
/// pitch class sits below the root's are lifted one octave when resolved,
/// so every cycle (and the whole table) ascends.
#[derive(Debug, Clone)]
pub struct Scale {
    mode: String,
    root: Note,
    notes: Vec<Note>,
    lifted: Vec<bool>,
    pitch_table: Vec<u8>,
    table: PitchTable,
}

impl Scale {
    /// Builds a scale from the names of one cycle. The root is prepended if
    /// missing and the wrap sentinel appended if the names do not end on it.
    pub fn new(mode: &str, root: &str, names: &[&str], table: &PitchTable) -> Result<Self> {
        let root_name = normalize_name(root);
        PitchTable::semitone(&root_name)?;

        let mut cycle: Vec<String> = names
            .iter()
            .map(|n| normalize_name(n))
            .filter(|n| !n.is_empty())
            .collect();
        if cycle.first() != Some(&root_name) {
            cycle.insert(0, root_name.clone());
        }
        if cycle.len() > 1 && cycle.last() == Some(&root_name) {
            cycle.pop();
        }

        let root_semitone = PitchTable::semitone(&root_name)?;
        let mut lifted = Vec::with_capacity(cycle.len());
        for name in &cycle {
            lifted.push(PitchTable::semitone(name)? < root_semitone);
        }

        let mut notes: Vec<Note> = cycle.iter().map(|n| Note::new(n, MIN_OCTAVE)).collect();
        notes.push(Note::new(&root_name, MIN_OCTAVE));

        let mut scale = Self {
            mode: mode.trim().to_string(),
            root: Note::new(&root_name, MIN_OCTAVE),
            notes,
            lifted,
            pitch_table: Vec::new(),
            table: table.clone(),
        };
        scale.pitch_table = scale.build_pitch_table()?;

        if scale.pitch_table.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ScaleKeysError::InvalidScaleRow(format!(
                "{} {}: notes do not ascend from the root",
                root_name, scale.mode
            )));
        }
        Ok(scale)
    }

    fn build_pitch_table(&self) -> Result<Vec<u8>> {
        let degrees = self.degree_count();
        let mut codes = Vec::with_capacity(TABLE_OCTAVES as usize * degrees);
        for octave in MIN_OCTAVE..=TOP_OCTAVE {
            for degree in 0..degrees {
                codes.push(self.pitch_code(degree, octave)?);
            }
        }
        Ok(codes)
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn root(&self) -> &Note {
        &self.root
    }

    /// The cycle including the trailing wrap sentinel.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Playable degrees per cycle (the sentinel excluded).
    pub fn degree_count(&self) -> usize {
        self.notes.len() - 1
    }

    /// Pitch codes for octaves 1..=7, octave-major.
    pub fn pitch_table(&self) -> &[u8] {
        &self.pitch_table
    }

    /// Canonical octave of the scale's notes.
    pub fn base_octave(&self) -> u8 {
        self.notes[0].octave
    }

    /// Pitch code of a degree in the given cycle octave.
    pub fn pitch_code(&self, degree: usize, octave: u8) -> Result<u8> {
        let Some(note) = self.notes.get(degree) else {
            return Err(ScaleKeysError::PitchRange(format!("degree {degree}")));
        };
        let lift = self.lifted.get(degree).copied().unwrap_or(false) as u8;
        self.table.code(note.name(), octave + lift)
    }

    /// Degree index of a pitch name (first match, sentinel excluded).
    pub fn degree_of(&self, name: &str) -> Option<usize> {
        self.notes[..self.degree_count()]
            .iter()
            .position(|n| n.name() == name)
    }

    /// Pitch code for a name in the given cycle octave.
    pub fn code_of(&self, name: &str, octave: u8) -> Result<u8> {
        let degree = self
            .degree_of(name)
            .ok_or_else(|| ScaleKeysError::PitchRange(format!("{name}{octave}")))?;
        self.pitch_code(degree, octave)
    }

    /// Moves every canonical note (root included) by one octave, clamped per note.
    pub fn adjust_octaves(&mut self, delta: i8) {
        for note in self.notes.iter_mut().chain(std::iter::once(&mut self.root)) {
            if delta > 0 {
                note.inc_octave();
            } else if delta < 0 {
                note.dec_octave();
            }
        }
    }

    pub fn set_octave(&mut self, octave: u8) {
        let octave = octave.clamp(MIN_OCTAVE, TOP_OCTAVE);
        for note in self.notes.iter_mut().chain(std::iter::once(&mut self.root)) {
            note.octave = octave;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAJOR: [&str; 7] = ["C", "D", "E", "F", "G", "A", "B"];

    #[test]
    fn test_pitch_table_invariants() {
        let cases: [(&str, &[&str]); 4] = [
            ("C", &MAJOR),
            ("A", &["A", "B", "C#", "D", "E", "F#", "G#"]),
            ("B", &["B", "C#", "D#", "E", "F#", "G#", "A#"]),
            ("D#", &["D#", "F#", "G#", "A#", "C#"]),
        ];
        for (root, names) in cases {
            let scale = Scale::new("Mode", root, names, &PitchTable::new()).unwrap();
            assert_eq!(scale.pitch_table().len(), 7 * (scale.notes().len() - 1));
            assert!(scale.pitch_table().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_sentinel_is_appended_once() {
        let scale = Scale::new("Major", "C", &MAJOR, &PitchTable::new()).unwrap();
        assert_eq!(scale.notes().len(), 8);
        assert_eq!(scale.notes()[7].name(), "C");

        let mut with_root = MAJOR.to_vec();
        with_root.push("C");
        let scale = Scale::new("Major", "C", &with_root, &PitchTable::new()).unwrap();
        assert_eq!(scale.notes().len(), 8);
    }

    #[test]
    fn test_c_major_codes() {
        let scale = Scale::new("Major", "C", &MAJOR, &PitchTable::new()).unwrap();
        assert_eq!(&scale.pitch_table()[..8], &[12, 14, 16, 17, 19, 21, 23, 24]);
        assert_eq!(scale.code_of("E", 4).unwrap(), 52);
    }

    #[test]
    fn test_degrees_below_root_are_lifted() {
        let scale = Scale::new("Major", "A", &["A", "B", "C#", "D", "E", "F#", "G#"], &PitchTable::new()).unwrap();
        assert_eq!(scale.code_of("A", 1).unwrap(), 21);
        assert_eq!(scale.code_of("C#", 1).unwrap(), 25);
    }

    #[test]
    fn test_adjust_octaves_clamps() {
        let mut scale = Scale::new("Major", "C", &MAJOR, &PitchTable::new()).unwrap();
        scale.set_octave(7);
        scale.adjust_octaves(1);
        assert_eq!(scale.base_octave(), 7);
        scale.adjust_octaves(-1);
        assert_eq!(scale.base_octave(), 6);
        assert_eq!(scale.root().octave, 6);
    }

    #[test]
    fn test_rejects_unknown_names() {
        assert!(Scale::new("Major", "H", &["H"], &PitchTable::new()).is_err());
        assert!(Scale::new("Major", "C", &["C", "X"], &PitchTable::new()).is_err());
    }
}
