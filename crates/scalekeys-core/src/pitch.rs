//! Pitch-class names and numeric pitch codes

use crate::error::{Result, ScaleKeysError};

/// Pitch-class names in semitone order, sharps only.
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lowest octave the table can name.
pub const MIN_OCTAVE: u8 = 1;
/// Highest octave the table can name. One above the window's top octave so
/// the last scale cycle of any root still resolves.
pub const MAX_OCTAVE: u8 = 8;

/// Bidirectional map between `name + octave` and pitch code.
///
/// Codes follow `12 * octave + semitone`, so `C1 = 12` and `C4 = 48`.
#[derive(Debug, Clone)]
pub struct PitchTable {
    lowest: u8,
    highest: u8,
}

impl Default for PitchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchTable {
    pub fn new() -> Self {
        Self {
            lowest: 12 * MIN_OCTAVE,
            highest: 12 * MAX_OCTAVE + 11,
        }
    }

    /// Semitone offset of a pitch class within its octave.
    pub fn semitone(name: &str) -> Result<u8> {
        PITCH_CLASSES
            .iter()
            .position(|&p| p == name)
            .map(|i| i as u8)
            .ok_or_else(|| ScaleKeysError::UnknownPitchName(name.to_string()))
    }

    pub fn contains(&self, code: i32) -> bool {
        code >= self.lowest as i32 && code <= self.highest as i32
    }

    /// Pitch code for a name at an octave.
    pub fn code(&self, name: &str, octave: u8) -> Result<u8> {
        let semitone = Self::semitone(name)
            .map_err(|_| ScaleKeysError::PitchRange(format!("{name}{octave}")))?;
        let code = 12 * octave as i32 + semitone as i32;
        if !self.contains(code) {
            return Err(ScaleKeysError::PitchRange(format!("{name}{octave}")));
        }
        Ok(code as u8)
    }

    /// Parse a token like `"C#4"` or `"A2"`.
    pub fn code_for_token(&self, token: &str) -> Result<u8> {
        let split = token
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ScaleKeysError::PitchRange(token.to_string()))?;
        let (name, octave) = token.split_at(split);
        let octave: u8 = octave
            .parse()
            .map_err(|_| ScaleKeysError::PitchRange(token.to_string()))?;
        self.code(name, octave)
    }

    /// Name and octave of a pitch code.
    pub fn name(&self, code: u8) -> Result<(&'static str, u8)> {
        if !self.contains(code as i32) {
            return Err(ScaleKeysError::PitchRange(format!("code {code}")));
        }
        Ok((PITCH_CLASSES[(code % 12) as usize], code / 12))
    }

    /// Token form of a pitch code, e.g. `61 -> "C#5"`.
    pub fn token(&self, code: u8) -> Result<String> {
        let (name, octave) = self.name(code)?;
        Ok(format!("{name}{octave}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip_at_edges() {
        let table = PitchTable::new();
        assert_eq!(table.code("C", 1).unwrap(), 12);
        assert_eq!(table.code("B", 7).unwrap(), 95);
        assert_eq!(table.token(12).unwrap(), "C1");
        assert_eq!(table.token(61).unwrap(), "C#5");
        assert_eq!(table.code_for_token("A#3").unwrap(), 46);
    }

    #[test]
    fn test_out_of_range_is_pitch_range_error() {
        let table = PitchTable::new();
        assert!(matches!(table.code("C", 0), Err(ScaleKeysError::PitchRange(_))));
        assert!(matches!(table.code("C", 9), Err(ScaleKeysError::PitchRange(_))));
        assert!(matches!(table.code("H", 3), Err(ScaleKeysError::PitchRange(_))));
        assert!(matches!(table.token(11), Err(ScaleKeysError::PitchRange(_))));
        assert!(matches!(table.token(120), Err(ScaleKeysError::PitchRange(_))));
        assert!(table.code_for_token("C").is_err());
    }
}
