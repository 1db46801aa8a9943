//! Pitch shift snapped to the scale

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchShiftFx {
    pub semitone_offset: i32,
}

impl PitchShiftFx {
    pub fn new(semitone_offset: i32) -> Self {
        Self { semitone_offset }
    }

    /// Parses a user-entered offset. Anything that is not an integer is 0.
    pub fn parse_offset(input: &str) -> i32 {
        input.trim().parse().unwrap_or(0)
    }

    /// `code + offset`, snapped to the nearest table entry when it is not in
    /// the scale. Ties go to the lowest candidate.
    pub fn shift(&self, code: u8, table: &[u8]) -> u8 {
        let target = code as i32 + self.semitone_offset;
        if table.iter().any(|&c| c as i32 == target) {
            return target as u8;
        }
        table
            .iter()
            .copied()
            .min_by_key(|&c| (c as i32 - target).abs())
            .unwrap_or(code)
    }
}
