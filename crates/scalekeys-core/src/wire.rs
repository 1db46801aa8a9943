//! Byte frames understood by the external synthesizer

use crate::effects::NoteEvent;
use crate::keyboard::CONFIG_KEYS;

pub const CONFIG_HEADER: u8 = 0x7D;
pub const NOTE_ON_HEADER: u8 = 0x7F;
pub const NOTE_OFF_HEADER: u8 = 0x7E;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Pitch codes of the first eight window keys.
    Config([u8; CONFIG_KEYS]),
    NoteOn(u8),
    NoteOff(u8),
}

impl Frame {
    /// Builds a config frame from window codes; missing keys are zero.
    pub fn config(codes: &[u8]) -> Self {
        let mut keys = [0u8; CONFIG_KEYS];
        for (key, code) in keys.iter_mut().zip(codes) {
            *key = *code;
        }
        Self::Config(keys)
    }

    /// Bytes in wire order. The link writes them one at a time with pacing.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Config(keys) => {
                let mut bytes = Vec::with_capacity(1 + CONFIG_KEYS);
                bytes.push(CONFIG_HEADER);
                bytes.extend_from_slice(keys);
                bytes
            }
            Self::NoteOn(code) => vec![NOTE_ON_HEADER, *code],
            Self::NoteOff(code) => vec![NOTE_OFF_HEADER, *code],
        }
    }
}

impl From<NoteEvent> for Frame {
    fn from(event: NoteEvent) -> Self {
        match event {
            NoteEvent::On(code) => Self::NoteOn(code),
            NoteEvent::Off(code) => Self::NoteOff(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_frame_bytes() {
        let frame = Frame::config(&[60, 62, 64, 65, 67, 69, 71, 72]);
        assert_eq!(frame.encode(), vec![0x7D, 0x3C, 0x3E, 0x40, 0x41, 0x43, 0x45, 0x47, 0x48]);
    }

    #[test]
    fn test_config_frame_pads_and_truncates() {
        assert_eq!(Frame::config(&[60]).encode(), vec![0x7D, 60, 0, 0, 0, 0, 0, 0, 0]);
        let long: Vec<u8> = (50..65).collect();
        assert_eq!(Frame::config(&long).encode().len(), 9);
    }

    #[test]
    fn test_note_frames() {
        assert_eq!(Frame::from(NoteEvent::On(60)).encode(), vec![0x7F, 0x3C]);
        assert_eq!(Frame::from(NoteEvent::Off(60)).encode(), vec![0x7E, 0x3C]);
    }
}
