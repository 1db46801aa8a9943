//! scalekeys-core: scale-bounded note pipeline domain types

mod catalog;
pub mod effects;
mod error;
pub mod keyboard;
mod note;
mod pitch;
mod scale;
pub mod wire;

pub use catalog::{parse_scale_row, ScaleCatalog};
pub use effects::{
    ActiveEffect, ArpNoteSet, ArpOrder, ArpeggioRequest, Effect, EffectChain, EffectOutput, NoteEvent, SlotNote,
};
pub use error::{Result, ScaleKeysError};
pub use keyboard::{key_for_slot, slot_for_key, KeyboardWindow, VisibleKey, CONFIG_KEYS, KEY_MAP, WINDOW_SIZE};
pub use note::{normalize_name, Note, TOP_OCTAVE};
pub use pitch::{PitchTable, MAX_OCTAVE, MIN_OCTAVE, PITCH_CLASSES};
pub use scale::Scale;
pub use wire::Frame;
