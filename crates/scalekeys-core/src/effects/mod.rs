//! Single-slot note effects and the chain that routes key events through them

mod arpeggiator;
mod chordify;
mod monophonic;
mod pitch_shift;

pub use arpeggiator::{ArpNoteSet, ArpOrder, ArpeggiatorFx};
pub use chordify::ChordifyFx;
pub use monophonic::MonophonicFx;
pub use pitch_shift::PitchShiftFx;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScaleKeysError};
use crate::keyboard::WINDOW_SIZE;
use crate::scale::Scale;

/// A processed output event carrying a pitch code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteEvent {
    On(u8),
    Off(u8),
}

impl NoteEvent {
    pub fn code(&self) -> u8 {
        match self {
            Self::On(code) | Self::Off(code) => *code,
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Self::On(_))
    }
}

/// Which effect is active, with its single parameter.
///
/// The text form is the preset format: `Chordify`, `Arpeggiator Ascending`,
/// `PitchShift -3`, `Monophonic`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveEffect {
    #[default]
    None,
    Chordify,
    Arpeggiate { order: ArpOrder },
    PitchShift { semitone_offset: i32 },
    Monophonic,
}

impl fmt::Display for ActiveEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Chordify => f.write_str("Chordify"),
            Self::Arpeggiate { order } => write!(f, "Arpeggiator {order}"),
            Self::PitchShift { semitone_offset } => write!(f, "PitchShift {semitone_offset}"),
            Self::Monophonic => f.write_str("Monophonic"),
        }
    }
}

impl FromStr for ActiveEffect {
    type Err = ScaleKeysError;

    fn from_str(s: &str) -> Result<Self> {
        let mut tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(ScaleKeysError::InvalidEffect(s.to_string()));
        }
        let mut name = tokens.remove(0).to_ascii_lowercase();
        if name == "pitch" && tokens.first().is_some_and(|t| t.eq_ignore_ascii_case("shift")) {
            tokens.remove(0);
            name = "pitchshift".to_string();
        }
        let param = tokens.join(" ");

        match name.as_str() {
            "none" => Ok(Self::None),
            "chordify" => Ok(Self::Chordify),
            "arpeggiator" | "arpegiator" | "arpeggiate" => {
                let order = if param.is_empty() { ArpOrder::default() } else { param.parse()? };
                Ok(Self::Arpeggiate { order })
            }
            "pitchshift" => Ok(Self::PitchShift {
                semitone_offset: PitchShiftFx::parse_offset(&param),
            }),
            "monophonic" => Ok(Self::Monophonic),
            _ => Err(ScaleKeysError::InvalidEffect(s.to_string())),
        }
    }
}

// ============================================================================
// Live effect instances
// ============================================================================

/// The active effect together with its transient state.
#[derive(Debug, Clone)]
pub enum Effect {
    Chordify(ChordifyFx),
    Arpeggiate(ArpeggiatorFx),
    PitchShift(PitchShiftFx),
    Monophonic(MonophonicFx),
}

impl Effect {
    pub fn from_active(active: ActiveEffect) -> Option<Self> {
        match active {
            ActiveEffect::None => None,
            ActiveEffect::Chordify => Some(Self::Chordify(ChordifyFx)),
            ActiveEffect::Arpeggiate { order } => Some(Self::Arpeggiate(ArpeggiatorFx::new(order))),
            ActiveEffect::PitchShift { semitone_offset } => {
                Some(Self::PitchShift(PitchShiftFx::new(semitone_offset)))
            }
            ActiveEffect::Monophonic => Some(Self::Monophonic(MonophonicFx::default())),
        }
    }

    pub fn describe(&self) -> ActiveEffect {
        match self {
            Self::Chordify(_) => ActiveEffect::Chordify,
            Self::Arpeggiate(fx) => ActiveEffect::Arpeggiate { order: fx.order },
            Self::PitchShift(fx) => ActiveEffect::PitchShift { semitone_offset: fx.semitone_offset },
            Self::Monophonic(_) => ActiveEffect::Monophonic,
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Arpeggiate(fx) => fx.reset(),
            Self::Monophonic(fx) => fx.reset(),
            Self::Chordify(_) | Self::PitchShift(_) => {}
        }
    }
}

// ============================================================================
// Effect chain
// ============================================================================

/// What a held window slot is currently sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotNote {
    Single(u8),
    /// Root of a chordified triad; the triad is re-derived on release.
    Chord(u8),
    /// Held under the arpeggiator; key events produce no direct output.
    Arpeggiated(u8),
}

/// Request to (re)start arpeggio playback over a shared note set.
#[derive(Debug, Clone)]
pub struct ArpeggioRequest {
    pub order: ArpOrder,
    pub notes: ArpNoteSet,
}

#[derive(Debug, Clone, Default)]
pub struct EffectOutput {
    pub events: Vec<NoteEvent>,
    pub arpeggio: Option<ArpeggioRequest>,
}

impl EffectOutput {
    fn events(events: Vec<NoteEvent>) -> Self {
        Self { events, arpeggio: None }
    }
}

/// Routes raw key events through at most one effect.
#[derive(Debug, Clone, Default)]
pub struct EffectChain {
    effect: Option<Effect>,
    pending: [Option<SlotNote>; WINDOW_SIZE],
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> ActiveEffect {
        self.effect.as_ref().map(Effect::describe).unwrap_or_default()
    }

    pub fn pending(&self, slot: usize) -> Option<SlotNote> {
        self.pending.get(slot).copied().flatten()
    }

    /// The note set of the active arpeggiator, if any.
    pub fn arp_notes(&self) -> Option<&ArpNoteSet> {
        match &self.effect {
            Some(Effect::Arpeggiate(fx)) => Some(fx.notes()),
            _ => None,
        }
    }

    /// Resolves the key to a pitch code and runs it through the active
    /// effect. A second key-down on a slot that is already sounding is ignored.
    pub fn on_key_down(&mut self, slot: usize, name: &str, octave: u8, scale: &Scale) -> Result<EffectOutput> {
        if slot >= WINDOW_SIZE {
            return Err(ScaleKeysError::PitchRange(format!("slot {slot}")));
        }
        if self.pending[slot].is_some() {
            return Ok(EffectOutput::default());
        }
        let code = scale.code_of(name, octave)?;
        let table = scale.pitch_table();

        let (note, output) = match &mut self.effect {
            None => (SlotNote::Single(code), EffectOutput::events(vec![NoteEvent::On(code)])),
            Some(Effect::Chordify(_)) => {
                (SlotNote::Chord(code), EffectOutput::events(ChordifyFx::key_down(code, table)))
            }
            Some(Effect::Arpeggiate(fx)) => {
                fx.key_down(code);
                let request = ArpeggioRequest { order: fx.order, notes: fx.notes().clone() };
                (SlotNote::Arpeggiated(code), EffectOutput { events: Vec::new(), arpeggio: Some(request) })
            }
            Some(Effect::PitchShift(fx)) => {
                let shifted = fx.shift(code, table);
                (SlotNote::Single(shifted), EffectOutput::events(vec![NoteEvent::On(shifted)]))
            }
            Some(Effect::Monophonic(fx)) => {
                // the previous key stops sounding, so its release must stay silent
                self.pending = Default::default();
                (SlotNote::Single(code), EffectOutput::events(fx.key_down(code)))
            }
        };
        self.pending[slot] = Some(note);
        Ok(output)
    }

    pub fn on_key_up(&mut self, slot: usize, scale: &Scale) -> EffectOutput {
        let Some(note) = self.pending.get_mut(slot).and_then(Option::take) else {
            return EffectOutput::default();
        };
        let events = match (note, &mut self.effect) {
            (SlotNote::Single(code), Some(Effect::Monophonic(fx))) => fx.key_up(code).into_iter().collect(),
            (SlotNote::Single(code), _) => vec![NoteEvent::Off(code)],
            (SlotNote::Chord(root), _) => ChordifyFx::key_up(root, scale.pitch_table()),
            (SlotNote::Arpeggiated(code), Some(Effect::Arpeggiate(fx))) => {
                fx.key_up(code);
                Vec::new()
            }
            (SlotNote::Arpeggiated(_), _) => Vec::new(),
        };
        EffectOutput::events(events)
    }

    /// Replaces the active effect. Sounding notes are released first and all
    /// transient state of the old effect is discarded.
    pub fn set_effect(&mut self, active: ActiveEffect, table: &[u8]) -> Vec<NoteEvent> {
        let released = self.release_all(table);
        self.effect = Effect::from_active(active);
        released
    }

    pub fn remove_effect(&mut self, table: &[u8]) -> Vec<NoteEvent> {
        self.set_effect(ActiveEffect::None, table)
    }

    /// Off events for every sounding slot, clearing all pending state
    /// including the arpeggiator note set.
    pub fn release_all(&mut self, table: &[u8]) -> Vec<NoteEvent> {
        let mut events: Vec<NoteEvent> = Vec::new();
        for note in self.pending.iter_mut().filter_map(Option::take) {
            let codes = match note {
                SlotNote::Single(code) | SlotNote::Arpeggiated(code) => vec![code],
                SlotNote::Chord(root) => ChordifyFx::triad(root, table).to_vec(),
            };
            for code in codes {
                let off = NoteEvent::Off(code);
                if !events.contains(&off) {
                    events.push(off);
                }
            }
        }
        if let Some(effect) = self.effect.as_mut() {
            effect.reset();
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::PitchTable;

    fn c_major() -> Scale {
        Scale::new("Major", "C", &["C", "D", "E", "F", "G", "A", "B"], &PitchTable::new()).unwrap()
    }

    #[test]
    fn test_no_effect_passes_through() {
        let scale = c_major();
        let mut chain = EffectChain::new();
        let out = chain.on_key_down(0, "C", 5, &scale).unwrap();
        assert_eq!(out.events, vec![NoteEvent::On(60)]);
        assert!(out.arpeggio.is_none());
        assert_eq!(chain.on_key_up(0, &scale).events, vec![NoteEvent::Off(60)]);
        assert!(chain.on_key_up(0, &scale).events.is_empty());
    }

    #[test]
    fn test_repeated_key_down_is_ignored() {
        let scale = c_major();
        let mut chain = EffectChain::new();
        chain.on_key_down(3, "F", 2, &scale).unwrap();
        assert!(chain.on_key_down(3, "F", 2, &scale).unwrap().events.is_empty());
    }

    #[test]
    fn test_unknown_pitch_is_an_error_without_state() {
        let scale = c_major();
        let mut chain = EffectChain::new();
        assert!(chain.on_key_down(0, "C#", 4, &scale).is_err());
        assert!(chain.on_key_down(WINDOW_SIZE, "C", 5, &scale).is_err());
        assert_eq!(chain.pending(0), None);
    }

    #[test]
    fn test_chordify_round_trip() {
        let scale = c_major();
        let mut chain = EffectChain::new();
        chain.set_effect(ActiveEffect::Chordify, scale.pitch_table());
        let down = chain.on_key_down(1, "D", 3, &scale).unwrap();
        assert_eq!(down.events, vec![NoteEvent::On(38), NoteEvent::On(41), NoteEvent::On(45)]);
        let up = chain.on_key_up(1, &scale);
        assert_eq!(up.events, vec![NoteEvent::Off(38), NoteEvent::Off(41), NoteEvent::Off(45)]);
    }

    #[test]
    fn test_pitch_shift_snaps_into_scale() {
        let scale = c_major();
        let mut chain = EffectChain::new();
        chain.set_effect(ActiveEffect::PitchShift { semitone_offset: 1 }, scale.pitch_table());
        // E5 (64) + 1 = 65 = F5, in scale
        assert_eq!(chain.on_key_down(2, "E", 5, &scale).unwrap().events, vec![NoteEvent::On(65)]);
        // C5 (60) + 1 = 61, tie between 60 and 62 resolves low
        assert_eq!(chain.on_key_down(0, "C", 5, &scale).unwrap().events, vec![NoteEvent::On(60)]);
        assert_eq!(chain.on_key_up(2, &scale).events, vec![NoteEvent::Off(65)]);
    }

    #[test]
    fn test_monophonic_last_note_priority() {
        let scale = c_major();
        let mut chain = EffectChain::new();
        chain.set_effect(ActiveEffect::Monophonic, scale.pitch_table());
        assert_eq!(chain.on_key_down(0, "C", 5, &scale).unwrap().events, vec![NoteEvent::On(60)]);
        assert_eq!(
            chain.on_key_down(4, "G", 5, &scale).unwrap().events,
            vec![NoteEvent::Off(60), NoteEvent::On(67)]
        );
        assert!(chain.on_key_up(0, &scale).events.is_empty());
        assert_eq!(chain.on_key_up(4, &scale).events, vec![NoteEvent::Off(67)]);
    }

    #[test]
    fn test_arpeggiate_fills_shared_set() {
        let scale = c_major();
        let mut chain = EffectChain::new();
        chain.set_effect(ActiveEffect::Arpeggiate { order: ArpOrder::Descending }, scale.pitch_table());
        let out = chain.on_key_down(4, "G", 5, &scale).unwrap();
        assert!(out.events.is_empty());
        let request = out.arpeggio.unwrap();
        assert_eq!(request.order, ArpOrder::Descending);
        chain.on_key_down(0, "C", 5, &scale).unwrap();
        assert_eq!(request.notes.sorted_snapshot(), vec![60, 67]);

        assert!(chain.on_key_up(4, &scale).events.is_empty());
        assert_eq!(request.notes.sorted_snapshot(), vec![60]);
    }

    #[test]
    fn test_replacing_effect_releases_and_clears() {
        let scale = c_major();
        let mut chain = EffectChain::new();
        chain.set_effect(ActiveEffect::Chordify, scale.pitch_table());
        chain.on_key_down(0, "C", 5, &scale).unwrap();

        let released = chain.set_effect(ActiveEffect::Arpeggiate { order: ArpOrder::Ascending }, scale.pitch_table());
        assert_eq!(released, vec![NoteEvent::Off(60), NoteEvent::Off(64), NoteEvent::Off(67)]);
        assert_eq!(chain.pending(0), None);

        chain.on_key_down(1, "D", 5, &scale).unwrap();
        let notes = chain.arp_notes().unwrap().clone();
        assert_eq!(chain.remove_effect(scale.pitch_table()), vec![NoteEvent::Off(62)]);
        assert!(notes.is_empty());
        assert_eq!(chain.active(), ActiveEffect::None);
    }

    #[test]
    fn test_release_all_empties_arp_set() {
        let scale = c_major();
        let mut chain = EffectChain::new();
        chain.set_effect(ActiveEffect::Arpeggiate { order: ArpOrder::Ascending }, scale.pitch_table());
        chain.on_key_down(0, "C", 5, &scale).unwrap();
        chain.on_key_down(2, "E", 5, &scale).unwrap();

        let released = chain.release_all(scale.pitch_table());
        assert_eq!(released, vec![NoteEvent::Off(60), NoteEvent::Off(64)]);
        assert!(chain.arp_notes().unwrap().is_empty());
        assert!(chain.on_key_up(0, &scale).events.is_empty());
        assert_eq!(chain.active(), ActiveEffect::Arpeggiate { order: ArpOrder::Ascending });
    }

    #[test]
    fn test_preset_text() {
        let presets = [
            ActiveEffect::Chordify,
            ActiveEffect::Arpeggiate { order: ArpOrder::PingPong },
            ActiveEffect::PitchShift { semitone_offset: -3 },
            ActiveEffect::Monophonic,
        ];
        for preset in presets {
            assert_eq!(preset.to_string().parse::<ActiveEffect>().unwrap(), preset);
        }
        assert_eq!(ActiveEffect::PitchShift { semitone_offset: -3 }.to_string(), "PitchShift -3");
        assert_eq!(
            "Arpegiator".parse::<ActiveEffect>().unwrap(),
            ActiveEffect::Arpeggiate { order: ArpOrder::Ascending }
        );
        assert_eq!(
            "Pitch Shift abc".parse::<ActiveEffect>().unwrap(),
            ActiveEffect::PitchShift { semitone_offset: 0 }
        );
        assert!("Reverb".parse::<ActiveEffect>().is_err());
        assert!("".parse::<ActiveEffect>().is_err());
    }
}
