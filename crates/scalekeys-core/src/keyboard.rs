//! The 15-key sliding window over the active scale

use std::collections::VecDeque;

use crate::catalog::ScaleCatalog;
use crate::error::{Result, ScaleKeysError};
use crate::note::TOP_OCTAVE;
use crate::pitch::MIN_OCTAVE;
use crate::scale::Scale;

/// Number of playable slots.
pub const WINDOW_SIZE: usize = 15;
/// Number of leading slots sent to the external device as its key layout.
pub const CONFIG_KEYS: usize = 8;
/// Hardware keys bound to the slots, left to right.
pub const KEY_MAP: [char; WINDOW_SIZE] = [
    'z', 'x', 'c', 'v', 'b', 'n', 'm', 'q', 'w', 'e', 'r', 't', 'y', 'u', 'i',
];

/// Smallest cycle that can fill the window within octaves 1..=7.
const MIN_DEGREES: usize = 3;

pub fn slot_for_key(key: char) -> Option<usize> {
    KEY_MAP.iter().position(|&k| k == key.to_ascii_lowercase())
}

pub fn key_for_slot(slot: usize) -> Option<char> {
    KEY_MAP.get(slot).copied()
}

/// One visible key: a scale degree in a cycle octave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleKey {
    pub name: String,
    pub octave: u8,
    pub degree: usize,
}

impl VisibleKey {
    pub fn label(&self) -> String {
        format!("{}{}", self.name, self.octave)
    }
}

#[derive(Debug, Clone)]
pub struct KeyboardWindow {
    scale: Option<Scale>,
    visible: VecDeque<VisibleKey>,
    /// Degree the next right-side append produces.
    cursor: usize,
    start_octave: u8,
    /// Octave the next right-side append is annotated with.
    end_octave: u8,
}

impl Default for KeyboardWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardWindow {
    pub fn new() -> Self {
        Self {
            scale: None,
            visible: VecDeque::with_capacity(WINDOW_SIZE),
            cursor: 0,
            start_octave: MIN_OCTAVE,
            end_octave: MIN_OCTAVE,
        }
    }

    /// Activates the scale for `root` + `mode` and rebuilds the window.
    ///
    /// Returns `Ok(false)` without touching state when either field is unset.
    /// The new window starts at the previous scale's canonical octave.
    pub fn select_scale(&mut self, catalog: &ScaleCatalog, root: &str, mode: &str) -> Result<bool> {
        let (root, mode) = (root.trim(), mode.trim());
        if root.is_empty() || mode.is_empty() {
            return Ok(false);
        }
        let mut scale = catalog
            .get(root, mode)
            .cloned()
            .ok_or_else(|| ScaleKeysError::ScaleNotFound {
                root: root.to_string(),
                mode: mode.to_string(),
            })?;
        let degrees = scale.degree_count();
        if degrees < MIN_DEGREES {
            return Err(ScaleKeysError::ScaleTooSmall(format!("{root} {mode}")));
        }

        let previous = self.scale.as_ref().map(Scale::base_octave).unwrap_or(MIN_OCTAVE);
        let highest_start = TOP_OCTAVE.saturating_sub(((WINDOW_SIZE - 1) / degrees) as u8).max(MIN_OCTAVE);
        let base = previous.clamp(MIN_OCTAVE, highest_start);
        scale.set_octave(base);

        self.scale = Some(scale);
        self.cursor = 0;
        self.start_octave = base;
        self.end_octave = base;
        self.rebuild();
        Ok(true)
    }

    fn rebuild(&mut self) {
        self.visible.clear();
        for _ in 0..WINDOW_SIZE {
            match self.produce_next_visible() {
                Some(key) => self.visible.push_back(key),
                None => break,
            }
        }
        if let Some(first) = self.visible.front() {
            self.start_octave = first.octave;
        }
    }

    /// Emits the degree under the cursor at `end_octave`, then advances.
    /// Passing the last degree before the sentinel wraps the cursor and
    /// raises `end_octave` (capped at the top octave).
    fn produce_next_visible(&mut self) -> Option<VisibleKey> {
        let scale = self.scale.as_ref()?;
        let last_degree = scale.degree_count() - 1;
        let degree = self.cursor.min(last_degree);
        let key = VisibleKey {
            name: scale.notes()[degree].name().to_string(),
            octave: self.end_octave,
            degree,
        };
        if degree == last_degree {
            self.cursor = 0;
            if self.end_octave < TOP_OCTAVE {
                self.end_octave += 1;
            }
        } else {
            self.cursor = degree + 1;
        }
        Some(key)
    }

    /// The key preceding the current leftmost one.
    fn produce_left_of_first(&mut self) -> Option<VisibleKey> {
        let scale = self.scale.as_ref()?;
        let first = self.visible.front()?;
        let (degree, octave) = if first.degree == 0 {
            (scale.degree_count() - 1, first.octave.saturating_sub(1).max(MIN_OCTAVE))
        } else {
            (first.degree - 1, first.octave)
        };
        self.start_octave = octave;
        Some(VisibleKey {
            name: scale.notes()[degree].name().to_string(),
            octave,
            degree,
        })
    }

    pub fn can_shift_right(&self) -> bool {
        match (self.scale.as_ref(), self.visible.back()) {
            (Some(scale), Some(last)) => {
                !(last.degree == scale.degree_count() - 1 && last.octave >= TOP_OCTAVE)
            }
            _ => false,
        }
    }

    pub fn can_shift_left(&self) -> bool {
        match self.visible.front() {
            Some(first) => !(first.degree == 0 && first.octave <= MIN_OCTAVE),
            None => false,
        }
    }

    /// Drops the leftmost key and appends the next one. Saturates at the top.
    pub fn shift_right(&mut self) -> bool {
        if !self.can_shift_right() {
            return false;
        }
        let Some(key) = self.produce_next_visible() else {
            return false;
        };
        self.visible.pop_front();
        self.visible.push_back(key);
        if let Some(first) = self.visible.front() {
            self.start_octave = first.octave;
        }
        true
    }

    /// Drops the rightmost key and prepends its predecessor. Saturates at
    /// the bottom. The cursor is re-anchored on the dropped key so a later
    /// right shift produces it again.
    pub fn shift_left(&mut self) -> bool {
        if !self.can_shift_left() {
            return false;
        }
        let Some(key) = self.produce_left_of_first() else {
            return false;
        };
        if let Some(dropped) = self.visible.pop_back() {
            self.cursor = dropped.degree;
            self.end_octave = dropped.octave;
        }
        self.visible.push_front(key);
        true
    }

    pub fn can_octave_up(&self) -> bool {
        self.visible.back().is_some_and(|k| k.octave < TOP_OCTAVE)
    }

    pub fn can_octave_down(&self) -> bool {
        self.visible.front().is_some_and(|k| k.octave > MIN_OCTAVE)
    }

    /// Moves the whole window one octave up (`delta > 0`) or down
    /// (`delta < 0`), anchored on the leftmost key's degree. The active
    /// scale's canonical notes move with it.
    pub fn change_octave(&mut self, delta: i8) -> bool {
        let allowed = match delta.signum() {
            1 => self.can_octave_up(),
            -1 => self.can_octave_down(),
            _ => false,
        };
        if !allowed {
            return false;
        }
        let (Some(scale), Some(first)) = (self.scale.as_mut(), self.visible.front()) else {
            return false;
        };
        scale.adjust_octaves(delta.signum());
        let start = (first.octave as i8 + delta.signum()) as u8;
        self.cursor = first.degree;
        self.start_octave = start;
        self.end_octave = start;
        self.rebuild();
        true
    }

    pub fn scale(&self) -> Option<&Scale> {
        self.scale.as_ref()
    }

    pub fn visible(&self) -> &VecDeque<VisibleKey> {
        &self.visible
    }

    pub fn key(&self, slot: usize) -> Option<&VisibleKey> {
        self.visible.get(slot)
    }

    pub fn is_root(&self, slot: usize) -> bool {
        self.key(slot).is_some_and(|k| k.degree == 0)
    }

    /// Pitch code of the key in `slot`.
    pub fn pitch_code(&self, slot: usize) -> Result<u8> {
        let key = self
            .key(slot)
            .ok_or_else(|| ScaleKeysError::PitchRange(format!("slot {slot}")))?;
        let scale = self
            .scale
            .as_ref()
            .ok_or_else(|| ScaleKeysError::PitchRange(key.label()))?;
        scale.pitch_code(key.degree, key.octave)
    }

    /// Pitch codes of the leading keys, for the device's configuration frame.
    pub fn config_codes(&self) -> Vec<u8> {
        (0..CONFIG_KEYS.min(self.visible.len()))
            .filter_map(|slot| self.pitch_code(slot).ok())
            .collect()
    }

    pub fn start_octave(&self) -> u8 {
        self.start_octave
    }

    pub fn end_octave(&self) -> u8 {
        self.end_octave
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
