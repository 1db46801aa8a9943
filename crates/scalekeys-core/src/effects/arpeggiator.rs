//! Arpeggiator: held keys feed a shared note set that a background run plays

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::ScaleKeysError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpOrder {
    #[default]
    Ascending,
    Descending,
    PingPong,
    Random,
}

impl ArpOrder {
    pub const ALL: [ArpOrder; 4] = [Self::Ascending, Self::Descending, Self::PingPong, Self::Random];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascending => "Ascending",
            Self::Descending => "Descending",
            Self::PingPong => "PingPong",
            Self::Random => "Random",
        }
    }

    /// One playback cycle over an ascending snapshot.
    pub fn sequence(&self, sorted: &[u8], rng: &mut fastrand::Rng) -> Vec<u8> {
        match self {
            Self::Ascending => sorted.to_vec(),
            Self::Descending => sorted.iter().rev().copied().collect(),
            Self::PingPong => {
                let mut seq = sorted.to_vec();
                if sorted.len() > 1 {
                    seq.extend(sorted[..sorted.len() - 1].iter().rev());
                }
                seq
            }
            Self::Random => {
                let mut seq = sorted.to_vec();
                rng.shuffle(&mut seq);
                seq
            }
        }
    }
}

impl fmt::Display for ArpOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArpOrder {
    type Err = ScaleKeysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "ascending" | "up" => Ok(Self::Ascending),
            "descending" | "down" => Ok(Self::Descending),
            "pingpong" | "updown" => Ok(Self::PingPong),
            "random" => Ok(Self::Random),
            _ => Err(ScaleKeysError::InvalidEffect(format!("unknown arpeggio order {s:?}"))),
        }
    }
}

/// Pitch codes currently held under the arpeggiator.
///
/// Shared between the control thread (insert/remove on keys) and the
/// playback run, which takes one sorted snapshot per cycle.
#[derive(Debug, Clone, Default)]
pub struct ArpNoteSet(Arc<Mutex<Vec<u8>>>);

impl ArpNoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, code: u8) {
        if let Ok(mut notes) = self.0.lock() {
            notes.push(code);
        }
    }

    /// Removes one instance of `code`; returns whether one was held.
    pub fn remove_one(&self, code: u8) -> bool {
        let Ok(mut notes) = self.0.lock() else {
            return false;
        };
        match notes.iter().position(|&c| c == code) {
            Some(index) => {
                notes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn sorted_snapshot(&self) -> Vec<u8> {
        let mut snapshot = self.0.lock().map(|n| n.clone()).unwrap_or_default();
        snapshot.sort_unstable();
        snapshot
    }

    pub fn clear(&self) {
        if let Ok(mut notes) = self.0.lock() {
            notes.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.0.lock().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArpeggiatorFx {
    pub order: ArpOrder,
    notes: ArpNoteSet,
}

impl ArpeggiatorFx {
    pub fn new(order: ArpOrder) -> Self {
        Self { order, notes: ArpNoteSet::new() }
    }

    pub fn notes(&self) -> &ArpNoteSet {
        &self.notes
    }

    pub fn key_down(&mut self, code: u8) {
        self.notes.insert(code);
    }

    pub fn key_up(&mut self, code: u8) {
        self.notes.remove_one(code);
    }

    pub fn reset(&mut self) {
        self.notes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences() {
        let mut rng = fastrand::Rng::with_seed(7);
        let sorted = [60, 64, 67];
        assert_eq!(ArpOrder::Ascending.sequence(&sorted, &mut rng), vec![60, 64, 67]);
        assert_eq!(ArpOrder::Descending.sequence(&sorted, &mut rng), vec![67, 64, 60]);
        assert_eq!(ArpOrder::PingPong.sequence(&sorted, &mut rng), vec![60, 64, 67, 64, 60]);
        assert_eq!(ArpOrder::PingPong.sequence(&[60], &mut rng), vec![60]);

        let mut shuffled = ArpOrder::Random.sequence(&sorted, &mut rng);
        shuffled.sort_unstable();
        assert_eq!(shuffled, vec![60, 64, 67]);
    }

    #[test]
    fn test_order_parsing() {
        for order in ArpOrder::ALL {
            assert_eq!(order.to_string().parse::<ArpOrder>().unwrap(), order);
        }
        assert_eq!("Ping Pong".parse::<ArpOrder>().unwrap(), ArpOrder::PingPong);
        assert!("sideways".parse::<ArpOrder>().is_err());
    }

    #[test]
    fn test_note_set_tolerates_duplicates() {
        let set = ArpNoteSet::new();
        set.insert(67);
        set.insert(60);
        set.insert(67);
        assert_eq!(set.sorted_snapshot(), vec![60, 67, 67]);
        assert!(set.remove_one(67));
        assert_eq!(set.sorted_snapshot(), vec![60, 67]);
        assert!(!set.remove_one(61));

        let shared = set.clone();
        shared.clear();
        assert!(set.is_empty());
    }
}
