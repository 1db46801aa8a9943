//! Persists the last removed effect so it can be reloaded

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use scalekeys_core::{ActiveEffect, ScaleKeysError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum EffectStoreError {
    #[error("No saved effect at {0}")]
    Missing(PathBuf),
    #[error("Effect file {path} is empty")]
    Empty { path: PathBuf },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ScaleKeysError),
}

/// Whitespace-separated `name param` at a fixed path.
#[derive(Debug, Clone)]
pub struct EffectStore {
    path: PathBuf,
}

impl EffectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, effect: ActiveEffect) -> Result<(), EffectStoreError> {
        fs::write(&self.path, format!("{effect}\n")).map_err(|source| EffectStoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), %effect, "Effect saved");
        Ok(())
    }

    pub fn load(&self) -> Result<ActiveEffect, EffectStoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EffectStoreError::Missing(self.path.clone()));
            }
            Err(source) => {
                return Err(EffectStoreError::Io { path: self.path.clone(), source });
            }
        };
        let line = text
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| EffectStoreError::Empty { path: self.path.clone() })?;
        Ok(line.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalekeys_core::ArpOrder;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = EffectStore::new(dir.path().join("blocks-config.txt"));

        store.save(ActiveEffect::Arpeggiate { order: ArpOrder::Random }).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "Arpeggiator Random\n");
        assert_eq!(store.load().unwrap(), ActiveEffect::Arpeggiate { order: ArpOrder::Random });

        store.save(ActiveEffect::PitchShift { semitone_offset: 5 }).unwrap();
        assert_eq!(store.load().unwrap(), ActiveEffect::PitchShift { semitone_offset: 5 });
    }

    #[test]
    fn test_missing_file_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let store = EffectStore::new(dir.path().join("absent.txt"));
        assert!(matches!(store.load(), Err(EffectStoreError::Missing(_))));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = EffectStore::new(dir.path().join("blocks-config.txt"));
        fs::write(store.path(), "\n\nFlanger 3\n").unwrap();
        assert!(matches!(store.load(), Err(EffectStoreError::Parse(_))));
        fs::write(store.path(), "  \n").unwrap();
        assert!(matches!(store.load(), Err(EffectStoreError::Empty { .. })));
    }
}
