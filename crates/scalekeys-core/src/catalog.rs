//! The set of loadable scales, keyed by (mode, root)

use std::io::BufRead;

use crate::error::{Result, ScaleKeysError};
use crate::note::normalize_name;
use crate::pitch::PitchTable;
use crate::scale::Scale;

#[derive(Debug, Clone, Default)]
pub struct ScaleCatalog {
    scales: Vec<Scale>,
}

impl ScaleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `mode,root,note,...` rows. Blank lines and blank fields are skipped.
    pub fn from_reader<R: BufRead>(reader: R, table: &PitchTable) -> Result<Self> {
        let mut catalog = Self::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let scale = parse_scale_row(&line, table).map_err(|e| match e {
                ScaleKeysError::InvalidScaleRow(msg) => {
                    ScaleKeysError::InvalidScaleRow(format!("line {}: {msg}", index + 1))
                }
                other => other,
            })?;
            catalog.add(scale);
        }
        Ok(catalog)
    }

    /// Adds a scale, replacing any existing one with the same key.
    pub fn add(&mut self, scale: Scale) {
        match self
            .scales
            .iter_mut()
            .find(|s| s.mode() == scale.mode() && s.root().name() == scale.root().name())
        {
            Some(existing) => *existing = scale,
            None => self.scales.push(scale),
        }
    }

    pub fn get(&self, root: &str, mode: &str) -> Option<&Scale> {
        let root = normalize_name(root);
        self.scales
            .iter()
            .find(|s| s.mode() == mode && s.root().name() == root)
    }

    /// Distinct roots in load order.
    pub fn roots(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = Vec::new();
        for scale in &self.scales {
            if !roots.contains(&scale.root().name()) {
                roots.push(scale.root().name());
            }
        }
        roots
    }

    /// Distinct modes in load order.
    pub fn modes(&self) -> Vec<&str> {
        let mut modes: Vec<&str> = Vec::new();
        for scale in &self.scales {
            if !modes.contains(&scale.mode()) {
                modes.push(scale.mode());
            }
        }
        modes
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

/// One row: mode, root, then the remaining degrees (the root may repeat first
/// and last; both are tolerated).
pub fn parse_scale_row(line: &str, table: &PitchTable) -> Result<Scale> {
    let fields: Vec<&str> = line
        .split(',')
        .map(|f| f.trim().trim_matches('"'))
        .filter(|f| !f.is_empty())
        .collect();
    let [mode, root, rest @ ..] = fields.as_slice() else {
        return Err(ScaleKeysError::InvalidScaleRow(line.to_string()));
    };
    Scale::new(mode, root, rest, table)
}
