//! Loads the scale catalog from a CSV file

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use scalekeys_core::{PitchTable, Result, ScaleCatalog};
use tracing::info;

pub fn load_scales(path: &Path, table: &PitchTable) -> Result<ScaleCatalog> {
    let file = File::open(path)?;
    let catalog = ScaleCatalog::from_reader(BufReader::new(file), table)?;
    info!(path = %path.display(), scales = catalog.len(), "Scales loaded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Major,G,A,B,C,D,E,F#,G").unwrap();
        writeln!(file, "Minor,E,F#,G,A,B,C,D,,,").unwrap();

        let catalog = load_scales(file.path(), &PitchTable::new()).unwrap();
        assert_eq!(catalog.len(), 2);
        let g_major = catalog.get("G", "Major").unwrap();
        assert_eq!(g_major.degree_count(), 7);
        assert!(g_major.pitch_table().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_scales(Path::new("/nonexistent/scales.csv"), &PitchTable::new()).is_err());
    }
}
