//! Reference stroke geometry
//!
//! Each character has an optional data file `<glyph>.json` holding stroke
//! outlines and the median (centerline) of every stroke in a 1024-unit
//! coordinate space with the y axis pointing up. A missing file is a normal
//! "no data" answer, not an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Centerline of one reference stroke
pub type Median = Vec<[f64; 2]>;

/// Reference geometry for one character
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeReference {
    /// SVG path outlines, one per stroke
    #[serde(default)]
    pub strokes: Vec<String>,
    /// Median point sequences, one per stroke, in writing order
    #[serde(default)]
    pub medians: Vec<Median>,
}

impl StrokeReference {
    pub fn stroke_count(&self) -> usize {
        self.medians.len()
    }
}

/// Source of reference stroke geometry
#[async_trait]
pub trait ReferenceData: Send + Sync {
    /// Look up a character; None when no data exists
    async fn lookup(&self, character: &str) -> Option<StrokeReference>;
}

/// Reference data read from a directory of per-character JSON files
pub struct FileReferenceData {
    dir: PathBuf,
}

impl FileReferenceData {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, character: &str) -> PathBuf {
        self.dir.join(format!("{}.json", character))
    }
}

#[async_trait]
impl ReferenceData for FileReferenceData {
    async fn lookup(&self, character: &str) -> Option<StrokeReference> {
        // Keep lookups inside the data directory
        if character.is_empty() || character.contains(['/', '\\', '.']) {
            return None;
        }

        let path = self.path_for(character);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No reference data for '{}'", character);
                return None;
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!("Malformed reference data {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lookup_reads_medians() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("十.json"),
            r#"{"strokes":["M 1 2","M 3 4"],"medians":[[[100,500],[900,500]],[[500,900],[500,100]]]}"#,
        )
        .unwrap();

        let data = FileReferenceData::new(dir.path());
        let reference = data.lookup("十").await.unwrap();
        assert_eq!(reference.stroke_count(), 2);
        assert_eq!(reference.medians[0][1], [900.0, 500.0]);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_are_none() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("坏.json"), "{not json").unwrap();

        let data = FileReferenceData::new(dir.path());
        assert!(data.lookup("山").await.is_none());
        assert!(data.lookup("坏").await.is_none());
        assert!(data.lookup("../etc/passwd").await.is_none());
    }
}
