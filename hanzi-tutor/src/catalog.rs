//! Character catalog import
//!
//! The catalog is rebuilt from a reference data directory: every
//! `<glyph>.json` file contributes one character. Grades come from a grade
//! map (characters it does not list land in grade 6) and example words are
//! drawn from an optional phrase list.
//!
//! Import is gated by `char_data_version`: it runs when the table is empty
//! or the stored version is older than the target.

use crate::db::{characters, settings};
use crate::error::{Error, Result};
use hanzi_common::db::Character;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Catalog version written after a successful import
pub const CATALOG_VERSION: i64 = 11;

/// Grade for characters missing from the grade map
pub const UNLISTED_GRADE: i64 = 6;

const MAX_EXAMPLE_WORDS: usize = 3;

/// Built-in grade map: grade number to the string of its characters
const DEFAULT_GRADES: &str = include_str!("../data/grades.json");

/// Where to read catalog inputs from
#[derive(Debug, Clone)]
pub struct CatalogSource {
    /// Directory of per-character reference files
    pub data_dir: PathBuf,
    /// Phrase list (`{"data": [{"content": ["..."]}]}`)
    pub phrases: Option<PathBuf>,
    /// Grade map overriding the built-in one (`{"1": "一二三..."}`)
    pub grades: Option<PathBuf>,
}

impl CatalogSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            phrases: None,
            grades: None,
        }
    }

    pub fn with_phrases(mut self, path: impl Into<PathBuf>) -> Self {
        self.phrases = Some(path.into());
        self
    }

    pub fn with_grades(mut self, path: impl Into<PathBuf>) -> Self {
        self.grades = Some(path.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct PhraseFile {
    #[serde(default)]
    data: Vec<PhraseEntry>,
}

#[derive(Debug, Deserialize)]
struct PhraseEntry {
    #[serde(default)]
    content: Vec<String>,
}

/// Parse a grade map; a character listed in several grades keeps the highest
pub fn parse_grade_map(json: &str) -> Result<HashMap<char, i64>> {
    let raw: BTreeMap<String, String> = serde_json::from_str(json)?;

    let mut grades: Vec<(i64, String)> = raw
        .into_iter()
        .map(|(grade, chars)| {
            grade
                .trim()
                .parse::<i64>()
                .map(|g| (g, chars))
                .map_err(|_| Error::Config(format!("invalid grade key '{}'", grade)))
        })
        .collect::<Result<_>>()?;
    grades.sort_by_key(|(grade, _)| *grade);

    let mut map = HashMap::new();
    for (grade, chars) in grades {
        for c in chars.chars().filter(|c| !c.is_whitespace()) {
            map.insert(c, grade);
        }
    }
    Ok(map)
}

/// Multi-character phrases from a phrase list
pub fn parse_phrases(json: &str) -> Result<Vec<String>> {
    let file: PhraseFile = serde_json::from_str(json)?;
    Ok(file
        .data
        .into_iter()
        .flat_map(|entry| entry.content)
        .filter(|text| text.chars().count() > 1)
        .collect())
}

/// Up to three phrases containing `glyph`, longest first
pub fn example_words(glyph: &str, phrases: &[String]) -> Vec<String> {
    let mut words: Vec<&String> = phrases.iter().filter(|p| p.contains(glyph)).collect();
    words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    words.into_iter().take(MAX_EXAMPLE_WORDS).cloned().collect()
}

/// Glyphs that have a reference file in `dir`, sorted
pub async fn list_glyphs(dir: &Path) -> Result<Vec<String>> {
    let mut glyphs = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if stem.chars().count() == 1 {
                glyphs.push(stem.to_string());
            }
        }
    }

    glyphs.sort();
    Ok(glyphs)
}

/// Assemble catalog rows
pub fn build_catalog(glyphs: &[String], grades: &HashMap<char, i64>, phrases: &[String]) -> Vec<Character> {
    glyphs
        .iter()
        .map(|glyph| {
            let grade = glyph
                .chars()
                .next()
                .and_then(|c| grades.get(&c).copied())
                .unwrap_or(UNLISTED_GRADE);

            let mut character = Character::new(glyph.clone(), grade);
            character.example_words = example_words(glyph, phrases);
            character
        })
        .collect()
}

/// Rebuild the catalog from `source`, returning the number of characters
///
/// An empty data directory leaves the existing catalog and version alone.
pub async fn import_catalog(db: &Pool<Sqlite>, source: &CatalogSource, version: i64) -> Result<usize> {
    let grades = match &source.grades {
        Some(path) => parse_grade_map(&tokio::fs::read_to_string(path).await?)?,
        None => parse_grade_map(DEFAULT_GRADES)?,
    };

    let phrases = match &source.phrases {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(json) => parse_phrases(&json).unwrap_or_else(|e| {
                warn!("Ignoring malformed phrase list {}: {}", path.display(), e);
                Vec::new()
            }),
            Err(e) => {
                warn!("Phrase list {} unavailable: {}", path.display(), e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let glyphs = list_glyphs(&source.data_dir).await?;
    let catalog = build_catalog(&glyphs, &grades, &phrases);

    if catalog.is_empty() {
        warn!("No character data found in {}", source.data_dir.display());
        return Ok(0);
    }

    characters::replace_all(db, &catalog).await?;
    settings::set_char_data_version(db, version).await?;

    info!(
        "Imported {} characters from {} ({} phrases), catalog version {}",
        catalog.len(),
        source.data_dir.display(),
        phrases.len(),
        version
    );
    Ok(catalog.len())
}

/// Import when the catalog is empty or older than `target_version`
///
/// Returns the number of imported characters, or None when up to date.
pub async fn import_if_stale(db: &Pool<Sqlite>, source: &CatalogSource, target_version: i64) -> Result<Option<usize>> {
    let count = characters::count_characters(db).await?;
    let version = settings::get_char_data_version(db).await?;

    if count > 0 && version >= target_version {
        info!("Character catalog up to date ({} characters, version {})", count, version);
        return Ok(None);
    }

    import_catalog(db, source, target_version).await.map(Some)
}
