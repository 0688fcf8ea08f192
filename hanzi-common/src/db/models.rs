//! Database models

use serde::{Deserialize, Serialize};

/// Score at or above which a character counts as mastered
pub const PASS_SCORE: i64 = 6;

/// A character in the curriculum, keyed by the glyph itself
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    pub id: String,
    pub pinyin: String,
    /// Stroke metadata (JSON text), backfilled after import
    pub strokes: String,
    /// Curriculum grade, 1 through 6
    pub grade: i64,
    pub example_words: Vec<String>,
    pub meaning: String,
}

impl Character {
    pub fn new(id: impl Into<String>, grade: i64) -> Self {
        Self {
            id: id.into(),
            pinyin: String::new(),
            strokes: String::new(),
            grade,
            example_words: Vec::new(),
            meaning: String::new(),
        }
    }
}

/// A learner profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub avatar: String,
    pub total_points: i64,
    pub current_grade: i64,
    pub last_character_id: String,
    /// Epoch millis
    pub last_login_time: i64,
    /// Cumulative learning time in seconds
    pub total_learning_time: i64,
}

/// Default avatar selector for new users
pub const DEFAULT_AVATAR: &str = "avatar_twilight";

/// Per-user, per-character progress row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub user_id: i64,
    pub character_id: String,
    pub practice_count: i64,
    /// Best handwriting score ever recorded
    pub high_score: i64,
    /// Serialized ink of the last recorded attempt
    pub last_writing_ink: Option<String>,
    pub last_score: i64,
    /// Best pronunciation star rating ever recorded
    pub pronunciation_score: i64,
    /// Epoch millis
    pub last_modified: i64,
}

impl Progress {
    /// Fresh row for a (user, character) pair that has not been written yet
    pub fn empty(user_id: i64, character_id: impl Into<String>) -> Self {
        Self {
            user_id,
            character_id: character_id.into(),
            practice_count: 0,
            high_score: 0,
            last_writing_ink: None,
            last_score: 0,
            pronunciation_score: 0,
            last_modified: 0,
        }
    }

    /// Mastery predicate: last score reached the pass threshold
    pub fn is_mastered(&self) -> bool {
        self.last_score >= PASS_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mastery_threshold() {
        let mut progress = Progress::empty(1, "木");
        assert!(!progress.is_mastered());

        progress.last_score = 5;
        assert!(!progress.is_mastered());

        progress.last_score = 6;
        assert!(progress.is_mastered());
    }

    #[test]
    fn test_character_new_defaults() {
        let character = Character::new("山", 1);
        assert_eq!(character.id, "山");
        assert_eq!(character.grade, 1);
        assert!(character.example_words.is_empty());
        assert!(character.pinyin.is_empty());
    }
}
