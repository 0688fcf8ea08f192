//! Next-character selection and derived progress views
//!
//! Learned and pending sets are recomputed from the store after every
//! mutation; they are never a source of truth.

use crate::db::characters;
use crate::error::Result;
use hanzi_common::db::{Character, Progress};
use sqlx::{Pool, Sqlite};
use std::collections::{HashMap, HashSet};

/// Derived per-user views over one grade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressViews {
    /// Mastered characters of the grade, most recently modified first
    pub learned: Vec<String>,
    /// Characters of the grade not yet mastered, ordered by id
    pub pending: Vec<String>,
    /// Characters (any grade) mastered since the start of today
    pub daily_char_count: i64,
}

impl ProgressViews {
    /// Compute views from the grade's characters and the user's progress
    pub fn compute(grade_characters: &[Character], progress: &[Progress], today_start_ms: i64) -> Self {
        let by_id: HashMap<&str, &Progress> =
            progress.iter().map(|p| (p.character_id.as_str(), p)).collect();

        let mut learned: Vec<(&str, i64)> = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for character in grade_characters {
            match by_id.get(character.id.as_str()) {
                Some(p) if p.is_mastered() => learned.push((character.id.as_str(), p.last_modified)),
                _ => pending.push(character.id.clone()),
            }
        }

        // Stable sort keeps id order among equal timestamps
        learned.sort_by(|a, b| b.1.cmp(&a.1));
        pending.sort();

        let daily_char_count = progress
            .iter()
            .filter(|p| p.last_modified >= today_start_ms && p.is_mastered())
            .count() as i64;

        Self {
            learned: learned.into_iter().map(|(id, _)| id.to_string()).collect(),
            pending,
            daily_char_count,
        }
    }
}

/// Result of choosing what to present next
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Next(Character),
    /// The grade has no characters at all
    AllComplete,
}

/// Preferred pending character: unvisited first, then any, never the current
pub fn pick_pending<'a>(
    pending: &'a [String],
    visited: &HashSet<String>,
    current: Option<&str>,
) -> Option<&'a str> {
    let not_current = |id: &&String| Some(id.as_str()) != current;

    pending
        .iter()
        .filter(not_current)
        .find(|id| !visited.contains(*id))
        .or_else(|| pending.iter().find(not_current))
        .map(String::as_str)
}

/// Choose the next character to present
///
/// Order of preference:
/// 1. a pending character not yet visited this session (not the current one)
/// 2. any other pending character
/// 3. the next character by id after the current one, within its grade
/// 4. the first character of the user's grade
pub async fn select_next(
    db: &Pool<Sqlite>,
    grade: i64,
    current: Option<&Character>,
    pending: &[String],
    visited: &HashSet<String>,
) -> Result<Selection> {
    let current_id = current.map(|c| c.id.as_str());

    if let Some(id) = pick_pending(pending, visited, current_id) {
        if let Some(character) = characters::get_character(db, id).await? {
            return Ok(Selection::Next(character));
        }
    }

    if let Some(current) = current {
        if let Some(character) = characters::next_in_grade(db, &current.id, current.grade).await? {
            return Ok(Selection::Next(character));
        }
    }

    Ok(match characters::first_in_grade(db, grade).await? {
        Some(character) => Selection::Next(character),
        None => Selection::AllComplete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn progress(id: &str, last_score: i64, last_modified: i64) -> Progress {
        let mut p = Progress::empty(1, id);
        p.last_score = last_score;
        p.high_score = last_score;
        p.last_modified = last_modified;
        p
    }

    #[test]
    fn test_views_split_and_order() {
        let grade: Vec<Character> = ["人", "口", "山", "木"].iter().map(|c| Character::new(*c, 1)).collect();
        let rows = vec![
            progress("山", 8, 300),
            progress("木", 6, 500),
            progress("口", 5, 900),
            // Other grade, still counts toward today
            progress("春", 9, 1_000),
        ];

        let views = ProgressViews::compute(&grade, &rows, 400);
        assert_eq!(views.learned, ids(&["木", "山"]));
        let mut expected_pending = ids(&["人", "口"]);
        expected_pending.sort();
        assert_eq!(views.pending, expected_pending);
        assert_eq!(views.daily_char_count, 2);
    }

    #[test]
    fn test_pick_prefers_unvisited() {
        let pending = ids(&["一", "二", "三"]);
        let visited: HashSet<String> = ids(&["一"]).into_iter().collect();

        assert_eq!(pick_pending(&pending, &visited, Some("二")), Some("三"));
        assert_eq!(pick_pending(&pending, &HashSet::new(), Some("一")), Some("二"));
    }

    #[test]
    fn test_pick_falls_back_to_visited_but_never_current() {
        let pending = ids(&["一", "二"]);
        let visited: HashSet<String> = pending.iter().cloned().collect();

        assert_eq!(pick_pending(&pending, &visited, Some("一")), Some("二"));
        assert_eq!(pick_pending(&ids(&["一"]), &visited, Some("一")), None);
        assert_eq!(pick_pending(&[], &visited, None), None);
    }

    #[tokio::test]
    async fn test_select_walks_grade_then_wraps() {
        let (_dir, db) = temp_db().await;
        let catalog: Vec<Character> = ["一", "二", "三"].iter().map(|c| Character::new(*c, 1)).collect();
        characters::replace_all(&db, &catalog).await.unwrap();

        let mut ordered: Vec<String> = catalog.iter().map(|c| c.id.clone()).collect();
        ordered.sort();
        let first = characters::get_character(&db, &ordered[0]).await.unwrap().unwrap();
        let last = characters::get_character(&db, &ordered[2]).await.unwrap().unwrap();

        // Nothing pending: next by id within the grade
        let next = select_next(&db, 1, Some(&first), &[], &HashSet::new()).await.unwrap();
        assert_eq!(next, Selection::Next(characters::get_character(&db, &ordered[1]).await.unwrap().unwrap()));

        // End of grade wraps to the first character
        let wrapped = select_next(&db, 1, Some(&last), &[], &HashSet::new()).await.unwrap();
        assert_eq!(wrapped, Selection::Next(first.clone()));

        // Only the current character is pending: it is skipped
        let skipped = select_next(&db, 1, Some(&first), &[first.id.clone()], &HashSet::new())
            .await
            .unwrap();
        assert_ne!(skipped, Selection::Next(first));
    }

    #[tokio::test]
    async fn test_empty_grade_is_all_complete() {
        let (_dir, db) = temp_db().await;
        let selection = select_next(&db, 3, None, &[], &HashSet::new()).await.unwrap();
        assert_eq!(selection, Selection::AllComplete);
    }
}
