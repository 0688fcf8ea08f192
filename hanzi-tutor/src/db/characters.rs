//! Character catalog queries
//!
//! Characters are keyed by the glyph itself. Ordering "by id" is SQLite's
//! binary TEXT comparison, i.e. code point order.

use crate::error::Result;
use hanzi_common::db::Character;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use tracing::warn;

const CHARACTER_COLUMNS: &str = "id, pinyin, strokes, grade, example_words, meaning";

/// Get a single character by glyph
pub async fn get_character(db: &Pool<Sqlite>, id: &str) -> Result<Option<Character>> {
    let row = sqlx::query(&format!("SELECT {} FROM characters WHERE id = ?", CHARACTER_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(row.as_ref().map(character_from_row))
}

/// All characters of a grade, ordered by id
pub async fn characters_by_grade(db: &Pool<Sqlite>, grade: i64) -> Result<Vec<Character>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM characters WHERE grade = ? ORDER BY id",
        CHARACTER_COLUMNS
    ))
    .bind(grade)
    .fetch_all(db)
    .await?;

    Ok(rows.iter().map(character_from_row).collect())
}

/// Next character after `after_id` within `grade`
pub async fn next_in_grade(db: &Pool<Sqlite>, after_id: &str, grade: i64) -> Result<Option<Character>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM characters WHERE id > ? AND grade = ? ORDER BY id LIMIT 1",
        CHARACTER_COLUMNS
    ))
    .bind(after_id)
    .bind(grade)
    .fetch_optional(db)
    .await?;

    Ok(row.as_ref().map(character_from_row))
}

/// First character of a grade
pub async fn first_in_grade(db: &Pool<Sqlite>, grade: i64) -> Result<Option<Character>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM characters WHERE grade = ? ORDER BY id LIMIT 1",
        CHARACTER_COLUMNS
    ))
    .bind(grade)
    .fetch_optional(db)
    .await?;

    Ok(row.as_ref().map(character_from_row))
}

/// Number of characters in the catalog
pub async fn count_characters(db: &Pool<Sqlite>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM characters")
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Replace the whole catalog in one transaction
///
/// Progress rows reference characters by glyph only, so they survive a
/// re-import.
pub async fn replace_all(db: &Pool<Sqlite>, characters: &[Character]) -> Result<()> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM characters").execute(&mut *tx).await?;

    for character in characters {
        let example_words = serde_json::to_string(&character.example_words)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO characters (id, pinyin, strokes, grade, example_words, meaning)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&character.id)
        .bind(&character.pinyin)
        .bind(&character.strokes)
        .bind(character.grade)
        .bind(example_words)
        .bind(&character.meaning)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Backfill phonetic reading and stroke metadata of an imported character
pub async fn backfill(db: &Pool<Sqlite>, id: &str, pinyin: &str, strokes: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE characters SET pinyin = ?, strokes = ? WHERE id = ?")
        .bind(pinyin)
        .bind(strokes)
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn character_from_row(row: &SqliteRow) -> Character {
    let id: String = row.get("id");
    let example_words_json: String = row.get("example_words");
    let example_words = serde_json::from_str(&example_words_json).unwrap_or_else(|e| {
        warn!("Ignoring malformed example words for '{}': {}", id, e);
        Vec::new()
    });

    Character {
        id,
        pinyin: row.get("pinyin"),
        strokes: row.get("strokes"),
        grade: row.get("grade"),
        example_words,
        meaning: row.get("meaning"),
    }
}
