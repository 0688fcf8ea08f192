//! Per-user, per-character progress queries
//!
//! Best-ever values (`high_score`, `pronunciation_score`) are merged with
//! `MAX` inside the upsert so they can never decrease, whatever the caller
//! passes in.

use super::users::add_points;
use crate::error::Result;
use hanzi_common::db::Progress;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite, SqliteConnection};

const PROGRESS_COLUMNS: &str = "user_id, character_id, practice_count, high_score, last_writing_ink, \
                                last_score, pronunciation_score, last_modified";

/// Get the progress row for one (user, character) pair
pub async fn get_progress(db: &Pool<Sqlite>, user_id: i64, character_id: &str) -> Result<Option<Progress>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM user_progress WHERE user_id = ? AND character_id = ?",
        PROGRESS_COLUMNS
    ))
    .bind(user_id)
    .bind(character_id)
    .fetch_optional(db)
    .await?;

    Ok(row.as_ref().map(progress_from_row))
}

/// All progress rows of a user
pub async fn user_progress(db: &Pool<Sqlite>, user_id: i64) -> Result<Vec<Progress>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM user_progress WHERE user_id = ? ORDER BY character_id",
        PROGRESS_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(rows.iter().map(progress_from_row).collect())
}

/// A stored attempt together with the points it earned
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAttempt {
    pub progress: Progress,
    pub points: i64,
    /// User's point total after the award
    pub total_points: i64,
}

/// Record a passing handwriting attempt and award its points
///
/// Stores the ink and last score, bumps the practice count and raises the
/// high score if the new score beats it. `points_for` sees the row as it
/// was before the attempt. Row and point total are written in one
/// immediate transaction, so concurrent passes never award the same
/// improvement twice.
pub async fn record_writing_pass(
    db: &Pool<Sqlite>,
    user_id: i64,
    character_id: &str,
    score: i64,
    ink_json: &str,
    now_ms: i64,
    points_for: impl FnOnce(&Progress) -> i64,
) -> Result<ScoredAttempt> {
    let mut tx = db.begin_with("BEGIN IMMEDIATE").await?;
    let before = stored(&mut tx, user_id, character_id).await?;

    sqlx::query(
        r#"
        INSERT INTO user_progress
            (user_id, character_id, practice_count, high_score, last_writing_ink, last_score, last_modified)
        VALUES (?, ?, 1, ?, ?, ?, ?)
        ON CONFLICT(user_id, character_id) DO UPDATE SET
            practice_count = practice_count + 1,
            high_score = MAX(high_score, excluded.high_score),
            last_writing_ink = excluded.last_writing_ink,
            last_score = excluded.last_score,
            last_modified = excluded.last_modified
        "#,
    )
    .bind(user_id)
    .bind(character_id)
    .bind(score)
    .bind(ink_json)
    .bind(score)
    .bind(now_ms)
    .execute(&mut *tx)
    .await?;

    let points = points_for(&before).max(0);
    let total_points = add_points(&mut tx, user_id, points).await?;
    let progress = stored(&mut tx, user_id, character_id).await?;
    tx.commit().await?;

    Ok(ScoredAttempt {
        progress,
        points,
        total_points,
    })
}

/// Record a pronunciation rating when it beats the stored best
///
/// Returns `None` without writing anything when it does not. Otherwise the
/// new best and the points from `points_for` (given the previous row) are
/// committed together.
pub async fn record_pronunciation(
    db: &Pool<Sqlite>,
    user_id: i64,
    character_id: &str,
    stars: i64,
    now_ms: i64,
    points_for: impl FnOnce(&Progress) -> i64,
) -> Result<Option<ScoredAttempt>> {
    let mut tx = db.begin_with("BEGIN IMMEDIATE").await?;
    let before = stored(&mut tx, user_id, character_id).await?;
    if stars <= before.pronunciation_score {
        return Ok(None);
    }

    sqlx::query(
        r#"
        INSERT INTO user_progress (user_id, character_id, pronunciation_score, last_modified)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, character_id) DO UPDATE SET
            pronunciation_score = MAX(pronunciation_score, excluded.pronunciation_score),
            last_modified = excluded.last_modified
        "#,
    )
    .bind(user_id)
    .bind(character_id)
    .bind(stars)
    .bind(now_ms)
    .execute(&mut *tx)
    .await?;

    let points = points_for(&before).max(0);
    let total_points = add_points(&mut tx, user_id, points).await?;
    let progress = stored(&mut tx, user_id, character_id).await?;
    tx.commit().await?;

    Ok(Some(ScoredAttempt {
        progress,
        points,
        total_points,
    }))
}

/// Forget the last attempt of an existing row
///
/// Resets last score and ink so the character drops back to pending. Best
/// scores are kept. Returns false when there was no row to clear.
pub async fn clear_history_ink(
    db: &Pool<Sqlite>,
    user_id: i64,
    character_id: &str,
    now_ms: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE user_progress
        SET last_score = 0, last_writing_ink = NULL, last_modified = ?
        WHERE user_id = ? AND character_id = ?
        "#,
    )
    .bind(now_ms)
    .bind(user_id)
    .bind(character_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn stored(conn: &mut SqliteConnection, user_id: i64, character_id: &str) -> Result<Progress> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM user_progress WHERE user_id = ? AND character_id = ?",
        PROGRESS_COLUMNS
    ))
    .bind(user_id)
    .bind(character_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row
        .as_ref()
        .map(progress_from_row)
        .unwrap_or_else(|| Progress::empty(user_id, character_id)))
}

fn progress_from_row(row: &SqliteRow) -> Progress {
    Progress {
        user_id: row.get("user_id"),
        character_id: row.get("character_id"),
        practice_count: row.get("practice_count"),
        high_score: row.get("high_score"),
        last_writing_ink: row.get("last_writing_ink"),
        last_score: row.get("last_score"),
        pronunciation_score: row.get("pronunciation_score"),
        last_modified: row.get("last_modified"),
    }
}
