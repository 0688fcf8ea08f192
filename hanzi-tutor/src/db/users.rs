//! User profile queries

use crate::error::{Error, Result};
use hanzi_common::db::User;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite, SqliteConnection};

const USER_COLUMNS: &str = "id, name, avatar, total_points, current_grade, last_character_id, \
                            last_login_time, total_learning_time";

/// Get user by id
pub async fn get_user(db: &Pool<Sqlite>, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

/// Get user by id, failing when missing
pub async fn require_user(db: &Pool<Sqlite>, id: i64) -> Result<User> {
    get_user(db, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", id)))
}

/// Look up a user by display name
pub async fn find_by_name(db: &Pool<Sqlite>, name: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE name = ?", USER_COLUMNS))
        .bind(name)
        .fetch_optional(db)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

/// Create a user and return the stored row
pub async fn insert_user(
    db: &Pool<Sqlite>,
    name: &str,
    avatar: &str,
    grade: i64,
    login_time: i64,
) -> Result<User> {
    let result = sqlx::query(
        "INSERT INTO users (name, avatar, current_grade, last_login_time) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(avatar)
    .bind(grade)
    .bind(login_time)
    .execute(db)
    .await?;

    require_user(db, result.last_insert_rowid()).await
}

/// Record a login: timestamp, avatar and grade
pub async fn update_login(
    db: &Pool<Sqlite>,
    id: i64,
    avatar: &str,
    grade: i64,
    login_time: i64,
) -> Result<()> {
    sqlx::query("UPDATE users SET avatar = ?, current_grade = ?, last_login_time = ? WHERE id = ?")
        .bind(avatar)
        .bind(grade)
        .bind(login_time)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Add to the user's point total, returning the new total
///
/// Takes a connection so it can run inside the transaction that stores
/// the scored attempt.
pub async fn add_points(conn: &mut SqliteConnection, id: i64, delta: i64) -> Result<i64> {
    let total: Option<i64> = sqlx::query_scalar(
        "UPDATE users SET total_points = total_points + ? WHERE id = ? RETURNING total_points",
    )
    .bind(delta)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    total.ok_or_else(|| Error::NotFound(format!("user {}", id)))
}

/// Add whole seconds to cumulative learning time, returning the new total
pub async fn add_learning_time(db: &Pool<Sqlite>, id: i64, seconds: i64) -> Result<i64> {
    let total: Option<i64> = sqlx::query_scalar(
        "UPDATE users SET total_learning_time = total_learning_time + ? WHERE id = ? \
         RETURNING total_learning_time",
    )
    .bind(seconds)
    .bind(id)
    .fetch_optional(db)
    .await?;

    total.ok_or_else(|| Error::NotFound(format!("user {}", id)))
}

/// Remember the character the user last had on screen
pub async fn set_last_character(db: &Pool<Sqlite>, id: i64, character_id: &str) -> Result<()> {
    sqlx::query("UPDATE users SET last_character_id = ? WHERE id = ?")
        .bind(character_id)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Most recently logged-in users, newest first
pub async fn recent_users(db: &Pool<Sqlite>, limit: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM users ORDER BY last_login_time DESC, id DESC LIMIT ?",
        USER_COLUMNS
    ))
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(rows.iter().map(user_from_row).collect())
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        avatar: row.get("avatar"),
        total_points: row.get("total_points"),
        current_grade: row.get("current_grade"),
        last_character_id: row.get("last_character_id"),
        last_login_time: row.get("last_login_time"),
        total_learning_time: row.get("total_learning_time"),
    }
}
