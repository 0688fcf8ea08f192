//! Database initialization
//!
//! Creates the database on first run, applies the schema (idempotent) and
//! seeds default settings. Existing values are never overwritten.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 3;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL lets the UI-facing readers proceed while a session writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema_version_table(&pool).await?;
    create_settings_table(&pool).await?;
    create_characters_table(&pool).await?;
    create_users_table(&pool).await?;
    create_user_progress_table(&pool).await?;

    record_schema_version(&pool).await?;
    init_default_settings(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn record_schema_version(pool: &SqlitePool) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores runtime tunables as key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the characters table
///
/// The glyph itself is the primary key. Example words are a JSON array.
pub async fn create_characters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS characters (
            id TEXT PRIMARY KEY,
            pinyin TEXT NOT NULL DEFAULT '',
            strokes TEXT NOT NULL DEFAULT '',
            grade INTEGER NOT NULL CHECK (grade BETWEEN 1 AND 6),
            example_words TEXT NOT NULL DEFAULT '[]',
            meaning TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_characters_grade ON characters(grade, id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the users table
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            avatar TEXT NOT NULL DEFAULT 'avatar_twilight',
            total_points INTEGER NOT NULL DEFAULT 0,
            current_grade INTEGER NOT NULL DEFAULT 1,
            last_character_id TEXT NOT NULL DEFAULT '',
            last_login_time INTEGER NOT NULL DEFAULT 0,
            total_learning_time INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the user_progress table
///
/// Composite key (user_id, character_id); rows go away with their user.
pub async fn create_user_progress_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_progress (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            character_id TEXT NOT NULL,
            practice_count INTEGER NOT NULL DEFAULT 0,
            high_score INTEGER NOT NULL DEFAULT 0,
            last_writing_ink TEXT,
            last_score INTEGER NOT NULL DEFAULT 0,
            pronunciation_score INTEGER NOT NULL DEFAULT 0,
            last_modified INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, character_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize default settings
///
/// Ensures every tunable exists. NULL values are reset to the default.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Stroke geometry (reference glyph coordinate system)
    ensure_setting(pool, "stroke_coordinate_space", "1024").await?;
    ensure_setting(pool, "stroke_vertical_offset", "120").await?;
    ensure_setting(pool, "stroke_order_threshold", "300").await?;
    ensure_setting(pool, "stroke_quality_excellent", "80").await?;
    ensure_setting(pool, "stroke_quality_good", "150").await?;
    ensure_setting(pool, "stroke_quality_fair", "250").await?;

    // Evaluation flow
    ensure_setting(pool, "recognizer_timeout_ms", "5000").await?;
    ensure_setting(pool, "evaluation_settle_ms", "1500").await?;
    ensure_setting(pool, "fireworks_min_score", "8").await?;

    // Celebration pacing (lets speech finish before the next prompt)
    ensure_setting(pool, "wrong_order_pause_ms", "1500").await?;
    ensure_setting(pool, "pronunciation_pause_ms", "4500").await?;
    ensure_setting(pool, "reward_pause_ms", "1500").await?;
    ensure_setting(pool, "advance_pause_ms", "1000").await?;

    // Session statistics
    ensure_setting(pool, "stats_tick_interval_ms", "10000").await?;
    ensure_setting(pool, "learning_time_flush_ms", "60000").await?;

    // Catalog import bookkeeping
    ensure_setting(pool, "char_data_version", "0").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let existing: Option<Option<String>> = sqlx::query_scalar(
        "SELECT value FROM settings WHERE key = ?"
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    match existing {
        None => {
            // INSERT OR IGNORE tolerates a concurrent initializer
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
        }
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;

            warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}
