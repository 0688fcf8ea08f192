//! Settings database access
//!
//! Typed reads of the runtime tunables stored in the `settings` table.
//! Missing values are written back with their defaults on first read.

use crate::error::{Error, Result};
use crate::scoring::stroke::StrokeParams;
use crate::session::SessionTimings;
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

/// Catalog data version key
pub const CHAR_DATA_VERSION_KEY: &str = "char_data_version";

/// Load stroke geometry and quality thresholds
pub async fn load_stroke_params(db: &Pool<Sqlite>) -> Result<StrokeParams> {
    let defaults = StrokeParams::default();

    Ok(StrokeParams {
        coordinate_space: get_or_init(db, "stroke_coordinate_space", defaults.coordinate_space).await?,
        vertical_offset: get_or_init(db, "stroke_vertical_offset", defaults.vertical_offset).await?,
        order_threshold: get_or_init(db, "stroke_order_threshold", defaults.order_threshold).await?,
        quality_excellent: get_or_init(db, "stroke_quality_excellent", defaults.quality_excellent).await?,
        quality_good: get_or_init(db, "stroke_quality_good", defaults.quality_good).await?,
        quality_fair: get_or_init(db, "stroke_quality_fair", defaults.quality_fair).await?,
    })
}

/// Load evaluation pacing and statistics periods
pub async fn load_session_timings(db: &Pool<Sqlite>) -> Result<SessionTimings> {
    let defaults = SessionTimings::default();

    Ok(SessionTimings {
        recognizer_timeout: get_duration(db, "recognizer_timeout_ms", defaults.recognizer_timeout).await?,
        evaluation_settle: get_duration(db, "evaluation_settle_ms", defaults.evaluation_settle).await?,
        fireworks_min_score: get_or_init(db, "fireworks_min_score", defaults.fireworks_min_score).await?,
        wrong_order_pause: get_duration(db, "wrong_order_pause_ms", defaults.wrong_order_pause).await?,
        pronunciation_pause: get_duration(db, "pronunciation_pause_ms", defaults.pronunciation_pause).await?,
        reward_pause: get_duration(db, "reward_pause_ms", defaults.reward_pause).await?,
        advance_pause: get_duration(db, "advance_pause_ms", defaults.advance_pause).await?,
        stats_tick_interval: get_duration(db, "stats_tick_interval_ms", defaults.stats_tick_interval).await?,
        learning_time_flush: get_duration(db, "learning_time_flush_ms", defaults.learning_time_flush).await?,
    })
}

/// Version of the character catalog currently imported (0 = never)
pub async fn get_char_data_version(db: &Pool<Sqlite>) -> Result<i64> {
    Ok(get_setting::<i64>(db, CHAR_DATA_VERSION_KEY).await?.unwrap_or(0))
}

/// Record the imported catalog version
pub async fn set_char_data_version(db: &Pool<Sqlite>, version: i64) -> Result<()> {
    set_setting(db, CHAR_DATA_VERSION_KEY, version).await
}

async fn get_duration(db: &Pool<Sqlite>, key: &str, default: Duration) -> Result<Duration> {
    let ms: u64 = get_or_init(db, key, default.as_millis() as u64).await?;
    Ok(Duration::from_millis(ms))
}

/// Read a setting, writing the default back when it is absent
async fn get_or_init<T>(db: &Pool<Sqlite>, key: &str, default: T) -> Result<T>
where
    T: FromStr + ToString + Copy,
{
    match get_setting::<T>(db, key).await? {
        Some(value) => Ok(value),
        None => {
            set_setting(db, key, default).await?;
            Ok(default)
        }
    }
}

/// Generic setting getter
///
/// Returns None when the key is missing or its value is NULL.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value.flatten() {
        Some(s) => match s.trim().parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}
