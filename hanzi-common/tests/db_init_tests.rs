//! Integration tests for database initialization
//!
//! Covers first-run creation, idempotent reopen, schema shape and default
//! settings seeding.

use hanzi_common::db::init::{ensure_setting, init_database};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("hanzi.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("hanzi.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_tables_created() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("hanzi.db")).await.unwrap();

    for table in ["settings", "characters", "users", "user_progress", "schema_version"] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "table {} missing", table);
    }
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("hanzi.db")).await.unwrap();

    let offset: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'stroke_vertical_offset'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(offset.as_deref(), Some("120"));

    let threshold: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'stroke_order_threshold'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(threshold.as_deref(), Some("300"));

    let tick: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'stats_tick_interval_ms'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(tick.as_deref(), Some("10000"));
}

#[tokio::test]
async fn test_existing_setting_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("hanzi.db");
    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("UPDATE settings SET value = '200' WHERE key = 'stroke_order_threshold'")
        .execute(&pool)
        .await
        .unwrap();
    drop(pool);

    let pool = init_database(&db_path).await.unwrap();
    let value: String =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'stroke_order_threshold'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(value, "200");
}

#[tokio::test]
async fn test_null_setting_reset_to_default() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("hanzi.db")).await.unwrap();

    sqlx::query("UPDATE settings SET value = NULL WHERE key = 'evaluation_settle_ms'")
        .execute(&pool)
        .await
        .unwrap();

    ensure_setting(&pool, "evaluation_settle_ms", "1500").await.unwrap();

    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'evaluation_settle_ms'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(value.as_deref(), Some("1500"));
}

#[tokio::test]
async fn test_progress_cascades_with_user() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("hanzi.db")).await.unwrap();

    sqlx::query("INSERT INTO users (name) VALUES ('Mei')")
        .execute(&pool)
        .await
        .unwrap();
    let user_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE name = 'Mei'")
        .fetch_one(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO user_progress (user_id, character_id, last_score) VALUES (?, '木', 7)")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_progress")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
