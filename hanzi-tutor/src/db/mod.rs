//! Database access layer
//!
//! Query functions over the shared SQLite pool for characters, users,
//! per-user progress and runtime settings. Schema creation lives in
//! `hanzi_common::db::init`.

pub mod characters;
pub mod progress;
pub mod settings;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    /// Fresh database in a temporary directory
    ///
    /// The TempDir must outlive the pool.
    pub async fn temp_db() -> (TempDir, SqlitePool) {
        let dir = TempDir::new().unwrap();
        let pool = hanzi_common::db::init_database(&dir.path().join("test.db"))
            .await
            .unwrap();
        (dir, pool)
    }
}
