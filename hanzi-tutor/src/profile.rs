//! Learner login and registration
//!
//! Names are unique across all users. Logging in with an unknown name
//! registers it; a known name updates login time, avatar and grade.

use crate::db::users;
use crate::error::{Error, Result};
use hanzi_common::db::{User, DEFAULT_AVATAR};
use hanzi_common::time;
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Number of users offered on the quick-login list
pub const RECENT_USER_LIMIT: i64 = 3;

fn validate_grade(grade: i64) -> Result<i64> {
    if (1..=6).contains(&grade) {
        Ok(grade)
    } else {
        Err(Error::BadRequest(format!("grade must be 1-6, got {}", grade)))
    }
}

fn avatar_or_default(avatar: &str) -> &str {
    let avatar = avatar.trim();
    if avatar.is_empty() {
        DEFAULT_AVATAR
    } else {
        avatar
    }
}

/// Log in by name, registering the user on first login
pub async fn login_or_register(db: &Pool<Sqlite>, name: &str, avatar: &str, grade: i64) -> Result<User> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::BadRequest("name must not be empty".to_string()));
    }
    let grade = validate_grade(grade)?;
    let avatar = avatar_or_default(avatar);
    let now = time::now_millis();

    match users::find_by_name(db, name).await? {
        Some(existing) => {
            users::update_login(db, existing.id, avatar, grade, now).await?;
            info!("User {} ({}) logged in, grade {}", existing.id, name, grade);
            users::require_user(db, existing.id).await
        }
        None => {
            let user = users::insert_user(db, name, avatar, grade, now).await?;
            info!("Registered user {} ({}), grade {}", user.id, name, grade);
            Ok(user)
        }
    }
}

/// Log in a user picked from the recent list
pub async fn login_recent(db: &Pool<Sqlite>, user_id: i64, avatar: &str, grade: i64) -> Result<User> {
    let grade = validate_grade(grade)?;
    let user = users::require_user(db, user_id).await?;

    users::update_login(db, user.id, avatar_or_default(avatar), grade, time::now_millis()).await?;
    info!("User {} ({}) logged in from recent list", user.id, user.name);
    users::require_user(db, user.id).await
}

/// Users who logged in most recently, newest first
pub async fn recent_users(db: &Pool<Sqlite>) -> Result<Vec<User>> {
    users::recent_users(db, RECENT_USER_LIMIT).await
}
