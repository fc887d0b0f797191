//! User lifecycle. Every user gets exactly one profile, created by `register_user`
//! and re-saved by `save_user`.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::AppError,
    models::{profile::Profile, user::User},
};

const USER_COLUMNS: &str = "id, username, password, email, first_name, created_at";
const PROFILE_COLUMNS: &str = "id, user_id, date_of_birth, photo, updated_at";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Inserts the user and their profile in one transaction.
pub async fn register_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    email: Option<&str>,
) -> Result<User, AppError> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, password, email, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(password_hash)
    .bind(email)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Username '{}' already exists", username))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    create_profile(&mut tx, user.id).await?;

    tx.commit().await?;
    tracing::info!(user_id = user.id, "registered user {}", user.username);
    Ok(user)
}

/// Creates the empty profile that accompanies a freshly inserted user.
pub async fn create_profile(conn: &mut SqliteConnection, user_id: i64) -> Result<Profile, AppError> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        r#"
        INSERT INTO profiles (user_id, updated_at)
        VALUES (?, ?)
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("User {} already has a profile", user_id))
        } else {
            AppError::from(e)
        }
    })?;

    Ok(profile)
}

/// Persists user fields, then re-saves the user's profile.
pub async fn save_user(conn: &mut SqliteConnection, user: &User) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET email = ?, first_name = ? WHERE id = ?")
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(user.id)
        .execute(&mut *conn)
        .await?;

    let profile = find_profile(&mut *conn, user.id).await?;
    save_profile(conn, &profile).await
}

/// Writes the profile back and stamps `updated_at`. Never inserts.
pub async fn save_profile(conn: &mut SqliteConnection, profile: &Profile) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE profiles SET date_of_birth = ?, photo = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(profile.date_of_birth)
    .bind(&profile.photo)
    .bind(Utc::now())
    .bind(profile.user_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::InternalServerError(format!(
            "profile missing for user {}",
            profile.user_id
        )));
    }
    Ok(())
}

pub async fn find_user_by_id(conn: &mut SqliteConnection, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

pub async fn find_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_profile(conn: &mut SqliteConnection, user_id: i64) -> Result<Profile, AppError> {
    sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .ok_or(AppError::NotFound("Profile not found".to_string()))
}
