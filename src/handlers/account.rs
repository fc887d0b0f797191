// src/handlers/account.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    accounts, activity,
    error::AppError,
    models::user::{EditAccountRequest, MeResponse},
    utils::jwt::Claims,
};

/// Number of entries returned by the activity feed.
const FEED_SIZE: i64 = 20;

/// Current user with profile.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let mut conn = pool.acquire().await?;

    let user = accounts::find_user_by_id(&mut conn, user_id).await?;
    let profile = accounts::find_profile(&mut conn, user_id).await?;

    Ok(Json(MeResponse { user, profile }))
}

/// Updates the user and their profile in one transaction.
pub async fn edit(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EditAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let mut user = accounts::find_user_by_id(&mut tx, user_id).await?;
    if payload.email.is_some() {
        user.email = payload.email;
    }
    if payload.first_name.is_some() {
        user.first_name = payload.first_name;
    }
    accounts::save_user(&mut tx, &user).await?;

    let mut profile = accounts::find_profile(&mut tx, user_id).await?;
    if payload.date_of_birth.is_some() {
        profile.date_of_birth = payload.date_of_birth;
        accounts::save_profile(&mut tx, &profile).await?;
    }

    tx.commit().await?;
    tracing::info!(user_id, "account updated");

    Ok(Json(MeResponse { user, profile }))
}

/// The current user's recent actions, newest first.
pub async fn list_actions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let actions = activity::recent_for_user(&pool, claims.user_id()?, FEED_SIZE).await?;
    Ok(Json(actions))
}
