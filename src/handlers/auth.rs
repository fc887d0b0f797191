// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::{CookieJar, cookie::{Cookie, SameSite}};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    accounts,
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{SESSION_COOKIE, sign_jwt},
    },
};

/// Registers a new user together with their profile.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let user = accounts::register_user(
        &pool,
        &payload.username,
        &hashed_password,
        payload.email.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user.
///
/// Returns the signed token in the body and also sets it as the session cookie
/// so browser requests to the HTML views are authenticated.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = accounts::find_user_by_username(&pool, &payload.username)
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.username,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    let jar = jar.add(
        Cookie::build((SESSION_COOKIE, token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    );

    tracing::info!(user_id = user.id, "user logged in");
    Ok((
        jar,
        Json(json!({
            "token": token,
            "type": "Bearer",
        })),
    ))
}
