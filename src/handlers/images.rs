// src/handlers/images.rs

use std::collections::BTreeMap;

use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use chrono::Utc;
use serde_json::{Value, json};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tera::Context;
use validator::{Validate, ValidationErrors};

use crate::{
    activity,
    error::AppError,
    media,
    models::{
        action::Target,
        image::{
            Image, ImageForm, ImageListParams, ImageView, LikeAction, LikeRequest, RankedImage,
        },
    },
    state::AppState,
    templates,
    utils::{
        html::clean_description,
        jwt::Claims,
        paginate::{PAGE_SIZE, PageError, Paginator},
        slug::slugify,
    },
};

/// Cookie carrying a one-shot notification to the next rendered page.
pub const FLASH_COOKIE: &str = "flash";
const FLASH_IMAGE_ADDED: &str = "image_added";

/// Number of entries on the most-viewed page.
const RANKING_SIZE: usize = 10;

const IMAGE_COLUMNS: &str = "id, user_id, title, slug, url, image, description, created_at";

type FieldErrors = BTreeMap<String, Vec<String>>;

fn flash_message(code: &str) -> Option<&'static str> {
    match code {
        FLASH_IMAGE_ADDED => Some("Image added successfully"),
        _ => None,
    }
}

fn base_context(section: &str, claims: Option<&Claims>) -> Context {
    let mut context = Context::new();
    context.insert("section", section);
    context.insert("username", &claims.map(|c| c.username.as_str()));
    context.insert("flash", &None::<&str>);
    context
}

fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

fn render_create_form(
    state: &AppState,
    claims: &Claims,
    form: &ImageForm,
    errors: &FieldErrors,
) -> Result<Html<String>, AppError> {
    let mut context = base_context("images", Some(claims));
    context.insert("form", form);
    context.insert("errors", errors);
    templates::render(&state.templates, "images/create.html", &context)
}

/// Bookmarklet entry point: shows the form pre-filled from the query string.
/// Never persists anything.
pub async fn create_form(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(form): Query<ImageForm>,
) -> Result<Html<String>, AppError> {
    render_create_form(&state, &claims, &form.normalized(), &FieldErrors::new())
}

/// Validates and stores a new bookmark owned by the current user.
///
/// Invalid input re-renders the form with inline errors. On success the user is
/// redirected to the image's detail page with a flash notification.
pub async fn create_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
    Form(form): Form<ImageForm>,
) -> Result<Response, AppError> {
    let form = form.normalized();
    if let Err(errors) = form.validate() {
        return Ok(render_create_form(&state, &claims, &form, &field_errors(&errors))?.into_response());
    }

    let user_id = claims.user_id()?;
    let slug = slugify(&form.title);
    let ext = form
        .extension()
        .ok_or(AppError::BadRequest("URL has no file extension".to_string()))?;

    let stored = if state.config.fetch_images {
        match media::download_image(&state.http, &state.config.media_root, &form.url, &slug, &ext)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", form.url, e);
                let mut errors = FieldErrors::new();
                errors.insert("url".to_string(), vec!["Could not download the image.".to_string()]);
                return Ok(render_create_form(&state, &claims, &form, &errors)?.into_response());
            }
        }
    } else {
        None
    };

    let image = sqlx::query_as::<_, Image>(&format!(
        r#"
        INSERT INTO images (user_id, title, slug, url, image, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {IMAGE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&form.title)
    .bind(&slug)
    .bind(&form.url)
    .bind(&stored)
    .bind(clean_description(&form.description))
    .bind(Utc::now())
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create image: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    activity::record(&state.pool, user_id, "bookmarked image", Target::Image(image.id)).await?;
    tracing::info!(image_id = image.id, user_id, "image bookmarked");

    let jar = jar.add(
        Cookie::build((FLASH_COOKIE, FLASH_IMAGE_ADDED))
            .path("/")
            .http_only(true),
    );
    Ok((jar, Redirect::to(&image.absolute_url())).into_response())
}

async fn find_image(pool: &SqlitePool, id: i64, slug: &str) -> Result<Option<Image>, AppError> {
    let image = sqlx::query_as::<_, Image>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM images WHERE id = ? AND slug = ?"
    ))
    .bind(id)
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(image)
}

async fn has_liked(pool: &SqlitePool, image_id: i64, user_id: i64) -> Result<bool, AppError> {
    let (liked,): (i64,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM image_likes WHERE image_id = ? AND user_id = ?)",
    )
    .bind(image_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(liked != 0)
}

async fn likes_count(pool: &SqlitePool, image_id: i64) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM image_likes WHERE image_id = ?")
        .bind(image_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Shows one image and counts the view.
///
/// Every request increments the view counter, so reloading inflates the total.
pub async fn image_detail(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    jar: CookieJar,
    Path((id, slug)): Path<(i64, String)>,
) -> Result<(CookieJar, Html<String>), AppError> {
    let claims = claims.map(|Extension(c)| c);
    let image = find_image(&state.pool, id, &slug)
        .await?
        .ok_or(AppError::NotFound("Image not found".to_string()))?;

    let total_views = state.counters.incr_views(image.id).await?;
    state.counters.bump_ranking(image.id).await?;

    let user_has_liked = match claims.as_ref() {
        Some(c) => has_liked(&state.pool, image.id, c.user_id()?).await?,
        None => false,
    };

    let flash = jar
        .get(FLASH_COOKIE)
        .and_then(|cookie| flash_message(cookie.value()));
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));

    let mut context = base_context("images", claims.as_ref());
    context.insert("flash", &flash);
    context.insert("image_url", &image.display_url());
    context.insert("user_has_liked", &user_has_liked);
    context.insert("total_views", &total_views);
    context.insert("likes_count", &likes_count(&state.pool, image.id).await?);
    context.insert("image", &image);

    let html = templates::render(&state.templates, "images/detail.html", &context)?;
    Ok((jar, html))
}

fn like_status(ok: bool) -> Json<Value> {
    Json(json!({ "status": if ok { "ok" } else { "error" } }))
}

/// Adds or removes the current user in the image's liked-by set.
/// Returns `false` when the image does not exist.
async fn apply_like(
    pool: &SqlitePool,
    user_id: i64,
    image_id: i64,
    action: LikeAction,
) -> Result<bool, AppError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM images WHERE id = ?")
        .bind(image_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Ok(false);
    }

    match action {
        LikeAction::Like => {
            // primary key on (image_id, user_id) keeps this a set
            sqlx::query("INSERT OR IGNORE INTO image_likes (image_id, user_id) VALUES (?, ?)")
                .bind(image_id)
                .bind(user_id)
                .execute(pool)
                .await?;
            activity::record(pool, user_id, "likes", Target::Image(image_id)).await?;
        }
        LikeAction::Unlike => {
            sqlx::query("DELETE FROM image_likes WHERE image_id = ? AND user_id = ?")
                .bind(image_id)
                .bind(user_id)
                .execute(pool)
                .await?;
        }
    }

    Ok(true)
}

/// Asynchronous like/unlike. Always answers with a status payload, never an error page.
pub async fn image_like(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    form: Result<Form<LikeRequest>, FormRejection>,
) -> Json<Value> {
    let Ok(Form(request)) = form else {
        return like_status(false);
    };
    let Some((image_id, action)) = request.parse() else {
        return like_status(false);
    };
    let Ok(user_id) = claims.user_id() else {
        return like_status(false);
    };

    match apply_like(&pool, user_id, image_id, action).await {
        Ok(applied) => like_status(applied),
        Err(e) => {
            tracing::error!("Failed to update likes for image {}: {}", image_id, e);
            like_status(false)
        }
    }
}

async fn count_images(pool: &SqlitePool) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM images")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Lists images newest first, eight per page.
///
/// With `images_only` set only the items of the requested page are rendered, and
/// a page past the end yields an empty body so the scroll loader can stop.
pub async fn image_list(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Query(params): Query<ImageListParams>,
) -> Result<Response, AppError> {
    let items_only = params.items_only();
    let paginator = Paginator::new(count_images(&state.pool).await?, PAGE_SIZE);

    let page = match paginator.page(params.page.as_deref()) {
        Ok(page) => page,
        Err(PageError::NotAnInteger) => paginator.first_page(),
        Err(PageError::Empty) if items_only => return Ok(Html(String::new()).into_response()),
        Err(PageError::Empty) => paginator.last_page(),
    };

    let images: Vec<ImageView> = sqlx::query_as::<_, Image>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM images ORDER BY id DESC LIMIT ? OFFSET ?"
    ))
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(ImageView::from)
    .collect();

    let claims = claims.map(|Extension(c)| c);
    let mut context = base_context("images", claims.as_ref());
    context.insert("images", &images);
    context.insert("page", &page);

    let template = if items_only {
        "images/list_images.html"
    } else {
        "images/list.html"
    };
    Ok(templates::render(&state.templates, template, &context)?.into_response())
}

/// Most viewed images, in ranking order.
pub async fn image_ranking(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
) -> Result<Html<String>, AppError> {
    let ids = state.counters.top_ranked(RANKING_SIZE).await?;

    let mut found = Vec::new();
    if !ids.is_empty() {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        found = query.build_query_as::<Image>().fetch_all(&state.pool).await?;
    }

    let mut most_viewed = Vec::with_capacity(found.len());
    for id in ids {
        // ranked ids whose image has since been deleted are skipped
        if let Some(pos) = found.iter().position(|image| image.id == id) {
            let image = found.swap_remove(pos);
            most_viewed.push(RankedImage {
                total_views: state.counters.views(image.id).await?,
                view: ImageView::from(image),
            });
        }
    }

    let claims = claims.map(|Extension(c)| c);
    let mut context = base_context("ranking", claims.as_ref());
    context.insert("most_viewed", &most_viewed);
    templates::render(&state.templates, "images/ranking.html", &context)
}
