// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{account, auth, images},
    state::AppState,
    utils::jwt::{auth_middleware, optional_auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (account, images).
/// * Serves downloaded payloads under `/media`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let account_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(account::get_me))
                .route("/edit", put(account::edit))
                .route("/actions", get(account::list_actions))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let image_routes = Router::new()
        .route("/images", get(images::image_list))
        .route("/images/", get(images::image_list))
        .route("/images/detail/{id}/{slug}", get(images::image_detail))
        .route("/images/ranking", get(images::image_ranking))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        // Login required
        .merge(
            Router::new()
                .route(
                    "/images/create",
                    get(images::create_form).post(images::create_image),
                )
                .route("/images/like", post(images::image_like))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    Router::new()
        .nest("/account", account_routes)
        .merge(image_routes)
        .nest_service("/media", ServeDir::new(&state.config.media_root))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
