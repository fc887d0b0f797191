// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use bookmarks::{
    config::Config, counter::MemoryCounter, db, routes, state::AppState, templates,
};
use sqlx::SqlitePool;

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub counters: Arc<MemoryCounter>,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port backed by in-memory SQLite and counters.
pub async fn spawn_app() -> TestApp {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create in-memory database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        redis_host: "127.0.0.1".to_string(),
        redis_port: 6379,
        redis_db: 0,
        media_root: std::env::temp_dir()
            .join("bookmarks-test-media")
            .to_string_lossy()
            .to_string(),
        fetch_images: false,
        bind_addr: "127.0.0.1:0".to_string(),
    };

    let counters = Arc::new(MemoryCounter::new());
    let state = AppState {
        pool: pool.clone(),
        config,
        counters: counters.clone(),
        templates: Arc::new(templates::load().expect("templates compile")),
        http: reqwest::Client::new(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        pool,
        counters,
        client,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a user and returns `(user_id, token)`.
    pub async fn register_and_login(&self, username: &str) -> (i64, String) {
        let password = "password123";

        let user: serde_json::Value = self
            .client
            .post(self.url("/account/register"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Register failed")
            .json()
            .await
            .unwrap();

        let login: serde_json::Value = self
            .client
            .post(self.url("/account/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .unwrap();

        (
            user["id"].as_i64().expect("user id"),
            login["token"].as_str().expect("token").to_string(),
        )
    }

    /// Inserts an image row directly, without a stored payload.
    pub async fn insert_image(&self, user_id: i64, title: &str, slug: &str) -> i64 {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO images (user_id, title, slug, url, created_at)
            VALUES (?, ?, ?, 'https://example.com/pic.jpg', ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(slug)
        .bind(chrono::Utc::now())
        .fetch_one(&self.pool)
        .await
        .unwrap();
        id
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql).fetch_one(&self.pool).await.unwrap();
        n
    }
}

/// Number of rendered image items in an HTML response.
pub fn image_items(html: &str) -> usize {
    html.matches("data-image-id=").count()
}
