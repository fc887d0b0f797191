// src/config.rs

use std::env;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: i64,
    /// Directory downloaded image payloads are written to and served from.
    pub media_root: String,
    /// Download the remote image when a bookmark is created.
    pub fetch_images: bool,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://bookmarks.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let redis_host = env::var("REDIS_HOST")
            .unwrap_or_else(|_| "127.0.0.1".to_string());
        let redis_port = env::var("REDIS_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(6379);
        let redis_db = env::var("REDIS_DB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
        let fetch_images = env::var("FETCH_IMAGES")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            redis_host,
            redis_port,
            redis_db,
            media_root,
            fetch_images,
            bind_addr,
        }
    }

    /// Connection string for the view counter store.
    pub fn redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        )
    }
}
