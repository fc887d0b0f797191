//! View counters and the most-viewed ranking.
//!
//! Counters live outside the relational store. Atomicity of a single increment
//! is provided by the backing store's own primitive (`INCR` / `ZINCRBY` on Redis).

use std::collections::HashMap;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::AppError;

/// Sorted set holding one member per image, scored by views.
pub const RANKING_KEY: &str = "image_ranking";

/// Counter key for an image's total views.
pub fn views_key(image_id: i64) -> String {
    format!("image:{}:views", image_id)
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Adds one view and returns the total after the increment.
    async fn incr_views(&self, image_id: i64) -> Result<i64, AppError>;

    /// Current total, 0 if the image was never viewed.
    async fn views(&self, image_id: i64) -> Result<i64, AppError>;

    /// Raises the image's ranking score by one.
    async fn bump_ranking(&self, image_id: i64) -> Result<(), AppError>;

    /// Ids of the most viewed images, highest score first.
    async fn top_ranked(&self, limit: usize) -> Result<Vec<i64>, AppError>;
}

/// Redis backed counters.
///
/// Each operation takes a fresh multiplexed connection from the client, so a
/// restarted or dropped Redis only fails the requests made while it is down.
pub struct RedisCounter {
    client: Client,
}

impl RedisCounter {
    /// Opens the client. No connection is made until the first command.
    pub fn open(url: &str) -> Result<Self, AppError> {
        let client = Client::open(url)?;
        info!("Counter store client initialized for {}", url);
        Ok(Self { client })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, AppError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool, AppError> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[async_trait]
impl CounterStore for RedisCounter {
    async fn incr_views(&self, image_id: i64) -> Result<i64, AppError> {
        let mut conn = self.get_connection().await?;
        let total: i64 = conn.incr(views_key(image_id), 1).await?;
        Ok(total)
    }

    async fn views(&self, image_id: i64) -> Result<i64, AppError> {
        let mut conn = self.get_connection().await?;
        let total: Option<i64> = conn.get(views_key(image_id)).await?;
        Ok(total.unwrap_or(0))
    }

    async fn bump_ranking(&self, image_id: i64) -> Result<(), AppError> {
        let mut conn = self.get_connection().await?;
        let _: f64 = conn.zincr(RANKING_KEY, image_id, 1).await?;
        Ok(())
    }

    async fn top_ranked(&self, limit: usize) -> Result<Vec<i64>, AppError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.get_connection().await?;
        let ids: Vec<i64> = conn.zrevrange(RANKING_KEY, 0, limit as isize - 1).await?;
        Ok(ids)
    }
}

/// Process-local counters for tests and runs without Redis.
#[derive(Default)]
pub struct MemoryCounter {
    views: Mutex<HashMap<i64, i64>>,
    ranking: Mutex<HashMap<i64, i64>>,
}

impl MemoryCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounter {
    async fn incr_views(&self, image_id: i64) -> Result<i64, AppError> {
        let mut views = self.views.lock().await;
        let total = views.entry(image_id).or_insert(0);
        *total += 1;
        Ok(*total)
    }

    async fn views(&self, image_id: i64) -> Result<i64, AppError> {
        Ok(self.views.lock().await.get(&image_id).copied().unwrap_or(0))
    }

    async fn bump_ranking(&self, image_id: i64) -> Result<(), AppError> {
        *self.ranking.lock().await.entry(image_id).or_insert(0) += 1;
        Ok(())
    }

    async fn top_ranked(&self, limit: usize) -> Result<Vec<i64>, AppError> {
        let ranking = self.ranking.lock().await;
        let mut entries: Vec<(i64, i64)> = ranking.iter().map(|(id, score)| (*id, *score)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
        Ok(entries.into_iter().take(limit).map(|(id, _)| id).collect())
    }
}
