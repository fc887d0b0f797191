//! Storage of downloaded image payloads below the media root.

use std::path::Path;

use chrono::{Datelike, Utc};
use tokio::{fs, io::AsyncWriteExt};

use crate::error::AppError;

/// Largest payload accepted from a bookmarked URL.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Downloads `url` and stores it as `images/<yyyy>/<mm>/<dd>/<slug>.<ext>`.
/// Returns the path relative to `media_root`.
pub async fn download_image(
    http: &reqwest::Client,
    media_root: &str,
    url: &str,
    slug: &str,
    ext: &str,
) -> Result<String, AppError> {
    download_capped(http, media_root, url, slug, ext, MAX_IMAGE_BYTES).await
}

async fn download_capped(
    http: &reqwest::Client,
    media_root: &str,
    url: &str,
    slug: &str,
    ext: &str,
    max_bytes: u64,
) -> Result<String, AppError> {
    let mut response = http.get(url).send().await?.error_for_status()?;
    if response.content_length().is_some_and(|len| len > max_bytes) {
        return Err(too_large(max_bytes));
    }

    let relative = unique_relative_path(media_root, slug, ext).await;
    let full = Path::new(media_root).join(&relative);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).await?;
    }

    // the advertised length can lie, so the body is counted as it arrives
    let mut file = fs::File::create(&full).await?;
    let mut size: u64 = 0;
    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&full).await;
                return Err(e.into());
            }
        };
        size += chunk.len() as u64;
        if size > max_bytes {
            drop(file);
            let _ = fs::remove_file(&full).await;
            return Err(too_large(max_bytes));
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    tracing::info!(path = %relative, size, "stored image payload");
    Ok(relative)
}

fn too_large(max_bytes: u64) -> AppError {
    AppError::BadRequest(format!("Image is larger than {} bytes", max_bytes))
}

fn dated_dir() -> String {
    let today = Utc::now().date_naive();
    format!("images/{:04}/{:02}/{:02}", today.year(), today.month(), today.day())
}

async fn unique_relative_path(media_root: &str, slug: &str, ext: &str) -> String {
    let dir = dated_dir();
    let candidate = format!("{}/{}.{}", dir, slug, ext);
    if !fs::try_exists(Path::new(media_root).join(&candidate))
        .await
        .unwrap_or(false)
    {
        return candidate;
    }
    format!("{}/{}-{}.{}", dir, slug, Utc::now().timestamp_millis(), ext)
}
