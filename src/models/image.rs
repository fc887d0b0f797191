use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

/// File extensions accepted for bookmarked images.
pub const VALID_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// URL schemes a bookmark may point to.
pub const VALID_SCHEMES: [&str; 2] = ["http", "https"];

/// Represents the 'images' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub slug: String,
    /// Page the bookmark was taken from.
    pub url: String,
    /// Path of the downloaded payload below the media root, if any.
    pub image: Option<String>,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Image {
    /// Canonical detail location of this image.
    pub fn absolute_url(&self) -> String {
        format!("/images/detail/{}/{}", self.id, self.slug)
    }

    /// Public URL of the stored payload, `None` when nothing was downloaded.
    pub fn display_url(&self) -> Option<String> {
        self.image
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| format!("/media/{}", path))
    }
}

/// Form submitted to bookmark an image, either POSTed or pre-filled by the bookmarklet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ImageForm {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 characters."
    ))]
    pub title: String,

    #[validate(
        length(min = 1, max = 2000, message = "URL length must be between 1 and 2000 characters."),
        custom(function = validate_image_url)
    )]
    pub url: String,

    #[validate(length(max = 2000, message = "Ensure this value has at most 2000 characters."))]
    pub description: String,
}

impl ImageForm {
    /// Trims surrounding whitespace from every field.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            url: self.url.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }

    /// Lower-cased extension of the image URL path.
    pub fn extension(&self) -> Option<String> {
        url_extension(&self.url)
    }
}

fn url_extension(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Validates that the URL parses and points to a supported image type.
fn validate_image_url(url: &str) -> Result<(), validator::ValidationError> {
    let valid_scheme = Url::parse(url)
        .map(|parsed| VALID_SCHEMES.contains(&parsed.scheme()))
        .unwrap_or(false);
    if !valid_scheme {
        let mut err = validator::ValidationError::new("invalid_url");
        err.message = Some("Enter a valid URL.".into());
        return Err(err);
    }
    match url_extension(url) {
        Some(ext) if VALID_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => {
            let mut err = validator::ValidationError::new("invalid_extension");
            err.message = Some("The given URL does not match valid image extensions.".into());
            Err(err)
        }
    }
}

/// Query parameters for the image list.
#[derive(Debug, Default, Deserialize)]
pub struct ImageListParams {
    /// Raw page number; anything that is not an integer serves page 1.
    pub page: Option<String>,
    /// Any non-empty value requests the items-only fragment.
    pub images_only: Option<String>,
}

impl ImageListParams {
    pub fn items_only(&self) -> bool {
        self.images_only.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Asynchronous like/unlike request.
#[derive(Debug, Default, Deserialize)]
pub struct LikeRequest {
    pub id: Option<String>,
    pub action: Option<String>,
}

/// Requested change to the liked-by set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

impl LikeRequest {
    /// Returns the target id and action when both are present and well formed.
    pub fn parse(&self) -> Option<(i64, LikeAction)> {
        let id = self.id.as_deref()?.trim().parse::<i64>().ok()?;
        let action = match self.action.as_deref()? {
            "like" => LikeAction::Like,
            "unlike" => LikeAction::Unlike,
            _ => return None,
        };
        Some((id, action))
    }
}

/// An image together with the URLs templates need.
#[derive(Debug, Serialize)]
pub struct ImageView {
    pub url: String,
    pub display_url: Option<String>,
    pub image: Image,
}

impl From<Image> for ImageView {
    fn from(image: Image) -> Self {
        Self {
            url: image.absolute_url(),
            display_url: image.display_url(),
            image,
        }
    }
}

/// Row of the most-viewed ranking.
#[derive(Debug, Serialize)]
pub struct RankedImage {
    #[serde(flatten)]
    pub view: ImageView,
    pub total_views: i64,
}
