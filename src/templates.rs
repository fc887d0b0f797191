//! Server-rendered HTML. Templates are compiled into the binary.

use axum::response::Html;
use tera::{Context, Tera};

use crate::error::AppError;

const TEMPLATES: [(&str, &str); 6] = [
    ("base.html", include_str!("../templates/base.html")),
    ("images/create.html", include_str!("../templates/images/create.html")),
    ("images/detail.html", include_str!("../templates/images/detail.html")),
    ("images/list.html", include_str!("../templates/images/list.html")),
    ("images/list_images.html", include_str!("../templates/images/list_images.html")),
    ("images/ranking.html", include_str!("../templates/images/ranking.html")),
];

/// Builds the template engine with autoescaping for `.html` files.
pub fn load() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html"]);
    tera.add_raw_templates(TEMPLATES.to_vec())?;
    Ok(tera)
}

pub fn render(tera: &Tera, name: &str, context: &Context) -> Result<Html<String>, AppError> {
    Ok(Html(tera.render(name, context)?))
}
