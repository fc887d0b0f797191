use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s_-]").expect("valid slug regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid slug regex"));

/// Turns a title into a URL-safe label: lowercase ASCII words joined by hyphens.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(stripped.trim(), "-");
    let slug = joined.trim_matches(|c| c == '-' || c == '_');

    if slug.is_empty() {
        "image".to_string()
    } else {
        slug.chars().take(200).collect()
    }
}
