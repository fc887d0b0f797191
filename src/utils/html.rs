/// Sanitizes user supplied description markup before it is stored.
///
/// Safe inline tags such as <b> and <a> survive, while <script>, <iframe> and
/// event handler attributes are stripped. Templates still autoescape on output.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitized description, `None` when nothing is left.
pub fn clean_description(input: &str) -> Option<String> {
    let cleaned = clean_html(input.trim());
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
