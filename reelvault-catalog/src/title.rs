//! Title and identifier normalization.
//!
//! Clean titles are the lookup key used when matching release names against
//! the library, so both sides must be produced by [`clean_title`].

const ARTICLES: &[&str] = &["a", "an", "the"];

/// Reduce a title to its lowercase alphanumeric core.
///
/// Leading articles are dropped, `&` is treated as "and", and everything that
/// is not a letter or digit is removed.
///
/// ```
/// use reelvault_catalog::title::clean_title;
///
/// assert_eq!(clean_title("The Matrix"), "matrix");
/// assert_eq!(clean_title("Fast & Furious 6"), "fastandfurious6");
/// assert_eq!(clean_title("Amélie"), "amélie");
/// ```
pub fn clean_title(title: &str) -> String {
    let lowered = title.to_lowercase().replace('&', " and ");
    let mut words = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .peekable();

    // Keep the article if it is the whole title ("A").
    if let Some(first) = words.peek() {
        if ARTICLES.contains(first) {
            let first = words.next().unwrap_or_default();
            if words.peek().is_none() {
                return first.to_string();
            }
        }
    }

    words.collect()
}

/// Normalize an IMDb id to `tt` followed by at least seven digits.
///
/// Returns `None` when the input carries no digits or anything other than an
/// optional `tt` prefix.
///
/// ```
/// use reelvault_catalog::title::normalize_imdb_id;
///
/// assert_eq!(normalize_imdb_id("tt0133093").as_deref(), Some("tt0133093"));
/// assert_eq!(normalize_imdb_id("133093").as_deref(), Some("tt0133093"));
/// assert_eq!(normalize_imdb_id("nm0000206"), None);
/// ```
pub fn normalize_imdb_id(imdb_id: &str) -> Option<String> {
    let trimmed = imdb_id.trim();
    let digits = trimmed
        .strip_prefix("tt")
        .or_else(|| trimmed.strip_prefix("TT"))
        .unwrap_or(trimmed);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(format!("tt{digits:0>7}"))
}
