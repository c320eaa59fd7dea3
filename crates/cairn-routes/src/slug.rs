//! Slug generation and validation.
//!
//! A slug is one URL path segment:
//! - Must be non-empty
//! - Must not contain whitespace, `/`, `?`, `#`, `%`, or `\`
//! - Must not start or end with `-`

use crate::error::{RouteError, RouteResult};

const FORBIDDEN_CHARS: &[char] = &['/', '?', '#', '%', '\\'];

/// Turn free text into a lowercase, hyphen-separated slug.
///
/// ASCII letters and digits are kept, everything else becomes a separator,
/// and runs of separators collapse into a single `-`.
///
/// ```
/// use cairn_routes::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Rust -- 2024  "), "rust-2024");
/// assert_eq!(slugify("***"), "");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Validate a slug, returning `Ok(())` if it can be used as a path segment.
pub fn validate_slug(slug: &str) -> RouteResult<()> {
    let invalid = |reason: String| RouteError::InvalidSlug {
        slug: slug.to_string(),
        reason,
    };

    if slug.is_empty() {
        return Err(invalid("slug must not be empty".into()));
    }
    if let Some(ch) = slug
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(invalid("must not start or end with '-'".into()));
    }
    Ok(())
}
