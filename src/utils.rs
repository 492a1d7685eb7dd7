//! Utility functions for text cleanup, URL resolution, and log formatting.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Trim a string and collapse every run of whitespace to a single space.
///
/// Headline markup tends to carry indentation and line breaks between
/// inline elements; this turns it back into a single readable line.
pub fn normalize_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Resolve `href` against `base`.
///
/// Absolute URLs come back unchanged, relative ones are joined onto the page
/// URL, and an empty `href` stays empty. If joining fails the raw value is
/// kept rather than dropped.
pub fn resolve_url(base: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    match base.join(href) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let s = "é".repeat(10);
        let result = truncate_for_log(&s, 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+18 bytes)"));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Hello \n\t  World  "), "Hello World");
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace("single"), "single");
    }

    #[test]
    fn test_resolve_url_relative() {
        let base = Url::parse("https://www.huffpost.com/").unwrap();
        assert_eq!(
            resolve_url(&base, "/entry/story_n_1"),
            "https://www.huffpost.com/entry/story_n_1"
        );
    }

    #[test]
    fn test_resolve_url_absolute_passes_through() {
        let base = Url::parse("https://www.huffpost.com/").unwrap();
        assert_eq!(
            resolve_url(&base, "https://img.huffingtonpost.com/a.jpg"),
            "https://img.huffingtonpost.com/a.jpg"
        );
    }

    #[test]
    fn test_resolve_url_empty_stays_empty() {
        let base = Url::parse("https://www.huffpost.com/").unwrap();
        assert_eq!(resolve_url(&base, ""), "");
        assert_eq!(resolve_url(&base, "   "), "");
    }
}
