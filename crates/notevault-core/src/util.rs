//! Shared utility functions used across multiple modules.

use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("Invalid regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Turn a note title into a file stem that is safe on every platform.
///
/// Falls back to `fallback` (usually the note uuid) when nothing usable
/// remains.
pub fn sanitize_file_stem(title: &str, fallback: &str) -> String {
    let replaced = UNSAFE_FILE_CHARS.replace_all(title, "-");
    let collapsed = WHITESPACE_RUN.replace_all(replaced.trim(), " ");
    let stem = collapsed.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if stem.is_empty() {
        fallback.to_string()
    } else {
        stem.chars().take(120).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" Notes ".to_string())),
            Some("Notes".to_string())
        );
    }

    #[test]
    fn sanitize_file_stem_replaces_separators() {
        assert_eq!(sanitize_file_stem("a/b: c?", "x"), "a-b- c-");
        assert_eq!(sanitize_file_stem("  many   spaces  here ", "x"), "many spaces here");
    }

    #[test]
    fn sanitize_file_stem_uses_fallback() {
        assert_eq!(sanitize_file_stem("  ", "uuid-1"), "uuid-1");
        assert_eq!(sanitize_file_stem("...", "uuid-2"), "uuid-2");
    }
}
