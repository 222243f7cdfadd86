//! Text normalization applied to every result description.

/// Word limit applied to descriptions and abstracts
pub const DEFAULT_MAX_WORDS: usize = 50;

/// Suffix appended to truncated text
pub const ELLIPSIS: &str = "...";

/// Truncate `text` to at most `max_words` whitespace-separated words.
///
/// Text within the limit is returned unchanged, including its original
/// spacing. Longer text is rebuilt from the first `max_words` words joined by
/// single spaces, followed by [`ELLIPSIS`].
pub fn truncate_words(text: &str, max_words: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();

    if words.next().is_none() {
        return text.to_string();
    }

    let mut truncated = kept.join(" ");
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Collapse runs of whitespace (including newlines) into single spaces.
///
/// Atom titles are frequently hard-wrapped.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (1..=n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(truncate_words("", 50), "");
    }

    #[test]
    fn test_within_limit_is_unchanged() {
        let text = "  Attention   is all\nyou need ";
        assert_eq!(truncate_words(text, 5), text);
        assert_eq!(truncate_words(&words(50), 50), words(50));
    }

    #[test]
    fn test_over_limit_keeps_exact_word_count() {
        let truncated = truncate_words(&words(51), 50);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated, format!("{}...", words(50)));

        let body = truncated.trim_end_matches(ELLIPSIS);
        assert_eq!(body.split_whitespace().count(), 50);
    }

    #[test]
    fn test_irregular_spacing_is_normalized_when_truncated() {
        assert_eq!(truncate_words("a\n\nb   c\td", 2), "a b...");
    }

    #[test]
    fn test_zero_word_limit() {
        assert_eq!(truncate_words("one", 0), "...");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("Deep\n  Residual Learning\n for Image"),
            "Deep Residual Learning for Image"
        );
    }
}
