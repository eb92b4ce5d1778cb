//! Character-count truncation used by the summary templates.
//!
//! Counts are in `char`s, never word aware.

pub const ELLIPSIS: &str = "...";

/// The first `limit` characters of `text`.
pub fn take_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Template truncation: the ellipsis is appended whether or not anything
/// was cut.
pub fn clip(text: &str, limit: usize) -> String {
    format!("{}{}", take_chars(text, limit), ELLIPSIS)
}

/// Truncation that only adds the ellipsis when `text` was actually longer.
pub fn clip_if_longer(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        clip(text, limit)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_text_is_cut_to_limit_plus_ellipsis() {
        let text = "a".repeat(250);
        let clipped = clip(&text, 200);
        assert_eq!(clipped.chars().count(), 203);
        assert!(clipped.ends_with("a..."));
    }

    #[test]
    fn short_text_still_gets_ellipsis() {
        assert_eq!(clip("short", 200), "short...");
        assert_eq!(clip("", 100), "...");
    }

    #[test]
    fn conditional_clip_leaves_short_text_alone() {
        assert_eq!(clip_if_longer("short", 100), "short");
        assert_eq!(clip_if_longer(&"b".repeat(101), 100), format!("{}...", "b".repeat(100)));
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(take_chars("héllo wörld", 4), "héll");
        assert_eq!(take_chars("日本語テキスト", 3), "日本語");
    }
}
