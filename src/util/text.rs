use std::borrow::Cow;

/// Ellipsis string used for truncation
pub const ELLIPSIS: &str = "...";
/// Length of the ellipsis in characters
const ELLIPSIS_LEN: usize = 3;

/// Counts characters the way Slack enforces its text limits (Unicode scalar values).
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Truncates a string to at most `max_chars` characters.
///
/// If truncation is necessary, the result is cut to `max_chars - 3` characters
/// and "..." is appended, so a truncated string is always exactly `max_chars`
/// long and always ends with the ellipsis.
///
/// # Returns
///
/// - If the string fits, `Cow::Borrowed(s)` (no allocation)
/// - If `max_chars <= 3`, as many characters as fit, without ellipsis
/// - Otherwise `Cow::Owned` with the truncated prefix and "..."
///
/// Cuts always land on a `char` boundary, so multi-byte text (CJK, emoji)
/// never panics.
///
/// # Examples
///
/// ```
/// use tech_digest::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("Hello World", 8), "Hello...");
/// assert_eq!(truncate_chars("日本語のテキスト", 6), "日本語...");
/// assert_eq!(truncate_chars("Test", 2), "Te");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    if max_chars == 0 {
        return Cow::Borrowed("");
    }

    // Byte offset of the first character past the limit, if any
    let Some((overflow_at, _)) = s.char_indices().nth(max_chars) else {
        return Cow::Borrowed(s);
    };

    if max_chars <= ELLIPSIS_LEN {
        return Cow::Owned(s[..overflow_at].to_string());
    }

    let keep = max_chars - ELLIPSIS_LEN;
    let cut = s.char_indices().nth(keep).map_or(s.len(), |(idx, _)| idx);
    Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ascii_truncation() {
        // "Hello World" = 11 chars, max 8 -> keep 5 + "..."
        assert_eq!(truncate_chars("Hello World", 8), "Hello...");
        assert_eq!(truncate_chars("Short", 10), "Short");
    }

    #[test]
    fn test_fits_returns_borrowed() {
        let result = truncate_chars("exact", 5);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "exact");
    }

    #[test]
    fn test_multibyte_counts_chars_not_bytes() {
        // 8 chars, 24 bytes
        let text = "日本語のテキスト";
        assert_eq!(truncate_chars(text, 8), text);
        assert_eq!(truncate_chars(text, 7), "日本語の...");
        assert_eq!(truncate_chars("🔥🔥🔥🔥🔥", 4), "🔥...");
    }

    #[test]
    fn test_edge_case_limits() {
        assert_eq!(truncate_chars("Test", 0), "");
        assert_eq!(truncate_chars("", 0), "");
        assert_eq!(truncate_chars("Testing", 1), "T");
        assert_eq!(truncate_chars("Testing", 3), "Tes");
        assert_eq!(truncate_chars("Testing", 4), "T...");
    }

    #[test]
    fn test_char_len() {
        assert_eq!(char_len(""), 0);
        assert_eq!(char_len("abc"), 3);
        assert_eq!(char_len("技術記事"), 4);
    }

    proptest! {
        #[test]
        fn truncated_text_respects_limit(s in "\\PC{0,300}", max in 4usize..200) {
            let out = truncate_chars(&s, max);
            prop_assert!(char_len(&out) <= max);
            if char_len(&s) > max {
                prop_assert!(out.ends_with(ELLIPSIS));
                prop_assert_eq!(char_len(&out), max);
            } else {
                prop_assert_eq!(out.as_ref(), s.as_str());
            }
        }
    }
}
