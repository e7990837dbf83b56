//! Small string helpers for markup text and log output

/// Truncate a string to at most `max_chars` characters without splitting a
/// multi-byte character.
///
/// # Examples
/// ```
/// # use tariffscrape::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("10 Downing Street, London", 9), "10 Downin");
/// assert_eq!(safe_truncate_chars("£75", 1), "£");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Collapse runs of whitespace (including non-breaking spaces) into single
/// spaces and trim both ends.
///
/// Markup text pulled out of nested elements is full of newlines and
/// indentation; every comparison in the extractor runs on collapsed text.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split(|c: char| c.is_whitespace() || c == '\u{a0}') {
        if word.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
