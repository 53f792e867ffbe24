//! Text helpers for rendering failure messages.

use crate::secret::{Secret, MASK};

/// Truncate `s` to at most `max_len` Unicode scalar values, appending `"..."` if
/// truncation occurred. `max_len` counts characters (not bytes), making this safe
/// for multi-byte UTF-8 content.
///
/// Special cases:
/// - `max_len == 0` → empty string
/// - `max_len <= 3` → up to `max_len` dots (e.g. `max_len=2` → `".."`)
pub fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }

    let char_count = s.chars().count();
    if char_count <= max_len {
        return s.to_string();
    }

    if max_len <= 3 {
        return ".".repeat(max_len);
    }

    // Find byte offset of the (max_len - 3)th character.
    let keep_chars = max_len - 3;
    let byte_offset = s
        .char_indices()
        .nth(keep_chars)
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    format!("{}...", &s[..byte_offset])
}

/// Replace every occurrence of each non-empty secret in `text` with [`MASK`].
pub fn scrub_secrets(text: &str, secrets: &[&Secret]) -> String {
    let mut out = text.to_string();
    for secret in secrets {
        let value = secret.expose();
        if !value.is_empty() && out.contains(value) {
            out = out.replace(value, MASK);
        }
    }
    out
}

/// First line of a possibly multi-line error rendering.
pub fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("").trim_end()
}
