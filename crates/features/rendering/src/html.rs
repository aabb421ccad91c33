//! Escaping helpers shared by the block renderers.

/// Escapes text for element bodies and attribute values.
#[must_use]
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Keeps a user-supplied url out of script territory.
///
/// `javascript:`, `vbscript:` and non-image `data:` urls collapse to `#`.
/// The check strips whitespace and control characters first because browsers
/// do the same before resolving the scheme.
#[must_use]
pub fn safe_url(url: &str) -> &str {
    let compact: String = url
        .chars()
        .filter(|ch| !ch.is_ascii_control() && !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    let blocked = compact.starts_with("javascript:")
        || compact.starts_with("vbscript:")
        || (compact.starts_with("data:") && !compact.starts_with("data:image/"));
    if blocked { "#" } else { url }
}
