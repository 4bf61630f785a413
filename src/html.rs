//! Plain-text recovery for the HTML fragments the coverage API returns.
//!
//! Paragraphs arrive double-encoded (`&amp;lt;p&amp;gt;`), so entity decoding is
//! applied twice before markup is stripped.

use std::sync::LazyLock;

use regex::Regex;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Decodes the double-encoded entities of a CMS paragraph.
pub fn unescape_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    decode_entities(&decode_entities(text))
}

/// Single decoding pass over named, decimal and hex entities. Unknown entities
/// are left untouched.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Replaces every markup tag with a space.
pub fn strip_tags(text: &str) -> String {
    TAG_REGEX.replace_all(text, " ").into_owned()
}

/// Decoded, tag-free text with whitespace runs collapsed.
pub fn plain_text(html: &str) -> String {
    strip_tags(&unescape_html(html))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
