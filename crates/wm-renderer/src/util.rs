//! Shared helpers for entity handling.

use std::borrow::Cow;

use html_escape::{decode_html_entities, encode_text};

/// Escape text for use between tags.
///
/// # Examples
///
/// ```
/// use wm_renderer::escape_html;
///
/// assert_eq!(escape_html("a < b & c"), "a &lt; b &amp; c");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    encode_text(text).into_owned()
}

/// Decode named and numeric HTML entities.
///
/// # Examples
///
/// ```
/// use wm_renderer::unescape_html;
///
/// assert_eq!(unescape_html("Tom &amp; Jerry &#33;"), "Tom & Jerry !");
/// ```
#[must_use]
pub fn unescape_html(text: &str) -> String {
    match decode_html_entities(text) {
        Cow::Borrowed(text) => text.to_owned(),
        Cow::Owned(text) => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_keeps_quotes() {
        assert_eq!(escape_html(r#"say "hi""#), r#"say "hi""#);
    }

    #[test]
    fn test_unescape_unknown_entity_left_alone() {
        assert_eq!(unescape_html("&bogus; &lt;"), "&bogus; <");
    }
}
