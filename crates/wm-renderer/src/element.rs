//! Minimal HTML element: a name, ordered attributes and a void flag.

use std::fmt::Write;

use html_escape::encode_double_quoted_attribute;

use crate::dtd::Dtd;
use crate::protect::ContentType;

/// Attribute value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    /// Present without a value (`<input disabled>`).
    Flag,
    Text(String),
    /// Space-separated tokens (`class`, `rel`).
    List(Vec<String>),
    /// CSS declarations (`style`).
    Style(Vec<(String, String)>),
}

impl AttrValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Text content of a value; a flag reads as the empty string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Flag => Some(""),
            Self::Text(text) => Some(text),
            Self::List(_) | Self::Style(_) => None,
        }
    }

    /// Serialized form as it appears between the quotes.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Flag => String::new(),
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join(" "),
            Self::Style(decls) => decls
                .iter()
                .map(|(prop, value)| format!("{prop}: {value}"))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Flag | Self::Text(_) => false,
            Self::List(items) => items.is_empty(),
            Self::Style(decls) => decls.is_empty(),
        }
    }
}

/// Insertion-ordered attribute map with unique keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attrs {
    items: Vec<(String, AttrValue)>,
}

impl Attrs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut AttrValue> {
        self.items
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Text value of `key`, see [`AttrValue::as_text`].
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_text)
    }

    /// Insert or replace; a replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: AttrValue) {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.items.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        let pos = self.items.iter().position(|(k, _)| k == key)?;
        Some(self.items.remove(pos).1)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &AttrValue) -> bool,
    {
        self.items.retain(|(k, v)| keep(k, v));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// HTML element produced by the sanitizer or a module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    pub attrs: Attrs,
    void: bool,
}

impl Element {
    /// New element; void-ness comes from the DTD.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let void = Dtd::html().is_void(&name);
        Self {
            name,
            attrs: Attrs::new(),
            void,
        }
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename; void-ness is recomputed from the DTD.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.void = Dtd::html().is_void(&self.name);
    }

    /// Mark an element void regardless of the DTD (written as `<tag/>`).
    pub fn force_void(&mut self) {
        self.void = true;
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        self.void
    }

    #[must_use]
    pub fn content_type(&self) -> ContentType {
        Dtd::html().content_type(&self.name)
    }

    #[must_use]
    pub fn start_tag(&self) -> String {
        let mut out = format!("<{}", self.name);
        for (key, value) in self.attrs.iter() {
            if value.is_blank() {
                continue;
            }
            // writing into a String cannot fail
            let _ = if matches!(value, AttrValue::Flag) {
                write!(out, " {key}")
            } else {
                write!(
                    out,
                    r#" {key}="{}""#,
                    encode_double_quoted_attribute(&value.render())
                )
            };
        }
        out.push('>');
        out
    }

    /// Closing tag; empty for void elements.
    #[must_use]
    pub fn end_tag(&self) -> String {
        if self.void {
            String::new()
        } else {
            format!("</{}>", self.name)
        }
    }

    /// Whole element around already-rendered inner HTML.
    #[must_use]
    pub fn to_html(&self, inner: &str) -> String {
        if self.void {
            self.start_tag()
        } else {
            format!("{}{inner}{}", self.start_tag(), self.end_tag())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_start_and_end_tag() {
        let mut el = Element::new("a");
        el.attrs.insert("href", AttrValue::text("http://x/"));
        el.attrs
            .insert("rel", AttrValue::List(vec!["me".to_owned(), "nofollow".to_owned()]));
        assert_eq!(el.start_tag(), r#"<a href="http://x/" rel="me nofollow">"#);
        assert_eq!(el.end_tag(), "</a>");
    }

    #[test]
    fn test_void_element() {
        let el = Element::new("br");
        assert!(el.is_void());
        assert_eq!(el.to_html("ignored"), "<br>");
        assert_eq!(el.end_tag(), "");
    }

    #[test]
    fn test_force_void() {
        let mut el = Element::new("custom");
        assert!(!el.is_void());
        el.force_void();
        assert_eq!(el.to_html(""), "<custom>");
    }

    #[test]
    fn test_flag_and_style() {
        let mut el = Element::new("td");
        el.attrs.insert("nowrap", AttrValue::Flag);
        el.attrs.insert(
            "style",
            AttrValue::Style(vec![
                ("color".to_owned(), "red".to_owned()),
                ("text-align".to_owned(), "center".to_owned()),
            ]),
        );
        assert_eq!(
            el.start_tag(),
            r#"<td nowrap style="color: red; text-align: center">"#
        );
    }

    #[test]
    fn test_attribute_value_escaped() {
        let mut el = Element::new("span");
        el.attrs.insert("title", AttrValue::text(r#"a "b" & c"#));
        assert!(el.start_tag().contains("&quot;b&quot;"));
        assert!(el.start_tag().contains("&amp;"));
    }

    #[test]
    fn test_blank_list_skipped() {
        let mut el = Element::new("span");
        el.attrs.insert("class", AttrValue::List(Vec::new()));
        assert_eq!(el.start_tag(), "<span>");
    }

    #[test]
    fn test_attrs_insert_keeps_position() {
        let mut attrs = Attrs::new();
        attrs.insert("a", AttrValue::text("1"));
        attrs.insert("b", AttrValue::text("2"));
        attrs.insert("a", AttrValue::text("3"));
        let keys: Vec<_> = attrs.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(attrs.text("a"), Some("3"));
        assert_eq!(attrs.remove("a"), Some(AttrValue::text("3")));
        assert_eq!(attrs.len(), 1);
    }
}
