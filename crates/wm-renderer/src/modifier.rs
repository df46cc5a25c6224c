//! Modifier annotations: `.(title)[class #id]{prop: value}` plus alignment glyphs.
//!
//! Parsing is best-effort. Unknown or malformed fragments are skipped, never
//! reported.
//!
//! | fragment          | effect                                     |
//! |-------------------|--------------------------------------------|
//! | `(text)`          | title                                      |
//! | `[a b #id]`       | classes (accumulate), id (last wins)       |
//! | `{p: v; q: w}`    | structural attribute if known, else style  |
//! | `^` `-` `_`       | vertical align top / middle / bottom       |
//! | `<` `>` `<>` `=`  | horizontal align left / right / center / justify |

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::context::Settings;
use crate::dtd::Dtd;
use crate::element::{AttrValue, Attrs, Element};
use crate::policy::{AllowList, AllowPolicy};
use crate::url::UrlKind;
use crate::util::unescape_html;

/// One modifier fragment, unanchored.
pub const FRAGMENT: &str = r"\([^)\n]+\)|\[[^\]\n]+\]|\{[^}\n]+\}|<>|>|=|<|\^|_|-";

static FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(FRAGMENT).unwrap());

/// Horizontal alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Right,
    Center,
    Justify,
}

impl HAlign {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
            Self::Justify => "justify",
        }
    }
}

/// Vertical alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

impl VAlign {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        }
    }
}

/// Parsed modifier record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifier {
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// CSS declarations, property names lower-cased.
    pub styles: BTreeMap<String, String>,
    /// Structural attributes from `{...}`.
    pub attrs: BTreeMap<String, String>,
    pub title: Option<String>,
    pub h_align: Option<HAlign>,
    pub v_align: Option<VAlign>,
}

impl Modifier {
    /// Parse a modifier string such as `(Caption)[one #main]{color: red}^`.
    pub fn parse(text: &str) -> Self {
        Self::from_fragments(FRAGMENT_RE.find_iter(text).map(|m| m.as_str()))
    }

    /// Fold fragments left to right.
    pub fn from_fragments<'a, I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut modifier = Self::default();
        for fragment in fragments {
            modifier.apply(fragment);
        }
        modifier
    }

    /// Apply one fragment; anything unrecognized is ignored.
    pub fn apply(&mut self, fragment: &str) {
        match fragment {
            "" => {}
            "^" => self.v_align = Some(VAlign::Top),
            "-" => self.v_align = Some(VAlign::Middle),
            "_" => self.v_align = Some(VAlign::Bottom),
            "=" => self.h_align = Some(HAlign::Justify),
            ">" => self.h_align = Some(HAlign::Right),
            "<" => self.h_align = Some(HAlign::Left),
            "<>" => self.h_align = Some(HAlign::Center),
            _ => {
                if let Some(inner) = enclosed(fragment, '(', ')') {
                    self.apply_title(inner);
                } else if let Some(inner) = enclosed(fragment, '[', ']') {
                    self.apply_classes(inner);
                } else if let Some(inner) = enclosed(fragment, '{', '}') {
                    self.apply_styles(inner);
                }
            }
        }
    }

    fn apply_title(&mut self, inner: &str) {
        let title = inner.trim();
        let title = if title.contains('&') {
            unescape_html(title)
        } else {
            title.to_owned()
        };
        self.title = Some(title);
    }

    fn apply_classes(&mut self, inner: &str) {
        for token in inner.replace('#', " #").split_whitespace() {
            match token.strip_prefix('#') {
                Some(id) if !id.is_empty() => self.id = Some(id.to_owned()),
                Some(_) => {}
                None => self.classes.push(token.to_owned()),
            }
        }
    }

    fn apply_styles(&mut self, inner: &str) {
        let dtd = Dtd::html();
        for declaration in inner.split(';') {
            let (prop, value) = declaration.split_once(':').unwrap_or((declaration, ""));
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            if prop.is_empty() {
                continue;
            }
            if dtd.is_known_attribute(&prop) {
                self.attrs.insert(prop, value.to_owned());
            } else if !value.is_empty() {
                self.styles.insert(prop, value.to_owned());
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Attributes for `tag` that survive `policy`.
    ///
    /// Order: structural attributes, title, class, id, style. Alignment is
    /// appended to the style after the style allow-list has been applied.
    #[must_use]
    pub fn project(&self, tag: &str, policy: &AllowPolicy) -> Attrs {
        let mut attrs = Attrs::new();

        let allowed = policy.tags.attributes(tag).unwrap_or(&AllowList::None);
        for (key, value) in &self.attrs {
            // class, id and style only come from their own fragments
            if matches!(key.as_str(), "class" | "id" | "style") || !allowed.allows(key) {
                continue;
            }
            attrs.insert(key.clone(), AttrValue::text(value.clone()));
        }

        if let Some(title) = &self.title {
            attrs.insert("title", AttrValue::text(title.clone()));
        }

        let classes: Vec<String> = self
            .classes
            .iter()
            .filter(|class| policy.allows_class(class))
            .cloned()
            .collect();
        if !classes.is_empty() {
            attrs.insert("class", AttrValue::List(classes));
        }

        if let Some(id) = self.id.as_ref().filter(|id| policy.allows_id(id)) {
            attrs.insert("id", AttrValue::text(id.clone()));
        }

        let mut style: Vec<(String, String)> = self
            .styles
            .iter()
            .filter(|(prop, _)| policy.allows_style(prop))
            .map(|(prop, value)| (prop.clone(), value.clone()))
            .collect();
        if let Some(align) = self.h_align {
            style.push(("text-align".to_owned(), align.as_str().to_owned()));
        }
        if let Some(align) = self.v_align {
            style.push(("vertical-align".to_owned(), align.as_str().to_owned()));
        }
        if !style.is_empty() {
            attrs.insert("style", AttrValue::Style(style));
        }

        attrs
    }

    /// New element named `tag` carrying the projected attributes.
    ///
    /// Attributes the element table does not list for `tag` are dropped, and
    /// so are `href` and `src` values the URL filter rejects.
    #[must_use]
    pub fn to_element(&self, tag: &str, settings: &Settings) -> Element {
        let mut element = Element::new(tag).with_attrs(self.project(tag, &settings.policy));
        Dtd::html().validate_attrs(&mut element);
        for (attr, kind) in [("href", UrlKind::Anchor), ("src", UrlKind::Image)] {
            if let Some(url) = element.attrs.text(attr)
                && !settings.check_url(url, kind)
            {
                tracing::debug!(tag, attr, url, "Modifier URL rejected");
                element.attrs.remove(attr);
            }
        }
        element
    }
}

fn enclosed(fragment: &str, open: char, close: char) -> Option<&str> {
    fragment.strip_prefix(open)?.strip_suffix(close)
}
