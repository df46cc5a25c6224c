//! Element content model: permitted attributes and children per tag.
//!
//! Single-level rules only. Unknown elements are not judged: they keep all
//! their attributes and accept any child.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::element::Element;
use crate::protect::ContentType;

/// Attributes every known element accepts.
const CORE_ATTRS: &[&str] = &["id", "class", "style", "title", "lang", "dir"];

const CELL_ATTRS: &[&str] = &[
    "colspan", "rowspan", "align", "valign", "width", "height", "abbr", "scope",
];
const EDIT_ATTRS: &[&str] = &["cite", "datetime"];
const ROW_GROUP_ATTRS: &[&str] = &["align", "valign"];

/// Children an element permits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Children {
    /// Any element.
    Flow,
    /// Inline and replaced elements only.
    Phrasing,
    /// Exactly these elements.
    Only(&'static [&'static str]),
    /// Void element, no children.
    Empty,
}

/// Rendering category of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Block,
    Inline,
    Replaced,
}

/// Definition of one known element.
#[derive(Clone, Copy, Debug)]
pub struct ElementDef {
    pub kind: ElementKind,
    pub attrs: &'static [&'static str],
    pub children: Children,
}

/// Content-model table.
#[derive(Debug)]
pub struct Dtd {
    elements: BTreeMap<&'static str, ElementDef>,
    attributes: BTreeSet<&'static str>,
}

static HTML: LazyLock<Dtd> = LazyLock::new(Dtd::build_html);

impl Dtd {
    /// The built-in HTML table.
    pub fn html() -> &'static Dtd {
        &HTML
    }

    fn build_html() -> Self {
        use Children::{Empty, Flow, Only, Phrasing};
        use ElementKind::{Block, Inline, Replaced};

        const TABLE: &[(&str, ElementKind, &[&str], Children)] = &[
            // block containers
            ("div", Block, &["align"], Flow),
            ("section", Block, &[], Flow),
            ("article", Block, &[], Flow),
            ("aside", Block, &[], Flow),
            ("header", Block, &[], Flow),
            ("footer", Block, &[], Flow),
            ("nav", Block, &[], Flow),
            ("figure", Block, &[], Flow),
            ("figcaption", Block, &[], Flow),
            ("address", Block, &[], Flow),
            ("blockquote", Block, &["cite"], Flow),
            ("p", Block, &["align"], Phrasing),
            ("pre", Block, &[], Phrasing),
            ("h1", Block, &["align"], Phrasing),
            ("h2", Block, &["align"], Phrasing),
            ("h3", Block, &["align"], Phrasing),
            ("h4", Block, &["align"], Phrasing),
            ("h5", Block, &["align"], Phrasing),
            ("h6", Block, &["align"], Phrasing),
            ("hr", Block, &["align", "width"], Empty),
            // lists
            ("ul", Block, &["type"], Only(&["li"])),
            ("ol", Block, &["type", "start", "reversed"], Only(&["li"])),
            ("li", Block, &["value", "type"], Flow),
            ("dl", Block, &[], Only(&["dt", "dd"])),
            ("dt", Block, &[], Phrasing),
            ("dd", Block, &[], Flow),
            // tables
            (
                "table",
                Block,
                &["border", "cellpadding", "cellspacing", "width", "summary", "align"],
                Only(&["caption", "colgroup", "col", "thead", "tbody", "tfoot", "tr"]),
            ),
            ("caption", Block, &["align"], Phrasing),
            ("colgroup", Block, &["span", "width"], Only(&["col"])),
            ("col", Block, &["span", "width"], Empty),
            ("thead", Block, ROW_GROUP_ATTRS, Only(&["tr"])),
            ("tbody", Block, ROW_GROUP_ATTRS, Only(&["tr"])),
            ("tfoot", Block, ROW_GROUP_ATTRS, Only(&["tr"])),
            ("tr", Block, ROW_GROUP_ATTRS, Only(&["td", "th"])),
            ("td", Block, CELL_ATTRS, Flow),
            ("th", Block, CELL_ATTRS, Flow),
            // phrasing
            (
                "a",
                Inline,
                &["href", "name", "rel", "target", "hreflang", "type"],
                Phrasing,
            ),
            ("abbr", Inline, &[], Phrasing),
            ("acronym", Inline, &[], Phrasing),
            ("b", Inline, &[], Phrasing),
            ("big", Inline, &[], Phrasing),
            ("cite", Inline, &[], Phrasing),
            ("code", Inline, &[], Phrasing),
            ("del", Inline, EDIT_ATTRS, Flow),
            ("dfn", Inline, &[], Phrasing),
            ("em", Inline, &[], Phrasing),
            ("i", Inline, &[], Phrasing),
            ("ins", Inline, EDIT_ATTRS, Flow),
            ("kbd", Inline, &[], Phrasing),
            ("mark", Inline, &[], Phrasing),
            ("q", Inline, &["cite"], Phrasing),
            ("s", Inline, &[], Phrasing),
            ("samp", Inline, &[], Phrasing),
            ("small", Inline, &[], Phrasing),
            ("span", Inline, &[], Phrasing),
            ("strike", Inline, &[], Phrasing),
            ("strong", Inline, &[], Phrasing),
            ("sub", Inline, &[], Phrasing),
            ("sup", Inline, &[], Phrasing),
            ("time", Inline, &["datetime"], Phrasing),
            ("tt", Inline, &[], Phrasing),
            ("u", Inline, &[], Phrasing),
            ("var", Inline, &[], Phrasing),
            // replaced
            ("br", Replaced, &["clear"], Empty),
            (
                "img",
                Replaced,
                &["src", "alt", "width", "height", "align", "border", "usemap"],
                Empty,
            ),
        ];

        let mut elements = BTreeMap::new();
        let mut attributes: BTreeSet<&'static str> = CORE_ATTRS.iter().copied().collect();
        for &(name, kind, attrs, children) in TABLE {
            attributes.extend(attrs.iter().copied());
            elements.insert(
                name,
                ElementDef {
                    kind,
                    attrs,
                    children,
                },
            );
        }

        Self {
            elements,
            attributes,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ElementDef> {
        self.elements.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// Names of all known elements, sorted.
    pub fn element_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.elements.keys().copied()
    }

    /// Whether `name` is an attribute of any known element.
    #[must_use]
    pub fn is_known_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    #[must_use]
    pub fn is_void(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|def| def.children == Children::Empty)
    }

    /// Content type of the protected span an element's tags are stored as.
    #[must_use]
    pub fn content_type(&self, name: &str) -> ContentType {
        match self.get(name).map(|def| def.kind) {
            Some(ElementKind::Block) => ContentType::Block,
            Some(ElementKind::Replaced) => ContentType::Replaced,
            Some(ElementKind::Inline) | None => ContentType::Markup,
        }
    }

    /// Whether `child` may appear directly inside `parent`.
    #[must_use]
    pub fn permits_child(&self, parent: &str, child: &str) -> bool {
        let Some(def) = self.get(parent) else {
            return true;
        };
        match def.children {
            Children::Flow => true,
            Children::Empty => false,
            Children::Only(names) => names.contains(&child),
            Children::Phrasing => self
                .get(child)
                .is_none_or(|child_def| child_def.kind != ElementKind::Block),
        }
    }

    /// Drop attributes the table does not list for a known element.
    pub fn validate_attrs(&self, element: &mut Element) {
        let Some(def) = self.get(element.name()) else {
            return;
        };
        element
            .attrs
            .retain(|key, _| CORE_ATTRS.contains(&key) || def.attrs.contains(&key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::AttrValue;

    #[test]
    fn test_known_elements() {
        let dtd = Dtd::html();
        assert!(dtd.contains("div"));
        assert!(dtd.contains("img"));
        assert!(!dtd.contains("script"));
        assert!(!dtd.contains("DIV"));
    }

    #[test]
    fn test_void_elements() {
        let dtd = Dtd::html();
        assert!(dtd.is_void("br"));
        assert!(dtd.is_void("img"));
        assert!(!dtd.is_void("div"));
        assert!(!dtd.is_void("unknown"));
    }

    #[test]
    fn test_known_attributes() {
        let dtd = Dtd::html();
        assert!(dtd.is_known_attribute("width"));
        assert!(dtd.is_known_attribute("href"));
        assert!(dtd.is_known_attribute("title"));
        assert!(!dtd.is_known_attribute("color"));
        assert!(!dtd.is_known_attribute("onclick"));
    }

    #[test]
    fn test_content_types() {
        let dtd = Dtd::html();
        assert_eq!(dtd.content_type("div"), ContentType::Block);
        assert_eq!(dtd.content_type("img"), ContentType::Replaced);
        assert_eq!(dtd.content_type("b"), ContentType::Markup);
        assert_eq!(dtd.content_type("custom"), ContentType::Markup);
    }

    #[test]
    fn test_permits_child() {
        let dtd = Dtd::html();
        assert!(dtd.permits_child("ul", "li"));
        assert!(!dtd.permits_child("ul", "div"));
        assert!(dtd.permits_child("span", "b"));
        assert!(!dtd.permits_child("span", "div"));
        assert!(dtd.permits_child("span", "custom"));
        assert!(!dtd.permits_child("br", "b"));
        assert!(dtd.permits_child("custom", "div"));
        assert!(dtd.permits_child("div", "table"));
    }

    #[test]
    fn test_validate_attrs() {
        let mut el = Element::new("img");
        el.attrs.insert("src", AttrValue::text("a.png"));
        el.attrs.insert("href", AttrValue::text("x"));
        el.attrs.insert("class", AttrValue::text("c"));
        Dtd::html().validate_attrs(&mut el);

        assert!(el.attrs.contains("src"));
        assert!(el.attrs.contains("class"));
        assert!(!el.attrs.contains("href"));
    }

    #[test]
    fn test_validate_attrs_unknown_element_untouched() {
        let mut el = Element::new("custom");
        el.attrs.insert("onclick", AttrValue::text("x"));
        Dtd::html().validate_attrs(&mut el);
        assert!(el.attrs.contains("onclick"));
    }
}
