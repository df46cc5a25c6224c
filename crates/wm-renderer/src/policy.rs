//! Allow-list policy for tags, attributes, CSS classes, ids and CSS properties.
//!
//! A policy is configured once before a conversion starts and is only read
//! while the document is processed.

use std::collections::{BTreeMap, BTreeSet};

use crate::dtd::Dtd;

static ALLOW_ALL: AllowList = AllowList::All;

/// Which names of one kind (attributes, classes, styles) are permitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AllowList {
    /// No restriction.
    #[default]
    All,
    /// Feature fully disabled.
    None,
    /// Explicit allow-list.
    Subset(BTreeSet<String>),
}

impl AllowList {
    /// Build an explicit allow-list from names.
    pub fn subset<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Subset(names.into_iter().map(Into::into).collect())
    }

    /// Check whether `name` is permitted (exact, case-sensitive match).
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Subset(names) => names.contains(name),
        }
    }

    /// `true` when the feature is disabled altogether.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Which tags are permitted and, per tag, which attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagPolicy {
    /// Every tag, every attribute.
    All,
    /// No markup tags at all.
    None,
    /// Explicit tags, each with its own attribute allow-list.
    Subset(BTreeMap<String, AllowList>),
}

impl TagPolicy {
    /// Attribute allow-list for `tag`, or `None` if the tag itself is not allowed.
    #[must_use]
    pub fn attributes(&self, tag: &str) -> Option<&AllowList> {
        match self {
            Self::All => Some(&ALLOW_ALL),
            Self::None => None,
            Self::Subset(tags) => tags.get(tag),
        }
    }

    #[must_use]
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.attributes(tag).is_some()
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Complete allow-list policy consumed by the sanitizer and the modifier projection.
///
/// Class and id checks share one list: an id is allowed when `#id` is listed.
/// Style properties are compared case-insensitively on both sides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowPolicy {
    pub tags: TagPolicy,
    pub classes: AllowList,
    pub styles: AllowList,
}

impl Default for AllowPolicy {
    /// Every element the DTD knows, with all attributes; classes and styles allowed.
    fn default() -> Self {
        let tags = Dtd::html()
            .element_names()
            .map(|name| (name.to_owned(), AllowList::All))
            .collect();
        Self {
            tags: TagPolicy::Subset(tags),
            classes: AllowList::All,
            styles: AllowList::All,
        }
    }
}

impl AllowPolicy {
    /// No restriction at all, unknown tags included.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            tags: TagPolicy::All,
            classes: AllowList::All,
            styles: AllowList::All,
        }
    }

    /// Nothing allowed.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            tags: TagPolicy::None,
            classes: AllowList::None,
            styles: AllowList::None,
        }
    }

    /// Preset for untrusted input: a handful of phrase tags, no classes, no styles.
    #[must_use]
    pub fn safe() -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("a".to_owned(), AllowList::subset(["href", "title"]));
        tags.insert("acronym".to_owned(), AllowList::subset(["title"]));
        for tag in [
            "b", "br", "cite", "code", "em", "i", "strong", "sub", "sup", "q", "small",
        ] {
            tags.insert(tag.to_owned(), AllowList::None);
        }
        Self {
            tags: TagPolicy::Subset(tags),
            classes: AllowList::None,
            styles: AllowList::None,
        }
    }

    /// Replace the styles list with an explicit subset (names are lower-cased).
    #[must_use]
    pub fn with_styles<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.styles = AllowList::Subset(
            properties
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_lowercase())
                .collect(),
        );
        self
    }

    /// Replace the classes list with an explicit subset (`#id` entries allow ids).
    #[must_use]
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = AllowList::subset(classes);
        self
    }

    #[must_use]
    pub fn allows_class(&self, class: &str) -> bool {
        self.classes.allows(class)
    }

    /// Ids are looked up in the classes list under the `#id` key.
    #[must_use]
    pub fn allows_id(&self, id: &str) -> bool {
        match &self.classes {
            AllowList::Subset(names) => names.contains(&format!("#{id}")),
            other => other.allows(id),
        }
    }

    /// CSS property check, case-insensitive.
    #[must_use]
    pub fn allows_style(&self, property: &str) -> bool {
        match &self.styles {
            AllowList::Subset(names) => {
                let property = property.trim();
                names.iter().any(|name| name.trim().eq_ignore_ascii_case(property))
            }
            other => other.allows(property),
        }
    }
}
