//! URL checks for `href` and `src` values.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::LazyLock;

use regex::Regex;

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.-]{0,20}:").unwrap());

/// Schemes that execute code and are never accepted.
const SCRIPT_SCHEMES: &[&str] = &["javascript", "vbscript"];

/// Where a URL is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// Link target (`<a href>`).
    Anchor,
    /// Embedded resource (`<img src>`).
    Image,
}

/// Decides whether a URL may be emitted.
pub trait UrlFilter: Debug + Send + Sync {
    fn check(&self, url: &str, kind: UrlKind) -> bool;
}

/// Scheme of a URL, lower-cased, or `None` for a relative URL.
///
/// Whitespace and control characters are removed first, browsers ignore them
/// inside schemes.
#[must_use]
pub fn scheme(url: &str) -> Option<String> {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();
    SCHEME_RE
        .find(&compact)
        .map(|m| m.as_str().trim_end_matches(':').to_ascii_lowercase())
}

/// Scheme-based filter.
///
/// Script schemes are always rejected. `data:` is rejected for anchors and
/// accepted for images only as `data:image/...`. Relative URLs pass. When an
/// allow-list is set for a kind, any other scheme is rejected.
#[derive(Clone, Debug, Default)]
pub struct SchemeFilter {
    anchor: Option<BTreeSet<String>>,
    image: Option<BTreeSet<String>>,
}

impl SchemeFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow-lists used by safe mode.
    #[must_use]
    pub fn safe() -> Self {
        Self::new()
            .with_anchor_schemes(["http", "https", "ftp", "mailto"])
            .with_image_schemes(["http", "https"])
    }

    #[must_use]
    pub fn with_anchor_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.anchor = Some(normalize(schemes));
        self
    }

    #[must_use]
    pub fn with_image_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.image = Some(normalize(schemes));
        self
    }
}

fn normalize<I, S>(schemes: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    schemes
        .into_iter()
        .map(|s| s.as_ref().trim().trim_end_matches(':').to_ascii_lowercase())
        .collect()
}

impl UrlFilter for SchemeFilter {
    fn check(&self, url: &str, kind: UrlKind) -> bool {
        let Some(scheme) = scheme(url) else {
            return true;
        };
        if SCRIPT_SCHEMES.contains(&scheme.as_str()) {
            return false;
        }
        if scheme == "data" {
            let compact = url.trim_start().to_ascii_lowercase();
            return kind == UrlKind::Image && compact.starts_with("data:image/");
        }
        let allowed = match kind {
            UrlKind::Anchor => self.anchor.as_ref(),
            UrlKind::Image => self.image.as_ref(),
        };
        allowed.is_none_or(|schemes| schemes.contains(&scheme))
    }
}

/// Whether a URL needs no root (has a scheme or starts with `/`, `#` or `?`).
#[must_use]
pub fn is_absolute(url: &str) -> bool {
    scheme(url).is_some() || url.starts_with(['/', '#', '?'])
}

/// Prefix a relative URL with `root`.
#[must_use]
pub fn prepend_root(url: &str, root: Option<&str>) -> String {
    match root {
        Some(root) if !root.is_empty() && !is_absolute(url) => {
            format!("{}/{}", root.trim_end_matches('/'), url)
        }
        _ => url.to_owned(),
    }
}
