//! Settings and per-conversion state.
//!
//! [`Settings`] is configured once and only read during a conversion.
//! [`ConversionContext`] owns everything a conversion mutates: the protected
//! spans, the link/image summary, the table of contents and the stack of open
//! sanitized elements. Nothing survives between conversions.

use crate::dtd::Dtd;
use crate::element::Element;
use crate::policy::AllowPolicy;
use crate::protect::{ContentType, ProtectedStore};
use crate::url::{SchemeFilter, UrlFilter, UrlKind};

/// Conversion settings.
#[derive(Debug)]
pub struct Settings {
    pub policy: AllowPolicy,
    /// Keep sanitized `<!-- comments -->` in the output.
    pub pass_comments: bool,
    /// Add `rel="nofollow"` to links with an absolute or scheme-relative href.
    pub force_nofollow: bool,
    /// Prefix for relative link targets.
    pub link_root: Option<String>,
    /// Prefix for relative image sources.
    pub image_root: Option<String>,
    pub url_filter: Box<dyn UrlFilter>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            policy: AllowPolicy::default(),
            pass_comments: true,
            force_nofollow: false,
            link_root: None,
            image_root: None,
            url_filter: Box::new(SchemeFilter::new()),
        }
    }
}

impl Settings {
    /// Settings for untrusted input.
    #[must_use]
    pub fn safe_mode() -> Self {
        Self {
            policy: AllowPolicy::safe(),
            force_nofollow: true,
            url_filter: Box::new(SchemeFilter::safe()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AllowPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_url_filter(mut self, filter: impl UrlFilter + 'static) -> Self {
        self.url_filter = Box::new(filter);
        self
    }

    #[must_use]
    pub fn with_pass_comments(mut self, pass: bool) -> Self {
        self.pass_comments = pass;
        self
    }

    #[must_use]
    pub fn with_force_nofollow(mut self, force: bool) -> Self {
        self.force_nofollow = force;
        self
    }

    #[must_use]
    pub fn with_link_root(mut self, root: impl Into<String>) -> Self {
        self.link_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_image_root(mut self, root: impl Into<String>) -> Self {
        self.image_root = Some(root.into());
        self
    }

    /// Run the configured URL filter.
    #[must_use]
    pub fn check_url(&self, url: &str, kind: UrlKind) -> bool {
        self.url_filter.check(url, kind)
    }
}

/// URLs discovered during a conversion, in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub links: Vec<String>,
    pub images: Vec<String>,
}

/// Where a table-of-contents entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TocSource {
    /// Literal `<h1>`..`<h6>` markup.
    Html,
    /// Heading syntax of the markup language.
    Surrounded,
}

/// One heading of the table of contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub element: Element,
    /// 1 to 6.
    pub level: u8,
    pub source: TocSource,
    /// Plain title, when known at the time the heading is recorded.
    pub title: Option<String>,
}

/// Entry of the open-element stack.
#[derive(Debug)]
struct OpenElement {
    name: String,
    /// `false` when the start tag was dropped.
    emitted: bool,
}

/// How a closing tag relates to the open-element stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseMatch {
    /// Closes an element whose start tag was emitted.
    Emitted,
    /// Closes an element whose start tag was dropped.
    Dropped,
    /// No such element is open.
    Unmatched,
}

/// Mutable state of one conversion.
#[derive(Debug)]
pub struct ConversionContext<'s> {
    settings: &'s Settings,
    pub summary: Summary,
    pub toc: Vec<TocEntry>,
    protected: ProtectedStore,
    open_elements: Vec<OpenElement>,
}

impl<'s> ConversionContext<'s> {
    #[must_use]
    pub fn new(settings: &'s Settings) -> Self {
        Self {
            settings,
            summary: Summary::default(),
            toc: Vec::new(),
            protected: ProtectedStore::new(),
            open_elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &'s Settings {
        self.settings
    }

    #[must_use]
    pub fn dtd(&self) -> &'static Dtd {
        Dtd::html()
    }

    /// Park finished output and get the token that stands for it.
    pub fn protect(&mut self, content: impl Into<String>, ty: ContentType) -> String {
        self.protected.protect(content, ty)
    }

    /// Replace tokens by their spans and escape the remaining text.
    pub fn assemble(&mut self, text: &str) -> String {
        self.protected.assemble(text)
    }

    /// Record an opened, non-void element.
    pub fn open_element(&mut self, name: &str) {
        self.open_elements.push(OpenElement {
            name: name.to_owned(),
            emitted: true,
        });
    }

    /// Record a non-void element whose start tag was dropped, so that its
    /// closing tag is dropped as well.
    pub fn drop_element(&mut self, name: &str) {
        self.open_elements.push(OpenElement {
            name: name.to_owned(),
            emitted: false,
        });
    }

    /// Pop up to and including the innermost open `name`.
    ///
    /// The stack is unchanged when no such element is open.
    pub fn close_element(&mut self, name: &str) -> CloseMatch {
        let Some(pos) = self.open_elements.iter().rposition(|open| open.name == name) else {
            return CloseMatch::Unmatched;
        };
        let emitted = self.open_elements[pos].emitted;
        self.open_elements.truncate(pos);
        if emitted {
            CloseMatch::Emitted
        } else {
            CloseMatch::Dropped
        }
    }

    /// Innermost open element whose start tag was emitted.
    #[must_use]
    pub fn current_parent(&self) -> Option<&str> {
        self.open_elements
            .iter()
            .rev()
            .find(|open| open.emitted)
            .map(|open| open.name.as_str())
    }

    /// Forget open elements, e.g. at a paragraph boundary.
    pub fn reset_open_elements(&mut self) {
        self.open_elements.clear();
    }

    /// Accumulators collected so far.
    #[must_use]
    pub fn into_parts(self) -> (Summary, Vec<TocEntry>) {
        (self.summary, self.toc)
    }
}
