//! Literal HTML tags and comments.
//!
//! Raw `<tag ...>` spans are parsed into a candidate [`Element`] and
//! dispatched as `htmlTag`; the terminal handler enforces the allow-list
//! policy, the URL filter and the content model. `<!-- ... -->` spans go
//! through `htmlComment`.
//!
//! A span the tag grammar rejects (a self-closing close tag, a close tag with
//! attributes) stays in the text and is escaped. A tag the policy rejects
//! disappears.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::chain::{ChainError, CommentEvent, Event, Outcome, Resolved, TagEvent, events};
use crate::context::{CloseMatch, ConversionContext, TocEntry, TocSource};
use crate::element::{AttrValue, Attrs, Element};
use crate::engine::{Engine, Module, Parser};
use crate::policy::{AllowList, AllowPolicy, TagPolicy};
use crate::protect::{ContentType, MARK};
use crate::url::{UrlKind, prepend_root};
use crate::util::unescape_html;

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z0-9_:-]+)\s*(?:=\s*('[^']*'|"[^"]*"|[^'"\s]+))?"#).unwrap()
});

static HYPHENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new("-{2,}").unwrap());

/// Attributes whose values are trimmed and dropped when empty.
const TRIMMED_ATTRS: &[&str] = &["src", "href", "name", "id"];

/// Pattern for `<tag attr="...">`, `</tag>` and `<tag/>`.
#[must_use]
pub fn tag_pattern() -> String {
    format!(
        r#"(?is)<(/?)([a-z][a-z0-9_:-]{{0,50}})((?:\s+[a-z0-9_:-]+|=\s*"[^"{MARK}]*"|=\s*'[^'{MARK}]*'|=[^\s>{MARK}]+)*)\s*(/?)>"#
    )
}

/// Pattern for `<!-- comment -->`.
#[must_use]
pub fn comment_pattern() -> String {
    format!(r"(?s)<!--([^{MARK}]*?)-->")
}

/// HTML tag and comment module.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlModule;

impl Module for HtmlModule {
    fn register(&self, engine: &mut Engine) {
        engine.add_handler(events::HTML_COMMENT, |inv, event| {
            let Event::Comment(comment) = event else {
                return Ok(Outcome::Forward(event));
            };
            let resolved = if inv.settings().pass_comments {
                Resolved::Markup(format!("<!--{}-->", sanitize_comment(&comment.content)))
            } else {
                tracing::trace!("Comment dropped");
                Resolved::Nothing
            };
            Ok(Outcome::Handled(resolved))
        });

        engine.add_handler(events::HTML_TAG, |inv, event| {
            let Event::Tag(tag) = event else {
                return Ok(Outcome::Forward(event));
            };
            let resolved = sanitize_tag(inv.context(), tag.element, tag.is_start, tag.is_empty)
                .map_or(Resolved::Nothing, Resolved::Element);
            Ok(Outcome::Handled(resolved))
        });

        engine.register_line_pattern("html/tag", &tag_pattern(), pattern_tag);
        engine.register_line_pattern("html/comment", &comment_pattern(), pattern_comment);
    }
}

fn pattern_comment(
    parser: &mut Parser<'_, '_>,
    caps: &Captures<'_>,
) -> Result<Option<String>, ChainError> {
    let event = Event::Comment(CommentEvent {
        content: caps[1].to_owned(),
    });
    let resolved = parser.dispatch(event)?;
    Ok(resolved.map(|resolved| emit(parser, resolved, true)))
}

fn pattern_tag(
    parser: &mut Parser<'_, '_>,
    caps: &Captures<'_>,
) -> Result<Option<String>, ChainError> {
    let is_start = &caps[1] != "/";
    let mut is_empty = &caps[4] == "/";
    let mut raw_attrs = &caps[3];
    if !is_empty && let Some(stripped) = raw_attrs.strip_suffix('/') {
        raw_attrs = stripped;
        is_empty = true;
    }

    if is_empty && !is_start {
        return Ok(None);
    }
    let raw_attrs = raw_attrs.replace('\n', " ");
    let raw_attrs = raw_attrs.trim();
    if !raw_attrs.is_empty() && !is_start {
        return Ok(None);
    }

    let mut element = Element::new(&caps[2]);
    if is_start {
        element.attrs = parse_attributes(raw_attrs);
    }

    let resolved = parser.dispatch(Event::Tag(TagEvent {
        element,
        is_start,
        is_empty,
    }))?;
    Ok(resolved.map(|resolved| emit(parser, resolved, is_start)))
}

/// Protect a resolved tag or comment.
fn emit(parser: &mut Parser<'_, '_>, resolved: Resolved, is_start: bool) -> String {
    match resolved {
        Resolved::Element(element) => {
            let html = if is_start {
                element.start_tag()
            } else {
                element.end_tag()
            };
            parser.protect(html, element.content_type())
        }
        Resolved::Markup(html) => parser.protect(html, ContentType::Markup),
        Resolved::Nothing => String::new(),
    }
}

/// Tokenize raw attribute text.
///
/// Names are lower-cased, quoted and bare values are entity-decoded, a name
/// without a value becomes [`AttrValue::Flag`].
#[must_use]
pub fn parse_attributes(raw: &str) -> Attrs {
    let mut attrs = Attrs::new();
    for caps in ATTR_RE.captures_iter(raw) {
        let key = caps[1].to_ascii_lowercase();
        let value = match caps.get(2).map(|m| m.as_str()) {
            None => AttrValue::Flag,
            Some(quoted) if quoted.starts_with(['\'', '"']) => {
                AttrValue::Text(unescape_html(&quoted[1..quoted.len() - 1]))
            }
            Some(bare) => AttrValue::Text(unescape_html(bare)),
        };
        attrs.insert(key, value);
    }
    attrs
}

/// Collapse hyphen runs and trim hyphens at both ends.
#[must_use]
pub fn sanitize_comment(content: &str) -> String {
    HYPHENS_RE
        .replace_all(content, " - ")
        .trim_matches('-')
        .to_owned()
}

/// Apply policy, URL checks and the content model to a candidate tag.
///
/// Returns `None` when the tag must not be emitted. Accepted image and link
/// URLs are recorded in the summary, accepted headings in the table of
/// contents, and non-void start tags on the open-element stack. The closing
/// tag of a dropped start tag is dropped too.
pub fn sanitize_tag(
    ctx: &mut ConversionContext<'_>,
    mut element: Element,
    is_start: bool,
    is_empty: bool,
) -> Option<Element> {
    let settings = ctx.settings();
    let policy = &settings.policy;
    if policy.tags.is_none() {
        tracing::debug!(tag = element.name(), "Tags disabled, rejected");
        return None;
    }

    let name = element.name();
    let lower = name.to_ascii_lowercase();
    if ctx.dtd().contains(&lower) || name == name.to_ascii_uppercase() {
        element.set_name(lower);
    }
    let name = element.name().to_owned();

    let Some(allowed) = policy.tags.attributes(&name) else {
        tracing::debug!(tag = %name, "Tag not allowed, rejected");
        return None;
    };
    if is_empty && matches!(policy.tags, TagPolicy::All) {
        element.force_void();
    }

    if !is_start {
        return match ctx.close_element(&name) {
            CloseMatch::Emitted => Some(element),
            CloseMatch::Dropped => {
                tracing::debug!(tag = %name, "Start tag was dropped, closing tag rejected");
                None
            }
            CloseMatch::Unmatched => {
                tracing::trace!(tag = %name, "Closing tag without open element");
                Some(element)
            }
        };
    }

    let is_void = element.is_void();
    let accepted = accept_start(ctx, element, allowed);
    if !is_void {
        if accepted.is_some() {
            ctx.open_element(&name);
        } else {
            ctx.drop_element(&name);
        }
    }
    accepted
}

/// Content model, attribute filtering and URL checks of an allowed start tag.
fn accept_start(
    ctx: &mut ConversionContext<'_>,
    mut element: Element,
    allowed: &AllowList,
) -> Option<Element> {
    let settings = ctx.settings();
    let policy = &settings.policy;
    let name = element.name().to_owned();

    if let Some(parent) = ctx.current_parent()
        && !ctx.dtd().permits_child(parent, &name)
    {
        tracing::debug!(tag = %name, parent, "Not permitted here, rejected");
        return None;
    }

    filter_attributes(&mut element.attrs, allowed);
    filter_class_id_style(&mut element.attrs, policy);
    for attr in TRIMMED_ATTRS {
        let value = element.attrs.text(attr).map(str::trim).unwrap_or_default();
        if value.is_empty() {
            element.attrs.remove(attr);
        } else {
            let value = value.to_owned();
            element.attrs.insert(*attr, AttrValue::Text(value));
        }
    }

    match name.as_str() {
        "img" => {
            let src = element.attrs.text("src").unwrap_or_default().to_owned();
            if src.is_empty() || !settings.check_url(&src, UrlKind::Image) {
                tracing::debug!(src = %src, "Image URL rejected");
                return None;
            }
            let src = prepend_root(&src, settings.image_root.as_deref());
            element.attrs.insert("src", AttrValue::text(src.clone()));
            ctx.summary.images.push(src);
        }
        "a" => {
            if !["href", "name", "id"].iter().any(|a| element.attrs.contains(a)) {
                tracing::debug!("Anchor without href, name or id, rejected");
                return None;
            }
            if let Some(href) = element.attrs.text("href").map(str::to_owned) {
                if settings.force_nofollow && href.contains("//") {
                    add_nofollow(&mut element.attrs);
                }
                if !settings.check_url(&href, UrlKind::Anchor) {
                    tracing::debug!(href = %href, "Link URL rejected");
                    return None;
                }
                let href = prepend_root(&href, settings.link_root.as_deref());
                element.attrs.insert("href", AttrValue::text(href.clone()));
                ctx.summary.links.push(href);
            }
        }
        _ => {}
    }

    ctx.dtd().validate_attrs(&mut element);

    if let Some(level) = heading_level(&name) {
        ctx.toc.push(TocEntry {
            element: element.clone(),
            level,
            source: TocSource::Html,
            title: None,
        });
    }
    Some(element)
}

fn filter_attributes(attrs: &mut Attrs, allowed: &AllowList) {
    match allowed {
        AllowList::All => {}
        AllowList::None => attrs.clear(),
        AllowList::Subset(_) => attrs.retain(|key, _| allowed.allows(key)),
    }
}

fn filter_class_id_style(attrs: &mut Attrs, policy: &AllowPolicy) {
    if let Some(value) = attrs.get("class") {
        let classes: Vec<String> = value
            .render()
            .split_whitespace()
            .filter(|class| policy.allows_class(class))
            .map(str::to_owned)
            .collect();
        if classes.is_empty() {
            attrs.remove("class");
        } else {
            attrs.insert("class", AttrValue::List(classes));
        }
    }

    if let Some(id) = attrs.text("id")
        && !policy.allows_id(id.trim())
    {
        attrs.remove("id");
    }

    if let Some(value) = attrs.get("style")
        && !matches!(policy.styles, AllowList::All)
    {
        let declarations: Vec<(String, String)> = value
            .render()
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .map(|(prop, value)| (prop.trim().to_owned(), value.trim().to_owned()))
            .filter(|(prop, _)| policy.allows_style(prop))
            .collect();
        if declarations.is_empty() {
            attrs.remove("style");
        } else {
            attrs.insert("style", AttrValue::Style(declarations));
        }
    }
}

fn add_nofollow(attrs: &mut Attrs) {
    let mut rel: Vec<String> = attrs
        .get("rel")
        .map(|value| value.render().split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default();
    if !rel.iter().any(|r| r == "nofollow") {
        rel.push("nofollow".to_owned());
    }
    attrs.insert("rel", AttrValue::List(rel));
}

fn heading_level(name: &str) -> Option<u8> {
    let digit = name.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) if digit.len() == 1 => Some(level),
        _ => None,
    }
}
