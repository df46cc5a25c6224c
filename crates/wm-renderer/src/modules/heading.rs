//! `# Title` headings, levels 1 to 6, with an optional trailing modifier.

use regex::Captures;

use crate::chain::{ChainError, Event, HeadingEvent, Outcome, Resolved, events};
use crate::context::{TocEntry, TocSource};
use crate::engine::{Engine, Module, Parser};
use crate::modifier::{FRAGMENT, Modifier};
use crate::protect::ContentType;

/// Heading module.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadingModule;

impl Module for HeadingModule {
    fn register(&self, engine: &mut Engine) {
        engine.add_handler(events::HEADING, |inv, event| {
            let Event::Heading(heading) = event else {
                return Ok(Outcome::Forward(event));
            };
            let policy = &inv.settings().policy;
            let tag = format!("h{}", heading.level);
            if !policy.tags.allows_tag(&tag) {
                tracing::debug!(tag = %tag, "Heading tag not allowed, content kept");
                return Ok(Outcome::Handled(Resolved::Nothing));
            }
            let element = heading.modifier.to_element(&tag, inv.settings());
            inv.context().toc.push(TocEntry {
                element: element.clone(),
                level: heading.level,
                source: TocSource::Surrounded,
                title: Some(heading.content),
            });
            Ok(Outcome::Handled(Resolved::Element(element)))
        });

        engine.register_block_pattern(
            "heading/surrounded",
            &format!(
                r"(?m)^(#{{1,6}})[ \t]+(\S.*?)(?:[ \t]+\.((?:{FRAGMENT}){{1,6}}))?[ \t]*#*[ \t]*$"
            ),
            pattern_heading,
        );
    }
}

fn pattern_heading(
    parser: &mut Parser<'_, '_>,
    caps: &Captures<'_>,
) -> Result<Option<String>, ChainError> {
    let level = u8::try_from(caps[1].len()).unwrap_or(6);
    let content = caps[2].trim().to_owned();
    let modifier = caps
        .get(3)
        .map(|m| Modifier::parse(m.as_str()))
        .unwrap_or_default();

    let resolved = parser.dispatch(Event::Heading(HeadingEvent {
        level,
        content: content.clone(),
        modifier,
    }))?;
    let Some(resolved) = resolved else {
        return Ok(None);
    };

    let inner = parser.render_line(&content)?;
    let token = match resolved {
        Resolved::Element(element) => parser.protect(element.to_html(&inner), ContentType::Block),
        Resolved::Markup(html) => parser.protect(html, ContentType::Block),
        Resolved::Nothing => parser.protect(inner, ContentType::Textual),
    };
    Ok(Some(token))
}
