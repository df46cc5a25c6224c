//! Inline phrases: `**strong**`, `*emphasis*` and `` `code` ``.
//!
//! Each may end with a modifier after a space and a dot:
//! `**text .(title)[class]**`.

use regex::Captures;

use crate::chain::{ChainError, Event, Outcome, PhraseEvent, PhraseKind, Resolved, events};
use crate::engine::{Engine, Module, Parser};
use crate::modifier::{FRAGMENT, Modifier};
use crate::protect::ContentType;
use crate::util::escape_html;

/// Phrase module.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhraseModule;

fn modifier_group() -> String {
    format!(r"(?:[ \t]\.((?:{FRAGMENT}){{1,6}}))?")
}

impl Module for PhraseModule {
    fn register(&self, engine: &mut Engine) {
        engine.add_handler(events::PHRASE, |inv, event| {
            let Event::Phrase(phrase) = event else {
                return Ok(Outcome::Forward(event));
            };
            let policy = &inv.settings().policy;
            let tag = phrase.kind.tag();
            if !policy.tags.allows_tag(tag) {
                tracing::debug!(tag, "Phrase tag not allowed, content kept");
                return Ok(Outcome::Handled(Resolved::Nothing));
            }
            Ok(Outcome::Handled(Resolved::Element(
                phrase.modifier.to_element(tag, inv.settings()),
            )))
        });

        let modifier = modifier_group();
        // strong first: it wins ties with emphasis at the same offset
        engine.register_line_pattern(
            "phrase/strong",
            &format!(r"\*\*([^\s*](?:[^*\n]*?[^\s*])??){modifier}\*\*"),
            |parser, caps| pattern_phrase(parser, caps, PhraseKind::Strong),
        );
        engine.register_line_pattern(
            "phrase/em",
            &format!(r"\*([^\s*](?:[^*\n]*?[^\s*])??){modifier}\*"),
            |parser, caps| pattern_phrase(parser, caps, PhraseKind::Emphasis),
        );
        engine.register_line_pattern(
            "phrase/code",
            &format!(r"`([^`\n]+?){modifier}`"),
            |parser, caps| pattern_phrase(parser, caps, PhraseKind::Code),
        );
    }
}

fn pattern_phrase(
    parser: &mut Parser<'_, '_>,
    caps: &Captures<'_>,
    kind: PhraseKind,
) -> Result<Option<String>, ChainError> {
    let content = caps[1].to_owned();
    let modifier = caps
        .get(2)
        .map(|m| Modifier::parse(m.as_str()))
        .unwrap_or_default();

    let resolved = parser.dispatch(Event::Phrase(PhraseEvent {
        kind,
        content: content.clone(),
        modifier,
    }))?;
    let Some(resolved) = resolved else {
        return Ok(None);
    };

    let inner = match kind {
        PhraseKind::Code => escape_html(&content),
        PhraseKind::Strong | PhraseKind::Emphasis => parser.render_line(&content)?,
    };
    let token = match resolved {
        Resolved::Element(element) => parser.protect(element.to_html(&inner), ContentType::Markup),
        Resolved::Markup(html) => parser.protect(html, ContentType::Markup),
        Resolved::Nothing => parser.protect(inner, ContentType::Textual),
    };
    Ok(Some(token))
}
