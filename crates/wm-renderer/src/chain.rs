//! Handler invocation chain ("around advice").
//!
//! Handlers registered for an event run most-recently-registered first. Each
//! handler either resolves the event or forwards it, possibly rewritten, to
//! the next handler down. The deepest handler normally does the real work.
//!
//! ```text
//! register A, B, C  ->  dispatch runs C -> B -> A
//! ```
//!
//! A handler forwards in one of two ways:
//! - return [`Outcome::Forward`] with the (new) event;
//! - call [`Invocation::proceed`] and post-process what the rest of the chain
//!   resolved, then return [`Outcome::Handled`].
//!
//! Both share one cursor. Forwarding past the deepest handler is a bug in the
//! chain's setup and surfaces as [`ChainError::Exhausted`].

use crate::context::{ConversionContext, Settings};
use crate::element::Element;
use crate::engine::{Engine, Parser};
use crate::modifier::Modifier;

/// Event names used by the built-in modules.
pub mod events {
    pub const HTML_TAG: &str = "htmlTag";
    pub const HTML_COMMENT: &str = "htmlComment";
    pub const PHRASE: &str = "phrase";
    pub const HEADING: &str = "heading";
}

/// Raw `<tag ...>` occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagEvent {
    pub element: Element,
    /// `false` for a closing tag.
    pub is_start: bool,
    /// Written as `<tag/>`.
    pub is_empty: bool,
}

/// Raw `<!-- ... -->` occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentEvent {
    pub content: String,
}

/// Kind of inline phrase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhraseKind {
    Strong,
    Emphasis,
    Code,
}

impl PhraseKind {
    /// Element the phrase renders as.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Emphasis => "em",
            Self::Code => "code",
        }
    }
}

/// Inline phrase such as `**text**`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhraseEvent {
    pub kind: PhraseKind,
    pub content: String,
    pub modifier: Modifier,
}

/// `# Title` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadingEvent {
    /// 1 to 6.
    pub level: u8,
    pub content: String,
    pub modifier: Modifier,
}

/// Arguments of one dispatched event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Tag(TagEvent),
    Comment(CommentEvent),
    Phrase(PhraseEvent),
    Heading(HeadingEvent),
}

impl Event {
    /// Name the handlers of this event are registered under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tag(_) => events::HTML_TAG,
            Self::Comment(_) => events::HTML_COMMENT,
            Self::Phrase(_) => events::PHRASE,
            Self::Heading(_) => events::HEADING,
        }
    }
}

/// What an event resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    /// Sanitized element; the caller serializes it.
    Element(Element),
    /// Finished markup.
    Markup(String),
    /// Suppressed, emits nothing.
    Nothing,
}

/// Result of one handler step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Stop the chain with this result.
    Handled(Resolved),
    /// Pass to the next handler down.
    Forward(Event),
}

/// Chain fault.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("handler chain for `{event}` forwarded past its last handler")]
    Exhausted { event: &'static str },
}

/// Boxed handler.
pub type Handler = Box<dyn Fn(&mut Invocation<'_, '_>, Event) -> Result<Outcome, ChainError>>;

/// State of one dispatch, handed to every handler it reaches.
pub struct Invocation<'a, 's> {
    engine: &'a Engine,
    ctx: &'a mut ConversionContext<'s>,
    handlers: &'a [Handler],
    cursor: usize,
    event: &'static str,
}

impl<'a, 's> Invocation<'a, 's> {
    pub(crate) fn new(
        engine: &'a Engine,
        ctx: &'a mut ConversionContext<'s>,
        handlers: &'a [Handler],
        event: &'static str,
    ) -> Self {
        Self {
            engine,
            ctx,
            handlers,
            cursor: handlers.len(),
            event,
        }
    }

    /// Run the rest of the chain with `event` and return what it resolved to.
    pub fn proceed(&mut self, mut event: Event) -> Result<Resolved, ChainError> {
        let handlers = self.handlers;
        loop {
            if self.cursor == 0 {
                return Err(ChainError::Exhausted { event: self.event });
            }
            self.cursor -= 1;
            tracing::trace!(event = self.event, position = self.cursor, "Invoking handler");
            match (handlers[self.cursor])(self, event)? {
                Outcome::Handled(resolved) => return Ok(resolved),
                Outcome::Forward(next) => event = next,
            }
        }
    }

    /// Handlers below the current one.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cursor
    }

    /// Name of the event being dispatched.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        self.event
    }

    pub fn context(&mut self) -> &mut ConversionContext<'s> {
        &mut *self.ctx
    }

    #[must_use]
    pub fn settings(&self) -> &'s Settings {
        self.ctx.settings()
    }

    /// Parser over the same engine and context, for nested content.
    pub fn parser(&mut self) -> Parser<'_, 's> {
        Parser::new(self.engine, &mut *self.ctx)
    }
}
