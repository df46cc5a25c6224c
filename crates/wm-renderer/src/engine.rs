//! Engine (handlers and patterns) and the parser that drives them.
//!
//! The engine is built once from modules and only read afterwards. A
//! [`Parser`] pairs it with the mutable [`ConversionContext`] of one
//! conversion.
//!
//! # Scanning
//!
//! [`Parser::parse`] repeatedly picks the earliest match across all patterns
//! of a modality and runs its callback:
//!
//! - a replacement that differs from the matched text is spliced in, and
//!   every pattern that had moved past its start falls back to it, while
//!   patterns still behind it keep their place, so a construct enclosing
//!   the replacement can match afterwards;
//! - an empty match, a callback returning `None`, or an unchanged
//!   replacement is a reject: that pattern skips one character and the
//!   scan goes on.
//!
//! Every step either rewrites text or advances one pattern, so a pattern that
//! keeps matching without producing anything cannot stall the scan.

use std::collections::HashMap;

use regex::{Captures, Regex};

use crate::chain::{ChainError, Event, Handler, Invocation, Outcome, Resolved};
use crate::context::{ConversionContext, Settings};
use crate::pattern::{self, Modality, PatternRegistry};
use crate::protect::ContentType;

/// A syntax module: registers patterns and handlers on an engine.
pub trait Module {
    fn register(&self, engine: &mut Engine);
}

/// Registered handlers and patterns.
#[derive(Default)]
pub struct Engine {
    handlers: HashMap<&'static str, Vec<Handler>>,
    patterns: PatternRegistry,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut events: Vec<_> = self
            .handlers
            .iter()
            .map(|(name, list)| (*name, list.len()))
            .collect();
        events.sort_unstable();
        f.debug_struct("Engine")
            .field("handlers", &events)
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl Engine {
    /// Engine without modules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_module(mut self, module: &dyn Module) -> Self {
        self.add_module(module);
        self
    }

    pub fn add_module(&mut self, module: &dyn Module) {
        module.register(self);
    }

    /// Append a handler to the chain of `event`; it runs before all handlers
    /// registered earlier.
    pub fn add_handler<F>(&mut self, event: &'static str, handler: F)
    where
        F: Fn(&mut Invocation<'_, '_>, Event) -> Result<Outcome, ChainError> + 'static,
    {
        self.handlers.entry(event).or_default().push(Box::new(handler));
    }

    /// Number of handlers registered for `event`.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, Vec::len)
    }

    pub fn register_line_pattern<F>(&mut self, name: &str, regex: &str, callback: F)
    where
        F: Fn(&mut Parser<'_, '_>, &Captures<'_>) -> Result<Option<String>, ChainError> + 'static,
    {
        self.register_pattern(Modality::Line, name, regex, callback);
    }

    pub fn register_block_pattern<F>(&mut self, name: &str, regex: &str, callback: F)
    where
        F: Fn(&mut Parser<'_, '_>, &Captures<'_>) -> Result<Option<String>, ChainError> + 'static,
    {
        self.register_pattern(Modality::Block, name, regex, callback);
    }

    /// Register a pattern; an invalid expression is logged and skipped.
    pub fn register_pattern<F>(&mut self, modality: Modality, name: &str, regex: &str, callback: F)
    where
        F: Fn(&mut Parser<'_, '_>, &Captures<'_>) -> Result<Option<String>, ChainError> + 'static,
    {
        match Regex::new(regex) {
            Ok(regex) => self
                .patterns
                .register(modality, name, regex, Box::new(callback)),
            Err(e) => tracing::warn!(pattern = name, error = %e, "Invalid pattern, skipped"),
        }
    }

    #[must_use]
    pub fn patterns(&self) -> &PatternRegistry {
        &self.patterns
    }

    /// Run the chain of the event's name.
    ///
    /// `Ok(None)` when no handler is registered: the caller decides the
    /// fallback, usually keeping the source text.
    pub fn dispatch(
        &self,
        ctx: &mut ConversionContext<'_>,
        event: Event,
    ) -> Result<Option<Resolved>, ChainError> {
        let name = event.name();
        let Some(handlers) = self.handlers.get(name).filter(|list| !list.is_empty()) else {
            tracing::trace!(event = name, "No handlers");
            return Ok(None);
        };
        Invocation::new(self, ctx, handlers, name)
            .proceed(event)
            .map(Some)
    }

    /// Parser over this engine for one conversion.
    pub fn parser<'a, 's>(&'a self, ctx: &'a mut ConversionContext<'s>) -> Parser<'a, 's> {
        Parser::new(self, ctx)
    }
}

/// Engine plus the context of one conversion.
pub struct Parser<'a, 's> {
    engine: &'a Engine,
    ctx: &'a mut ConversionContext<'s>,
}

impl<'a, 's> Parser<'a, 's> {
    pub fn new(engine: &'a Engine, ctx: &'a mut ConversionContext<'s>) -> Self {
        Self { engine, ctx }
    }

    pub fn dispatch(&mut self, event: Event) -> Result<Option<Resolved>, ChainError> {
        self.engine.dispatch(self.ctx, event)
    }

    pub fn protect(&mut self, content: impl Into<String>, ty: ContentType) -> String {
        self.ctx.protect(content, ty)
    }

    pub fn context(&mut self) -> &mut ConversionContext<'s> {
        &mut *self.ctx
    }

    #[must_use]
    pub fn settings(&self) -> &'s Settings {
        self.ctx.settings()
    }

    /// Scan `text` with the patterns of `modality`; matches become tokens.
    pub fn parse(&mut self, text: &str, modality: Modality) -> Result<String, ChainError> {
        let engine = self.engine;
        let patterns = engine.patterns.patterns(modality);
        let mut text = text.to_owned();
        let mut floors = vec![0; patterns.len()];

        while let Some(found) = pattern::earliest(patterns, &text, &floors) {
            let (start, end) = (found.start(), found.end());
            let index = found.entry.order();
            let replacement = if start == end {
                None
            } else {
                (found.entry.callback)(self, &found.captures)?
            };
            drop(found);

            match replacement {
                Some(replacement) if replacement != text[start..end] => {
                    text.replace_range(start..end, &replacement);
                    for floor in &mut floors {
                        *floor = (*floor).min(start);
                    }
                }
                _ => {
                    floors[index] = start + text[start..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }
        Ok(text)
    }

    pub fn parse_line(&mut self, text: &str) -> Result<String, ChainError> {
        self.parse(text, Modality::Line)
    }

    /// Line-parse and assemble into finished HTML.
    pub fn render_line(&mut self, text: &str) -> Result<String, ChainError> {
        let parsed = self.parse_line(text)?;
        Ok(self.ctx.assemble(&parsed))
    }
}
