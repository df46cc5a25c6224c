//! Minimal document converter: block pass, paragraphs, line pass, assembly.

use crate::chain::ChainError;
use crate::context::{ConversionContext, Settings, Summary, TocEntry};
use crate::engine::{Engine, Module};
use crate::modules::{HeadingModule, HtmlModule, PhraseModule};
use crate::pattern::Modality;
use crate::protect::{ContentType, is_only_tokens, leading_content_type, strip_markers};

/// Conversion failure.
///
/// Markup the sanitizer rejects is never an error; only a broken handler
/// chain aborts a conversion.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Result of a conversion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub summary: Summary,
    pub toc: Vec<TocEntry>,
}

/// Engine plus settings; converts whole documents.
#[derive(Debug)]
pub struct Converter {
    engine: Engine,
    settings: Settings,
}

impl Converter {
    /// Converter with the built-in modules.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self::bare(settings)
            .with_module(&HtmlModule)
            .with_module(&PhraseModule)
            .with_module(&HeadingModule)
    }

    /// Converter without modules: text is only escaped and wrapped in paragraphs.
    #[must_use]
    pub fn bare(settings: Settings) -> Self {
        Self {
            engine: Engine::new(),
            settings,
        }
    }

    #[must_use]
    pub fn with_module(mut self, module: &dyn Module) -> Self {
        self.engine.add_module(module);
        self
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Convert a document to HTML.
    pub fn process(&self, text: &str) -> Result<Rendered, ConversionError> {
        let mut ctx = ConversionContext::new(&self.settings);
        let text = normalize(text);

        let body = {
            let mut parser = self.engine.parser(&mut ctx);
            let blocks = parser.parse(&text, Modality::Block)?;
            let mut parts = Vec::new();
            for chunk in chunks(&blocks) {
                parser.context().reset_open_elements();
                if is_only_tokens(&chunk) {
                    parts.push(chunk);
                    continue;
                }
                let parsed = parser.parse_line(&chunk)?;
                let parsed = parsed.trim();
                if parsed.is_empty() {
                    continue;
                }
                if leading_content_type(parsed) == Some(ContentType::Block) {
                    parts.push(parsed.to_owned());
                } else {
                    let open = parser.protect("<p>", ContentType::Block);
                    let close = parser.protect("</p>", ContentType::Block);
                    parts.push(format!("{open}{parsed}{close}"));
                }
            }
            tracing::debug!(parts = parts.len(), "Document parsed");
            parts.join("\n")
        };

        let html = ctx.assemble(&body);
        let (summary, toc) = ctx.into_parts();
        Ok(Rendered { html, summary, toc })
    }
}

/// Unify newlines, drop token characters and trailing whitespace.
fn normalize(text: &str) -> String {
    let text = strip_markers(&text.replace("\r\n", "\n").replace('\r', "\n"));
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split on blank lines; a line holding a lone block token is a chunk by itself.
fn chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let flush = |current: &mut Vec<&str>, chunks: &mut Vec<String>| {
        if !current.is_empty() {
            chunks.push(current.join("\n"));
            current.clear();
        }
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut current, &mut chunks);
        } else if is_only_tokens(line) && leading_content_type(line) == Some(ContentType::Block) {
            flush(&mut current, &mut chunks);
            chunks.push(line.trim().to_owned());
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut chunks);
    chunks
}
