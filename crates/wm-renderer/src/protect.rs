//! Protected spans: finished HTML parked behind opaque tokens.
//!
//! Patterns replace what they match with a token so later passes cannot
//! re-read generated markup. A token is a content-type marker, the span index
//! written as hex nibbles, and the same marker again. All token characters
//! live in the private-use range U+E000..=U+E01F, which is stripped from input.

use html_escape::encode_text;

/// Regex character-class body matching every token character.
pub const MARK: &str = r"\x{E000}-\x{E01F}";

const MARKER_BASE: u32 = 0xE001;
const DIGIT_BASE: u32 = 0xE010;

/// How a protected span behaves inside the surrounding text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Inline markup such as `<b>` or `</a>`.
    Markup,
    /// Replaced element that stands for content (`<img>`, `<br>`).
    Replaced,
    /// Literal text already escaped.
    Textual,
    /// Block-level markup; a chunk starting with it is not wrapped in `<p>`.
    Block,
}

impl ContentType {
    const ALL: [Self; 4] = [Self::Markup, Self::Replaced, Self::Textual, Self::Block];

    fn marker(self) -> char {
        let offset = match self {
            Self::Markup => 0,
            Self::Replaced => 1,
            Self::Textual => 2,
            Self::Block => 3,
        };
        char::from_u32(MARKER_BASE + offset).unwrap_or('\u{E001}')
    }

    fn from_marker(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.marker() == c)
    }
}

fn is_mark(c: char) -> bool {
    ('\u{E000}'..='\u{E01F}').contains(&c)
}

fn digit_value(c: char) -> Option<usize> {
    let value = (c as u32).checked_sub(DIGIT_BASE)?;
    (value < 16).then_some(value as usize)
}

fn encode_index(mut index: usize) -> String {
    let mut digits = Vec::new();
    loop {
        let nibble = u32::try_from(index % 16).unwrap_or(0);
        digits.push(char::from_u32(DIGIT_BASE + nibble).unwrap_or('\u{E010}'));
        index /= 16;
        if index == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

/// Remove every token character from untrusted input.
#[must_use]
pub fn strip_markers(text: &str) -> String {
    text.chars().filter(|&c| !is_mark(c)).collect()
}

/// A token found in text: byte range, type and span index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Token {
    start: usize,
    end: usize,
    ty: ContentType,
    index: usize,
}

/// Parse a token starting at byte `start`, if there is one.
fn token_at(text: &str, start: usize) -> Option<Token> {
    let mut chars = text[start..].char_indices();
    let (_, open) = chars.next()?;
    let ty = ContentType::from_marker(open)?;
    let mut index = 0usize;
    let mut digits = 0;
    for (offset, c) in chars {
        if let Some(value) = digit_value(c) {
            index = index.checked_mul(16)?.checked_add(value)?;
            digits += 1;
        } else if c == open && digits > 0 {
            return Some(Token {
                start,
                end: start + offset + c.len_utf8(),
                ty,
                index,
            });
        } else {
            return None;
        }
    }
    None
}

fn tokens(text: &str) -> impl Iterator<Item = Token> + '_ {
    let mut pos = 0;
    std::iter::from_fn(move || {
        while let Some(offset) = text[pos..].find(is_mark) {
            let start = pos + offset;
            if let Some(token) = token_at(text, start) {
                pos = token.end;
                return Some(token);
            }
            pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
        None
    })
}

/// Content type of the token the text starts with, ignoring leading whitespace.
#[must_use]
pub fn leading_content_type(text: &str) -> Option<ContentType> {
    let trimmed = text.trim_start();
    token_at(trimmed, 0).map(|token| token.ty)
}

/// Whether the text is made of tokens and whitespace only.
#[must_use]
pub fn is_only_tokens(text: &str) -> bool {
    let mut last = 0;
    let mut seen = false;
    for token in tokens(text) {
        if !text[last..token.start].trim().is_empty() {
            return false;
        }
        last = token.end;
        seen = true;
    }
    seen && text[last..].trim().is_empty()
}

/// Store of protected spans for one conversion.
#[derive(Debug, Default)]
pub struct ProtectedStore {
    spans: Vec<Option<String>>,
}

impl ProtectedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `content` and return the token standing for it.
    pub fn protect(&mut self, content: impl Into<String>, ty: ContentType) -> String {
        let index = self.spans.len();
        self.spans.push(Some(content.into()));
        let marker = ty.marker();
        format!("{marker}{}{marker}", encode_index(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Final output: plain text is escaped, each token is replaced by its span.
    ///
    /// Spans are emitted verbatim apart from tokens nested in them, which are
    /// expanded too. Each span is emitted at most once, stray token characters
    /// are dropped.
    pub fn assemble(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        self.assemble_into(text, true, &mut out);
        out
    }

    fn assemble_into(&mut self, text: &str, escape: bool, out: &mut String) {
        let push_text = |out: &mut String, raw: &str| {
            let raw = strip_markers(raw);
            if escape {
                out.push_str(&encode_text(&raw));
            } else {
                out.push_str(&raw);
            }
        };
        let mut last = 0;
        for token in tokens(text) {
            push_text(out, &text[last..token.start]);
            last = token.end;
            match self.spans.get_mut(token.index).and_then(Option::take) {
                Some(span) => self.assemble_into(&span, false, out),
                None => tracing::warn!(index = token.index, "Protected span missing or reused"),
            }
        }
        push_text(out, &text[last..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_protect_and_assemble() {
        let mut store = ProtectedStore::new();
        let open = store.protect("<b>", ContentType::Markup);
        let close = store.protect("</b>", ContentType::Markup);
        let text = format!("a < {open}bold{close} & c");
        assert_eq!(store.assemble(&text), "a &lt; <b>bold</b> &amp; c");
    }

    #[test]
    fn test_token_is_private_use_only() {
        let mut store = ProtectedStore::new();
        for _ in 0..40 {
            store.protect("x", ContentType::Textual);
        }
        let token = store.protect("y", ContentType::Block);
        assert!(token.chars().all(is_mark));
        assert_eq!(leading_content_type(&token), Some(ContentType::Block));
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("a\u{E001}b\u{E01F}c\u{E020}"), "abc\u{E020}");
    }

    #[test]
    fn test_span_used_once() {
        let mut store = ProtectedStore::new();
        let token = store.protect("<br>", ContentType::Replaced);
        let text = format!("{token}{token}");
        assert_eq!(store.assemble(&text), "<br>");
    }

    #[test]
    fn test_nested_tokens_expanded() {
        let mut store = ProtectedStore::new();
        let inner = store.protect("<b>x</b>", ContentType::Markup);
        let outer = store.protect(format!("<p>{inner}</p>"), ContentType::Block);
        assert_eq!(store.assemble(&outer), "<p><b>x</b></p>");
    }

    #[test]
    fn test_is_only_tokens() {
        let mut store = ProtectedStore::new();
        let a = store.protect("<hr>", ContentType::Block);
        let b = store.protect("<br>", ContentType::Replaced);
        assert!(is_only_tokens(&format!(" {a}\n{b} ")));
        assert!(!is_only_tokens(&format!("{a} text")));
        assert!(!is_only_tokens("   "));
    }

    #[test]
    fn test_leading_content_type() {
        let mut store = ProtectedStore::new();
        let token = store.protect("<b>", ContentType::Markup);
        assert_eq!(
            leading_content_type(&format!("  {token} x")),
            Some(ContentType::Markup)
        );
        assert_eq!(leading_content_type("x"), None);
    }
}
