//! Pattern registry: regular expressions contributed by modules, per modality.
//!
//! Selection is deterministic: the match with the smallest start offset wins,
//! ties go to the pattern registered first.

use regex::{Captures, Regex};

use crate::chain::ChainError;
use crate::engine::Parser;

/// Granularity a pattern is matched at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Modality {
    /// Within one paragraph, after the block pass.
    Line,
    /// Over the whole document, before paragraphs are formed.
    Block,
}

/// Callback run on a match.
///
/// `Ok(None)` means "not actually a match here": the text stays as is and the
/// engine moves on. `Ok(Some(text))` replaces the matched span.
pub type PatternCallback =
    Box<dyn Fn(&mut Parser<'_, '_>, &Captures<'_>) -> Result<Option<String>, ChainError>>;

/// One registered pattern.
pub struct PatternEntry {
    name: String,
    regex: Regex,
    order: usize,
    modality: Modality,
    pub(crate) callback: PatternCallback,
}

impl PatternEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Registration index within its modality.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    #[must_use]
    pub fn modality(&self) -> Modality {
        self.modality
    }
}

impl std::fmt::Debug for PatternEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternEntry")
            .field("name", &self.name)
            .field("regex", &self.regex.as_str())
            .field("order", &self.order)
            .field("modality", &self.modality)
            .finish_non_exhaustive()
    }
}

/// A match chosen by [`PatternRegistry::next_match`].
#[derive(Debug)]
pub struct PatternMatch<'p, 't> {
    pub entry: &'p PatternEntry,
    pub captures: Captures<'t>,
}

impl PatternMatch<'_, '_> {
    #[must_use]
    pub fn start(&self) -> usize {
        self.captures.get(0).map_or(0, |m| m.start())
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.captures.get(0).map_or(0, |m| m.end())
    }
}

/// Patterns in registration order, one list per modality.
#[derive(Debug, Default)]
pub struct PatternRegistry {
    line: Vec<PatternEntry>,
    block: Vec<PatternEntry>,
}

impl PatternRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        modality: Modality,
        name: impl Into<String>,
        regex: Regex,
        callback: PatternCallback,
    ) {
        let list = self.list_mut(modality);
        let name = name.into();
        tracing::trace!(pattern = %name, ?modality, "Registering pattern");
        list.push(PatternEntry {
            name,
            regex,
            order: list.len(),
            modality,
            callback,
        });
    }

    fn list_mut(&mut self, modality: Modality) -> &mut Vec<PatternEntry> {
        match modality {
            Modality::Line => &mut self.line,
            Modality::Block => &mut self.block,
        }
    }

    #[must_use]
    pub fn patterns(&self, modality: Modality) -> &[PatternEntry] {
        match modality {
            Modality::Line => &self.line,
            Modality::Block => &self.block,
        }
    }

    /// Earliest match of any pattern in `text`.
    pub fn next_match<'p, 't>(
        &'p self,
        text: &'t str,
        modality: Modality,
    ) -> Option<PatternMatch<'p, 't>> {
        let patterns = self.patterns(modality);
        let floors = vec![0; patterns.len()];
        earliest(patterns, text, &floors)
    }
}

/// Earliest match where pattern `i` is only tried from byte `floors[i]` on.
pub(crate) fn earliest<'p, 't>(
    patterns: &'p [PatternEntry],
    text: &'t str,
    floors: &[usize],
) -> Option<PatternMatch<'p, 't>> {
    let mut best: Option<PatternMatch<'p, 't>> = None;
    for (entry, &floor) in patterns.iter().zip(floors) {
        if floor > text.len() {
            continue;
        }
        let Some(captures) = entry.regex.captures_at(text, floor) else {
            continue;
        };
        let candidate = PatternMatch { entry, captures };
        if best
            .as_ref()
            .is_none_or(|current| candidate.start() < current.start())
        {
            best = Some(candidate);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn noop() -> PatternCallback {
        Box::new(|_parser, _caps| Ok(None))
    }

    fn registry(patterns: &[(&str, &str)]) -> PatternRegistry {
        let mut registry = PatternRegistry::new();
        for (name, re) in patterns {
            registry.register(Modality::Line, *name, Regex::new(re).unwrap(), noop());
        }
        registry
    }

    #[test]
    fn test_earliest_start_wins() {
        let registry = registry(&[("late", "b+"), ("early", "a+")]);
        let found = registry.next_match("xxaab bb", Modality::Line).unwrap();
        assert_eq!(found.entry.name(), "early");
        assert_eq!((found.start(), found.end()), (2, 4));
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let registry = registry(&[("first", "ab"), ("second", "abc")]);
        let found = registry.next_match("zabc", Modality::Line).unwrap();
        assert_eq!(found.entry.name(), "first");
        assert_eq!(found.entry.order(), 0);
    }

    #[test]
    fn test_modalities_are_separate() {
        let registry = registry(&[("line", "a")]);
        assert!(registry.next_match("a", Modality::Block).is_none());
        assert!(registry.next_match("a", Modality::Line).is_some());
    }

    #[test]
    fn test_floors_skip_rejected_positions() {
        let registry = registry(&[("a", "a")]);
        let patterns = registry.patterns(Modality::Line);
        let found = earliest(patterns, "a a", &[1]).unwrap();
        assert_eq!(found.start(), 2);
        assert!(earliest(patterns, "a a", &[4]).is_none());
    }
}
