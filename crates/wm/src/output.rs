//! Styled reports on stderr; stdout carries only converted HTML.

use std::fmt::Display;

use console::{Style, Term};

/// Report writer for the `wm` commands.
pub(crate) struct Output {
    term: Term,
    section: Style,
    key: Style,
    ok: Style,
    warn: Style,
    fail: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn stderr() -> Self {
        Self {
            term: Term::stderr(),
            section: Style::new().cyan().bold(),
            key: Style::new().dim(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
        }
    }

    /// Title of a report block, e.g. `Links`.
    pub(crate) fn section(&self, title: &str) {
        self.line(&self.section.apply_to(title).to_string());
    }

    /// `name: value` line inside a block.
    pub(crate) fn field(&self, name: &str, value: impl Display) {
        self.line(&format!("  {}: {value}", self.key.apply_to(name)));
    }

    /// List entry inside a block, nested `depth` levels.
    pub(crate) fn item(&self, depth: usize, text: &str) {
        self.line(&format!("{}{text}", "  ".repeat(depth + 1)));
    }

    pub(crate) fn note(&self, msg: &str) {
        self.line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(&self.ok.apply_to(msg).to_string());
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(&self.warn.apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.fail.apply_to(msg).to_string());
    }

    // a closed stderr leaves nothing to report to
    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }
}
