//! Diagnostics sink for the parser and analyzer.
//!
//! Front-end errors never abort a pass: they are appended here and the
//! pass continues with best-effort recovery. The sink preserves
//! insertion order, which the passes guarantee to be source order
//! (parser) followed by AST-walk order (analyzer).

use crate::span::Span;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// A single front-end diagnostic.
#[derive(Debug, Clone, Error)]
#[error("{path}:{span}: error: {message}")]
pub struct Diagnostic {
    /// The message text.
    pub message: String,
    /// Where in the source the problem was detected.
    pub span: Span,
    /// The file the diagnostic belongs to.
    pub path: String,
}

/// An ordered, in-memory collection of diagnostics for one file.
#[derive(Debug, Default)]
pub struct Diagnostics {
    path: String,
    entries: VecDeque<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty sink for the given file path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entries: VecDeque::new(),
        }
    }

    /// The file path this sink reports against.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append an error at the given span.
    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.entries.push_back(Diagnostic {
            message: message.into(),
            span,
            path: self.path.clone(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Whether any diagnostic's message contains `needle`.
    ///
    /// Convenience for tests and host-side filtering.
    pub fn any_contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emission_order_is_preserved() {
        let mut sink = Diagnostics::new("main.as");
        sink.error(Span::on_line(1, 1, 0, 3), "first");
        sink.error(Span::on_line(2, 1, 10, 3), "second");

        let messages: Vec<_> = sink.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn display_format() {
        let mut sink = Diagnostics::new("main.as");
        sink.error(Span::on_line(10, 5, 120, 3), "Expected ';'");

        assert_eq!(sink.to_string(), "main.as:10:5: error: Expected ';'\n");
    }

    #[test]
    fn any_contains_matches_substring() {
        let mut sink = Diagnostics::new("main.as");
        sink.error(Span::default(), "'foo' is not defined");

        assert!(sink.any_contains("not defined"));
        assert!(!sink.any_contains("not a type"));
    }
}
