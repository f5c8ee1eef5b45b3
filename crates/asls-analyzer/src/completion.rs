//! Completion hints.
//!
//! The analyzer records, on the scope where they occur, the facts an
//! external completer needs: which namespace path a `::` chain was
//! resolving, which type a written type annotation landed on, and
//! which callee (with template bindings) an argument list is filling
//! in.

use crate::symbols::{ResolvedType, SymbolId, TemplateTranslate};
use asls_core::{Span, TokenId};
use std::rc::Rc;

/// A hint for the external completer.
#[derive(Debug, Clone)]
pub enum CompletionHint {
    /// A namespace chain hop: `Game::Audio::` — covers the identifier
    /// through its `::`.
    Namespace { path: Vec<TokenId>, span: Span },
    /// A written type resolved to `target`.
    Type { target: ResolvedType, span: Span },
    /// An argument list in progress for `callee`.
    Arguments {
        callee: SymbolId,
        passing_ranges: Vec<Span>,
        translate: Option<Rc<TemplateTranslate>>,
    },
}

impl CompletionHint {
    /// Convenience for tests and hosts: the hint's anchor span.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompletionHint::Namespace { span, .. } | CompletionHint::Type { span, .. } => {
                Some(*span)
            }
            CompletionHint::Arguments { passing_ranges, .. } => passing_ranges.first().copied(),
        }
    }
}
