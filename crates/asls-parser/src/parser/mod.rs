//! Resilient recursive-descent parser.
//!
//! Every parse produces a [`Script`], diagnostics, and highlight
//! classifications, no matter how malformed the input: block loops
//! recover by diagnosing and consuming one token, so the cursor
//! strictly advances.

mod decl_parser;
mod expr_parser;
mod parsed;
mod state;
mod stmt_parser;
mod type_parser;

pub use parsed::Parsed;
pub use state::{CacheKind, ListStep, Marker, MemoValue, ParserState};

use crate::ast::Script;
use crate::lexer::Token;
use asls_core::{Diagnostics, Highlights};
use bumpalo::Bump;

/// Parser entry points.
pub struct Parser;

impl Parser {
    /// Parse a tokenized file into a script.
    ///
    /// The token sequence must come from [`crate::tokenize`] (it ends
    /// with the `End` sentinel). Diagnostics are appended to the sink
    /// in source order; the returned highlights cover every committed
    /// token.
    pub fn parse<'a>(
        tokens: &'a [Token<'a>],
        arena: &'a Bump,
        diagnostics: &mut Diagnostics,
    ) -> (Script<'a>, Highlights) {
        let mut highlights = Highlights::new(tokens.len());
        let mut state = ParserState::new(tokens, arena, diagnostics, &mut highlights);
        let script = state.parse_script_root();
        (script, highlights)
    }
}
