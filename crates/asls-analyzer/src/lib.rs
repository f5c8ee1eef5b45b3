//! Semantic analysis for AngelScript.
//!
//! Consumes the parser's AST and produces a populated scope tree:
//! resolved symbols and references, completion hints, highlight
//! re-classifications, and diagnostics. Resolution never aborts; an
//! unresolvable name yields an unknown type that downstream checks
//! stay quiet about.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let analysis = asls_analyzer::analyze("main.as", "int x = 1 + 2 * 3;", &arena);
//!
//! assert!(analysis.diagnostics.is_empty());
//! let global = analysis.symbols.global();
//! let x = analysis.symbols.lookup(global, "x").unwrap();
//! let ty = analysis.symbols.symbol(x).as_variable().unwrap().ty.as_ref().unwrap();
//! assert_eq!(analysis.symbols.symbol(ty.symbol).name(), "int");
//! ```

pub mod analyzer;
pub mod builtin;
pub mod completion;
pub mod conversion;
pub mod hoist;
pub mod symbols;

pub use analyzer::Analyzer;
pub use completion::CompletionHint;
pub use hoist::{hoist, AnalyzeTask, HoistResult};
pub use symbols::{
    ResolvedType, ScopeId, Symbol, SymbolArena, SymbolId, SymbolReference, SymbolScope,
};

use asls_core::{Diagnostics, Highlights};
use asls_parser::ast::Script;
use asls_parser::{tokenize, Parser, Token};
use bumpalo::Bump;
use tracing::debug_span;

/// Everything one front-end pass produces for a file.
pub struct Analysis<'a> {
    pub tokens: &'a [Token<'a>],
    pub script: Script<'a>,
    pub symbols: SymbolArena<'a>,
    pub diagnostics: Diagnostics,
    pub highlights: Highlights,
}

/// Tokenize, parse, hoist, and analyze one file.
///
/// The returned scope tree borrows the arena; diagnostics arrive in
/// source order (parser) followed by walk order (analyzer).
pub fn analyze<'a>(path: &str, source: &'a str, arena: &'a Bump) -> Analysis<'a> {
    let _span = debug_span!("analyze", path).entered();

    let mut diagnostics = Diagnostics::new(path);
    let tokens = tokenize(source, &mut diagnostics);
    let tokens: &'a [Token<'a>] = arena.alloc_slice_copy(&tokens);

    let (script, mut highlights) = Parser::parse(tokens, arena, &mut diagnostics);
    let hoisted = hoist::hoist(&script, &mut diagnostics);
    let symbols = Analyzer::run(hoisted, tokens, &mut diagnostics, &mut highlights);

    Analysis {
        tokens,
        script,
        symbols,
        diagnostics,
        highlights,
    }
}
