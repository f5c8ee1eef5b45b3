//! Tokenizer and parser for AngelScript.
//!
//! The tokenizer turns source text into a random-access token sequence
//! with highlight-relevant classifications and reserved-word property
//! flags. The parser consumes that sequence and produces an
//! arena-allocated AST, recovering from malformed input so that every
//! file yields a tree, highlight classifications, and diagnostics.
//!
//! # Example
//!
//! ```
//! use asls_core::Diagnostics;
//! use asls_parser::{tokenize, Parser};
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let mut diagnostics = Diagnostics::new("health.as");
//! let tokens = tokenize("int health = 100;", &mut diagnostics);
//! let (script, highlights) = Parser::parse(&tokens, &arena, &mut diagnostics);
//!
//! assert!(diagnostics.is_empty());
//! assert_eq!(script.items().len(), 1);
//! assert!(highlights.classified_count() > 0);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use lexer::{tokenize, NumberKind, ReservedFlags, Token, TokenKind};
pub use parser::{Parsed, Parser, ParserState};
