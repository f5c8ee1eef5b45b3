//! Shared value types for the AngelScript language-service front end.
//!
//! This crate carries the types that flow between the tokenizer, the
//! parser, and the analyzer: source spans, typed token indices, the
//! diagnostics sink, and highlight classifications.

pub mod diagnostics;
pub mod highlight;
pub mod ids;
pub mod span;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use highlight::{HighlightKind, Highlights};
pub use ids::{TokenId, TokenRange};
pub use span::Span;
