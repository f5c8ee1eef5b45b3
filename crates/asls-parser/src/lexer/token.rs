//! Token types produced by the tokenizer.

use asls_core::Span;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Property bag attached to reserved tokens.
    ///
    /// The parser keys most of its decisions off these flags rather
    /// than off token text, so composite virtual operators synthesized
    /// later can carry the same properties as real tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReservedFlags: u16 {
        /// A primitive type name (`int`, `float`, `bool`, …).
        const PRIME_TYPE = 1 << 0;
        /// Usable as a prefix operator in an expression term.
        const EXPR_PRE_OP = 1 << 1;
        /// Usable as a binary operator between expression terms.
        const EXPR_OP = 1 << 2;
        /// An assignment operator (`=`, `+=`, `<<=`, …).
        const ASSIGN_OP = 1 << 3;
        /// Arithmetic (`+ - * / % **`).
        const MATH_OP = 1 << 4;
        /// Comparison (`== != < <= > >= is`).
        const COMP_OP = 1 << 5;
        /// Logical (`&& || ^^ and or xor`).
        const LOGIC_OP = 1 << 6;
        /// Bitwise (`& | ^ << >> >>> ~`).
        const BIT_OP = 1 << 7;
    }
}

/// How a number literal is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    /// Decimal or radix-prefixed integer.
    Int,
    /// `f`/`F`-suffixed real.
    Float,
    /// Unsuffixed real with a fraction or exponent.
    Double,
}

/// The classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Number(NumberKind),
    String,
    /// Keywords and punctuation, with property flags.
    Reserved,
    Comment,
    /// Bytes the tokenizer could not classify.
    Unknown,
    /// Synthetic end-of-stream sentinel, always the last token.
    End,
}

/// One token of a source file.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// The source text of this token, quotes included for strings.
    pub text: &'src str,
    pub span: Span,
    /// Property flags; empty unless `kind` is `Reserved`.
    pub flags: ReservedFlags,
    /// Whether the next raw token starts at this token's end byte,
    /// with no whitespace or anything else between.
    pub adjacent_next: bool,
}

impl<'src> Token<'src> {
    pub(crate) fn new(kind: TokenKind, text: &'src str, span: Span, flags: ReservedFlags) -> Self {
        Self {
            kind,
            text,
            span,
            flags,
            adjacent_next: false,
        }
    }

    /// Whether this is the reserved token with exactly this text.
    #[inline]
    pub fn is_reserved(&self, text: &str) -> bool {
        self.kind == TokenKind::Reserved && self.text == text
    }

    #[inline]
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self.kind, TokenKind::Number(_))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        self.kind == TokenKind::String
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }

    #[inline]
    pub fn has(&self, flags: ReservedFlags) -> bool {
        self.flags.contains(flags)
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {})", self.kind, self.text, self.span)
    }
}
