//! Typed indices into the token sequence.
//!
//! The parser and analyzer never hold owning pointers to tokens; they
//! refer to them by index into the tokenized stream. This keeps AST
//! nodes, highlight entries, and template translations `Copy` and lets
//! back-references (scope to node, hint to token) stay acyclic.

use std::fmt;

/// Index of a token in the tokenized stream of one file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u32);

impl TokenId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// The token span of an AST node: first and last token, inclusive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TokenRange {
    pub start: TokenId,
    pub end: TokenId,
}

impl TokenRange {
    #[inline]
    pub fn new(start: TokenId, end: TokenId) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// A range covering a single token.
    #[inline]
    pub fn single(token: TokenId) -> Self {
        Self {
            start: token,
            end: token,
        }
    }

    /// Extend this range to cover `other`.
    #[inline]
    pub fn cover(self, other: TokenRange) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `token` falls inside this range.
    #[inline]
    pub fn contains(&self, token: TokenId) -> bool {
        self.start <= token && token <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_cover_and_contains() {
        let a = TokenRange::new(TokenId(2), TokenId(5));
        let b = TokenRange::single(TokenId(9));
        let covered = a.cover(b);

        assert_eq!(covered.start, TokenId(2));
        assert_eq!(covered.end, TokenId(9));
        assert!(covered.contains(TokenId(5)));
        assert!(!a.contains(TokenId(9)));
    }
}
