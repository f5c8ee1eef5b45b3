//! Parser cursor, memoization, and diagnostic plumbing.

use super::parsed::Parsed;
use crate::ast::{EntityAttrs, Ident, ScopeNode, TypeNode};
use crate::lexer::{Token, TokenKind};
use asls_core::{Diagnostics, HighlightKind, Highlights, Span, TokenId, TokenRange};
use bumpalo::Bump;
use rustc_hash::FxHashMap;

/// A saved cursor position for backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker(usize);

/// Nonterminals with a memoized sub-parse.
///
/// These productions are speculatively attempted at many sites (every
/// type, every function call, every variable access); without the
/// cache the grammar is super-linear on pathological inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Scope,
    TypeTemplates,
    EntityAttrs,
}

/// A memoized sub-parse result.
#[derive(Clone, Copy)]
pub enum MemoValue<'a> {
    Scope(Parsed<&'a ScopeNode<'a>>),
    TypeTemplates(Parsed<&'a [&'a TypeNode<'a>]>),
    EntityAttrs(Parsed<EntityAttrs>),
}

struct MemoEntry<'a> {
    value: MemoValue<'a>,
    end_cursor: usize,
}

/// Cursor over the token sequence, with commit/backtrack semantics.
///
/// The raw token stream (comments included) stays addressable by
/// [`TokenId`] for highlights and node ranges; the parse cursor runs
/// over the comment-free projection of it.
pub struct ParserState<'a, 'out> {
    tokens: &'a [Token<'a>],
    /// Raw indices of parseable (non-comment) tokens.
    stream: Vec<u32>,
    cursor: usize,
    pub(crate) arena: &'a Bump,
    diagnostics: &'out mut Diagnostics,
    highlights: &'out mut Highlights,
    memo: FxHashMap<(CacheKind, usize), MemoEntry<'a>>,
}

impl<'a, 'out> ParserState<'a, 'out> {
    /// Build a parser over a tokenized stream.
    ///
    /// The stream must end with the tokenizer's `End` sentinel.
    pub fn new(
        tokens: &'a [Token<'a>],
        arena: &'a Bump,
        diagnostics: &'out mut Diagnostics,
        highlights: &'out mut Highlights,
    ) -> Self {
        debug_assert!(tokens.last().is_some_and(|t| t.is_end()));
        let mut stream = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Comment => highlights.set(TokenId(i as u32), HighlightKind::Comment),
                TokenKind::End => {}
                TokenKind::Unknown => {
                    highlights.set(TokenId(i as u32), HighlightKind::Invalid);
                    stream.push(i as u32);
                }
                _ => stream.push(i as u32),
            }
        }
        Self {
            tokens,
            stream,
            cursor: 0,
            arena,
            diagnostics,
            highlights,
            memo: FxHashMap::default(),
        }
    }

    fn end_token(&self) -> &'a Token<'a> {
        &self.tokens[self.tokens.len() - 1]
    }

    /// Peek the token at `cursor + offset` without consuming.
    ///
    /// Offsets past the end return the `End` sentinel.
    pub fn next_at(&self, offset: usize) -> &'a Token<'a> {
        match self.stream.get(self.cursor + offset) {
            Some(&raw) => &self.tokens[raw as usize],
            None => self.end_token(),
        }
    }

    /// The current token.
    #[inline]
    pub fn next(&self) -> &'a Token<'a> {
        self.next_at(0)
    }

    /// The id of the token at `cursor + offset`.
    pub fn id_at(&self, offset: usize) -> TokenId {
        match self.stream.get(self.cursor + offset) {
            Some(&raw) => TokenId(raw),
            None => TokenId(self.tokens.len() as u32 - 1),
        }
    }

    #[inline]
    pub fn next_id(&self) -> TokenId {
        self.id_at(0)
    }

    /// The last committed token.
    pub fn prev(&self) -> &'a Token<'a> {
        match self.cursor.checked_sub(1).and_then(|i| self.stream.get(i)) {
            Some(&raw) => &self.tokens[raw as usize],
            None => &self.tokens[0],
        }
    }

    pub fn prev_id(&self) -> TokenId {
        match self.cursor.checked_sub(1).and_then(|i| self.stream.get(i)) {
            Some(&raw) => TokenId(raw),
            None => TokenId(0),
        }
    }

    /// Whether the cursor is past the last token.
    pub fn is_end(&self) -> bool {
        self.cursor >= self.stream.len()
    }

    /// Classify the current token for highlighting and advance.
    pub fn commit(&mut self, kind: HighlightKind) {
        if !self.is_end() {
            self.highlights.set(self.next_id(), kind);
            self.cursor += 1;
        }
    }

    /// Advance without classification (error recovery).
    pub fn step(&mut self) {
        if !self.is_end() {
            self.cursor += 1;
        }
    }

    /// Save the cursor for a speculative attempt.
    pub fn marker(&self) -> Marker {
        Marker(self.cursor)
    }

    /// Rewind to a previously observed position.
    pub fn backtrack(&mut self, marker: Marker) {
        debug_assert!(marker.0 <= self.cursor);
        self.cursor = marker.0;
    }

    /// Commit the current token if its text matches, else report
    /// `Expected 'text'` and leave the cursor unchanged.
    pub fn expect(&mut self, text: &str, kind: HighlightKind) -> bool {
        if self.next().text == text && !self.is_end() {
            self.commit(kind);
            true
        } else {
            self.error(format!("Expected '{}'", text));
            false
        }
    }

    /// Report an error at the current token.
    pub fn error(&mut self, message: impl Into<String>) {
        self.diagnostics.error(self.next().span, message);
    }

    /// Report an error at an explicit span.
    pub fn error_at(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.error(span, message);
    }

    /// Whether the token at `offset` is immediately followed by the
    /// next parseable token, with nothing (not even a comment)
    /// between them. Drives virtual-token synthesis.
    pub fn fused_with_next(&self, offset: usize) -> bool {
        match (
            self.stream.get(self.cursor + offset),
            self.stream.get(self.cursor + offset + 1),
        ) {
            (Some(&a), Some(&b)) => b == a + 1 && self.tokens[a as usize].adjacent_next,
            _ => false,
        }
    }

    /// An [`Ident`] for the current token.
    pub fn make_ident(&self) -> Ident<'a> {
        let token = self.next();
        Ident {
            name: token.text,
            token: self.next_id(),
            span: token.span,
        }
    }

    /// The node range from `start` through the last committed token.
    pub fn range_from(&self, start: TokenId) -> TokenRange {
        TokenRange {
            start,
            end: self.prev_id().max(start),
        }
    }

    /// Restore a memoized sub-parse at the current cursor, advancing
    /// the cursor to where that parse ended.
    pub fn cache_restore(&mut self, kind: CacheKind) -> Option<MemoValue<'a>> {
        let entry = self.memo.get(&(kind, self.cursor))?;
        let value = entry.value;
        self.cursor = entry.end_cursor;
        Some(value)
    }

    /// Record a sub-parse that started at `start` and ended at the
    /// current cursor.
    pub fn cache_store(&mut self, kind: CacheKind, start: Marker, value: MemoValue<'a>) {
        self.memo.insert(
            (kind, start.0),
            MemoEntry {
                value,
                end_cursor: self.cursor,
            },
        );
    }

    /// Allocate a node in the AST arena.
    pub fn alloc<T>(&self, value: T) -> &'a T {
        self.arena.alloc(value)
    }
}

/// How a delimited list continued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStep {
    /// The closing token was consumed.
    Closed,
    /// A separator was consumed; parse the next element.
    Continued,
    /// Neither matched; a diagnostic was emitted and the list must
    /// terminate without consuming.
    Aborted,
}

impl<'a, 'out> ParserState<'a, 'out> {
    /// Uniform list closing: accept `close`, else a separator when
    /// allowed, else diagnose and abort. Using this for every
    /// separated list guarantees malformed lists terminate.
    pub fn expect_continuous_or_close(
        &mut self,
        separator: &str,
        close: &str,
        allow_separator: bool,
    ) -> ListStep {
        if self.next().is_reserved(close) {
            self.commit(HighlightKind::Operator);
            ListStep::Closed
        } else if allow_separator && self.next().is_reserved(separator) {
            self.commit(HighlightKind::Operator);
            ListStep::Continued
        } else if allow_separator {
            self.error(format!("Expected '{}' or '{}'", separator, close));
            ListStep::Aborted
        } else {
            self.error(format!("Expected '{}'", close));
            ListStep::Aborted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn with_state<R>(source: &str, f: impl FnOnce(&mut ParserState<'_, '_>) -> R) -> R {
        let arena = Bump::new();
        let mut diagnostics = Diagnostics::new("test.as");
        let tokens = tokenize(source, &mut diagnostics);
        let mut highlights = Highlights::new(tokens.len());
        let mut state = ParserState::new(&tokens, &arena, &mut diagnostics, &mut highlights);
        f(&mut state)
    }

    #[test]
    fn peek_past_end_returns_sentinel() {
        with_state("int", |state| {
            assert!(state.next_at(5).is_end());
            assert_eq!(state.next().text, "int");
        });
    }

    #[test]
    fn commit_and_backtrack() {
        with_state("a b c", |state| {
            let mark = state.marker();
            state.commit(HighlightKind::Variable);
            state.commit(HighlightKind::Variable);
            assert_eq!(state.next().text, "c");
            assert_eq!(state.prev().text, "b");

            state.backtrack(mark);
            assert_eq!(state.next().text, "a");
        });
    }

    #[test]
    fn comments_are_skipped_by_the_cursor() {
        with_state("a /* note */ b", |state| {
            state.step();
            assert_eq!(state.next().text, "b");
        });
    }

    #[test]
    fn fusion_requires_raw_neighbors() {
        with_state(">> > /**/>", |state| {
            // ">>" arrives as two adjacent '>' tokens.
            assert!(state.fused_with_next(0));
            // "> >" has whitespace between.
            assert!(!state.fused_with_next(1));
            // The comment breaks the last pair.
            assert!(!state.fused_with_next(2));
        });
    }

    #[test]
    fn memo_round_trip_restores_cursor() {
        with_state("shared external class A {}", |state| {
            let mark = state.marker();
            state.commit(HighlightKind::Keyword);
            state.commit(HighlightKind::Keyword);

            let attrs = EntityAttrs {
                is_shared: true,
                is_external: true,
                ..EntityAttrs::default()
            };
            state.cache_store(CacheKind::EntityAttrs, mark, MemoValue::EntityAttrs(Parsed::Ok(attrs)));

            state.backtrack(mark);
            let restored = state.cache_restore(CacheKind::EntityAttrs);
            match restored {
                Some(MemoValue::EntityAttrs(Parsed::Ok(value))) => assert_eq!(value, attrs),
                _ => panic!("expected memoized entity attributes"),
            }
            // Cursor advanced to where the cached parse ended.
            assert_eq!(state.next().text, "class");

            // A different position misses.
            state.step();
            assert!(state.cache_restore(CacheKind::EntityAttrs).is_none());
        });
    }

    #[test]
    fn expect_reports_and_stays_put() {
        with_state("a", |state| {
            assert!(!state.expect(";", HighlightKind::Operator));
            assert_eq!(state.next().text, "a");
            assert!(state.expect("a", HighlightKind::Variable));
        });
    }
}
