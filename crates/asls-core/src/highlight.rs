//! Highlight classifications keyed by token.
//!
//! The parser classifies each token as it commits it; the analyzer
//! later re-classifies identifiers once it knows what they resolve to
//! (a variable, a parameter, an enum member, …). The store is indexed
//! by token, so the last write wins and reads come back in source
//! order.

use crate::ids::TokenId;

/// How a token should be presented by the highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    Operator,
    Builtin,
    Keyword,
    Namespace,
    Type,
    Class,
    Interface,
    Enum,
    EnumMember,
    Function,
    Variable,
    Parameter,
    Number,
    String,
    Decorator,
    Comment,
    /// Tokens the tokenizer could not classify.
    Invalid,
}

/// Token-indexed highlight classifications for one file.
#[derive(Debug, Default)]
pub struct Highlights {
    entries: Vec<Option<HighlightKind>>,
}

impl Highlights {
    /// Create a store for a stream of `token_count` tokens.
    pub fn new(token_count: usize) -> Self {
        Self {
            entries: vec![None; token_count],
        }
    }

    /// Classify a token, overwriting any earlier classification.
    pub fn set(&mut self, token: TokenId, kind: HighlightKind) {
        if let Some(slot) = self.entries.get_mut(token.index()) {
            *slot = Some(kind);
        }
    }

    /// The current classification of a token, if any.
    pub fn get(&self, token: TokenId) -> Option<HighlightKind> {
        self.entries.get(token.index()).copied().flatten()
    }

    /// All classified tokens in source order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, HighlightKind)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, kind)| kind.map(|k| (TokenId(i as u32), k)))
    }

    /// How many tokens carry a classification.
    pub fn classified_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_and_override() {
        let mut highlights = Highlights::new(4);
        highlights.set(TokenId(1), HighlightKind::Variable);
        assert_eq!(highlights.get(TokenId(1)), Some(HighlightKind::Variable));

        // Analyzer re-classification wins.
        highlights.set(TokenId(1), HighlightKind::Parameter);
        assert_eq!(highlights.get(TokenId(1)), Some(HighlightKind::Parameter));
    }

    #[test]
    fn iter_is_source_ordered() {
        let mut highlights = Highlights::new(5);
        highlights.set(TokenId(3), HighlightKind::Number);
        highlights.set(TokenId(0), HighlightKind::Keyword);

        let order: Vec<_> = highlights.iter().map(|(t, _)| t).collect();
        assert_eq!(order, [TokenId(0), TokenId(3)]);
        assert_eq!(highlights.classified_count(), 2);
    }

    #[test]
    fn out_of_range_set_is_ignored() {
        let mut highlights = Highlights::new(1);
        highlights.set(TokenId(7), HighlightKind::Keyword);
        assert_eq!(highlights.get(TokenId(7)), None);
    }
}
