//! Reserved word and punctuation tables.
//!
//! The right-angle family (`>=`, `>>`, `>>=`, `>>>`, `>>>=`) and `!is`
//! are deliberately absent from the punctuation table: `>` is always
//! lexed as a single token so that template argument lists stay
//! unambiguous, and the parser synthesizes the composites from
//! adjacent tokens where the context allows an operator.

use super::token::ReservedFlags;

const fn f(bits: u16) -> ReservedFlags {
    ReservedFlags::from_bits_truncate(bits)
}

const PRIME: u16 = ReservedFlags::PRIME_TYPE.bits();
const PRE: u16 = ReservedFlags::EXPR_PRE_OP.bits();
const OP: u16 = ReservedFlags::EXPR_OP.bits();
const ASSIGN: u16 = ReservedFlags::ASSIGN_OP.bits();
const MATH: u16 = ReservedFlags::MATH_OP.bits();
const COMP: u16 = ReservedFlags::COMP_OP.bits();
const LOGIC: u16 = ReservedFlags::LOGIC_OP.bits();
const BIT: u16 = ReservedFlags::BIT_OP.bits();

/// Keywords, with their property flags.
static KEYWORDS: &[(&str, ReservedFlags)] = &[
    ("abstract", f(0)),
    ("and", f(OP | LOGIC)),
    ("auto", f(0)),
    ("bool", f(PRIME)),
    ("break", f(0)),
    ("case", f(0)),
    ("cast", f(0)),
    ("catch", f(0)),
    ("class", f(0)),
    ("const", f(0)),
    ("continue", f(0)),
    ("default", f(0)),
    ("do", f(0)),
    ("double", f(PRIME)),
    ("else", f(0)),
    ("enum", f(0)),
    ("explicit", f(0)),
    ("external", f(0)),
    ("false", f(0)),
    ("final", f(0)),
    ("float", f(PRIME)),
    ("for", f(0)),
    ("from", f(0)),
    ("funcdef", f(0)),
    ("function", f(0)),
    ("get", f(0)),
    ("if", f(0)),
    ("import", f(0)),
    ("in", f(0)),
    ("inout", f(0)),
    ("int", f(PRIME)),
    ("int16", f(PRIME)),
    ("int32", f(PRIME)),
    ("int64", f(PRIME)),
    ("int8", f(PRIME)),
    ("interface", f(0)),
    ("is", f(OP | COMP)),
    ("mixin", f(0)),
    ("namespace", f(0)),
    ("not", f(PRE)),
    ("null", f(0)),
    ("or", f(OP | LOGIC)),
    ("out", f(0)),
    ("override", f(0)),
    ("private", f(0)),
    ("property", f(0)),
    ("protected", f(0)),
    ("return", f(0)),
    ("set", f(0)),
    ("shared", f(0)),
    ("super", f(0)),
    ("switch", f(0)),
    ("this", f(0)),
    ("true", f(0)),
    ("try", f(0)),
    ("typedef", f(0)),
    ("uint", f(PRIME)),
    ("uint16", f(PRIME)),
    ("uint32", f(PRIME)),
    ("uint64", f(PRIME)),
    ("uint8", f(PRIME)),
    ("void", f(PRIME)),
    ("while", f(0)),
    ("xor", f(OP | LOGIC)),
];

/// Punctuation, longest first so the tokenizer can take the first match.
static PUNCTUATION: &[(&str, ReservedFlags)] = &[
    ("**=", f(ASSIGN)),
    ("<<=", f(ASSIGN)),
    ("**", f(OP | MATH)),
    ("==", f(OP | COMP)),
    ("!=", f(OP | COMP)),
    ("<=", f(OP | COMP)),
    ("<<", f(OP | BIT)),
    ("&&", f(OP | LOGIC)),
    ("||", f(OP | LOGIC)),
    ("^^", f(OP | LOGIC)),
    ("+=", f(ASSIGN)),
    ("-=", f(ASSIGN)),
    ("*=", f(ASSIGN)),
    ("/=", f(ASSIGN)),
    ("%=", f(ASSIGN)),
    ("&=", f(ASSIGN)),
    ("|=", f(ASSIGN)),
    ("^=", f(ASSIGN)),
    ("++", f(PRE)),
    ("--", f(PRE)),
    ("::", f(0)),
    ("+", f(OP | PRE | MATH)),
    ("-", f(OP | PRE | MATH)),
    ("*", f(OP | MATH)),
    ("/", f(OP | MATH)),
    ("%", f(OP | MATH)),
    ("<", f(OP | COMP)),
    (">", f(OP | COMP)),
    ("&", f(OP | BIT)),
    ("|", f(OP | BIT)),
    ("^", f(OP | BIT)),
    ("~", f(PRE | BIT)),
    ("!", f(PRE)),
    ("=", f(ASSIGN)),
    ("(", f(0)),
    (")", f(0)),
    ("{", f(0)),
    ("}", f(0)),
    ("[", f(0)),
    ("]", f(0)),
    (",", f(0)),
    (";", f(0)),
    (":", f(0)),
    (".", f(0)),
    ("?", f(0)),
    ("@", f(PRE)),
];

/// Property flags for a keyword, or `None` if `text` is not reserved.
pub fn keyword_flags(text: &str) -> Option<ReservedFlags> {
    KEYWORDS
        .binary_search_by(|(word, _)| word.cmp(&text))
        .ok()
        .map(|i| KEYWORDS[i].1)
}

/// Longest punctuation token starting at the head of `rest`, with its
/// flags.
pub fn punctuation_flags(rest: &str) -> Option<(&'static str, ReservedFlags)> {
    PUNCTUATION
        .iter()
        .find(|(text, _)| rest.starts_with(text))
        .map(|&(text, flags)| (text, flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_sorted_for_binary_search() {
        for pair in KEYWORDS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn punctuation_prefers_longest_match() {
        for (i, (text, _)) in PUNCTUATION.iter().enumerate() {
            for (later, _) in &PUNCTUATION[i + 1..] {
                assert!(
                    !later.starts_with(text),
                    "'{}' would shadow '{}'",
                    text,
                    later
                );
            }
        }
    }

    #[test]
    fn keyword_lookup() {
        assert_eq!(keyword_flags("int"), Some(ReservedFlags::PRIME_TYPE));
        assert_eq!(keyword_flags("class"), Some(ReservedFlags::empty()));
        assert_eq!(keyword_flags("player"), None);
        assert!(keyword_flags("and")
            .unwrap()
            .contains(ReservedFlags::LOGIC_OP));
    }

    #[test]
    fn right_angle_composites_stay_out_of_the_table() {
        assert_eq!(punctuation_flags(">=").unwrap().0, ">");
        assert_eq!(punctuation_flags(">>").unwrap().0, ">");
        assert_eq!(punctuation_flags(">>>=").unwrap().0, ">");
    }

    #[test]
    fn compound_assignment_matches_whole() {
        assert_eq!(punctuation_flags("<<= 2").unwrap().0, "<<=");
        assert_eq!(punctuation_flags("**= 2").unwrap().0, "**=");
    }

}
