//! Hand-written tokenizer.
//!
//! Produces the random-access token sequence the parser consumes:
//! every token carries its lexeme, span, reserved-word property flags,
//! and an adjacency bit. Comments stay in the stream (the parser skips
//! them but adjacency is computed against the raw stream, so a comment
//! between two tokens breaks operator fusion). The stream always ends
//! with a synthetic `End` token.

use super::reserved::{keyword_flags, punctuation_flags};
use super::token::{NumberKind, ReservedFlags, Token, TokenKind};
use asls_core::{Diagnostics, Span};

/// Tokenize a whole source file.
///
/// Never fails; unrecognized bytes become `Unknown` tokens and
/// unterminated strings or block comments are reported to
/// `diagnostics` and consumed to the end of input.
pub fn tokenize<'src>(source: &'src str, diagnostics: &mut Diagnostics) -> Vec<Token<'src>> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    while let Some(c) = cursor.peek() {
        if c.is_whitespace() {
            cursor.bump();
            continue;
        }

        let mark = cursor.mark();
        let token = if c == '/' && cursor.peek_at(1) == Some('/') {
            cursor.consume_while(|c| c != '\n');
            cursor.token(mark, TokenKind::Comment, ReservedFlags::empty())
        } else if c == '/' && cursor.peek_at(1) == Some('*') {
            scan_block_comment(&mut cursor, mark, diagnostics)
        } else if c == '_' || c.is_ascii_alphabetic() {
            scan_word(&mut cursor, mark)
        } else if c.is_ascii_digit() {
            scan_number(&mut cursor, mark)
        } else if c == '"' || c == '\'' {
            scan_string(&mut cursor, mark, diagnostics)
        } else if let Some((text, flags)) = punctuation_flags(cursor.rest()) {
            for _ in 0..text.chars().count() {
                cursor.bump();
            }
            cursor.token(mark, TokenKind::Reserved, flags)
        } else {
            cursor.bump();
            cursor.token(mark, TokenKind::Unknown, ReservedFlags::empty())
        };
        tokens.push(token);
    }

    // Adjacency against the raw stream: offset-contiguous neighbors.
    for i in 0..tokens.len().saturating_sub(1) {
        tokens[i].adjacent_next = tokens[i + 1].span.offset == tokens[i].span.end_offset();
    }

    let end_mark = cursor.mark();
    tokens.push(cursor.token(end_mark, TokenKind::End, ReservedFlags::empty()));
    tokens
}

fn scan_word<'src>(cursor: &mut Cursor<'src>, mark: Mark) -> Token<'src> {
    cursor.consume_while(|c| c == '_' || c.is_ascii_alphanumeric());
    let text = cursor.text_from(mark);
    match keyword_flags(text) {
        Some(flags) => cursor.token(mark, TokenKind::Reserved, flags),
        None => cursor.token(mark, TokenKind::Identifier, ReservedFlags::empty()),
    }
}

fn scan_number<'src>(cursor: &mut Cursor<'src>, mark: Mark) -> Token<'src> {
    if cursor.peek() == Some('0')
        && matches!(
            cursor.peek_at(1),
            Some('x' | 'X' | 'b' | 'B' | 'o' | 'O' | 'd' | 'D')
        )
    {
        cursor.bump();
        cursor.bump();
        cursor.consume_while(|c| c.is_ascii_hexdigit());
        return cursor.token(mark, TokenKind::Number(NumberKind::Int), ReservedFlags::empty());
    }

    cursor.consume_while(|c| c.is_ascii_digit());

    let mut is_real = false;
    if cursor.peek() == Some('.') && cursor.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
        cursor.bump();
        cursor.consume_while(|c| c.is_ascii_digit());
        is_real = true;
    }
    if matches!(cursor.peek(), Some('e' | 'E')) {
        let exponent_follows = match cursor.peek_at(1) {
            Some('+' | '-') => cursor.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        };
        if exponent_follows {
            cursor.bump();
            if matches!(cursor.peek(), Some('+' | '-')) {
                cursor.bump();
            }
            cursor.consume_while(|c| c.is_ascii_digit());
            is_real = true;
        }
    }

    let kind = if matches!(cursor.peek(), Some('f' | 'F')) {
        cursor.bump();
        NumberKind::Float
    } else if is_real {
        NumberKind::Double
    } else {
        NumberKind::Int
    };
    cursor.token(mark, TokenKind::Number(kind), ReservedFlags::empty())
}

fn scan_string<'src>(
    cursor: &mut Cursor<'src>,
    mark: Mark,
    diagnostics: &mut Diagnostics,
) -> Token<'src> {
    if cursor.rest().starts_with("\"\"\"") {
        cursor.bump();
        cursor.bump();
        cursor.bump();
        loop {
            if cursor.rest().starts_with("\"\"\"") {
                cursor.bump();
                cursor.bump();
                cursor.bump();
                break;
            }
            if cursor.bump().is_none() {
                diagnostics.error(cursor.span_from(mark), "Unterminated string.");
                break;
            }
        }
        return cursor.token(mark, TokenKind::String, ReservedFlags::empty());
    }

    let quote = cursor.bump().expect("caller saw a quote");
    loop {
        match cursor.peek() {
            None | Some('\n') => {
                diagnostics.error(cursor.span_from(mark), "Unterminated string.");
                break;
            }
            Some('\\') => {
                cursor.bump();
                cursor.bump();
            }
            Some(c) => {
                cursor.bump();
                if c == quote {
                    break;
                }
            }
        }
    }
    cursor.token(mark, TokenKind::String, ReservedFlags::empty())
}

fn scan_block_comment<'src>(
    cursor: &mut Cursor<'src>,
    mark: Mark,
    diagnostics: &mut Diagnostics,
) -> Token<'src> {
    cursor.bump();
    cursor.bump();
    loop {
        if cursor.rest().starts_with("*/") {
            cursor.bump();
            cursor.bump();
            break;
        }
        if cursor.bump().is_none() {
            diagnostics.error(cursor.span_from(mark), "Unterminated block comment.");
            break;
        }
    }
    cursor.token(mark, TokenKind::Comment, ReservedFlags::empty())
}

/// A saved position in the source.
#[derive(Clone, Copy)]
struct Mark {
    offset: usize,
    line: u32,
    col: u32,
}

/// Character cursor with line/column tracking.
struct Cursor<'src> {
    source: &'src str,
    offset: usize,
    line: u32,
    col: u32,
}

impl<'src> Cursor<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    fn rest(&self) -> &'src str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn consume_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
            col: self.col,
        }
    }

    fn text_from(&self, mark: Mark) -> &'src str {
        &self.source[mark.offset..self.offset]
    }

    fn span_from(&self, mark: Mark) -> Span {
        Span {
            line: mark.line,
            col: mark.col,
            end_line: self.line,
            end_col: self.col,
            offset: mark.offset as u32,
            len: (self.offset - mark.offset) as u32,
        }
    }

    fn token(&self, mark: Mark, kind: TokenKind, flags: ReservedFlags) -> Token<'src> {
        Token::new(kind, self.text_from(mark), self.span_from(mark), flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token<'_>>, Diagnostics) {
        let mut diagnostics = Diagnostics::new("test.as");
        let tokens = tokenize(source, &mut diagnostics);
        (tokens, diagnostics)
    }

    fn texts<'a>(tokens: &'a [Token<'a>]) -> Vec<&'a str> {
        tokens
            .iter()
            .filter(|t| !t.is_end())
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn words_and_numbers() {
        let (tokens, diagnostics) = lex("int x = 42;");
        assert!(diagnostics.is_empty());
        assert_eq!(texts(&tokens), ["int", "x", "=", "42", ";"]);

        assert_eq!(tokens[0].kind, TokenKind::Reserved);
        assert!(tokens[0].has(ReservedFlags::PRIME_TYPE));
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].kind, TokenKind::Number(NumberKind::Int));
        assert!(tokens.last().unwrap().is_end());
    }

    #[test]
    fn number_kinds() {
        let (tokens, _) = lex("1 2.5 3f 1e10 0xFF 0b1010");
        let kinds: Vec<_> = tokens
            .iter()
            .filter(|t| !t.is_end())
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Number(NumberKind::Int),
                TokenKind::Number(NumberKind::Double),
                TokenKind::Number(NumberKind::Float),
                TokenKind::Number(NumberKind::Double),
                TokenKind::Number(NumberKind::Int),
                TokenKind::Number(NumberKind::Int),
            ]
        );
    }

    #[test]
    fn right_angle_is_never_fused() {
        let (tokens, _) = lex("a >> b >= c >>>= d");
        assert_eq!(
            texts(&tokens),
            ["a", ">", ">", "b", ">", "=", "c", ">", ">", ">", "=", "d"]
        );

        // The two '>' of '>>' are adjacent, ready for synthesis.
        assert!(tokens[1].adjacent_next);
        // '>' and 'b' are separated by a space.
        assert!(!tokens[2].adjacent_next);
    }

    #[test]
    fn left_shift_is_one_token() {
        let (tokens, _) = lex("a << 2 <<= 3");
        assert_eq!(texts(&tokens), ["a", "<<", "2", "<<=", "3"]);
    }

    #[test]
    fn strings_and_heredocs() {
        let (tokens, diagnostics) = lex(r#""hi" 'a' """x
y""""#);
        assert!(diagnostics.is_empty());
        let strings: Vec<_> = tokens.iter().filter(|t| t.is_string()).collect();
        assert_eq!(strings.len(), 3);
        assert_eq!(strings[0].text, "\"hi\"");
        assert_eq!(strings[2].span.end_line, 2);
    }

    #[test]
    fn escaped_quote_does_not_close() {
        let (tokens, diagnostics) = lex(r#""a\"b""#);
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].text, r#""a\"b""#);
    }

    #[test]
    fn unterminated_string_reports() {
        let (_, diagnostics) = lex("\"oops\nint x;");
        assert!(diagnostics.any_contains("Unterminated string"));
    }

    #[test]
    fn comments_stay_in_stream_and_break_adjacency() {
        let (tokens, _) = lex(">/**/>");
        assert_eq!(texts(&tokens), [">", "/**/", ">"]);
        // Offset-contiguous with the comment, but the comment sits
        // between the two angle tokens.
        assert!(tokens[0].adjacent_next);
        assert_eq!(tokens[1].kind, TokenKind::Comment);
    }

    #[test]
    fn line_comment_and_block_comment() {
        let (tokens, diagnostics) = lex("int a; // trailing\n/* b */ int c;");
        assert!(diagnostics.is_empty());
        let comments: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .map(|t| t.text)
            .collect();
        assert_eq!(comments, ["// trailing", "/* b */"]);
    }

    #[test]
    fn unknown_bytes_become_unknown_tokens() {
        let (tokens, _) = lex("int $ x;");
        assert_eq!(tokens[1].kind, TokenKind::Unknown);
        assert_eq!(tokens[1].text, "$");
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let (tokens, _) = lex("int\n  x;");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.col, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.col, 3);
        assert_eq!(tokens[1].span.offset, 6);
    }
}
