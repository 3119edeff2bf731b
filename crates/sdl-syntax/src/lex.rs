//! Byte-stream lexer for the SDL grammar (spec.md §4.2).
//!
//! Fails fast: the first unscannable byte or unterminated string literal
//! produces a single [`Diagnostic`] and scanning stops immediately. There is
//! no recovery — downstream stages only ever see a complete token stream.

use sdl_common::SourceSpan;
use sdl_diagnostics::{Diagnostic, ErrorCode};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Scene,
    Entity,
    Components,
    Constraint,
    Motion,
    Timeline,
    Event,
    LibraryImports,
    Kind,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Keyword> {
        Some(match ident {
            "scene" => Keyword::Scene,
            "entity" => Keyword::Entity,
            "components" => Keyword::Components,
            "constraint" => Keyword::Constraint,
            "motion" => Keyword::Motion,
            "timeline" => Keyword::Timeline,
            "event" => Keyword::Event,
            "library_imports" => Keyword::LibraryImports,
            "kind" => Keyword::Kind,
            _ => return None,
        })
    }

    pub fn text(&self) -> &'static str {
        match self {
            Keyword::Scene => "scene",
            Keyword::Entity => "entity",
            Keyword::Components => "components",
            Keyword::Constraint => "constraint",
            Keyword::Motion => "motion",
            Keyword::Timeline => "timeline",
            Keyword::Event => "event",
            Keyword::LibraryImports => "library_imports",
            Keyword::Kind => "kind",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Identifier(String),
    Integer(i64),
    Number(f64),
    String(String),
    Colon,
    Comma,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", k),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Integer(i) => write!(f, "{}", i),
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: SourceSpan,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: SourceSpan) -> Self {
        Spanned { value, span }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Cursor {
            bytes: src.as_bytes(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.offset + ahead).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.offset += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(byte)
    }

    fn pos(&self) -> (usize, usize, usize) {
        (self.offset, self.line, self.column)
    }
}

/// Scans `src` into a token stream terminated by [`Token::Eof`], or returns
/// the single diagnostic that halted scanning.
pub fn lex(src: &str, file: &str) -> Result<Vec<Spanned<Token>>, Diagnostic> {
    let mut cursor = Cursor::new(src);
    let mut tokens = Vec::new();

    loop {
        skip_trivia(&mut cursor);

        let (offset, line, column) = cursor.pos();
        let Some(byte) = cursor.peek() else {
            tokens.push(Spanned::new(
                Token::Eof,
                SourceSpan::empty_at(offset, line, column),
            ));
            break;
        };

        let token = match byte {
            b'{' => {
                cursor.bump();
                single(Token::LBrace, offset, line, column, &cursor)
            }
            b'}' => {
                cursor.bump();
                single(Token::RBrace, offset, line, column, &cursor)
            }
            b'[' => {
                cursor.bump();
                single(Token::LBracket, offset, line, column, &cursor)
            }
            b']' => {
                cursor.bump();
                single(Token::RBracket, offset, line, column, &cursor)
            }
            b':' => {
                cursor.bump();
                single(Token::Colon, offset, line, column, &cursor)
            }
            b',' => {
                cursor.bump();
                single(Token::Comma, offset, line, column, &cursor)
            }
            b'"' => lex_string(&mut cursor, file)?,
            b'-' if cursor.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                lex_number(&mut cursor)
            }
            b'0'..=b'9' => lex_number(&mut cursor),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => lex_ident(&mut cursor),
            other => {
                log::debug!("'{}' lexing halted at {}:{}: unexpected byte", file, line, column);
                return Err(Diagnostic::new(
                    ErrorCode::E001,
                    format!("unexpected character '{}'", other as char),
                    SourceSpan::new(offset, 1, line, column),
                    file,
                ))
            }
        };

        tokens.push(token);
    }

    log::debug!("'{}' lexed {} tokens", file, tokens.len());
    Ok(tokens)
}

fn single(tok: Token, offset: usize, line: usize, column: usize, cursor: &Cursor) -> Spanned<Token> {
    Spanned::new(tok, SourceSpan::new(offset, cursor.offset - offset, line, column))
}

fn skip_trivia(cursor: &mut Cursor) {
    loop {
        match cursor.peek() {
            Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                cursor.bump();
            }
            Some(b'/') if cursor.peek_at(1) == Some(b'/') => {
                while let Some(b) = cursor.peek() {
                    if b == b'\n' {
                        break;
                    }
                    cursor.bump();
                }
            }
            _ => break,
        }
    }
}

fn lex_string(cursor: &mut Cursor, file: &str) -> Result<Spanned<Token>, Diagnostic> {
    let (offset, line, column) = cursor.pos();
    cursor.bump(); // opening quote
    let mut value = String::new();
    loop {
        match cursor.peek() {
            Some(b'"') => {
                cursor.bump();
                break;
            }
            Some(_) => {
                let start = cursor.offset;
                cursor.bump();
                value.push_str(std::str::from_utf8(&cursor.bytes[start..cursor.offset]).unwrap_or(""));
            }
            None => {
                log::debug!("'{}' lexing halted at {}:{}: unterminated string", file, line, column);
                return Err(Diagnostic::new(
                    ErrorCode::E002,
                    "unterminated string literal",
                    SourceSpan::new(offset, cursor.offset - offset, line, column),
                    file,
                ))
            }
        }
    }
    Ok(Spanned::new(
        Token::String(value),
        SourceSpan::new(offset, cursor.offset - offset, line, column),
    ))
}

fn lex_number(cursor: &mut Cursor) -> Spanned<Token> {
    let (offset, line, column) = cursor.pos();
    let mut is_float = false;

    if cursor.peek() == Some(b'-') {
        cursor.bump();
    }
    while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
        cursor.bump();
    }
    if cursor.peek() == Some(b'.') && cursor.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
        is_float = true;
        cursor.bump();
        while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
            cursor.bump();
        }
    }
    if matches!(cursor.peek(), Some(b'e') | Some(b'E')) {
        let mut ahead = 1;
        if matches!(cursor.peek_at(ahead), Some(b'+') | Some(b'-')) {
            ahead += 1;
        }
        if cursor.peek_at(ahead).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            for _ in 0..ahead {
                cursor.bump();
            }
            while cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                cursor.bump();
            }
        }
    }

    let lexeme = std::str::from_utf8(&cursor.bytes[offset..cursor.offset]).unwrap_or("");
    let span = SourceSpan::new(offset, cursor.offset - offset, line, column);
    if is_float {
        Spanned::new(Token::Number(lexeme.parse().unwrap_or(f64::NAN)), span)
    } else {
        match lexeme.parse::<i64>() {
            Ok(i) => Spanned::new(Token::Integer(i), span),
            Err(_) => Spanned::new(Token::Number(lexeme.parse().unwrap_or(f64::NAN)), span),
        }
    }
}

fn lex_ident(cursor: &mut Cursor) -> Spanned<Token> {
    let (offset, line, column) = cursor.pos();
    while cursor
        .peek()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
    {
        cursor.bump();
    }
    let lexeme = std::str::from_utf8(&cursor.bytes[offset..cursor.offset]).unwrap_or("");
    let span = SourceSpan::new(offset, cursor.offset - offset, line, column);
    match Keyword::from_ident(lexeme) {
        Some(keyword) => Spanned::new(Token::Keyword(keyword), span),
        None => Spanned::new(Token::Identifier(lexeme.to_string()), span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Token> {
        lex(src, "t.dsl")
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_punctuation() {
        let tokens = toks("scene { name: \"a\" }");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Scene),
                Token::LBrace,
                Token::Identifier("name".into()),
                Token::Colon,
                Token::String("a".into()),
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn kind_is_a_keyword_not_an_identifier() {
        let tokens = toks("kind");
        assert_eq!(tokens[0], Token::Keyword(Keyword::Kind));
    }

    #[test]
    fn negative_and_exponent_numbers() {
        let tokens = toks("-1.5e-3 42 3.14");
        assert_eq!(tokens[0], Token::Number(-1.5e-3));
        assert_eq!(tokens[1], Token::Integer(42));
        assert_eq!(tokens[2], Token::Number(3.14));
    }

    #[test]
    fn skips_line_comments() {
        let tokens = toks("1 // trailing comment\n2");
        assert_eq!(tokens[0], Token::Integer(1));
        assert_eq!(tokens[1], Token::Integer(2));
    }

    #[test]
    fn unterminated_string_is_e002() {
        let err = lex("\"abc", "t.dsl").unwrap_err();
        assert_eq!(err.code, ErrorCode::E002);
    }

    #[test]
    fn unexpected_byte_is_e001() {
        let err = lex("@", "t.dsl").unwrap_err();
        assert_eq!(err.code, ErrorCode::E001);
    }

    #[test]
    fn lines_and_columns_track_newlines() {
        let tokens = lex("a\nb", "t.dsl").unwrap();
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 1);
    }
}
