//! Tokenizer for route expressions.
//!
//! # Responsibilities
//! - Produce tokens with line/column positions for error reporting
//! - Resolve string (`"…"`) and regexp (`/…/`) literal escapes
//! - Lex unquoted URL backends in arrow-target position
//!
//! # Design Decisions
//! - Pull-based: the parser requests tokens one at a time
//! - Two entry points: [`Lexer::next_token`] for the general grammar and
//!   [`Lexer::next_arrow_target`] after `->`, where a bare `example.org:80`
//!   must lex as one URL token instead of identifier soup
//! - Whitespace (including printer-inserted newlines) is insignificant
//! - `-` is either the start of `->` or a number sign, decided by one
//!   character of lookahead

use thiserror::Error;

use super::escape::unescape;

/// Position of a token or error in the source text (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Lexical error, aborts the parse of the whole batch.
#[derive(Debug, Error, PartialEq)]
pub enum LexError {
    #[error("unterminated string literal at {0}")]
    UnterminatedString(Pos),

    #[error("unterminated regexp literal at {0}")]
    UnterminatedRegexp(Pos),

    #[error("invalid number literal {literal:?} at {pos}")]
    InvalidNumber { literal: String, pos: Pos },

    #[error("unexpected character {found:?} at {pos}")]
    UnexpectedChar { found: char, pos: Pos },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Predicate, filter or route-id name.
    Ident(String),
    /// Double-quoted string literal, unescaped.
    Str(String),
    /// Slash-delimited regexp literal, unescaped.
    Regexp(String),
    /// Decimal number literal.
    Number(f64),
    /// Unquoted URL backend, only produced in arrow-target position.
    Url(String),
    /// `*`
    Wildcard,
    /// `&&`
    And,
    /// `->`
    Arrow,
    /// `<shunt>`
    Shunt,
    /// `<loopback>`
    Loopback,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Colon,
    Eof,
}

impl TokenKind {
    /// Short description used in "expected X, found Y" errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier {name:?}"),
            TokenKind::Str(s) => format!("string {s:?}"),
            TokenKind::Regexp(r) => format!("regexp /{r}/"),
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Url(u) => format!("backend {u:?}"),
            TokenKind::Wildcard => "'*'".to_string(),
            TokenKind::And => "'&&'".to_string(),
            TokenKind::Arrow => "'->'".to_string(),
            TokenKind::Shunt => "'<shunt>'".to_string(),
            TokenKind::Loopback => "'<loopback>'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

pub struct Lexer {
    chars: Vec<char>,
    idx: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            idx: 0,
            line: 1,
            column: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    /// Next token in the general grammar.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let pos = self.pos();

        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                pos,
            });
        };

        let kind = match c {
            '*' => {
                self.advance();
                TokenKind::Wildcard
            }
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            ':' => {
                self.advance();
                TokenKind::Colon
            }
            '&' => {
                self.advance();
                if self.peek() == Some('&') {
                    self.advance();
                    TokenKind::And
                } else {
                    return Err(LexError::UnexpectedChar { found: '&', pos });
                }
            }
            '-' => {
                self.advance();
                match self.peek() {
                    Some('>') => {
                        self.advance();
                        TokenKind::Arrow
                    }
                    Some(c) if c.is_ascii_digit() || c == '.' => {
                        TokenKind::Number(-self.lex_number(pos)?)
                    }
                    _ => return Err(LexError::UnexpectedChar { found: '-', pos }),
                }
            }
            '<' => self.lex_backend_token(pos)?,
            '"' => self.lex_string(pos)?,
            '/' => self.lex_regexp(pos)?,
            c if c.is_ascii_digit() || c == '.' => TokenKind::Number(self.lex_number(pos)?),
            c if c.is_alphabetic() || c == '_' => self.lex_ident(),
            other => return Err(LexError::UnexpectedChar { found: other, pos }),
        };

        Ok(Token { kind, pos })
    }

    /// Next token after `->`, where a filter name, a quoted or unquoted
    /// backend, `<shunt>` or `<loopback>` may follow.
    ///
    /// An unquoted run ending at `(` is a filter name; any other run is a
    /// URL backend.
    pub fn next_arrow_target(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let pos = self.pos();

        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some('<') => self.lex_backend_token(pos)?,
            Some('"') => self.lex_string(pos)?,
            Some(_) => {
                let mut run = String::new();
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == ';' || c == '(' {
                        break;
                    }
                    run.push(c);
                    self.advance();
                }
                self.skip_whitespace();
                if self.peek() == Some('(') {
                    TokenKind::Ident(run)
                } else {
                    TokenKind::Url(run)
                }
            }
        };

        Ok(Token { kind, pos })
    }

    fn lex_backend_token(&mut self, pos: Pos) -> Result<TokenKind, LexError> {
        // Only `<shunt>` and `<loopback>` start with '<'.
        let mut word = String::new();
        self.advance(); // consume '<'
        while let Some(c) = self.peek() {
            if c == '>' {
                self.advance();
                return match word.as_str() {
                    "shunt" => Ok(TokenKind::Shunt),
                    "loopback" => Ok(TokenKind::Loopback),
                    _ => Err(LexError::UnexpectedChar { found: '<', pos }),
                };
            }
            if !c.is_alphabetic() {
                break;
            }
            word.push(c);
            self.advance();
        }
        Err(LexError::UnexpectedChar { found: '<', pos })
    }

    fn lex_string(&mut self, pos: Pos) -> Result<TokenKind, LexError> {
        self.advance(); // opening quote
        let mut raw = String::new();
        loop {
            match self.advance() {
                None => return Err(LexError::UnterminatedString(pos)),
                Some('"') => return Ok(TokenKind::Str(unescape(&raw, &['"']))),
                Some('\\') => {
                    raw.push('\\');
                    match self.advance() {
                        None => return Err(LexError::UnterminatedString(pos)),
                        Some(c) => raw.push(c),
                    }
                }
                Some(c) => raw.push(c),
            }
        }
    }

    fn lex_regexp(&mut self, pos: Pos) -> Result<TokenKind, LexError> {
        self.advance(); // opening slash
        let mut raw = String::new();
        loop {
            match self.advance() {
                None => return Err(LexError::UnterminatedRegexp(pos)),
                Some('/') => return Ok(TokenKind::Regexp(unescape(&raw, &['/']))),
                Some('\\') => {
                    raw.push('\\');
                    match self.advance() {
                        None => return Err(LexError::UnterminatedRegexp(pos)),
                        Some(c) => raw.push(c),
                    }
                }
                Some(c) => raw.push(c),
            }
        }
    }

    fn lex_number(&mut self, pos: Pos) -> Result<f64, LexError> {
        let mut literal = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            literal.push(self.advance().unwrap());
        }
        if self.peek() == Some('.') {
            literal.push(self.advance().unwrap());
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                literal.push(self.advance().unwrap());
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            literal.push(self.advance().unwrap());
            if matches!(self.peek(), Some('+') | Some('-')) {
                literal.push(self.advance().unwrap());
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                literal.push(self.advance().unwrap());
            }
        }

        literal
            .parse::<f64>()
            .map_err(|_| LexError::InvalidNumber { literal, pos })
    }

    fn lex_ident(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Ident(name)
    }

    #[cfg(test)]
    fn lex_all(input: &str) -> Result<Vec<TokenKind>, LexError> {
        let mut lexer = Lexer::new(input);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            kinds.push(token.kind);
            if done {
                return Ok(kinds);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokens() {
        let kinds = Lexer::lex_all("* && -> ( ) , ; :").unwrap();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Wildcard,
                TokenKind::And,
                TokenKind::Arrow,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_with_escapes() {
        let kinds = Lexer::lex_all(r#""say \"hi\"""#).unwrap();
        assert_eq!(
            kinds[0],
            TokenKind::Str(r#"say "hi""#.to_string())
        );
    }

    #[test]
    fn test_regexp_literal() {
        // Only the delimiter escape resolves; regex escapes pass through.
        let kinds = Lexer::lex_all(r"/^example\.org$/").unwrap();
        assert_eq!(kinds[0], TokenKind::Regexp(r"^example\.org$".to_string()));

        let kinds = Lexer::lex_all(r"/a\/b/").unwrap();
        assert_eq!(kinds[0], TokenKind::Regexp("a/b".to_string()));
    }

    #[test]
    fn test_numbers() {
        let kinds = Lexer::lex_all("42 3.5 .25 1e3").unwrap();
        assert_eq!(
            &kinds[..4],
            &[
                TokenKind::Number(42.0),
                TokenKind::Number(3.5),
                TokenKind::Number(0.25),
                TokenKind::Number(1000.0),
            ]
        );
    }

    #[test]
    fn test_negative_numbers() {
        let kinds = Lexer::lex_all("-3 -0.5 -.25").unwrap();
        assert_eq!(
            &kinds[..3],
            &[
                TokenKind::Number(-3.0),
                TokenKind::Number(-0.5),
                TokenKind::Number(-0.25),
            ]
        );

        // '-' followed by neither '>' nor a number is still an error.
        assert!(matches!(
            Lexer::lex_all("a - b"),
            Err(LexError::UnexpectedChar { found: '-', .. })
        ));
    }

    #[test]
    fn test_shunt_and_loopback() {
        let kinds = Lexer::lex_all("<shunt> <loopback>").unwrap();
        assert_eq!(kinds[0], TokenKind::Shunt);
        assert_eq!(kinds[1], TokenKind::Loopback);

        assert!(matches!(
            Lexer::lex_all("<dynamic>"),
            Err(LexError::UnexpectedChar { found: '<', .. })
        ));
    }

    #[test]
    fn test_unterminated_string_position() {
        let err = Lexer::lex_all("Path(\"/foo").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString(Pos { line: 1, column: 6 }));
    }

    #[test]
    fn test_arrow_target_modes() {
        let mut lexer = Lexer::new("setPath(\"/x\")");
        assert_eq!(
            lexer.next_arrow_target().unwrap().kind,
            TokenKind::Ident("setPath".to_string())
        );

        let mut lexer = Lexer::new("http://example.org:9090/base;");
        assert_eq!(
            lexer.next_arrow_target().unwrap().kind,
            TokenKind::Url("http://example.org:9090/base".to_string())
        );

        let mut lexer = Lexer::new("\"https://example.org\"");
        assert_eq!(
            lexer.next_arrow_target().unwrap().kind,
            TokenKind::Str("https://example.org".to_string())
        );
    }

    #[test]
    fn test_line_column_tracking() {
        let mut lexer = Lexer::new("*\n  -> <shunt>");
        assert_eq!(lexer.next_token().unwrap().pos, Pos { line: 1, column: 1 });
        assert_eq!(lexer.next_token().unwrap().pos, Pos { line: 2, column: 3 });
        assert_eq!(lexer.next_token().unwrap().pos, Pos { line: 2, column: 6 });
    }

    #[test]
    fn test_stray_ampersand() {
        assert!(matches!(
            Lexer::lex_all("a & b"),
            Err(LexError::UnexpectedChar { found: '&', .. })
        ));
    }
}
