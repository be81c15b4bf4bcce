use std::fmt;

use crate::token::{Span, Token, TokenKind, Value};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Character that cannot start any token.
    UnknownCharacter(char),
    /// Number literal with more than one decimal point.
    InvalidNumberFormat,
    /// Single-quoted string still open at end of input.
    UnterminatedString,
    /// Integer literal that does not fit in an `i64`.
    NumberOutOfRange(String),
}

impl LexErrorKind {
    /// Headline shown to the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::UnknownCharacter(ch) => format!("Unknown Character '{ch}'"),
            Self::InvalidNumberFormat => "Invalid Number Format".to_string(),
            Self::UnterminatedString => "Unterminated String Literal".to_string(),
            Self::NumberOutOfRange(_) => "Number Out Of Range".to_string(),
        }
    }

    /// Suggested fix.
    #[must_use]
    pub fn hint(&self) -> String {
        match self {
            Self::UnknownCharacter(ch) => {
                format!("remove '{ch}' or replace it with a supported symbol.")
            }
            Self::InvalidNumberFormat => {
                "a decimal number cannot contain more than one decimal point.".to_string()
            }
            Self::UnterminatedString => "close the opening single quote.".to_string(),
            Self::NumberOutOfRange(_) => {
                format!("integer literals cannot exceed {}.", i64::MAX)
            }
        }
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCharacter(ch) => write!(f, "unknown character: {ch}"),
            Self::InvalidNumberFormat => {
                write!(f, "invalid number format, more than one decimal point")
            }
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::NumberOutOfRange(literal) => {
                write!(f, "number out of range: {literal}")
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.message()
    }

    #[must_use]
    pub fn hint(&self) -> String {
        self.kind.hint()
    }
}

/// Tokenize a SQL string into a sequence of tokens ending in EOF.
///
/// # Errors
///
/// Returns `LexError` on the first unknown character, malformed
/// number, or unterminated string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// Incremental scanner over a SQL string.
///
/// Each call to [`Lexer::next_token`] produces one token. After EOF
/// or an error, further calls are meaningless; the [`Iterator`]
/// impl stops yielding at that point.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    current: Option<char>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
            current: input.chars().next(),
            finished: false,
        }
    }

    /// Produce the next token.
    ///
    /// # Errors
    ///
    /// Returns `LexError` when the input at the cursor cannot form a
    /// token. The error is terminal for this input.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        while let Some(ch) = self.current {
            if ch.is_whitespace() {
                self.advance();
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                return Ok(self.read_word());
            }

            if ch.is_ascii_digit() {
                return self.read_number();
            }

            if ch == '\'' {
                return self.read_string();
            }

            let kind = match ch {
                '*' => TokenKind::Asterisk,
                ',' => TokenKind::Comma,
                '=' => TokenKind::Equals,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                ';' => TokenKind::Semicolon,
                _ => return Err(self.error(LexErrorKind::UnknownCharacter(ch))),
            };
            let span = self.span();
            self.advance();
            return Ok(Token {
                kind,
                value: None,
                span,
            });
        }

        Ok(Token {
            kind: TokenKind::Eof,
            value: None,
            span: self.span(),
        })
    }

    const fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }

    const fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            kind,
            span: self.span(),
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += ch.len_utf8();
            self.current = self.input[self.pos..].chars().next();
        }
    }

    fn read_word(&mut self) -> Token {
        let span = self.span();
        let start = self.pos;

        while let Some(ch) = self.current {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let word = &self.input[start..self.pos];
        Token {
            kind: TokenKind::classify_word(word),
            value: Some(Value::Text(word.to_string())),
            span,
        }
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let span = self.span();
        let start = self.pos;
        let mut seen_point = false;

        while let Some(ch) = self.current {
            if ch == '.' {
                if seen_point {
                    return Err(self.error(LexErrorKind::InvalidNumberFormat));
                }
                seen_point = true;
            } else if !ch.is_ascii_digit() {
                break;
            }
            self.advance();
        }

        let literal = &self.input[start..self.pos];
        let value = if seen_point {
            literal
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| LexError {
                    kind: LexErrorKind::InvalidNumberFormat,
                    span,
                })?
        } else {
            literal
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| LexError {
                    kind: LexErrorKind::NumberOutOfRange(literal.to_string()),
                    span,
                })?
        };

        Ok(Token {
            kind: TokenKind::Number,
            value: Some(value),
            span,
        })
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let span = self.span();
        self.advance(); // skip opening quote
        let start = self.pos;

        loop {
            match self.current {
                None => return Err(self.error(LexErrorKind::UnterminatedString)),
                Some('\'') => break,
                Some(_) => self.advance(),
            }
        }

        let text = self.input[start..self.pos].to_string();
        self.advance(); // skip closing quote

        Ok(Token {
            kind: TokenKind::String,
            value: Some(Value::Text(text)),
            span,
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.next_token();
        self.finished = !matches!(&item, Ok(token) if token.kind != TokenKind::Eof);
        Some(item)
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}
