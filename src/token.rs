use std::fmt;

use serde::{Serialize, Serializer};

/// Source location for error reporting.
///
/// Both fields are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Statements and clauses
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Create,
    Table,
    Drop,
    Alter,
    Add,
    Join,
    On,
    Group,
    By,
    Order,
    Having,
    Limit,
    As,
    Distinct,
    And,
    Or,
    Not,
    In,
    Is,
    Null,

    // Type names
    Int,
    Integer,
    Varchar,
    Text,
    Boolean,
    Date,

    /// Table or column name.
    Identifier,
    /// Integer or decimal literal.
    Number,
    /// Single-quoted string (`'...'`).
    String,

    /// `*`
    Asterisk,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `=`
    Equals,

    // Reserved for comparison and arithmetic; never produced yet.
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Plus,
    Minus,
    Slash,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Look up a fully delimited word in the keyword table.
    ///
    /// Matching is case-insensitive and exact: `SELECTED` is not
    /// a keyword. Returns `None` for identifiers.
    #[must_use]
    pub fn keyword(word: &str) -> Option<Self> {
        let kind = match word.to_ascii_uppercase().as_str() {
            "SELECT" => Self::Select,
            "FROM" => Self::From,
            "WHERE" => Self::Where,
            "INSERT" => Self::Insert,
            "INTO" => Self::Into,
            "VALUES" => Self::Values,
            "UPDATE" => Self::Update,
            "SET" => Self::Set,
            "DELETE" => Self::Delete,
            "CREATE" => Self::Create,
            "TABLE" => Self::Table,
            "DROP" => Self::Drop,
            "ALTER" => Self::Alter,
            "ADD" => Self::Add,
            "JOIN" => Self::Join,
            "ON" => Self::On,
            "GROUP" => Self::Group,
            "BY" => Self::By,
            "ORDER" => Self::Order,
            "HAVING" => Self::Having,
            "LIMIT" => Self::Limit,
            "AS" => Self::As,
            "DISTINCT" => Self::Distinct,
            "AND" => Self::And,
            "OR" => Self::Or,
            "NOT" => Self::Not,
            "IN" => Self::In,
            "IS" => Self::Is,
            "NULL" => Self::Null,
            "INT" => Self::Int,
            "INTEGER" => Self::Integer,
            "VARCHAR" => Self::Varchar,
            "TEXT" => Self::Text,
            "BOOLEAN" => Self::Boolean,
            "DATE" => Self::Date,
            _ => return None,
        };
        Some(kind)
    }

    /// Classify a fully delimited word as a keyword or identifier.
    #[must_use]
    pub fn classify_word(word: &str) -> Self {
        Self::keyword(word).unwrap_or(Self::Identifier)
    }

    /// Whether this kind comes from the keyword table.
    #[must_use]
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Select
                | Self::From
                | Self::Where
                | Self::Insert
                | Self::Into
                | Self::Values
                | Self::Update
                | Self::Set
                | Self::Delete
                | Self::Create
                | Self::Table
                | Self::Drop
                | Self::Alter
                | Self::Add
                | Self::Join
                | Self::On
                | Self::Group
                | Self::By
                | Self::Order
                | Self::Having
                | Self::Limit
                | Self::As
                | Self::Distinct
                | Self::And
                | Self::Or
                | Self::Not
                | Self::In
                | Self::Is
                | Self::Null
                | Self::Int
                | Self::Integer
                | Self::Varchar
                | Self::Text
                | Self::Boolean
                | Self::Date
        )
    }

    /// Upper-case name used in messages and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Insert => "INSERT",
            Self::Into => "INTO",
            Self::Values => "VALUES",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::Create => "CREATE",
            Self::Table => "TABLE",
            Self::Drop => "DROP",
            Self::Alter => "ALTER",
            Self::Add => "ADD",
            Self::Join => "JOIN",
            Self::On => "ON",
            Self::Group => "GROUP",
            Self::By => "BY",
            Self::Order => "ORDER",
            Self::Having => "HAVING",
            Self::Limit => "LIMIT",
            Self::As => "AS",
            Self::Distinct => "DISTINCT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Is => "IS",
            Self::Null => "NULL",
            Self::Int => "INT",
            Self::Integer => "INTEGER",
            Self::Varchar => "VARCHAR",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Identifier => "IDENTIFIER",
            Self::Number => "NUMBER",
            Self::String => "STRING",
            Self::Asterisk => "ASTERISK",
            Self::Comma => "COMMA",
            Self::Semicolon => "SEMICOLON",
            Self::LParen => "LPAREN",
            Self::RParen => "RPAREN",
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::Less => "LESS",
            Self::LessEquals => "LESS_EQUALS",
            Self::Greater => "GREATER",
            Self::GreaterEquals => "GREATER_EQUALS",
            Self::Plus => "PLUS",
            Self::Minus => "MINUS",
            Self::Slash => "SLASH",
            Self::Eof => "EOF",
        }
    }

    /// Source spelling of a punctuation kind.
    #[must_use]
    pub const fn symbol(self) -> Option<&'static str> {
        match self {
            Self::Asterisk => Some("*"),
            Self::Comma => Some(","),
            Self::Semicolon => Some(";"),
            Self::LParen => Some("("),
            Self::RParen => Some(")"),
            Self::Equals => Some("="),
            Self::NotEquals => Some("!="),
            Self::Less => Some("<"),
            Self::LessEquals => Some("<="),
            Self::Greater => Some(">"),
            Self::GreaterEquals => Some(">="),
            Self::Plus => Some("+"),
            Self::Minus => Some("-"),
            Self::Slash => Some("/"),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TokenKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Literal payload of a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Word or string contents.
    Text(String),
    /// Number without a decimal point.
    Integer(i64),
    /// Number with a decimal point.
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// A single token with its kind, payload, and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<Value>,
    pub span: Span,
}

impl Token {
    /// Text shown for this token in messages: its payload, its
    /// punctuation symbol, or its kind name.
    #[must_use]
    pub fn display_text(&self) -> String {
        match (&self.value, self.kind.symbol()) {
            (Some(value), _) => value.to_string(),
            (None, Some(symbol)) => symbol.to_string(),
            (None, None) if self.kind == TokenKind::Eof => "end of input".to_string(),
            (None, None) => self.kind.name().to_string(),
        }
    }
}
