//! Lexer token types

/// Token kinds for mapping templates.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Literal text outside of actions.
    Text(String),

    // Delimiters
    LeftDelim,
    RightDelim,
    LParen,
    RParen,
    Pipe,

    // Operands
    /// `.` on its own: the whole context.
    Dot,
    /// `.a.b.c`, stored as its path segments.
    Field(Vec<String>),
    Identifier(String),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,

    // Special
    Eof,
    Error(String),
}

impl TokenKind {
    /// Short human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Text(_) => "text".to_string(),
            TokenKind::LeftDelim => "\"{{\"".to_string(),
            TokenKind::RightDelim => "\"}}\"".to_string(),
            TokenKind::LParen => "\"(\"".to_string(),
            TokenKind::RParen => "\")\"".to_string(),
            TokenKind::Pipe => "\"|\"".to_string(),
            TokenKind::Dot => "\".\"".to_string(),
            TokenKind::Field(path) => format!("field .{}", path.join(".")),
            TokenKind::Identifier(name) => format!("identifier {:?}", name),
            TokenKind::String(s) => format!("string {:?}", s),
            TokenKind::Int(n) => format!("number {}", n),
            TokenKind::Float(n) => format!("number {}", n),
            TokenKind::Bool(b) => format!("{}", b),
            TokenKind::Nil => "nil".to_string(),
            TokenKind::Eof => "end of template".to_string(),
            TokenKind::Error(msg) => msg.clone(),
        }
    }
}

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
