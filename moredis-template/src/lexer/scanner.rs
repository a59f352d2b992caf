//! Lexer implementation

use super::token::*;
use std::iter::Peekable;
use std::str::CharIndices;

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const TRIM_RIGHT_DELIM: &str = "-}}";
const COMMENT_OPEN: &str = "/*";
const COMMENT_CLOSE: &str = "*/";
const TRIM_SPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// Lexer for mapping templates.
///
/// Text outside `{{ }}` is emitted as a single [`TokenKind::Text`] token;
/// inside an action the usual operand tokens are produced. Comments produce
/// no tokens at all. Lexing stops at the first [`TokenKind::Error`].
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
    in_action: bool,
    trim_next_text: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
            in_action: false,
            trim_next_text: false,
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let done = matches!(token.kind, TokenKind::Eof | TokenKind::Error(_));
            tokens.push(token);
            if done {
                break;
            }
        }

        tokens
    }

    /// Get the next token from the source.
    fn next_token(&mut self) -> Token {
        loop {
            let start_pos = self.pos;
            let start_line = self.line;
            let start_col = self.column;

            let kind = if self.in_action {
                self.scan_action_token()
            } else if self.rest().is_empty() {
                Some(TokenKind::Eof)
            } else if self.rest().starts_with(LEFT_DELIM) {
                self.scan_left_delim()
            } else {
                self.scan_text()
            };

            if let Some(kind) = kind {
                return Token {
                    kind,
                    span: Span {
                        start: start_pos,
                        end: self.pos,
                        line: start_line,
                        column: start_col,
                    },
                };
            }
        }
    }

    /// Scan literal text up to the next action. Returns `None` when trimming
    /// leaves nothing to emit.
    fn scan_text(&mut self) -> Option<TokenKind> {
        let end = self
            .rest()
            .find(LEFT_DELIM)
            .map(|ix| self.pos + ix)
            .unwrap_or(self.source.len());
        let source = self.source;
        let mut text = &source[self.pos..end];
        self.advance_to(end);

        if std::mem::take(&mut self.trim_next_text) {
            text = text.trim_start_matches(TRIM_SPACE);
        }
        if self.at_trim_left_delim() {
            text = text.trim_end_matches(TRIM_SPACE);
        }

        if text.is_empty() {
            None
        } else {
            Some(TokenKind::Text(text.to_string()))
        }
    }

    /// Scan `{{` (or `{{- `). Comments are consumed whole and yield `None`.
    fn scan_left_delim(&mut self) -> Option<TokenKind> {
        let trim_left = self.at_trim_left_delim();
        self.advance_n(LEFT_DELIM.len());
        if trim_left {
            self.advance();
            self.skip_whitespace();
        }

        if self.rest().starts_with(COMMENT_OPEN) {
            return self.scan_comment();
        }

        self.in_action = true;
        Some(TokenKind::LeftDelim)
    }

    fn scan_comment(&mut self) -> Option<TokenKind> {
        let close = match self.rest().find(COMMENT_CLOSE) {
            Some(ix) => self.pos + ix + COMMENT_CLOSE.len(),
            None => return Some(TokenKind::Error("unclosed comment".to_string())),
        };
        self.advance_to(close);

        let had_space = self.skip_whitespace();
        if had_space && self.rest().starts_with(TRIM_RIGHT_DELIM) {
            self.advance_n(TRIM_RIGHT_DELIM.len());
            self.trim_next_text = true;
            None
        } else if self.rest().starts_with(RIGHT_DELIM) {
            self.advance_n(RIGHT_DELIM.len());
            None
        } else {
            Some(TokenKind::Error(
                "comment ends before closing delimiter".to_string(),
            ))
        }
    }

    /// Scan one token inside an action.
    fn scan_action_token(&mut self) -> Option<TokenKind> {
        let had_space = self.skip_whitespace();

        if had_space && self.rest().starts_with(TRIM_RIGHT_DELIM) {
            self.advance_n(TRIM_RIGHT_DELIM.len());
            self.in_action = false;
            self.trim_next_text = true;
            return Some(TokenKind::RightDelim);
        }
        if self.rest().starts_with(RIGHT_DELIM) {
            self.advance_n(RIGHT_DELIM.len());
            self.in_action = false;
            return Some(TokenKind::RightDelim);
        }

        let kind = match self.peek_char() {
            None => TokenKind::Error("unclosed action".to_string()),
            Some(c) => match c {
                '|' => {
                    self.advance();
                    TokenKind::Pipe
                }
                '(' => {
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RParen
                }
                '.' => self.scan_field(),
                '"' => self.scan_string(),
                '`' => self.scan_raw_string(),
                '-' | '+' if self.peek_next_char().is_some_and(|n| n.is_ascii_digit()) => {
                    self.scan_number()
                }
                c if c.is_ascii_digit() => self.scan_number(),
                c if is_ident_start(c) => self.scan_identifier(),
                '$' => {
                    self.advance();
                    TokenKind::Error("variables are not supported".to_string())
                }
                c => {
                    self.advance();
                    TokenKind::Error(format!("unexpected {:?} in action", c))
                }
            },
        };
        Some(kind)
    }

    /// Scan `.` or a field chain `.a.b`.
    fn scan_field(&mut self) -> TokenKind {
        let mut path = Vec::new();

        while self.peek_char() == Some('.') {
            match self.peek_next_char() {
                Some(c) if is_ident_start(c) => {
                    self.advance();
                    path.push(self.scan_ident_text().to_string());
                }
                _ => break,
            }
        }

        if path.is_empty() {
            self.advance();
            return TokenKind::Dot;
        }
        TokenKind::Field(path)
    }

    /// Scan an identifier or keyword.
    fn scan_identifier(&mut self) -> TokenKind {
        match self.scan_ident_text() {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "nil" => TokenKind::Nil,
            ident => TokenKind::Identifier(ident.to_string()),
        }
    }

    fn scan_ident_text(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    /// Scan a string literal with escape sequences.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return TokenKind::Error("unterminated quoted string".to_string())
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('0') => value.push('\0'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('\'') => value.push('\''),
                        Some('u') => match self.scan_unicode_escape() {
                            Some(c) => value.push(c),
                            None => {
                                return TokenKind::Error("invalid unicode escape".to_string())
                            }
                        },
                        Some(c) => {
                            return TokenKind::Error(format!("unknown escape sequence \\{}", c))
                        }
                        None => {
                            return TokenKind::Error("unterminated quoted string".to_string())
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        TokenKind::String(value)
    }

    fn scan_unicode_escape(&mut self) -> Option<char> {
        let digits = self.rest().get(..4)?;
        let code = u32::from_str_radix(digits, 16).ok()?;
        self.advance_n(4);
        char::from_u32(code)
    }

    /// Scan a backquoted raw string. No escapes; may span lines.
    fn scan_raw_string(&mut self) -> TokenKind {
        self.advance();
        let start = self.pos;
        match self.rest().find('`') {
            Some(ix) => {
                let end = start + ix;
                let value = self.source[start..end].to_string();
                self.advance_to(end + 1);
                TokenKind::String(value)
            }
            None => TokenKind::Error("unterminated raw quoted string".to_string()),
        }
    }

    /// Scan an integer or float literal, with optional sign and exponent.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut is_float = false;

        if matches!(self.peek_char(), Some('-') | Some('+')) {
            self.advance();
        }
        self.skip_digits();
        if self.peek_char() == Some('.') && self.peek_next_char().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek_char(), Some('-') | Some('+')) {
                self.advance();
            }
            self.skip_digits();
        }

        let text = &self.source[start..self.pos];
        if self.peek_char().is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.') {
            self.advance();
            return TokenKind::Error(format!("bad number syntax: {:?}", &self.source[start..self.pos]));
        }
        if is_float {
            match text.parse::<f64>() {
                Ok(n) => TokenKind::Float(n),
                Err(_) => TokenKind::Error(format!("bad number syntax: {:?}", text)),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(_) => TokenKind::Error(format!("number out of range: {}", text)),
            }
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Skip whitespace, returning whether any was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
            skipped = true;
        }
        skipped
    }

    /// `{{-` only trims when followed by whitespace, so `{{-3}}` stays a number.
    fn at_trim_left_delim(&self) -> bool {
        let rest = self.rest();
        rest.starts_with("{{-")
            && rest[3..]
                .chars()
                .next()
                .is_some_and(char::is_whitespace)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }

    fn advance_n(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Advance until `pos` reaches the given byte offset.
    fn advance_to(&mut self, end: usize) {
        while self.pos < end {
            if self.advance().is_none() {
                break;
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}
