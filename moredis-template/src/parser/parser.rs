//! Parser implementation

use super::ast::*;
use crate::functions::Function;
use crate::lexer::*;
use bson::Bson;
use moredis_core::TemplateError;

/// Parser for mapping templates.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse the token stream into a list of nodes.
    pub fn parse(&mut self) -> Result<Vec<Node>, TemplateError> {
        if let Some(token) = self
            .tokens
            .iter()
            .find(|t| matches!(t.kind, TokenKind::Error(_)))
        {
            return Err(TemplateError::Syntax {
                message: token.kind.describe(),
                line: token.span.line,
                column: token.span.column,
            });
        }

        let mut nodes = Vec::new();

        loop {
            match &self.current().kind {
                TokenKind::Eof => break,
                TokenKind::Text(text) => {
                    nodes.push(Node::Text(text.clone()));
                    self.advance();
                }
                TokenKind::LeftDelim => {
                    self.advance();
                    let pipeline = self.parse_pipeline("command")?;
                    self.expect(TokenKind::RightDelim)?;
                    nodes.push(Node::Action(pipeline));
                }
                TokenKind::Error(msg) => return Err(self.error(msg)),
                other => return Err(self.error(&format!("unexpected {}", other.describe()))),
            }
        }

        Ok(nodes)
    }

    /// Parse `command ( | command )*`.
    fn parse_pipeline(&mut self, context: &str) -> Result<Pipeline, TemplateError> {
        let mut commands = vec![self.parse_command(context, 0)?];

        while self.check(&TokenKind::Pipe) {
            self.advance();
            let stage = commands.len();
            commands.push(self.parse_command(context, stage)?);
        }

        Ok(Pipeline { commands })
    }

    /// Parse one pipeline stage. Stages after the first must be function
    /// calls, and every call's arity is checked here, counting the piped
    /// argument.
    fn parse_command(&mut self, context: &str, stage: usize) -> Result<Command, TemplateError> {
        let start = self.pos;

        let command = match &self.current().kind {
            TokenKind::Identifier(name) => {
                let function = Function::from_name(name)
                    .ok_or_else(|| self.error(&format!("function {:?} not defined", name)))?;
                self.advance();
                let mut args = Vec::new();
                while !self.at_command_end() {
                    args.push(self.parse_operand()?);
                }
                let given = args.len() + usize::from(stage > 0);
                if given != function.arity() {
                    return Err(self.error_at(
                        start,
                        &format!(
                            "wrong number of args for {}: want {} got {}",
                            function.name(),
                            function.arity(),
                            given
                        ),
                    ));
                }
                Command::Call { function, args }
            }
            _ if self.at_command_end() => {
                return Err(self.error(&format!("missing value for {}", context)));
            }
            _ => {
                let operand = self.parse_operand()?;
                if !self.at_command_end() {
                    return Err(self.error_at(start, "can't give argument to non-function"));
                }
                if operand == Operand::Nil {
                    return Err(self.error_at(start, "nil is not a command"));
                }
                if stage > 0 {
                    return Err(self.error_at(
                        start,
                        &format!("non executable command in pipeline stage {}", stage + 1),
                    ));
                }
                Command::Value(operand)
            }
        };

        Ok(command)
    }

    fn parse_operand(&mut self) -> Result<Operand, TemplateError> {
        let operand = match &self.current().kind {
            TokenKind::Dot => Operand::Dot,
            TokenKind::Field(path) => Operand::Field(path.clone()),
            TokenKind::String(s) => Operand::Literal(Bson::String(s.clone())),
            TokenKind::Int(n) => Operand::Literal(Bson::Int64(*n)),
            TokenKind::Float(n) => Operand::Literal(Bson::Double(*n)),
            TokenKind::Bool(b) => Operand::Literal(Bson::Boolean(*b)),
            TokenKind::Nil => Operand::Nil,
            TokenKind::LParen => {
                self.advance();
                let pipeline = self.parse_pipeline("parenthesized pipeline")?;
                self.expect(TokenKind::RParen)?;
                return Ok(Operand::Pipeline(Box::new(pipeline)));
            }
            TokenKind::Identifier(name) => {
                return Err(match Function::from_name(name) {
                    Some(function) => self.error(&format!(
                        "wrong number of args for {}: want {} got 0",
                        function.name(),
                        function.arity()
                    )),
                    None => self.error(&format!("function {:?} not defined", name)),
                });
            }
            TokenKind::Error(msg) => return Err(self.error(msg)),
            other => return Err(self.error(&format!("unexpected {} in operand", other.describe()))),
        };
        self.advance();
        Ok(operand)
    }

    fn at_command_end(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Pipe | TokenKind::RightDelim | TokenKind::RParen | TokenKind::Eof
        )
    }

    fn current(&self) -> &Token {
        // The lexer always terminates the stream with Eof or Error.
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), TemplateError> {
        if self.check(&kind) {
            self.advance();
            return Ok(());
        }
        let found = &self.current().kind;
        let message = match found {
            TokenKind::Error(msg) => msg.clone(),
            _ => format!("expected {}, found {}", kind.describe(), found.describe()),
        };
        Err(self.error(&message))
    }

    fn error(&self, message: &str) -> TemplateError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: &str) -> TemplateError {
        let last = self.tokens.len().saturating_sub(1);
        let span = self
            .tokens
            .get(pos.min(last))
            .map(|t| t.span)
            .unwrap_or_default();
        TemplateError::Syntax {
            message: message.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}
