//! Compiled templates

use crate::exec::Evaluator;
use crate::lexer::Lexer;
use crate::parser::{Node, Parser};
use bson::Document;
use moredis_core::TemplateResult;

/// A mapping template compiled once and executed per record.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Compile `source`. Unknown functions and wrong arities are rejected
    /// here rather than at execution time.
    pub fn compile(source: &str) -> TemplateResult<Self> {
        let tokens = Lexer::new(source).tokenize();
        let nodes = Parser::new(tokens).parse()?;
        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    /// Render against `context`. The template is not mutated, so one
    /// compiled instance may be executed any number of times.
    pub fn execute(&self, context: &Document) -> TemplateResult<String> {
        let mut out = String::with_capacity(self.source.len());
        Evaluator::new(context).run(&self.nodes, &mut out)?;
        Ok(out)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Compile and execute in one step.
pub fn render(source: &str, context: &Document) -> TemplateResult<String> {
    Template::compile(source)?.execute(context)
}
