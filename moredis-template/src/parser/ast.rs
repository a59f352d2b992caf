//! Template syntax tree

use crate::functions::Function;
use bson::Bson;

/// A top-level template node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, copied verbatim.
    Text(String),
    /// `{{ pipeline }}`, whose final value is printed.
    Action(Pipeline),
}

/// `command | command | ...`. Each stage after the first receives the
/// previous result as its final argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A bare operand. Only valid as the first stage of a pipeline.
    Value(Operand),
    /// A function call with its explicit arguments.
    Call { function: Function, args: Vec<Operand> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `.`
    Dot,
    /// `.a.b.c`
    Field(Vec<String>),
    /// String, number, or boolean literal.
    Literal(Bson),
    /// `nil`, valid only as a function argument.
    Nil,
    /// `( pipeline )`
    Pipeline(Box<Pipeline>),
}
