//! Parser module for mapping templates

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::*;
