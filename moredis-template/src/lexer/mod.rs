//! Lexer module for mapping templates

pub mod scanner;
pub mod token;

pub use scanner::*;
pub use token::*;
