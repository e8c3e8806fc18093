// Expression parser module for computed channels

pub mod ast;
pub mod expr;
pub mod lexer;

// Public API re-exports
pub use ast::{BinaryOp, Expr};
pub use expr::{evaluate, parse_expression};
