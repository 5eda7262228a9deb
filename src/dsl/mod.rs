//! DSL front end: tokenizer, recursive-descent parser, and the element
//! tree it produces.

mod ast;
mod parser;

pub use ast::Element;
pub use parser::parse_document;
