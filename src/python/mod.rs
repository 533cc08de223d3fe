#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Everything that understands Python: literal values printed by
//! submissions, source checks, and interpreter discovery.

/// Parser for printed Python literals.
pub mod literal;
/// Tree-sitter wrapper for submission sources.
pub mod parser;
/// Tree-sitter query strings.
pub mod queries;
/// Interpreter discovery and command construction.
pub mod util;
/// Python literal values and their equality rules.
pub mod value;

pub use literal::parse_literal;
pub use parser::Parser;
pub use util::Interpreter;
pub use value::{Tolerance, Value};
