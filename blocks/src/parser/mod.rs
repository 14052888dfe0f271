pub mod error;
pub mod expression;

pub use error::ParseError;

use crate::instruction::Instruction;
use crate::instruction::value::Value;

/// Parse the text of a statement block: one or more `;`-separated
/// instructions mutating `x`.
pub fn parse_statement(source: &str) -> Result<Vec<Instruction>, ParseError> {
    expression::parse_instructions(source)
}

/// Parse the text of a condition header: a single expression.
pub fn parse_condition(source: &str) -> Result<Value, ParseError> {
    expression::parse_expression(source)
}
