pub mod value;

use std::ops::Range;

use crate::instruction::value::Value;
use crate::parser::ParseError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignOperator {
    /// `x = e`
    Assign,
    /// `x += e`
    AddAssign,
    /// `x -= e`
    SubtractAssign,
    /// `x *= e`
    MultiplyAssign,
    /// `x /= e`
    DivideAssign,
    /// `x %= e`
    ModuloAssign,
}

/// A single executable instruction parsed from a statement block's text.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Mutation of `x`: `x = e`, `x += e`, ... (`x++` desugars to `x += 1`).
    Assignment {
        variable: String,
        operator: AssignOperator,
        value: Value,
        span: Range<usize>,
    },
    /// Expression evaluation (result discarded).
    Expression { value: Value, span: Range<usize> },
}

/// Source text kept together with its parse result.
///
/// Blocks whose text does not parse still exist in the tree; the error is
/// reported when the block is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Code<T> {
    source: String,
    parsed: Result<T, ParseError>,
}

impl<T> Code<T> {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parsed(&self) -> Result<&T, &ParseError> {
        self.parsed.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_ok()
    }
}

impl Code<Vec<Instruction>> {
    pub fn statement(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = crate::parser::parse_statement(&source);
        Code { source, parsed }
    }
}

impl Code<Value> {
    pub fn condition(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = crate::parser::parse_condition(&source);
        Code { source, parsed }
    }
}
