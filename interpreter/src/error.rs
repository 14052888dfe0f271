use std::fmt;
use std::ops::Range;

use blocks::block::BlockId;
use blocks::block::compound::CompoundKind;
use blocks::block::header::HeaderKind;
use blocks::parser::ParseError;
use thiserror::Error;

/// Failure while evaluating one expression or statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// The block's text never parsed.
    #[error("{}", .0.message)]
    Syntax(ParseError),

    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String, span: Range<usize> },
}

impl ExpressionError {
    pub fn span(&self) -> Range<usize> {
        match self {
            ExpressionError::Syntax(error) => error.span.clone(),
            ExpressionError::UndefinedVariable { span, .. } => span.clone(),
        }
    }
}

/// A run stopped before the program finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("run was cancelled")]
    Cancelled,

    #[error("run exceeded its time limit")]
    TimedOut,
}

/// Something that went wrong in a block during a run. None of these stop
/// the run except `Interrupted`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error("{block} is missing its {} header", header_list(.missing))]
    MissingHeader {
        block: CompoundKind,
        missing: Vec<HeaderKind>,
    },

    #[error("{block} stopped after {cap} iterations")]
    IterationCap { block: CompoundKind, cap: u64 },

    #[error("loop variable '{0}' not found")]
    LoopVariableNotFound(String),

    #[error("break outside of a loop has no effect")]
    BreakOutsideLoop,

    #[error("failed to write output: {0}")]
    Output(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

fn header_list(kinds: &[HeaderKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.to_string())
        .collect::<Vec<_>>()
        .join(" and ")
}

/// A runtime error or warning tied to the block that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub error: RuntimeError,
    pub block: Option<BlockId>,
    /// Text of the statement or condition the span points into.
    pub source: Option<String>,
    pub span: Option<Range<usize>>,
    pub is_warning: bool,
}

impl Diagnostic {
    pub fn error(error: RuntimeError, block: BlockId) -> Self {
        Diagnostic {
            error,
            block: Some(block),
            source: None,
            span: None,
            is_warning: false,
        }
    }

    pub fn warning(error: RuntimeError, block: BlockId) -> Self {
        Diagnostic {
            is_warning: true,
            ..Diagnostic::error(error, block)
        }
    }

    /// Point the diagnostic at `span` within `source`.
    pub fn with_source(mut self, source: &str, span: Range<usize>) -> Self {
        self.source = Some(source.to_string());
        self.span = Some(span);
        self
    }
}

impl From<RuntimeError> for Diagnostic {
    fn from(error: RuntimeError) -> Self {
        Diagnostic {
            error,
            block: None,
            source: None,
            span: None,
            is_warning: false,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for Diagnostic {}
