use std::fmt;

/// A value produced by evaluating an expression.
#[derive(Debug, Clone, Copy)]
pub enum RuntimeValue {
    Number(f64),
    Boolean(bool),
}

impl RuntimeValue {
    pub fn is_truthy(&self) -> bool {
        !self.is_falsy()
    }

    /// `false`, `0` and `NaN` are falsy; every other value is truthy.
    pub fn is_falsy(&self) -> bool {
        match self {
            RuntimeValue::Boolean(b) => !b,
            RuntimeValue::Number(n) => *n == 0.0 || n.is_nan(),
        }
    }

    /// Numeric view of the value. Booleans become `1` and `0`.
    pub fn as_number(&self) -> f64 {
        match self {
            RuntimeValue::Number(n) => *n,
            RuntimeValue::Boolean(true) => 1.0,
            RuntimeValue::Boolean(false) => 0.0,
        }
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Number(n) => write!(f, "{}", blocks::block::header::format_number(*n)),
            RuntimeValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl PartialEq for RuntimeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuntimeValue::Boolean(a), RuntimeValue::Boolean(b)) => a == b,
            // NaN != NaN per IEEE 754; mixed operands compare numerically
            _ => self.as_number() == other.as_number(),
        }
    }
}
