use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    /// Arithmetic negation: -x
    Negation,
    /// Logical not: !x
    LogicalNot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    LogicalAnd,
    LogicalOr,
    Equality,
    Inequality,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

/// Pure functions callable from expressions. This list is closed: a call to
/// any other name is rejected by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Pow,
    Floor,
    Ceil,
    Round,
    Abs,
    Sqrt,
    Min,
    Max,
    Factorial,
}

impl Builtin {
    /// Resolve a call target. `Math.` prefixes are accepted and ignored.
    pub fn from_name(name: &str) -> Option<Builtin> {
        let bare = name.strip_prefix("Math.").unwrap_or(name);
        match bare {
            "pow" => Some(Builtin::Pow),
            "floor" => Some(Builtin::Floor),
            "ceil" => Some(Builtin::Ceil),
            "round" => Some(Builtin::Round),
            "abs" => Some(Builtin::Abs),
            "sqrt" => Some(Builtin::Sqrt),
            "min" => Some(Builtin::Min),
            "max" => Some(Builtin::Max),
            "factorial" => Some(Builtin::Factorial),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Pow => "pow",
            Builtin::Floor => "floor",
            Builtin::Ceil => "ceil",
            Builtin::Round => "round",
            Builtin::Abs => "abs",
            Builtin::Sqrt => "sqrt",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Factorial => "factorial",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Pow | Builtin::Min | Builtin::Max => 2,
            _ => 1,
        }
    }
}

/// An expression AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Literals
    NumberLiteral(f64),
    BooleanLiteral(bool),

    // References
    VariableReference(String, Range<usize>),

    // Invocations
    Call {
        function: Builtin,
        arguments: Vec<Value>,
        span: Range<usize>,
    },

    // Operations
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<Value>,
    },
    BinaryOperation {
        operator: BinaryOperator,
        left: Box<Value>,
        right: Box<Value>,
    },

    // Control flow
    /// cond ? expr : expr
    Conditional {
        condition: Box<Value>,
        true_branch: Box<Value>,
        false_branch: Box<Value>,
    },
}
