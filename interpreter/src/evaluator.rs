use blocks::instruction::value::{BinaryOperator, Builtin, UnaryOperator, Value};
use blocks::instruction::{AssignOperator, Instruction};

use crate::environment::Environment;
use crate::error::ExpressionError;
use crate::runtime_value::RuntimeValue;

/// Name of the program variable.
pub const PROGRAM_VARIABLE: &str = "x";

/// Evaluate a Value AST node against `x` and the open loop counters.
pub fn evaluate(value: &Value, x: f64, env: &Environment) -> Result<RuntimeValue, ExpressionError> {
    match value {
        // --- Literals ---
        Value::NumberLiteral(n) => Ok(RuntimeValue::Number(*n)),
        Value::BooleanLiteral(b) => Ok(RuntimeValue::Boolean(*b)),

        // --- References ---
        Value::VariableReference(name, span) => {
            if name == PROGRAM_VARIABLE {
                return Ok(RuntimeValue::Number(x));
            }
            env.get_variable(name)
                .map(RuntimeValue::Number)
                .ok_or_else(|| ExpressionError::UndefinedVariable {
                    name: name.clone(),
                    span: span.clone(),
                })
        }

        // --- Invocations ---
        Value::Call {
            function,
            arguments,
            ..
        } => {
            let mut args = Vec::with_capacity(arguments.len());
            for argument in arguments {
                args.push(evaluate(argument, x, env)?.as_number());
            }
            Ok(RuntimeValue::Number(call_builtin(*function, &args)))
        }

        // --- Operations ---
        Value::UnaryOperation { operator, operand } => {
            let val = evaluate(operand, x, env)?;
            match operator {
                UnaryOperator::Negation => Ok(RuntimeValue::Number(-val.as_number())),
                UnaryOperator::LogicalNot => Ok(RuntimeValue::Boolean(val.is_falsy())),
            }
        }

        Value::BinaryOperation {
            operator,
            left,
            right,
        } => {
            let l = evaluate(left, x, env)?;
            // && and || only evaluate the right side when it decides the result
            match operator {
                BinaryOperator::LogicalAnd if l.is_falsy() => return Ok(l),
                BinaryOperator::LogicalOr if l.is_truthy() => return Ok(l),
                _ => {}
            }
            let r = evaluate(right, x, env)?;
            Ok(eval_binary_op(operator, &l, &r))
        }

        // --- Control flow ---
        Value::Conditional {
            condition,
            true_branch,
            false_branch,
        } => {
            if evaluate(condition, x, env)?.is_truthy() {
                evaluate(true_branch, x, env)
            } else {
                evaluate(false_branch, x, env)
            }
        }
    }
}

/// Apply a statement's instructions in order and return the new `x`.
///
/// The input `x` is not touched if any instruction fails.
pub fn execute_instructions(
    instructions: &[Instruction],
    x: f64,
    env: &Environment,
) -> Result<f64, ExpressionError> {
    let mut current = x;
    for instruction in instructions {
        match instruction {
            Instruction::Assignment {
                operator, value, ..
            } => {
                let rhs = evaluate(value, current, env)?.as_number();
                current = match operator {
                    AssignOperator::Assign => rhs,
                    AssignOperator::AddAssign => current + rhs,
                    AssignOperator::SubtractAssign => current - rhs,
                    AssignOperator::MultiplyAssign => current * rhs,
                    AssignOperator::DivideAssign => current / rhs,
                    AssignOperator::ModuloAssign => current % rhs,
                };
            }
            Instruction::Expression { value, .. } => {
                evaluate(value, current, env)?;
            }
        }
    }
    Ok(current)
}

fn eval_binary_op(op: &BinaryOperator, left: &RuntimeValue, right: &RuntimeValue) -> RuntimeValue {
    match op {
        BinaryOperator::Addition => numeric_binop(left, right, |a, b| a + b),
        BinaryOperator::Subtraction => numeric_binop(left, right, |a, b| a - b),
        BinaryOperator::Multiplication => numeric_binop(left, right, |a, b| a * b),
        BinaryOperator::Division => numeric_binop(left, right, |a, b| a / b),
        BinaryOperator::Modulo => numeric_binop(left, right, |a, b| a % b),
        BinaryOperator::Equality => RuntimeValue::Boolean(left == right),
        BinaryOperator::Inequality => RuntimeValue::Boolean(left != right),
        BinaryOperator::LessThan => numeric_cmp(left, right, |a, b| a < b),
        BinaryOperator::GreaterThan => numeric_cmp(left, right, |a, b| a > b),
        BinaryOperator::LessThanOrEqual => numeric_cmp(left, right, |a, b| a <= b),
        BinaryOperator::GreaterThanOrEqual => numeric_cmp(left, right, |a, b| a >= b),
        // Short-circuit already handled the deciding left operand
        BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => *right,
    }
}

fn numeric_binop(left: &RuntimeValue, right: &RuntimeValue, f: fn(f64, f64) -> f64) -> RuntimeValue {
    RuntimeValue::Number(f(left.as_number(), right.as_number()))
}

fn numeric_cmp(left: &RuntimeValue, right: &RuntimeValue, f: fn(f64, f64) -> bool) -> RuntimeValue {
    RuntimeValue::Boolean(f(left.as_number(), right.as_number()))
}

fn call_builtin(function: Builtin, args: &[f64]) -> f64 {
    let arg = |i: usize| args.get(i).copied().unwrap_or(f64::NAN);
    match function {
        Builtin::Pow => arg(0).powf(arg(1)),
        Builtin::Floor => arg(0).floor(),
        Builtin::Ceil => arg(0).ceil(),
        // Halves round toward positive infinity
        Builtin::Round => (arg(0) + 0.5).floor(),
        Builtin::Abs => arg(0).abs(),
        Builtin::Sqrt => arg(0).sqrt(),
        Builtin::Min => min(arg(0), arg(1)),
        Builtin::Max => max(arg(0), arg(1)),
        Builtin::Factorial => factorial(arg(0)),
    }
}

// f64::min ignores NaN; a NaN operand must poison the result instead.
fn min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) }
}

fn max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
}

/// `n!` for non-negative integers; `NaN` otherwise. Large inputs overflow
/// to infinity.
fn factorial(n: f64) -> f64 {
    if n < 0.0 || n.fract() != 0.0 || n.is_nan() {
        return f64::NAN;
    }
    let mut result: f64 = 1.0;
    let mut k = 2.0;
    while k <= n && result.is_finite() {
        result *= k;
        k += 1.0;
    }
    result
}
