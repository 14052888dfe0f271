use blocks::instruction::value::{BinaryOperator, Builtin, Value};
use blocks::instruction::{AssignOperator, Instruction};
use blocks::parser::{parse_condition, parse_statement};

fn assignment(source: &str) -> (AssignOperator, Value) {
    let mut instructions = parse_statement(source).expect("parse failed");
    assert_eq!(instructions.len(), 1);
    match instructions.remove(0) {
        Instruction::Assignment {
            variable,
            operator,
            value,
            ..
        } => {
            assert_eq!(variable, "x");
            (operator, value)
        }
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn compound_assignments() {
    assert_eq!(assignment("x += 5").0, AssignOperator::AddAssign);
    assert_eq!(assignment("x -= 3;").0, AssignOperator::SubtractAssign);
    assert_eq!(assignment("x *= 2").0, AssignOperator::MultiplyAssign);
    assert_eq!(assignment("x /= 2").0, AssignOperator::DivideAssign);
    assert_eq!(assignment("x %= 2").0, AssignOperator::ModuloAssign);
    assert_eq!(assignment("x = 1").0, AssignOperator::Assign);
}

#[test]
fn increment_shorthand_desugars() {
    assert_eq!(
        assignment("x++"),
        (AssignOperator::AddAssign, Value::NumberLiteral(1.0))
    );
    assert_eq!(
        assignment("x--"),
        (AssignOperator::SubtractAssign, Value::NumberLiteral(1.0))
    );
}

#[test]
fn multiple_instructions() {
    let instructions = parse_statement("x += 1; x *= 2;").unwrap();
    assert_eq!(instructions.len(), 2);
}

#[test]
fn precedence() {
    let (_, value) = assignment("x = 1 + 2 * 3");
    match value {
        Value::BinaryOperation {
            operator: BinaryOperator::Addition,
            right,
            ..
        } => assert!(matches!(
            *right,
            Value::BinaryOperation {
                operator: BinaryOperator::Multiplication,
                ..
            }
        )),
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn strict_equality_is_an_alias() {
    assert_eq!(parse_condition("x % 2 === 0"), parse_condition("x % 2 == 0"));
    assert_eq!(parse_condition("x !== 0"), parse_condition("x != 0"));
}

#[test]
fn builtins_with_and_without_prefix() {
    let (_, prefixed) = assignment("x = Math.pow(2, x)");
    let (_, bare) = assignment("x = pow(2, x)");
    assert!(matches!(
        prefixed,
        Value::Call {
            function: Builtin::Pow,
            ..
        }
    ));
    assert!(matches!(
        bare,
        Value::Call {
            function: Builtin::Pow,
            ..
        }
    ));
}

#[test]
fn conditional_expression() {
    let (_, value) = assignment("x = x > 12 ? x : factorial(x)");
    assert!(matches!(value, Value::Conditional { .. }));
}

#[test]
fn rejects_unknown_function() {
    let err = parse_statement("x = eval(1)").unwrap_err();
    assert!(err.message.contains("eval"), "{}", err.message);
}

#[test]
fn rejects_wrong_arity() {
    assert!(parse_statement("x = pow(2)").is_err());
    assert!(parse_statement("x = sqrt(4, 5)").is_err());
}

#[test]
fn rejects_other_assignment_targets() {
    let err = parse_statement("i = 3").unwrap_err();
    assert_eq!(err.span, 0..1);
    assert!(!err.notes.is_empty());
}

#[test]
fn parse_errors_render_as_error_reports() {
    use codespan_reporting::diagnostic::Severity;

    let err = parse_statement("i = 3").unwrap_err();
    let report = err.to_diagnostic(0usize);
    assert_eq!(report.severity, Severity::Error);
    assert_eq!(report.message, err.message);
    assert_eq!(report.labels[0].range, 0..1);
    assert_eq!(report.notes, err.notes);
}

#[test]
fn rejects_unknown_characters_with_span() {
    let err = parse_statement("x += 1 @ 2").unwrap_err();
    assert_eq!(err.span, 7..8);
}

#[test]
fn rejects_empty_text() {
    assert!(parse_statement("").is_err());
    assert!(parse_statement(" ; ").is_err());
    assert!(parse_condition("").is_err());
}

#[test]
fn rejects_trailing_tokens() {
    assert!(parse_condition("x < 10 10").is_err());
    assert!(parse_statement("x = 1 2").is_err());
}

#[test]
fn numeric_literals() {
    assert_eq!(assignment("x = 0.5").1, Value::NumberLiteral(0.5));
    assert_eq!(assignment("x = 1e3").1, Value::NumberLiteral(1000.0));
}
