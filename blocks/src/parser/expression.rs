use std::ops::Range;

use crate::instruction::value::{BinaryOperator, Builtin, UnaryOperator, Value};
use crate::instruction::{AssignOperator, Instruction};
use crate::parser::error::ParseError;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    True,
    False,

    // Identifiers (`x`, `i`, `Math.pow`)
    Ident(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,         // =
    EqEq,       // == or ===
    BangEq,     // != or !==
    Gt,
    Lt,
    GtEq,
    LtEq,
    AmpAmp,     // &&
    PipePipe,   // ||
    Bang,       // !
    Question,   // ?
    Colon,      // :
    Comma,
    Semicolon,

    // Assignment operators
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    PlusPlus,
    MinusMinus,

    // Grouping
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    span: Range<usize>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse statement text into instructions. Instructions are separated by `;`
/// and a trailing `;` is allowed.
pub fn parse_instructions(source: &str) -> Result<Vec<Instruction>, ParseError> {
    let tokens = tokenize(source)?;

    let mut instructions = Vec::new();
    for segment in tokens.split(|t| t.token == Token::Semicolon) {
        if segment.is_empty() {
            continue;
        }
        instructions.push(parse_instruction(segment.to_vec(), source.len())?);
    }

    if instructions.is_empty() {
        return Err(ParseError::error("empty statement", 0..source.len()));
    }
    Ok(instructions)
}

/// Parse a single expression, as used by condition headers.
pub fn parse_expression(source: &str) -> Result<Value, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::error("empty expression", 0..source.len()));
    }
    let mut parser = ExprParser::new(tokens, source.len());
    let value = parser.parse_expr(0)?;
    if !parser.at_end() {
        return Err(parser.error_here("unexpected tokens after expression"));
    }
    Ok(value)
}

fn parse_instruction(tokens: Vec<Spanned>, source_len: usize) -> Result<Instruction, ParseError> {
    let span = tokens[0].span.start..tokens[tokens.len() - 1].span.end;
    let mut parser = ExprParser::new(tokens, source_len);

    if let Some((target, target_span, operator)) = parser.assignment_head() {
        if target != "x" {
            return Err(ParseError::error(
                format!("cannot assign to `{}`", target),
                target_span,
            )
            .with_note("only `x` can be assigned; loop counters are read-only"));
        }

        let (operator, value) = match operator {
            Some(operator) => (operator, parser.parse_expr(0)?),
            // `x++` / `x--`
            None => match parser.advance().map(|t| t.token) {
                Some(Token::PlusPlus) => (AssignOperator::AddAssign, Value::NumberLiteral(1.0)),
                _ => (AssignOperator::SubtractAssign, Value::NumberLiteral(1.0)),
            },
        };
        if !parser.at_end() {
            return Err(parser.error_here("unexpected tokens after assignment"));
        }
        return Ok(Instruction::Assignment {
            variable: target,
            operator,
            value,
            span,
        });
    }

    let value = parser.parse_expr(0)?;
    if !parser.at_end() {
        return Err(parser.error_here("unexpected tokens after expression"));
    }
    Ok(Instruction::Expression { value, span })
}

// ---------------------------------------------------------------------------
// Tokenizer: raw text → Token stream
// ---------------------------------------------------------------------------

fn tokenize(text: &str) -> Result<Vec<Spanned>, ParseError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let len = chars.len();
    let offset = |idx: usize| chars.get(idx).map(|(b, _)| *b).unwrap_or(text.len());
    let peek = |idx: usize| chars.get(idx).map(|(_, c)| *c);

    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        let start = i;
        let c = chars[i].1;
        let token = match c {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
                continue;
            }

            // Numbers
            '0'..='9' | '.' if c != '.' || peek(i + 1).is_some_and(|n| n.is_ascii_digit()) => {
                while i < len && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                // Exponent: 1e3, 2.5E-4
                if matches!(peek(i), Some('e' | 'E')) {
                    let mut j = i + 1;
                    if matches!(peek(j), Some('+' | '-')) {
                        j += 1;
                    }
                    if peek(j).is_some_and(|d| d.is_ascii_digit()) {
                        i = j;
                        while i < len && chars[i].1.is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let num_str = &text[offset(start)..offset(i)];
                match num_str.parse::<f64>() {
                    Ok(n) => Token::Number(n),
                    Err(_) => {
                        return Err(ParseError::error(
                            format!("invalid number literal `{}`", num_str),
                            offset(start)..offset(i),
                        ));
                    }
                }
            }

            // Identifiers and keywords
            'a'..='z' | 'A'..='Z' | '_' => {
                while i < len {
                    let ch = chars[i].1;
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        i += 1;
                    } else if ch == '.' && peek(i + 1).is_some_and(|n| n.is_ascii_alphabetic()) {
                        // Dotted builtin names such as `Math.pow`
                        i += 1;
                    } else {
                        break;
                    }
                }
                match &text[offset(start)..offset(i)] {
                    "true" => Token::True,
                    "false" => Token::False,
                    ident => Token::Ident(ident.to_string()),
                }
            }

            // One-, two- and three-character operators
            '=' => {
                i += 1;
                if peek(i) == Some('=') {
                    i += 1;
                    if peek(i) == Some('=') {
                        i += 1;
                    }
                    Token::EqEq
                } else {
                    Token::Eq
                }
            }
            '!' => {
                i += 1;
                if peek(i) == Some('=') {
                    i += 1;
                    if peek(i) == Some('=') {
                        i += 1;
                    }
                    Token::BangEq
                } else {
                    Token::Bang
                }
            }
            '>' => {
                i += 1;
                if peek(i) == Some('=') {
                    i += 1;
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            '<' => {
                i += 1;
                if peek(i) == Some('=') {
                    i += 1;
                    Token::LtEq
                } else {
                    Token::Lt
                }
            }
            '&' | '|' => {
                i += 1;
                if peek(i) != Some(c) {
                    return Err(ParseError::error(
                        format!("unexpected `{}`", c),
                        offset(start)..offset(i),
                    )
                    .with_note(format!("did you mean `{}{}`?", c, c)));
                }
                i += 1;
                if c == '&' { Token::AmpAmp } else { Token::PipePipe }
            }
            '+' => {
                i += 1;
                match peek(i) {
                    Some('=') => { i += 1; Token::PlusEq }
                    Some('+') => { i += 1; Token::PlusPlus }
                    _ => Token::Plus,
                }
            }
            '-' => {
                i += 1;
                match peek(i) {
                    Some('=') => { i += 1; Token::MinusEq }
                    Some('-') => { i += 1; Token::MinusMinus }
                    _ => Token::Minus,
                }
            }
            '*' | '/' | '%' => {
                i += 1;
                let compound = peek(i) == Some('=');
                if compound {
                    i += 1;
                }
                match (c, compound) {
                    ('*', false) => Token::Star,
                    ('*', true) => Token::StarEq,
                    ('/', false) => Token::Slash,
                    ('/', true) => Token::SlashEq,
                    (_, false) => Token::Percent,
                    (_, true) => Token::PercentEq,
                }
            }

            // Single-character punctuation
            '?' => { i += 1; Token::Question }
            ':' => { i += 1; Token::Colon }
            ',' => { i += 1; Token::Comma }
            ';' => { i += 1; Token::Semicolon }
            '(' => { i += 1; Token::LParen }
            ')' => { i += 1; Token::RParen }

            other => {
                return Err(ParseError::error(
                    format!("unexpected character `{}`", other),
                    offset(start)..offset(start + 1),
                ));
            }
        };

        tokens.push(Spanned {
            token,
            span: offset(start)..offset(i),
        });
    }

    Ok(tokens)
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number `{}`", n),
        Token::Ident(name) => format!("identifier `{}`", name),
        Token::True => "`true`".to_string(),
        Token::False => "`false`".to_string(),
        other => format!("{:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Pratt parser
// ---------------------------------------------------------------------------

struct ExprParser {
    tokens: Vec<Spanned>,
    pos: usize,
    source_len: usize,
}

// Binding powers (precedence). Higher = tighter binding.
// Left bp, right bp. For left-assoc: right = left + 1. For right-assoc: right = left.
const BP_CONDITIONAL: u8 = 2;   // ? :
const BP_OR: u8 = 4;            // ||
const BP_AND: u8 = 6;           // &&
const BP_EQUALITY: u8 = 8;      // == !=
const BP_COMPARISON: u8 = 10;   // < > <= >=
const BP_ADDITIVE: u8 = 12;     // + -
const BP_MULTIPLICATIVE: u8 = 14; // * / %
const BP_UNARY: u8 = 16;        // ! -

impl ExprParser {
    fn new(tokens: Vec<Spanned>, source_len: usize) -> Self {
        ExprParser {
            tokens,
            pos: 0,
            source_len,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let t = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(t)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Span of the current token, or an empty span at the end of the text.
    fn current_span(&self) -> Range<usize> {
        match self.tokens.get(self.pos) {
            Some(t) => t.span.clone(),
            None => self.source_len..self.source_len,
        }
    }

    fn error_here(&self, msg: impl Into<String>) -> ParseError {
        ParseError::error(msg, self.current_span())
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<Spanned, ParseError> {
        match self.tokens.get(self.pos) {
            Some(t) if t.token == expected => {
                let t = t.clone();
                self.pos += 1;
                Ok(t)
            }
            _ => Err(self.error_here(format!("expected {}", what))),
        }
    }

    /// Recognize `ident op= ...`, `ident = ...`, `ident++` and `ident--`.
    /// On success the target has been consumed; for `++`/`--` the operator
    /// token is left in place and `None` is returned as the operator.
    fn assignment_head(&mut self) -> Option<(String, Range<usize>, Option<AssignOperator>)> {
        let Some(Spanned { token: Token::Ident(name), span }) = self.tokens.first().cloned() else {
            return None;
        };
        let operator = match self.tokens.get(1).map(|t| &t.token)? {
            Token::Eq => Some(AssignOperator::Assign),
            Token::PlusEq => Some(AssignOperator::AddAssign),
            Token::MinusEq => Some(AssignOperator::SubtractAssign),
            Token::StarEq => Some(AssignOperator::MultiplyAssign),
            Token::SlashEq => Some(AssignOperator::DivideAssign),
            Token::PercentEq => Some(AssignOperator::ModuloAssign),
            Token::PlusPlus | Token::MinusMinus => None,
            _ => return None,
        };
        self.pos = if operator.is_some() { 2 } else { 1 };
        Some((name, span, operator))
    }

    // ------------------------------------------------------------------
    // Pratt parser core
    // ------------------------------------------------------------------

    fn parse_expr(&mut self, min_bp: u8) -> Result<Value, ParseError> {
        let mut left = self.parse_prefix()?;

        loop {
            let Some(token) = self.peek() else { break };
            let Some((l_bp, r_bp)) = infix_bp(token) else { break };

            if l_bp < min_bp {
                break;
            }

            // Conditional operator: cond ? a : b
            if *token == Token::Question {
                self.advance();
                let true_branch = self.parse_expr(0)?;
                self.expect(Token::Colon, "`:` in conditional expression")?;
                let false_branch = self.parse_expr(r_bp)?;
                left = Value::Conditional {
                    condition: Box::new(left),
                    true_branch: Box::new(true_branch),
                    false_branch: Box::new(false_branch),
                };
                continue;
            }

            let Some(op) = self.advance() else { break };
            let operator = match op.token {
                Token::Plus => BinaryOperator::Addition,
                Token::Minus => BinaryOperator::Subtraction,
                Token::Star => BinaryOperator::Multiplication,
                Token::Slash => BinaryOperator::Division,
                Token::Percent => BinaryOperator::Modulo,
                Token::EqEq => BinaryOperator::Equality,
                Token::BangEq => BinaryOperator::Inequality,
                Token::Gt => BinaryOperator::GreaterThan,
                Token::Lt => BinaryOperator::LessThan,
                Token::GtEq => BinaryOperator::GreaterThanOrEqual,
                Token::LtEq => BinaryOperator::LessThanOrEqual,
                Token::AmpAmp => BinaryOperator::LogicalAnd,
                Token::PipePipe => BinaryOperator::LogicalOr,
                _ => return Err(ParseError::error("unexpected infix operator", op.span)),
            };
            let right = self.parse_expr(r_bp)?;

            left = Value::BinaryOperation {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Value, ParseError> {
        let Some(Spanned { token, span }) = self.advance() else {
            return Err(self.error_here("unexpected end of expression"));
        };

        match token {
            // Literals
            Token::Number(n) => Ok(Value::NumberLiteral(n)),
            Token::True => Ok(Value::BooleanLiteral(true)),
            Token::False => Ok(Value::BooleanLiteral(false)),

            // References and calls
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) {
                    self.parse_call(name, span)
                } else {
                    Ok(Value::VariableReference(name, span))
                }
            }

            // Unary operators
            Token::Bang => {
                let operand = self.parse_expr(BP_UNARY)?;
                Ok(Value::UnaryOperation {
                    operator: UnaryOperator::LogicalNot,
                    operand: Box::new(operand),
                })
            }
            Token::Minus => {
                let operand = self.parse_expr(BP_UNARY)?;
                Ok(Value::UnaryOperation {
                    operator: UnaryOperator::Negation,
                    operand: Box::new(operand),
                })
            }

            // Parenthesized expression
            Token::LParen => {
                let expr = self.parse_expr(0)?;
                self.expect(Token::RParen, "`)`")?;
                Ok(expr)
            }

            other => Err(ParseError::error(
                format!("unexpected {}", describe(&other)),
                span,
            )),
        }
    }

    /// Parse `name(arg, ...)` against the builtin whitelist.
    fn parse_call(&mut self, name: String, name_span: Range<usize>) -> Result<Value, ParseError> {
        let Some(function) = Builtin::from_name(&name) else {
            return Err(ParseError::error(format!("unknown function `{}`", name), name_span)
                .with_note(
                    "available functions: pow, floor, ceil, round, abs, sqrt, min, max, factorial",
                ));
        };

        self.expect(Token::LParen, "`(`")?;
        let mut arguments = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                arguments.push(self.parse_expr(0)?);
                if self.peek() == Some(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let close = self.expect(Token::RParen, "`)` after arguments")?;
        let span = name_span.start..close.span.end;

        if arguments.len() != function.arity() {
            return Err(ParseError::error(
                format!(
                    "`{}` expects {} argument(s), got {}",
                    function.name(),
                    function.arity(),
                    arguments.len()
                ),
                span,
            ));
        }

        Ok(Value::Call {
            function,
            arguments,
            span,
        })
    }
}

/// Infix binding powers: returns (left_bp, right_bp) or None if not infix.
fn infix_bp(token: &Token) -> Option<(u8, u8)> {
    match token {
        Token::Question => Some((BP_CONDITIONAL, BP_CONDITIONAL)),
        Token::PipePipe => Some((BP_OR, BP_OR + 1)),
        Token::AmpAmp => Some((BP_AND, BP_AND + 1)),
        Token::EqEq | Token::BangEq => Some((BP_EQUALITY, BP_EQUALITY + 1)),
        Token::Gt | Token::Lt | Token::GtEq | Token::LtEq => {
            Some((BP_COMPARISON, BP_COMPARISON + 1))
        }
        Token::Plus | Token::Minus => Some((BP_ADDITIVE, BP_ADDITIVE + 1)),
        Token::Star | Token::Slash | Token::Percent => {
            Some((BP_MULTIPLICATIVE, BP_MULTIPLICATIVE + 1))
        }
        _ => None,
    }
}
