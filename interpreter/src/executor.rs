use std::io::Write;
use std::time::Instant;

use blocks::block::compound::{CompoundBlock, CompoundKind, IfElse, Loop};
use blocks::block::header::Condition;
use blocks::block::{Block, BlockKind};
use blocks::program::Program;

use crate::config::RunConfig;
use crate::environment::Environment;
use crate::error::{Diagnostic, ExpressionError, Interrupted, RuntimeError};
use crate::evaluator::{evaluate, execute_instructions};
use crate::runtime_value::RuntimeValue;

/// Result of evaluating one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    /// Normal completion with the new `x`.
    Value(f64),
    /// A break is travelling up to the nearest enclosing loop.
    Break,
}

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct RunOutcome {
    /// `x` after the last completed top-level block.
    pub value: f64,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when the run was cut short by cancellation or its time limit.
    pub interrupted: Option<Interrupted>,
}

impl RunOutcome {
    /// True when any block reported a problem while running.
    pub fn degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_warning)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning)
    }
}

/// State threaded through one run.
pub struct Context<'a> {
    pub env: Environment,
    pub output: &'a mut dyn Write,
    pub diagnostics: Vec<Diagnostic>,
    config: &'a RunConfig,
    deadline: Option<Instant>,
}

impl<'a> Context<'a> {
    pub fn new(output: &'a mut dyn Write, config: &'a RunConfig) -> Self {
        Context {
            env: Environment::new(),
            output,
            diagnostics: Vec::new(),
            config,
            deadline: config.time_limit.map(|limit| Instant::now() + limit),
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            block = ?diagnostic.block,
            warning = diagnostic.is_warning,
            "{}",
            diagnostic.error
        );
        self.diagnostics.push(diagnostic);
    }

    /// Checked once per loop iteration.
    fn check_interrupt(&self) -> Result<(), Interrupted> {
        if let Some(cancel) = &self.config.cancel {
            if cancel.is_cancelled() {
                return Err(Interrupted::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Interrupted::TimedOut);
            }
        }
        Ok(())
    }
}

/// Run every populated top-level slot in order, starting from `initial`.
pub fn execute_program(program: &Program, initial: f64, output: &mut dyn Write) -> RunOutcome {
    execute_program_with_config(program, initial, output, &RunConfig::default())
}

pub fn execute_program_with_config(
    program: &Program,
    initial: f64,
    output: &mut dyn Write,
    config: &RunConfig,
) -> RunOutcome {
    let mut ctx = Context::new(output, config);
    let mut x = initial;
    let mut interrupted = None;

    for block in program.blocks() {
        match evaluate_block(block, x, &mut ctx) {
            Ok(Flow::Value(value)) => x = value,
            Ok(Flow::Break) => {
                // No loop to stop: the break is dropped and x keeps its value
                ctx.report(Diagnostic::warning(RuntimeError::BreakOutsideLoop, block.id()));
            }
            Err(reason) => {
                let mut diagnostic = Diagnostic::from(RuntimeError::Interrupted(reason));
                diagnostic.block = Some(block.id());
                ctx.report(diagnostic);
                interrupted = Some(reason);
                break;
            }
        }
    }

    tracing::debug!(value = x, diagnostics = ctx.diagnostics.len(), "run finished");
    RunOutcome {
        value: x,
        diagnostics: ctx.diagnostics,
        interrupted,
    }
}

/// Evaluate one block against `x`.
///
/// Problems inside the block are reported to `ctx` and leave `x` unchanged.
/// Only an interruption is returned as an error.
pub fn evaluate_block(block: &Block, x: f64, ctx: &mut Context) -> Result<Flow, Interrupted> {
    match &block.kind {
        BlockKind::Statement(code) => {
            let result = match code.parsed() {
                Ok(instructions) => execute_instructions(instructions, x, &ctx.env),
                Err(error) => Err(ExpressionError::Syntax(error.clone())),
            };
            match result {
                Ok(value) => Ok(Flow::Value(value)),
                Err(error) => {
                    let span = error.span();
                    ctx.report(
                        Diagnostic::error(error.into(), block.id()).with_source(code.source(), span),
                    );
                    Ok(Flow::Value(x))
                }
            }
        }
        BlockKind::Print => {
            let text = RuntimeValue::Number(x).to_string();
            tracing::trace!(value = %text, "print");
            if let Err(error) = writeln!(ctx.output, "{}", text) {
                ctx.report(Diagnostic::error(
                    RuntimeError::Output(error.to_string()),
                    block.id(),
                ));
            }
            Ok(Flow::Value(x))
        }
        BlockKind::Break => Ok(Flow::Break),
        BlockKind::AddLoopVariable { name } => match ctx.env.get_variable(name) {
            Some(counter) => Ok(Flow::Value(x + counter)),
            None => {
                ctx.report(Diagnostic::warning(
                    RuntimeError::LoopVariableNotFound(name.clone()),
                    block.id(),
                ));
                Ok(Flow::Value(x))
            }
        },
        BlockKind::Compound(compound) => {
            let missing = compound.missing_headers();
            if !missing.is_empty() {
                ctx.report(Diagnostic::warning(
                    RuntimeError::MissingHeader {
                        block: compound.kind(),
                        missing,
                    },
                    block.id(),
                ));
                return Ok(Flow::Value(x));
            }
            match compound {
                CompoundBlock::ForLoop(body) => evaluate_for(block, body, x, ctx),
                CompoundBlock::While(body) => evaluate_while(block, body, x, ctx),
                CompoundBlock::IfElse(if_else) => evaluate_if_else(block, if_else, x, ctx),
            }
        }
    }
}

fn evaluate_for(block: &Block, body: &Loop, x: f64, ctx: &mut Context) -> Result<Flow, Interrupted> {
    let (Some(init), Some(condition), Some(increment)) = (
        &body.headers.init,
        &body.headers.condition,
        &body.headers.increment,
    ) else {
        return Ok(Flow::Value(x));
    };

    ctx.env.push_scope(&init.counter, init.value);
    let result = run_loop(block, CompoundKind::ForLoop, condition, &body.children, x, ctx, |env| {
        env.advance(increment.value)
    });
    // Popped on every exit path, interruption included
    ctx.env.pop_scope();
    result.map(Flow::Value)
}

fn evaluate_while(
    block: &Block,
    body: &Loop,
    x: f64,
    ctx: &mut Context,
) -> Result<Flow, Interrupted> {
    let Some(condition) = &body.headers.condition else {
        return Ok(Flow::Value(x));
    };
    run_loop(block, CompoundKind::While, condition, &body.children, x, ctx, |_| {}).map(Flow::Value)
}

/// Shared loop driver. `step` runs after each completed pass of the body.
fn run_loop(
    block: &Block,
    kind: CompoundKind,
    condition: &Condition,
    children: &[Block],
    mut x: f64,
    ctx: &mut Context,
    step: impl Fn(&mut Environment),
) -> Result<f64, Interrupted> {
    let mut iterations: u64 = 0;
    loop {
        ctx.check_interrupt()?;
        if !test_condition(block, condition, x, ctx) {
            tracing::trace!(block = %block.id(), iterations, "loop condition false");
            return Ok(x);
        }
        if iterations >= ctx.config.iteration_cap {
            ctx.report(Diagnostic::warning(
                RuntimeError::IterationCap {
                    block: kind,
                    cap: ctx.config.iteration_cap,
                },
                block.id(),
            ));
            return Ok(x);
        }
        iterations += 1;

        for child in children {
            match evaluate_block(child, x, ctx)? {
                Flow::Value(value) => x = value,
                Flow::Break => {
                    tracing::trace!(block = %block.id(), iterations, "loop broken");
                    return Ok(x);
                }
            }
        }
        step(&mut ctx.env);
    }
}

fn evaluate_if_else(
    block: &Block,
    if_else: &IfElse,
    mut x: f64,
    ctx: &mut Context,
) -> Result<Flow, Interrupted> {
    let Some(condition) = &if_else.headers.condition else {
        return Ok(Flow::Value(x));
    };
    let section = if test_condition(block, condition, x, ctx) {
        &if_else.if_section
    } else {
        &if_else.else_section
    };
    for child in &section.children {
        match evaluate_block(child, x, ctx)? {
            Flow::Value(value) => x = value,
            Flow::Break => return Ok(Flow::Break),
        }
    }
    Ok(Flow::Value(x))
}

/// Evaluate a condition header. A condition that cannot be evaluated is
/// reported and counts as false.
fn test_condition(block: &Block, condition: &Condition, x: f64, ctx: &mut Context) -> bool {
    let result = match condition.code.parsed() {
        Ok(value) => evaluate(value, x, &ctx.env),
        Err(error) => Err(ExpressionError::Syntax(error.clone())),
    };
    match result {
        Ok(value) => value.is_truthy(),
        Err(error) => {
            let span = error.span();
            ctx.report(
                Diagnostic::error(error.into(), block.id()).with_source(condition.code.source(), span),
            );
            false
        }
    }
}
