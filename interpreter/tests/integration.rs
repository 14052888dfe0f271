use std::io::{self, Write};
use std::time::Duration;

use blocks::block::compound::SectionKind;
use blocks::persist;
use blocks::{Block, BlockId, Container, HeaderBlock, Problem, Program};
use interpreter::{CancelToken, Interrupted, RunConfig, RunOutcome, RuntimeError};

fn run(program: &Program, initial: f64) -> RunOutcome {
    let mut output = Vec::new();
    interpreter::execute_program(program, initial, &mut output)
}

fn run_with_output(program: &Program, initial: f64) -> (RunOutcome, String) {
    let mut output = Vec::new();
    let outcome = interpreter::execute_program(program, initial, &mut output);
    (outcome, String::from_utf8(output).unwrap())
}

/// A program with no initializer, so `initial` flows straight in.
fn program(blocks: Vec<Block>) -> Program {
    let mut program = Program::default();
    for block in blocks {
        program.push_child(Container::Program, block).unwrap();
    }
    program
}

fn add_children(program: &mut Program, container: Container, children: Vec<Block>) {
    for child in children {
        program.push_child(container, child).unwrap();
    }
}

/// Append a fully headered for loop to the top level and return its id.
fn for_loop(program: &mut Program, init: f64, condition: &str, increment: f64, body: Vec<Block>) -> BlockId {
    let id = program.push_child(Container::Program, Block::for_loop()).unwrap();
    program.attach_header(id, HeaderBlock::init(init)).unwrap();
    program.attach_header(id, HeaderBlock::condition(condition)).unwrap();
    program.attach_header(id, HeaderBlock::increment(increment)).unwrap();
    add_children(program, Container::Body(id), body);
    id
}

fn while_loop(program: &mut Program, condition: &str, body: Vec<Block>) -> BlockId {
    let id = program.push_child(Container::Program, Block::while_loop()).unwrap();
    program.attach_header(id, HeaderBlock::condition(condition)).unwrap();
    add_children(program, Container::Body(id), body);
    id
}

fn if_else(program: &mut Program, condition: &str, if_body: Vec<Block>, else_body: Vec<Block>) -> BlockId {
    let id = program.push_child(Container::Program, Block::if_else()).unwrap();
    program.attach_header(id, HeaderBlock::condition(condition)).unwrap();
    add_children(program, Container::Section(id, SectionKind::If), if_body);
    add_children(program, Container::Section(id, SectionKind::Else), else_body);
    id
}

fn stmt(source: &str) -> Block {
    Block::statement(source)
}

fn has_error(outcome: &RunOutcome, matches: impl Fn(&RuntimeError) -> bool) -> bool {
    outcome.diagnostics.iter().any(|d| matches(&d.error))
}

// --- Sequencing ---

#[test]
fn statements_thread_x_in_order() {
    let p = program(vec![stmt("x += 1"), stmt("x *= 3"), stmt("x -= 2")]);
    assert_eq!(run(&p, 0.0).value, 1.0);
    assert_eq!(run(&p, 4.0).value, 13.0);
}

#[test]
fn initializer_sets_starting_value() {
    let mut p = Program::new(7.0);
    p.push_child(Container::Program, stmt("x *= 2")).unwrap();
    let outcome = run(&p, 0.0);
    assert_eq!(outcome.value, 14.0);
    assert!(!outcome.degraded());
}

#[test]
fn initializer_accepts_non_finite_values() {
    let outcome = run(&Program::new(f64::INFINITY), 0.0);
    assert_eq!(outcome.value, f64::INFINITY);
    assert!(!outcome.degraded());

    let outcome = run(&Program::new(f64::NEG_INFINITY), 0.0);
    assert_eq!(outcome.value, f64::NEG_INFINITY);
    assert!(!outcome.degraded());

    let outcome = run(&Program::new(f64::NAN), 0.0);
    assert!(outcome.value.is_nan());
    assert!(!outcome.degraded());
}

#[test]
fn empty_program_returns_initial() {
    assert_eq!(run(&Program::default(), 5.0).value, 5.0);
}

#[test]
fn gaps_are_skipped() {
    let mut p = program(vec![stmt("x += 1"), stmt("x += 10"), stmt("x += 100")]);
    p.clear_slot(1).unwrap();
    assert_eq!(p.len(), 3);
    assert_eq!(run(&p, 0.0).value, 101.0);
}

#[test]
fn statement_text_variants() {
    let p = program(vec![stmt("x++; x++"), stmt("x = x * x;"), stmt("x--")]);
    assert_eq!(run(&p, 1.0).value, 8.0);
    let p = program(vec![stmt("x = Math.pow(2, x)")]);
    assert_eq!(run(&p, 10.0).value, 1024.0);
    let p = program(vec![stmt("x = x > 12 ? x : factorial(x)")]);
    assert_eq!(run(&p, 5.0).value, 120.0);
    assert_eq!(run(&p, 13.0).value, 13.0);
    let p = program(vec![stmt("x = -x")]);
    assert_eq!(run(&p, 4.0).value, -4.0);
}

#[test]
fn factorial_domain() {
    let p = program(vec![stmt("x = factorial(x)")]);
    assert_eq!(run(&p, 0.0).value, 1.0);
    assert_eq!(run(&p, 6.0).value, 720.0);
    assert_eq!(run(&p, 171.0).value, f64::INFINITY);
    assert!(run(&p, -1.0).value.is_nan());
    assert!(run(&p, 2.5).value.is_nan());
}

#[test]
fn boolean_results_coerce_to_numbers() {
    let p = program(vec![stmt("x = x > 5")]);
    assert_eq!(run(&p, 6.0).value, 1.0);
    assert_eq!(run(&p, 2.0).value, 0.0);
    let p = program(vec![stmt("x = x && 7")]);
    assert_eq!(run(&p, 0.0).value, 0.0);
    assert_eq!(run(&p, 3.0).value, 7.0);
}

#[test]
fn division_follows_ieee() {
    let p = program(vec![stmt("x = 1 / x")]);
    assert_eq!(run(&p, 0.0).value, f64::INFINITY);
    let p = program(vec![stmt("x %= 0")]);
    assert!(run(&p, 3.0).value.is_nan());
}

// --- Degraded blocks ---

#[test]
fn malformed_statement_is_noop() {
    let p = program(vec![stmt("x += 1"), stmt("x += $"), stmt("x += 1")]);
    let outcome = run(&p, 0.0);
    assert_eq!(outcome.value, 2.0);
    assert_eq!(outcome.errors().count(), 1);
    let diagnostic = &outcome.diagnostics[0];
    assert_eq!(diagnostic.source.as_deref(), Some("x += $"));
    assert!(diagnostic.span.is_some());
}

#[test]
fn undefined_variable_is_noop() {
    let p = program(vec![stmt("x += i")]);
    let outcome = run(&p, 3.0);
    assert_eq!(outcome.value, 3.0);
    assert!(has_error(&outcome, |e| e.to_string().contains("undefined variable: i")));
}

#[test]
fn failed_instruction_discards_whole_statement() {
    let p = program(vec![stmt("x += 5; x += y")]);
    assert_eq!(run(&p, 1.0).value, 1.0);
}

// --- Print ---

#[test]
fn print_writes_x_and_keeps_it() {
    let p = program(vec![stmt("x = 2.5"), Block::print(), stmt("x = 4"), Block::print()]);
    let (outcome, output) = run_with_output(&p, 0.0);
    assert_eq!(outcome.value, 4.0);
    assert_eq!(output, "2.5\n4\n");
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn failed_print_is_reported_not_fatal() {
    let p = program(vec![Block::print(), stmt("x += 1")]);
    let outcome = interpreter::execute_program(&p, 0.0, &mut FailingWriter);
    assert_eq!(outcome.value, 1.0);
    assert!(has_error(&outcome, |e| matches!(e, RuntimeError::Output(_))));
}

// --- For loops ---

#[test]
fn for_loop_runs_condition_bound() {
    for n in [0.0, 1.0, 5.0, 37.0] {
        let mut p = Program::default();
        for_loop(&mut p, 0.0, &format!("i < {}", n), 1.0, vec![stmt("x += 1")]);
        assert_eq!(run(&p, 0.0).value, n);
    }
}

#[test]
fn for_loop_stops_at_iteration_cap() {
    let mut p = Program::default();
    for_loop(&mut p, 0.0, "i < 10001", 1.0, vec![stmt("x += 1")]);
    let outcome = run(&p, 0.0);
    assert_eq!(outcome.value, 10000.0);
    assert!(has_error(&outcome, |e| matches!(e, RuntimeError::IterationCap { cap: 10000, .. })));
}

#[test]
fn for_loop_at_cap_exactly_is_not_reported() {
    let mut p = Program::default();
    for_loop(&mut p, 0.0, "i < 10000", 1.0, vec![stmt("x += 1")]);
    let outcome = run(&p, 0.0);
    assert_eq!(outcome.value, 10000.0);
    assert!(!outcome.degraded());
}

#[test]
fn iteration_cap_is_configurable() {
    let mut p = Program::default();
    while_loop(&mut p, "true", vec![stmt("x += 1")]);
    let config = RunConfig::default().with_iteration_cap(25);
    let outcome = interpreter::execute_program_with_config(&p, 0.0, &mut io::sink(), &config);
    assert_eq!(outcome.value, 25.0);
}

#[test]
fn empty_body_still_iterates() {
    let mut p = Program::default();
    for_loop(&mut p, 0.0, "x < 10", 1.0, vec![]);
    let outcome = run(&p, 0.0);
    assert_eq!(outcome.value, 0.0);
    assert!(has_error(&outcome, |e| matches!(e, RuntimeError::IterationCap { .. })));
}

#[test]
fn condition_sees_current_x() {
    let mut p = Program::default();
    for_loop(&mut p, 0.0, "x < 20", 1.0, vec![stmt("x += 3")]);
    assert_eq!(run(&p, 0.0).value, 21.0);
}

#[test]
fn negative_increment_counts_down() {
    let mut p = Program::default();
    for_loop(&mut p, 10.0, "i > 0", -2.0, vec![Block::add_loop_variable()]);
    // 10 + 8 + 6 + 4 + 2
    assert_eq!(run(&p, 0.0).value, 30.0);
}

// --- Break ---

#[test]
fn break_keeps_effects_before_it() {
    let mut p = Program::default();
    for_loop(&mut p, 0.0, "i < 5", 1.0, vec![stmt("x += 1"), Block::break_loop(), stmt("x += 100")]);
    assert_eq!(run(&p, 0.0).value, 1.0);
}

#[test]
fn break_first_discards_everything() {
    let mut p = Program::default();
    for_loop(&mut p, 0.0, "i < 5", 1.0, vec![Block::break_loop(), stmt("x += 1")]);
    assert_eq!(run(&p, 0.0).value, 0.0);
}

#[test]
fn break_inside_if_stops_enclosing_loop() {
    let mut p = Program::default();
    let outer = for_loop(&mut p, 0.0, "i < 100", 1.0, vec![stmt("x += 1")]);
    let branch = p.push_child(Container::Body(outer), Block::if_else()).unwrap();
    p.attach_header(branch, HeaderBlock::condition("x >= 4")).unwrap();
    p.push_child(Container::Section(branch, SectionKind::If), Block::break_loop()).unwrap();
    assert_eq!(run(&p, 0.0).value, 4.0);
}

#[test]
fn break_only_stops_innermost_loop() {
    let mut p = Program::default();
    let outer = for_loop(&mut p, 0.0, "i < 3", 1.0, vec![]);
    let inner = p.push_child(Container::Body(outer), Block::while_loop()).unwrap();
    p.attach_header(inner, HeaderBlock::condition("true")).unwrap();
    p.push_child(Container::Body(inner), stmt("x += 1")).unwrap();
    p.push_child(Container::Body(inner), Block::break_loop()).unwrap();
    assert_eq!(run(&p, 0.0).value, 3.0);
}

#[test]
fn top_level_break_is_absorbed() {
    let p = program(vec![stmt("x += 1"), Block::break_loop(), stmt("x += 1")]);
    let outcome = run(&p, 0.0);
    assert_eq!(outcome.value, 2.0);
    assert_eq!(outcome.warnings().count(), 1);
    assert!(has_error(&outcome, |e| matches!(e, RuntimeError::BreakOutsideLoop)));
}

// --- While ---

#[test]
fn while_loop_runs_until_false() {
    let mut p = Program::default();
    while_loop(&mut p, "x < 100", vec![stmt("x *= 2")]);
    assert_eq!(run(&p, 3.0).value, 192.0);
}

#[test]
fn while_loop_can_read_enclosing_counter() {
    let mut p = Program::default();
    let outer = for_loop(&mut p, 1.0, "i <= 3", 1.0, vec![]);
    let inner = p.push_child(Container::Body(outer), Block::while_loop()).unwrap();
    p.attach_header(inner, HeaderBlock::condition("x < i * 10")).unwrap();
    p.push_child(Container::Body(inner), Block::add_loop_variable()).unwrap();
    // i = 1 climbs to 10, i = 2 to 20, i = 3 overshoots to 32
    assert_eq!(run(&p, 0.0).value, 32.0);
}

// --- If/else ---

#[test]
fn if_else_takes_exactly_one_branch() {
    let mut p = Program::default();
    if_else(&mut p, "x % 2 === 0", vec![stmt("x /= 2")], vec![stmt("x = 3 * x + 1")]);
    assert_eq!(run(&p, 10.0).value, 5.0);
    assert_eq!(run(&p, 5.0).value, 16.0);
}

#[test]
fn failed_condition_counts_as_false() {
    let mut p = Program::default();
    if_else(&mut p, "y > 1", vec![stmt("x = 1")], vec![stmt("x = 2")]);
    let outcome = run(&p, 0.0);
    assert_eq!(outcome.value, 2.0);
    assert!(outcome.degraded());
}

// --- Missing headers ---

#[test]
fn missing_header_is_noop() {
    let mut p = Program::default();
    let id = p.push_child(Container::Program, Block::for_loop()).unwrap();
    p.attach_header(id, HeaderBlock::init(0.0)).unwrap();
    p.attach_header(id, HeaderBlock::condition("i < 5")).unwrap();
    p.push_child(Container::Body(id), stmt("x += 1")).unwrap();
    let outcome = run(&p, 2.0);
    assert_eq!(outcome.value, 2.0);
    assert!(has_error(&outcome, |e| matches!(e, RuntimeError::MissingHeader { .. })));

    let mut p = Program::default();
    let id = p.push_child(Container::Program, Block::if_else()).unwrap();
    p.push_child(Container::Section(id, SectionKind::Else), stmt("x += 1")).unwrap();
    assert_eq!(run(&p, 2.0).value, 2.0);
}

// --- Loop variable scoping ---

#[test]
fn add_loop_variable_sums_counter() {
    let mut p = Program::default();
    for_loop(&mut p, 0.0, "i < 5", 1.0, vec![Block::add_loop_variable()]);
    assert_eq!(run(&p, 0.0).value, 10.0);
}

#[test]
fn add_loop_variable_outside_loop_is_noop() {
    let p = program(vec![Block::add_loop_variable()]);
    let outcome = run(&p, 4.0);
    assert_eq!(outcome.value, 4.0);
    assert!(has_error(&outcome, |e| matches!(e, RuntimeError::LoopVariableNotFound(_))));
}

#[test]
fn counter_is_gone_after_loop() {
    let mut p = Program::default();
    for_loop(&mut p, 0.0, "i < 3", 1.0, vec![]);
    p.push_child(Container::Program, Block::add_loop_variable()).unwrap();
    let outcome = run(&p, 1.0);
    assert_eq!(outcome.value, 1.0);
    assert!(has_error(&outcome, |e| matches!(e, RuntimeError::LoopVariableNotFound(_))));
}

#[test]
fn inner_counter_shadows_and_restores() {
    let mut p = Program::default();
    let outer = for_loop(&mut p, 100.0, "i < 102", 1.0, vec![]);
    let inner = p.push_child(Container::Body(outer), Block::for_loop()).unwrap();
    p.attach_header(inner, HeaderBlock::init(0.0)).unwrap();
    p.attach_header(inner, HeaderBlock::condition("i < 2")).unwrap();
    p.attach_header(inner, HeaderBlock::increment(1.0)).unwrap();
    p.push_child(Container::Body(inner), Block::add_loop_variable()).unwrap();
    // Outer counter is visible again once the inner loop ends
    p.push_child(Container::Body(outer), Block::add_loop_variable()).unwrap();
    // Per outer pass: inner adds 0 + 1, then the outer counter
    assert_eq!(run(&p, 0.0).value, (1.0 + 100.0) + (1.0 + 101.0));
}

#[test]
fn counter_scope_is_popped_after_break() {
    let mut p = Program::default();
    for_loop(&mut p, 5.0, "true", 1.0, vec![Block::break_loop()]);
    p.push_child(Container::Program, Block::add_loop_variable()).unwrap();
    let outcome = run(&p, 0.0);
    assert_eq!(outcome.value, 0.0);
    assert!(has_error(&outcome, |e| matches!(e, RuntimeError::LoopVariableNotFound(_))));
}

// --- Interruption ---

#[test]
fn cancelled_run_stops_with_last_completed_value() {
    let mut p = program(vec![stmt("x = 9")]);
    while_loop(&mut p, "true", vec![stmt("x += 1")]);
    let token = CancelToken::new();
    token.cancel();
    let config = RunConfig::default().with_cancel(token);
    let outcome = interpreter::execute_program_with_config(&p, 0.0, &mut io::sink(), &config);
    assert_eq!(outcome.interrupted, Some(Interrupted::Cancelled));
    assert_eq!(outcome.value, 9.0);
}

#[test]
fn time_limit_interrupts_nested_loops() {
    let mut p = Program::default();
    let outer = while_loop(&mut p, "true", vec![]);
    let inner = p.push_child(Container::Body(outer), Block::while_loop()).unwrap();
    p.attach_header(inner, HeaderBlock::condition("true")).unwrap();
    p.push_child(Container::Body(inner), stmt("x += 1")).unwrap();
    let config = RunConfig::default().with_time_limit(Duration::from_millis(20));
    let outcome = interpreter::execute_program_with_config(&p, 0.0, &mut io::sink(), &config);
    assert_eq!(outcome.interrupted, Some(Interrupted::TimedOut));
    assert_eq!(outcome.value, 0.0);
    assert!(has_error(&outcome, |e| matches!(e, RuntimeError::Interrupted(_))));
}

// --- Persistence and problems ---

#[test]
fn round_trip_preserves_behavior() {
    let mut p = Program::default();
    let outer = for_loop(&mut p, 0.0, "i < 4", 1.0, vec![stmt("x += 1")]);
    let branch = p.push_child(Container::Body(outer), Block::if_else()).unwrap();
    p.attach_header(branch, HeaderBlock::condition("x % 2 === 0")).unwrap();
    let inner = p
        .push_child(Container::Section(branch, SectionKind::If), Block::while_loop())
        .unwrap();
    p.attach_header(inner, HeaderBlock::condition("x < 50")).unwrap();
    p.push_child(Container::Body(inner), stmt("x *= 3")).unwrap();
    let stop = p.push_child(Container::Body(inner), Block::if_else()).unwrap();
    p.attach_header(stop, HeaderBlock::condition("x > 20")).unwrap();
    p.push_child(Container::Section(stop, SectionKind::If), Block::break_loop())
        .unwrap();
    p.push_child(Container::Section(branch, SectionKind::Else), Block::add_loop_variable())
        .unwrap();
    p.push_child(Container::Program, Block::print()).unwrap();

    let text = persist::to_toml(&p).unwrap();
    let restored = persist::from_toml(&text).unwrap();
    assert_eq!(persist::serialize(&restored), persist::serialize(&p));

    for input in -10..=10 {
        let input = f64::from(input);
        let (original, original_output) = run_with_output(&p, input);
        let (copy, copy_output) = run_with_output(&restored, input);
        assert_eq!(original.value, copy.value, "input {}", input);
        assert_eq!(original_output, copy_output, "input {}", input);
    }
}

#[test]
fn solving_a_problem() {
    let problem = Problem::new(2.0, 16.0);
    let mut p = problem.starting_program();
    p.push_child(Container::Program, stmt("x = x * x")).unwrap();
    assert!(!problem.is_solved(run(&p, problem.initial_value).value));
    p.push_child(Container::Program, stmt("x = x * x")).unwrap();
    assert!(problem.is_solved(run(&p, problem.initial_value).value));
}
