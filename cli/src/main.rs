mod program_file;
mod test_runner;

use std::path::Path;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic as Report, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use blocks::block::Block;
use blocks::block::header::format_number;
use blocks::catalog::{self, Item};
use blocks::persist::{self, ProgramRecord};
use blocks::program::Program;
use blocks::{BlockKind, Problem};
use interpreter::Diagnostic;

use crate::program_file::ProgramFile;

#[derive(Parser)]
#[command(name = "blocks", version, about = "Block program interpreter")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log interpreter events at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program file
    Run(RunArgs),

    /// Run .test.toml test files
    Test(TestArgs),

    /// List the block palette
    Catalog(CatalogArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// TOML program file to execute
    file: String,

    /// Starting value of x (defaults to the problem's, or 0)
    #[arg(long, allow_negative_numbers = true)]
    initial: Option<f64>,

    /// Value the program should reach (defaults to the problem's)
    #[arg(long, allow_negative_numbers = true)]
    target: Option<f64>,

    /// Iterations allowed per loop
    #[arg(long)]
    iteration_cap: Option<u64>,

    /// Abort the run after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Parse only, don't execute (exit 0 if every block's text is valid)
    #[arg(long)]
    check: bool,

    /// Dump the block tree
    #[arg(long)]
    ast: bool,

    /// Suppress print output (just report the result)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.toml file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

#[derive(clap::Args)]
struct CatalogArgs {
    /// Print the persisted form of one entry
    #[arg(long)]
    show: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
        Command::Catalog(catalog_args) => do_catalog(catalog_args),
    }
}

/// Install a stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let file = match ProgramFile::load(Path::new(&args.file)) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    let program = file.program();
    tracing::debug!(file = %args.file, blocks = program.block_count(), "loaded program");

    // --check: report every block whose text does not parse
    if args.check {
        let invalid = emit_parse_errors(&writer, &config, &program);
        if invalid > 0 {
            eprintln!("error: {} block(s) in {} do not parse", invalid, args.file);
            process::exit(1);
        }
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    // --ast: dump the block tree
    if args.ast {
        println!("{:#?}", program);
        return;
    }

    let mut run_config = file.limits.run_config();
    if let Some(cap) = args.iteration_cap {
        run_config = run_config.with_iteration_cap(cap);
    }
    if let Some(ms) = args.timeout_ms {
        run_config = run_config.with_time_limit(Duration::from_millis(ms));
    }

    let initial = file.initial_value(args.initial);
    let outcome = if args.quiet {
        let mut sink = std::io::sink();
        interpreter::execute_program_with_config(&program, initial, &mut sink, &run_config)
    } else {
        let mut stdout = std::io::stdout();
        interpreter::execute_program_with_config(&program, initial, &mut stdout, &run_config)
    };

    emit_diagnostics(&writer, &config, &outcome.diagnostics);
    println!("x = {}", format_number(outcome.value));

    if outcome.interrupted.is_some() {
        process::exit(1);
    }

    let problem = match (args.target, &file.problem) {
        (Some(target), Some(problem)) => Some(Problem {
            target_value: Some(target),
            ..problem.clone()
        }),
        (Some(target), None) => Some(Problem::new(initial, target)),
        (None, problem) => problem.clone(),
    };
    if let Some(problem) = problem.filter(|p| p.target_value.is_some()) {
        if problem.is_solved(outcome.value) {
            eprintln!("solved");
        } else {
            eprintln!(
                "not solved: expected {}",
                problem.target_value.map(format_number).unwrap_or_default()
            );
            process::exit(1);
        }
    }
}

fn do_catalog(args: CatalogArgs) {
    let Some(id) = args.show else {
        for entry in catalog::entries() {
            println!("{:<16} {:<16} {}", entry.id, entry.name, entry.description);
        }
        return;
    };

    match catalog::create(&id) {
        Some(Item::Block(block)) => {
            let record = ProgramRecord {
                slots: vec![persist::serialize_block(&block)],
            };
            match toml::to_string(&record) {
                Ok(text) => print!("{}", text),
                Err(e) => {
                    eprintln!("error: {}", e);
                    process::exit(1);
                }
            }
        }
        Some(Item::Header(header)) => println!("{} header: {}", header.kind(), header.label()),
        None => {
            eprintln!("error: no catalog entry '{}'", id);
            process::exit(1);
        }
    }
}

/// Emit a codespan report for every statement or condition that failed to
/// parse. Returns how many were found.
fn emit_parse_errors(writer: &StandardStream, config: &term::Config, program: &Program) -> usize {
    let mut files = SimpleFiles::new();
    let mut reports = Vec::new();

    let mut check = |block: &Block| {
        let name = format!("block {}", block.id());
        if let BlockKind::Statement(code) = &block.kind {
            if let Err(error) = code.parsed() {
                let file_id = files.add(name.clone(), code.source().to_string());
                reports.push(error.to_diagnostic(file_id));
            }
        }
        if let Some(condition) = block.as_compound().and_then(|c| c.headers().condition.as_ref()) {
            if let Err(error) = condition.code.parsed() {
                let file_id = files.add(name, condition.code.source().to_string());
                reports.push(error.to_diagnostic(file_id));
            }
        }
    };
    for block in program.blocks() {
        block.walk(&mut check);
    }

    for report in &reports {
        let _ = term::emit_to_write_style(&mut writer.lock(), config, &files, report);
    }
    reports.len()
}

fn emit_diagnostic(writer: &StandardStream, config: &term::Config, diagnostic: &Diagnostic) {
    if let (Some(source), Some(span)) = (&diagnostic.source, &diagnostic.span) {
        let severity = if diagnostic.is_warning {
            Severity::Warning
        } else {
            Severity::Error
        };
        let name = diagnostic
            .block
            .map(|id| format!("block {}", id))
            .unwrap_or_else(|| "block".to_string());
        let mut files = SimpleFiles::new();
        let file_id = files.add(name, source.clone());
        let report = Report::new(severity)
            .with_message(diagnostic.to_string())
            .with_labels(vec![Label::primary(file_id, span.clone())]);
        let _ = term::emit_to_write_style(&mut writer.lock(), config, &files, &report);
    } else {
        let prefix = if diagnostic.is_warning {
            "warning"
        } else {
            "runtime error"
        };
        match diagnostic.block {
            Some(id) => eprintln!("{}: {} (block {})", prefix, diagnostic, id),
            None => eprintln!("{}: {}", prefix, diagnostic),
        }
    }
}

fn emit_diagnostics(writer: &StandardStream, config: &term::Config, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        emit_diagnostic(writer, config, diagnostic);
    }
}
