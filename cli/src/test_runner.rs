use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use blocks::block::header::format_number;
use interpreter::Diagnostic;

use crate::program_file::ProgramFile;

#[derive(Debug, Deserialize)]
pub struct ExpectedDiagnostic {
    /// Substring that must appear in the diagnostic message.
    pub contains: String,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Starting value of x. Falls back to the problem's initial value, then 0.
    #[serde(default)]
    pub initial: Option<f64>,

    /// Expected final value of x. `nan` matches NaN.
    #[serde(default)]
    pub expect_value: Option<f64>,

    /// Expected print output (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Whether the final value should solve the file's `[problem]`.
    #[serde(default)]
    pub expect_solved: Option<bool>,

    /// Whether the run should be cut short by its limits.
    #[serde(default)]
    pub expect_interrupted: Option<bool>,

    /// Expected diagnostics, in order. If present (even empty), the count
    /// and each message are checked.
    #[serde(default)]
    pub expect_diagnostics: Option<Vec<ExpectedDiagnostic>>,

    #[serde(flatten)]
    pub file: ProgramFile,
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    // 1. Read and parse the file
    let config: TestConfig = match std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read file: {}", e))
        .and_then(|content| {
            toml::from_str(&content).map_err(|e| format!("TOML parse error: {}", e))
        }) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(e),
            };
        }
    };

    let description = config.description.clone();
    let outcome = match check_test(&config) {
        Some(reason) => TestOutcome::Fail(reason),
        None => TestOutcome::Pass,
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Run the test's program and compare it against every expectation.
/// Returns `Some(reason)` on the first mismatch.
fn check_test(config: &TestConfig) -> Option<String> {
    let program = config.file.program();
    let initial = config.file.initial_value(config.initial);
    let run_config = config.file.limits.run_config();

    let mut output_buf = Vec::new();
    let outcome =
        interpreter::execute_program_with_config(&program, initial, &mut output_buf, &run_config);

    if let Some(expected) = config.expect_value {
        let actual = outcome.value;
        if !(actual == expected || (actual.is_nan() && expected.is_nan())) {
            return Some(format!(
                "value mismatch\n  expected: {}\n  actual:   {}",
                format_number(expected),
                format_number(actual)
            ));
        }
    }

    if let Some(expected_output) = &config.expect_output {
        let actual = String::from_utf8_lossy(&output_buf);
        let actual_trimmed = actual.trim();
        let expected_trimmed = expected_output.trim();
        if actual_trimmed != expected_trimmed {
            return Some(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected_trimmed, actual_trimmed
            ));
        }
    }

    if let Some(expected_solved) = config.expect_solved {
        let Some(problem) = &config.file.problem else {
            return Some("expect_solved needs a [problem] table".to_string());
        };
        let solved = problem.is_solved(outcome.value);
        if solved != expected_solved {
            return Some(format!(
                "expected solved = {}, got {} (x = {})",
                expected_solved,
                solved,
                format_number(outcome.value)
            ));
        }
    }

    if let Some(expected_interrupted) = config.expect_interrupted {
        if outcome.interrupted.is_some() != expected_interrupted {
            return Some(format!(
                "expected interrupted = {}, got {:?}",
                expected_interrupted, outcome.interrupted
            ));
        }
    }

    if let Some(expected) = &config.expect_diagnostics {
        return check_diagnostics(&outcome.diagnostics, expected);
    }

    None
}

/// Check that actual diagnostics match expectations. Returns `Some(reason)` on mismatch.
fn check_diagnostics(actual: &[Diagnostic], expected: &[ExpectedDiagnostic]) -> Option<String> {
    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual.iter().map(|d| format!("  - {}", d)).collect();
        return Some(format!(
            "expected {} diagnostic(s), got {}\n  actual diagnostics:\n{}",
            expected.len(),
            actual.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected.iter()).enumerate() {
        let msg = actual.to_string();
        if !msg.contains(&expected.contains) {
            return Some(format!(
                "diagnostic[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }
    }

    None
}

/// Discover `.test.toml` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".test.toml") {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

fn category_name(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.toml files found in {}", path.display());
        return;
    }
    for (category, files) in &categories {
        eprintln!("{:<24} {} test(s)", category_name(category), files.len());
    }
}

/// ANSI styling for the test report, disabled by `--no-color`.
#[derive(Clone, Copy)]
struct Palette {
    enabled: bool,
}

impl Palette {
    const GREEN: &'static str = "32";
    const RED: &'static str = "31";
    const BOLD: &'static str = "1";

    fn paint(self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }
}

impl TestResult {
    /// The description, or the file stem when there is none.
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(".test.toml"))
                .unwrap_or("?")
        })
    }
}

/// Run all `.test.toml` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { enabled: !no_color };
    let single_file = path.is_file();

    let selected = if single_file {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let discovered = discover_categorized(path);
        if discovered.is_empty() {
            eprintln!("no .test.toml files found in {}", path.display());
            return 1;
        }
        select_categories(discovered, categories)
    };
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures = Vec::new();
    for (category, files) in &selected {
        if !single_file {
            eprintln!("\n{}", palette.paint(Palette::BOLD, category_name(category)));
        }
        for result in files.iter().map(|file| run_single_test(file)) {
            if let TestOutcome::Fail(_) = result.outcome {
                eprintln!("  {}  {}", palette.paint(Palette::RED, "FAIL"), result.label());
                failures.push(result);
            } else {
                eprintln!("  {}  {}", palette.paint(Palette::GREEN, "PASS"), result.label());
                passed += 1;
            }
        }
    }

    for failure in &failures {
        if let TestOutcome::Fail(reason) = &failure.outcome {
            eprintln!("\n  --- {} ---", failure.path.display());
            for line in reason.lines() {
                eprintln!("  {}", line);
            }
        }
    }

    let total = passed + failures.len();
    if failures.is_empty() {
        eprintln!("\n{}: {} of {} passed", palette.paint(Palette::GREEN, "ok"), passed, total);
        0
    } else {
        eprintln!(
            "\n{}: {} of {} failed",
            palette.paint(Palette::RED, "FAILED"),
            failures.len(),
            total
        );
        1
    }
}

/// Keep the requested categories and their subcategories. Unknown names are
/// reported and skipped.
fn select_categories(
    discovered: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    if requested.is_empty() {
        return discovered;
    }

    let mut selected = BTreeMap::new();
    for name in requested.iter().map(|r| r.trim_matches('/')) {
        let prefix = format!("{}/", name);
        let matching: Vec<_> = discovered
            .iter()
            .filter(|(category, _)| category.as_str() == name || category.starts_with(&prefix))
            .collect();
        if matching.is_empty() {
            let known: Vec<&str> = discovered.keys().map(|k| category_name(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                name,
                known.join(", ")
            );
        }
        for (category, files) in matching {
            selected.insert(category.clone(), files.clone());
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn passes(path: &Path) -> bool {
        matches!(run_single_test(path).outcome, TestOutcome::Pass)
    }

    fn failure(path: &Path) -> String {
        match run_single_test(path).outcome {
            TestOutcome::Fail(reason) => reason,
            TestOutcome::Pass => panic!("expected {} to fail", path.display()),
        }
    }

    const LOOP_TEST: &str = r#"
description = "sum of counters"
initial = 0
expect_value = 10
expect_diagnostics = []

[[slots]]
kind = "for"
init = 0
condition = "i < 5"
increment = 1

[[slots.body]]
kind = "add_loop_variable"
"#;

    #[test]
    fn passing_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "loop.test.toml", LOOP_TEST);
        assert!(passes(&path));
    }

    #[test]
    fn value_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let content = LOOP_TEST.replace("expect_value = 10", "expect_value = 11");
        let path = write(dir.path(), "loop.test.toml", &content);
        assert!(failure(&path).contains("value mismatch"));
    }

    #[test]
    fn output_and_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "print.test.toml",
            r#"
initial = 3
expect_output = "3\n3"
expect_diagnostics = [{ contains = "break outside of a loop" }]

[[slots]]
kind = "print"

[[slots]]
kind = "break"

[[slots]]
kind = "print"
"#,
        );
        assert!(passes(&path));
    }

    #[test]
    fn diagnostic_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "bad.test.toml",
            r#"
expect_diagnostics = []

[[slots]]
kind = "statement"
text = "x += y"
"#,
        );
        assert!(failure(&path).contains("expected 0 diagnostic(s), got 1"));
    }

    #[test]
    fn problem_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "problem.test.toml",
            r#"
expect_solved = true
expect_interrupted = false

[problem]
initial_value = 1
target_value = 64

[limits]
iteration_cap = 6

[[slots]]
kind = "while"
condition = "true"

[[slots.body]]
kind = "statement"
text = "x *= 2"
"#,
        );
        assert!(passes(&path));
    }

    #[test]
    fn expect_solved_without_problem_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "p.test.toml", "expect_solved = true\n");
        assert!(failure(&path).contains("[problem]"));
    }

    #[test]
    fn malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "broken.test.toml", "slots = 3\n");
        assert!(failure(&path).contains("TOML parse error"));
    }

    #[test]
    fn discovers_categories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.test.toml", LOOP_TEST);
        write(dir.path(), "loops/a.test.toml", LOOP_TEST);
        write(dir.path(), "loops/nested/b.test.toml", LOOP_TEST);
        write(dir.path(), "loops/readme.txt", "not a test");

        let categories = discover_categorized(dir.path());
        let names: Vec<&str> = categories.keys().map(String::as_str).collect();
        assert_eq!(names, ["", "loops", "loops/nested"]);

        let selected = select_categories(categories, &["loops".to_string()]);
        assert_eq!(selected.len(), 2);
        assert_eq!(run_tests(dir.path(), true, &["loops".to_string()]), 0);
    }
}
