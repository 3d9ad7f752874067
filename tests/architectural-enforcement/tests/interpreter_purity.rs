//! Integration Test: Interpreter Purity
//!
//! **Policy**: The tool interpreter maps a tool call to a display descriptor
//! and nothing else. It MUST NOT perform I/O, touch the async runtime, log,
//! hold shared state, or read the environment, so the same call always yields
//! the same descriptor.

use architectural_enforcement::{report, workspace_root, SourceFile, Violation};

const INTERPRETER: &str = "coordinator/core/src/interpreter.rs";

const FORBIDDEN: &[(&str, &str)] = &[
    ("tokio", "Async runtime"),
    ("async ", "Async code"),
    ("std::fs", "File I/O"),
    ("std::io", "Stream I/O"),
    ("std::env", "Environment access"),
    ("tracing", "Logging"),
    ("println!", "Printing"),
    ("eprintln!", "Printing"),
    ("Mutex", "Shared state"),
    ("static mut", "Global state"),
    ("OnceLock", "Global state"),
    ("thread_local!", "Global state"),
];

#[test]
fn test_interpreter_is_pure() {
    let path = workspace_root().join(INTERPRETER);
    let source = SourceFile::read(&path)
        .unwrap_or_else(|| panic!("cannot read {}", path.display()));

    let violations: Vec<Violation> = FORBIDDEN
        .iter()
        .flat_map(|(needle, rule)| source.scan(rule, |_, _, code| code.contains(needle)))
        .collect();

    report(
        "Impure code found in the tool interpreter!",
        &violations,
        &["✅ Keep interpret() a function of its arguments; do effects in the coordinator"],
    );
}

#[test]
fn test_interpreter_only_depends_on_value_types() {
    let path = workspace_root().join(INTERPRETER);
    let source = SourceFile::read(&path)
        .unwrap_or_else(|| panic!("cannot read {}", path.display()));

    let crate_imports: Vec<String> = source
        .production_lines()
        .iter()
        .map(|line| line.trim())
        .filter(|line| line.starts_with("use crate::"))
        .map(ToString::to_string)
        .collect();

    for import in &crate_imports {
        assert!(
            import.starts_with("use crate::invocation::"),
            "interpreter must only import invocation value types, found: {import}"
        );
    }
}
