//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async code in the core and the replay binary MUST NOT use
//! blocking I/O.
//! **Required**: Use `tokio::fs`, `tokio::net`, `tokio::process`, not
//! `std::fs`, `std::net`, `std::process`.
//! **Acceptable**: Non-async functions (config loading before the runtime
//! starts) and test code.

use architectural_enforcement::{
    is_in_async_function, is_in_non_async_function, production_sources, report, Violation,
};

#[test]
fn test_no_blocking_io_in_production_code() {
    let violations = find_blocking_io_violations();

    report(
        "CRITICAL: Blocking I/O calls found in async code!",
        &violations,
        &[
            "❌ FORBIDDEN in async fns: std::fs, std::net, std::process::Command, reqwest::blocking",
            "✅ REQUIRED: tokio::fs::read_to_string().await and friends",
            "✅ ACCEPTABLE: non-async functions, test code",
        ],
    );
}

fn find_blocking_io_violations() -> Vec<Violation> {
    let mut violations = Vec::new();

    for source in production_sources() {
        violations.extend(source.scan("Blocking file I/O", |lines, idx, code| {
            (code.contains("std::fs::") || code.contains("use std::fs"))
                && !is_in_non_async_function(lines, idx)
        }));

        violations.extend(source.scan("Blocking network I/O", |lines, idx, code| {
            (code.contains("std::net::") || code.contains("use std::net"))
                && !is_in_non_async_function(lines, idx)
        }));

        violations.extend(source.scan("Blocking process I/O", |_, _, code| {
            code.contains("std::process::Command")
        }));

        violations.extend(source.scan("Blocking HTTP client", |_, _, code| {
            code.contains("reqwest::blocking")
        }));

        violations.extend(source.scan("Blocking stdin in async", |lines, idx, code| {
            code.contains("std::io::stdin()") && is_in_async_function(lines, idx)
        }));
    }

    violations
}
