//! Integration Test: Panic Prohibition
//!
//! **Policy**: Production code propagates errors with `?` or handles them.
//! `unwrap()` and `expect()` are allowed in test code only.

use architectural_enforcement::{production_sources, report, Violation};

#[test]
fn test_no_unwrap_in_production_code() {
    let violations: Vec<Violation> = production_sources()
        .iter()
        .flat_map(|source| {
            source.scan("Panicking unwrap", |_, _, code| {
                code.contains(".unwrap()") || code.contains(".expect(")
            })
        })
        .collect();

    report(
        "CRITICAL: unwrap()/expect() found in production code!",
        &violations,
        &[
            "✅ REQUIRED: propagate with ? (anyhow::Context in binaries, thiserror in the core)",
            "✅ ACCEPTABLE: unwrap_or, unwrap_or_else, unwrap_or_default",
        ],
    );
}

#[test]
fn test_no_sleep_in_production_code() {
    let violations: Vec<Violation> = production_sources()
        .iter()
        .flat_map(|source| {
            source.scan("Sleep call", |_, _, code| {
                code.contains("::sleep(") || code.contains(".sleep(")
            })
        })
        .collect();

    report(
        "CRITICAL: Sleep calls found in production code!",
        &violations,
        &["✅ REQUIRED: wait on the event stream (recv().await), never poll with sleep"],
    );
}
