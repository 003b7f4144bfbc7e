//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions in production code MUST NOT block the runtime.
//! **Required**: `tokio::fs`, `tokio::io`, `tokio::time::sleep`, async `reqwest`.
//!
//! Blocking calls in plain `fn`s (config loading before requests run) are allowed.

use architectural_enforcement::{in_async_fn, scan, PRODUCTION_DIRS};

#[test]
fn test_no_blocking_io_in_async_functions() {
    let violations = scan(PRODUCTION_DIRS, |_, lines, idx, code| {
        if !in_async_fn(lines, idx) {
            return None;
        }
        if code.contains("std::fs::") || code.contains("use std::fs") {
            Some("Blocking file I/O")
        } else if code.contains("std::net::") {
            Some("Blocking network I/O")
        } else if code.contains("std::io::stdin()") || code.contains("std::io::stdout()") {
            Some("Blocking stdin/stdout")
        } else {
            None
        }
    });

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking I/O inside async functions:");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use tokio::fs / tokio::io instead");

        panic!("Found {} blocking I/O violation(s)", violations.len());
    }
}

#[test]
fn test_no_blocking_http_or_sleep() {
    let violations = scan(PRODUCTION_DIRS, |_, _, _, code| {
        if code.contains("reqwest::blocking") {
            Some("Blocking HTTP client")
        } else if code.contains("std::thread::sleep") || code.contains("thread::sleep(") {
            Some("Thread sleep")
        } else {
            None
        }
    });

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking calls found in production code:");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use async reqwest and tokio::time::sleep / timeout");

        panic!("Found {} blocking call violation(s)", violations.len());
    }
}
