//! Integration Test: Panic Prohibition in the Core Library
//!
//! **Policy**: `studyspace-core` production code propagates errors with `?`
//! and `StudyError`. `unwrap()`, `expect()` and `panic!` stay in tests.

use architectural_enforcement::scan;

#[test]
fn test_no_unwrap_in_core_production_code() {
    let violations = scan(&["assistant/core/src"], |_, _, _, code| {
        if code.contains(".unwrap()") {
            Some("unwrap()")
        } else if code.contains(".expect(") {
            Some("expect()")
        } else if code.contains("panic!(") {
            Some("panic!")
        } else {
            None
        }
    });

    if !violations.is_empty() {
        eprintln!("\n❌ Panicking calls in studyspace-core:");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Return a StudyError instead");

        panic!("Found {} panic violation(s)", violations.len());
    }
}
