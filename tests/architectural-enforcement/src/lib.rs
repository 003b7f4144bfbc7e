//! Architectural Enforcement Integration Tests
//!
//! Source scanners shared by the tests in `tests/`:
//! - No blocking I/O or sleeps inside async functions
//! - No `unwrap()`/`expect()` in library production code
//!
//! Test modules (everything after the first `#[cfg(test)]`) are not scanned.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["assistant/core/src", "assistant/cli/src"];

/// A single offending line
#[derive(Debug, Clone)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub rule: &'static str,
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.rule,
            self.text
        )
    }
}

/// Workspace root, two levels above this crate
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .to_path_buf()
}

/// All `.rs` files under a workspace-relative directory
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    if !root.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Production lines of a file: 1-based number and the code before any `//`
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line)))
        .collect()
}

/// Whether the function enclosing line `idx` (0-based) is `async`
pub fn in_async_fn(lines: &[&str], idx: usize) -> bool {
    for line in lines[..=idx].iter().rev() {
        let line = line.trim_start();
        let line = line
            .strip_prefix("pub(crate) ")
            .or_else(|| line.strip_prefix("pub "))
            .unwrap_or(line);

        if line.starts_with("async fn ") {
            return true;
        }
        if line.starts_with("fn ") {
            return false;
        }
        if line.starts_with("mod ") || (line.starts_with("impl") && line.contains('{')) {
            return false;
        }
    }
    false
}

/// Scan every production file with `check`, collecting violations
pub fn scan<F>(dirs: &[&str], mut check: F) -> Vec<Violation>
where
    F: FnMut(&Path, &[&str], usize, &str) -> Option<&'static str>,
{
    let mut violations = Vec::new();

    for dir in dirs {
        for path in rust_files(dir) {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            let all: Vec<&str> = content.lines().collect();
            for (line_number, code) in production_lines(&content) {
                if let Some(rule) = check(&path, &all, line_number - 1, code) {
                    violations.push(Violation {
                        path: path.clone(),
                        line: line_number,
                        rule,
                        text: all[line_number - 1].trim().to_string(),
                    });
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let src = "fn a() {} // note\n#[cfg(test)]\nmod tests { fn b() { x.unwrap(); } }";
        let lines = production_lines(src);
        assert_eq!(lines, vec![(1, "fn a() {} ")]);
    }

    #[test]
    fn test_in_async_fn() {
        let lines = [
            "pub async fn run() {",
            "    work().await;",
            "}",
            "fn load() {",
            "    std::fs::read(p);",
            "}",
        ];
        assert!(in_async_fn(&lines, 1));
        assert!(!in_async_fn(&lines, 4));
    }
}
