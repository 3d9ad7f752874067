//! Architectural Enforcement
//!
//! Source scanners shared by the integration tests in `tests/`. Each test walks
//! the production sources of the workspace and reports lines that break one
//! rule:
//! - no blocking I/O inside async code
//! - the tool interpreter stays pure
//! - no `unwrap()` or `expect()` outside tests
//!
//! The scanners are line based. Everything from the first `#[cfg(test)]` in a
//! file onward is treated as test code and skipped.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["coordinator/core/src", "coordinator/replay/src"];

/// Workspace root, resolved from this package's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// One offending line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub rule: &'static str,
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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

/// A production source file, cut off at its test module
pub struct SourceFile {
    pub path: PathBuf,
    content: String,
}

impl SourceFile {
    pub fn read(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        Some(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Lines before the first `#[cfg(test)]`
    pub fn production_lines(&self) -> Vec<&str> {
        production_lines(&self.content)
    }

    /// Report every production line whose code part matches `is_violation`
    pub fn scan<F>(&self, rule: &'static str, is_violation: F) -> Vec<Violation>
    where
        F: Fn(&[&str], usize, &str) -> bool,
    {
        let lines = self.production_lines();
        lines
            .iter()
            .enumerate()
            .filter(|(idx, line)| is_violation(&lines, *idx, code_part(line)))
            .map(|(idx, line)| Violation {
                path: self.path.clone(),
                line: idx + 1,
                rule,
                text: line.trim().to_string(),
            })
            .collect()
    }
}

/// Every `.rs` file under the production directories
pub fn production_sources() -> Vec<SourceFile> {
    let root = workspace_root();
    PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| rust_files(&root.join(dir)))
        .filter_map(|path| SourceFile::read(&path))
        .collect()
}

/// Every `.rs` file under `dir`; empty if the directory is missing
pub fn rust_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|entry| entry.into_path())
        .collect()
}

pub fn production_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .take_while(|line| !line.trim_start().starts_with("#[cfg(test)]"))
        .collect()
}

/// The line without its trailing comment
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Whether `line` opens a function, and if so whether it is async
fn function_header(line: &str) -> Option<bool> {
    let mut rest = line.trim_start();
    for visibility in ["pub(crate) ", "pub(super) ", "pub "] {
        if let Some(stripped) = rest.strip_prefix(visibility) {
            rest = stripped;
            break;
        }
    }

    if rest.starts_with("async fn ") {
        Some(true)
    } else if rest.starts_with("fn ") || rest.starts_with("const fn ") {
        Some(false)
    } else {
        None
    }
}

/// Async-ness of the function enclosing `current_idx`, if one is found before
/// a module or impl boundary
fn enclosing_function(lines: &[&str], current_idx: usize) -> Option<bool> {
    for i in (0..current_idx).rev() {
        if let Some(is_async) = function_header(lines[i]) {
            return Some(is_async);
        }

        let line = lines[i].trim();
        if line.starts_with("mod ") || (line.starts_with("impl") && line.contains('{')) {
            return None;
        }
    }
    None
}

/// Check if line is inside an async function
pub fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    enclosing_function(lines, current_idx) == Some(true)
}

/// Check if line is inside a non-async function (acceptable for blocking I/O)
pub fn is_in_non_async_function(lines: &[&str], current_idx: usize) -> bool {
    enclosing_function(lines, current_idx) == Some(false)
}

/// Print the violations and fail the test
pub fn report(title: &str, violations: &[Violation], advice: &[&str]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    eprintln!();
    for line in advice {
        eprintln!("  {line}");
    }

    panic!(
        "\nFound {} violation(s) in production code.\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_function_detection() {
        let code = vec![
            "pub async fn bad_function() {",
            "    let contents = std::fs::read_to_string(\"file.txt\")?;",
            "}",
        ];

        assert!(is_in_async_function(&code, 1));
        assert!(!is_in_non_async_function(&code, 1));
    }

    #[test]
    fn test_non_async_function_detection() {
        let code = vec![
            "fn load<F>(path: PathBuf, env: F) -> Result<Config, Error>",
            "where",
            "    F: Fn(&str) -> Option<String>,",
            "{",
            "    let contents = std::fs::read_to_string(path)?;",
            "}",
        ];

        assert!(is_in_non_async_function(&code, 4));
    }

    #[test]
    fn test_impl_boundary_stops_scan() {
        let code = vec!["async fn before() {}", "impl Thing {", "    const X: u8 = 1;"];

        assert!(!is_in_async_function(&code, 2));
        assert!(!is_in_non_async_function(&code, 2));
    }

    #[test]
    fn test_test_module_is_cut_off() {
        let content = "fn real() {}\n\n#[cfg(test)]\nmod tests {\n    fn helper() { x.unwrap(); }\n}\n";

        assert_eq!(production_lines(content), vec!["fn real() {}", ""]);
    }

    #[test]
    fn test_code_part_drops_comments() {
        assert_eq!(code_part("let x = 1; // std::fs::read"), "let x = 1; ");
        assert_eq!(code_part("/// uses std::fs"), "");
    }

    #[test]
    fn test_workspace_root_holds_production_dirs() {
        let root = workspace_root();
        for dir in PRODUCTION_DIRS {
            assert!(root.join(dir).exists(), "missing {dir}");
        }
    }
}
