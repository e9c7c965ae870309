//! Dead Code Enforcement
//!
//! Production code may not carry #[allow(dead_code)] attributes or call
//! `.unwrap()` outside its test module. Test code, test-only fixtures and the
//! `trawl-tests` crate itself are exempt.

use std::fs;
use std::path::{Path, PathBuf};

/// Kind of rule a violation broke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViolationKind {
    DeadCodeAllowance,
    Unwrap,
}

/// A violation found in production code
#[derive(Debug)]
struct Violation {
    kind: ViolationKind,
    file_path: String,
    line_number: usize,
    context: String,
}

impl Violation {
    fn new(kind: ViolationKind, file_path: &str, line_number: usize, context: &str) -> Self {
        Self {
            kind,
            file_path: file_path.to_string(),
            line_number,
            context: context.to_string(),
        }
    }
}

/// Checker for production code violations across the trawl crates
struct DeadCodeChecker {
    violations: Vec<Violation>,
    files_checked: usize,
}

impl DeadCodeChecker {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
            files_checked: 0,
        }
    }

    /// Find all Rust files in the trawl crates
    fn find_rust_files(&self) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let mut files = Vec::new();
        for entry in fs::read_dir("..")? {
            let path = entry?.path();
            let is_crate = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("trawl-"))
                .unwrap_or(false);

            if is_crate && path.is_dir() && !path.ends_with("trawl-tests") {
                Self::find_rust_files_recursive(&path, &mut files, 0)?;
            }
        }
        Ok(files)
    }

    fn find_rust_files_recursive(
        dir: &Path,
        files: &mut Vec<PathBuf>,
        depth: usize,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if depth > 10 {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();

            // Skip hidden directories and target directory
            if let Some(name) = path.file_name()
                && (name.to_string_lossy().starts_with('.') || name == "target")
            {
                continue;
            }

            if path.is_dir() {
                Self::find_rust_files_recursive(&path, files, depth + 1)?;
            } else if path.extension().map(|s| s == "rs").unwrap_or(false) {
                files.push(path);
            }
        }
        Ok(())
    }

    /// Check if a file path represents test code
    fn is_test_file(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase().replace('\\', "/");

        path_str.contains("/tests/")
            || path_str.contains("test_")
            || path_str.contains("_test")
            // Fixtures compiled only under cfg(test) or the test-utils feature
            || path_str.ends_with("/testing.rs")
            || path_str.ends_with("/providers/mock.rs")
    }

    /// Check the contents of one production file
    fn check_source(&mut self, file_path: &str, content: &str) {
        let mut in_test_module = false;

        for (line_number, line) in content.lines().enumerate() {
            let line_number = line_number + 1;
            let trimmed = line.trim();

            if trimmed.starts_with("#[cfg(test)]") {
                in_test_module = true;
            }

            if trimmed.contains("#[allow(") && trimmed.contains("dead_code") {
                self.violations.push(Violation::new(
                    ViolationKind::DeadCodeAllowance,
                    file_path,
                    line_number,
                    line,
                ));
            }

            if !in_test_module && !trimmed.starts_with("//") && trimmed.contains(".unwrap()") {
                self.violations.push(Violation::new(
                    ViolationKind::Unwrap,
                    file_path,
                    line_number,
                    line,
                ));
            }
        }
    }

    /// Check a single file for violations
    fn check_file(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if self.is_test_file(path) {
            return Ok(());
        }

        let content = fs::read_to_string(path)?;
        self.files_checked += 1;
        self.check_source(&path.to_string_lossy(), &content);

        Ok(())
    }

    /// Check all files in the trawl crates
    fn check_workspace(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let files = self.find_rust_files()?;

        for file in files {
            self.check_file(&file)?;
        }

        Ok(())
    }

    /// Report violations and return whether the check passed
    fn report_violations(&self) -> bool {
        if self.violations.is_empty() {
            println!(
                "Dead code enforcement: {} files checked, no violations found",
                self.files_checked
            );
            return true;
        }

        println!("Production code violations found:");
        println!();

        for violation in &self.violations {
            println!(
                "{}:{} ({:?})",
                violation.file_path, violation.line_number, violation.kind
            );
            println!("  {}", violation.context.trim());
            println!();
        }

        println!(
            "Found {} violation(s) in {} file(s) checked",
            self.violations.len(),
            self.files_checked
        );
        println!();
        println!("Unused code should be removed or used, not silenced.");
        println!("Fallible calls should propagate their error with `?`.");
        println!("Test modules and test-only fixtures are exempt from this check.");

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_test_file() {
        let checker = DeadCodeChecker::new();

        assert!(checker.is_test_file(Path::new(
            "../trawl-search/tests/provider_integration_tests.rs"
        )));
        assert!(checker.is_test_file(Path::new("../trawl-core/src/testing.rs")));
        assert!(checker.is_test_file(Path::new("../trawl-search/src/providers/mock.rs")));
        assert!(checker.is_test_file(Path::new("src/helper_test.rs")));

        assert!(!checker.is_test_file(Path::new("../trawl-search/src/lib.rs")));
        assert!(!checker.is_test_file(Path::new("../trawl-search/src/aggregator.rs")));
        assert!(!checker.is_test_file(Path::new("../trawl-search/src/providers/rarbg.rs")));
    }

    #[test]
    fn test_violation_detection() {
        let mut checker = DeadCodeChecker::new();
        let content = r#"
use std::collections::HashMap;

#[allow(dead_code)]
struct UnusedStruct {
    field: u32,
}

#[allow(clippy::missing_docs, dead_code)]
fn parse(input: &str) -> u32 {
    // input.parse().unwrap() would panic
    input.parse().unwrap()
}

#[cfg(test)]
mod tests {
    #[test]
    fn parses() {
        assert_eq!(super::parse("1"), "1".parse::<u32>().unwrap());
    }
}
"#;

        checker.check_source("example.rs", content);

        let found: Vec<_> = checker
            .violations
            .iter()
            .map(|v| (v.kind, v.line_number))
            .collect();
        assert_eq!(
            found,
            [
                (ViolationKind::DeadCodeAllowance, 4),
                (ViolationKind::DeadCodeAllowance, 9),
                (ViolationKind::Unwrap, 12),
            ]
        );
    }

    #[test]
    fn dead_code_enforcement() {
        let mut checker = DeadCodeChecker::new();

        checker
            .check_workspace()
            .expect("Failed to check workspace");

        assert!(checker.files_checked > 0, "No production files found");
        let passed = checker.report_violations();
        assert!(
            passed,
            "Production code violations found - see output above"
        );
    }
}
