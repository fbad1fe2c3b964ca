//! Integration Test: Streaming Discipline
//!
//! The streaming pipeline is cooperative and event-driven: the only
//! suspension points are awaiting the next body chunk and awaiting a
//! search response. Blocking inside async code stalls the whole surface.
//!
//! **Policy**: Production code in the assistant core MUST NOT use the
//! blocking HTTP client or sleep a thread inside async code.
//! **Required**: `reqwest` async APIs, `tokio::time` for delays.

use std::fs;
use std::path::{Path, PathBuf};

/// Directories containing production code, relative to the workspace root
const PRODUCTION_DIRS: &[&str] = &["assistant/core/src"];

/// Test that production code does not use the blocking HTTP client
#[test]
fn test_no_blocking_http_client() {
    let violations = find_violations(|code_part, lines, idx| {
        if code_part.contains("reqwest::blocking") && !is_in_test_function(lines, idx) {
            return Some("Blocking HTTP client".to_string());
        }
        None
    });

    assert!(
        violations.is_empty(),
        "\nFound {} blocking HTTP violation(s) in production code:\n{}\nUse the async reqwest client.",
        violations.len(),
        violations.join("\n")
    );
}

/// Test that async production code does not sleep the thread
#[test]
fn test_no_thread_sleep_in_async_code() {
    let violations = find_violations(|code_part, lines, idx| {
        if code_part.contains("thread::sleep")
            && is_in_async_function(lines, idx)
            && !is_in_test_function(lines, idx)
        {
            return Some("Thread sleep in async code".to_string());
        }
        None
    });

    assert!(
        violations.is_empty(),
        "\nFound {} thread-sleep violation(s) in async production code:\n{}\nUse tokio::time::sleep().await.",
        violations.len(),
        violations.join("\n")
    );
}

/// Scan every production source file with the given line check
fn find_violations(
    check: impl Fn(&str, &[&str], usize) -> Option<String>,
) -> Vec<String> {
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        let path = workspace_root().join(dir);
        if !path.exists() {
            panic!("production directory missing: {}", path.display());
        }

        for entry in walkdir::WalkDir::new(&path)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
                check_file(entry.path(), &check, &mut violations);
            }
        }
    }

    violations
}

fn check_file(
    path: &Path,
    check: &impl Fn(&str, &[&str], usize) -> Option<String>,
    violations: &mut Vec<String>,
) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return,
    };

    let lines: Vec<&str> = content.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        if let Some(kind) = check(code_part, &lines, idx) {
            violations.push(format!(
                "{}:{} - {}: {}",
                path.display(),
                idx + 1,
                kind,
                line.trim()
            ));
        }
    }
}

/// Workspace root, resolved from this package's manifest directory
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .expect("workspace root")
}

/// Check if line is inside a test function
fn is_in_test_function(lines: &[&str], current_idx: usize) -> bool {
    // Scan backwards to find the enclosing function
    let mut found_fn_idx = None;
    for i in (0..current_idx).rev() {
        let line = lines[i].trim();

        if line.starts_with("fn ") || line.contains(" fn ") {
            found_fn_idx = Some(i);
            break;
        }

        // Stop at module boundaries
        if line.starts_with("mod ") || (line.starts_with("impl ") && line.contains('{')) {
            // a #[cfg(test)] module is all test code
            return lines[..=i]
                .iter()
                .rev()
                .take(2)
                .any(|l| l.trim().starts_with("#[cfg(test)]"));
        }
    }

    // If we found a function, check if it has a test marker
    if let Some(fn_idx) = found_fn_idx {
        for i in (0..fn_idx).rev() {
            let line = lines[i].trim();

            if line.starts_with("#[test]")
                || line.starts_with("#[tokio::test")
                || line.starts_with("#[cfg(test)]")
            {
                return true;
            }

            // Stop if we hit another function or boundary
            if line.starts_with("fn ") || line.starts_with("mod ") || line.starts_with("impl ") {
                break;
            }
        }
        // Fall back: inside a #[cfg(test)] module anywhere above
        return lines[..fn_idx]
            .iter()
            .any(|l| l.trim().starts_with("#[cfg(test)]"));
    }

    false
}

/// Check if line is inside an async function
fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    for i in (0..current_idx).rev() {
        let line = lines[i].trim();

        if line.contains("async fn ") {
            return true;
        }

        if line.starts_with("fn ") && !line.contains("async") {
            return false;
        }

        // Stop at module/impl boundaries
        if line.starts_with("mod ") || (line.starts_with("impl ") && line.contains('{')) {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_function_detection() {
        let test_code = vec![
            "async fn bad_function() {",
            "    std::thread::sleep(Duration::from_secs(1));",
            "}",
        ];
        assert!(is_in_async_function(&test_code, 1), "Should detect async function");
    }

    #[test]
    fn test_test_function_detection() {
        let test_code = vec![
            "#[test]",
            "fn test_something() {",
            "    std::thread::sleep(Duration::from_millis(5));",
            "}",
        ];
        assert!(is_in_test_function(&test_code, 2), "Should detect test function");
    }

    #[test]
    fn test_plain_function_is_not_async() {
        let test_code = vec!["fn helper() {", "    thread::sleep(d);", "}"];
        assert!(!is_in_async_function(&test_code, 1));
    }
}
