// src/analyzer.rs
// Static code metadata extraction: language sniffing, structural counts,
// complexity hints. Pure text analysis, no state, never fails.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdef\s+\w+|function\s+\w+|\bfn\s+\w+").unwrap());

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bclass\s+\w+").unwrap());

/// Line count above which a snippet is flagged as large
const LARGE_BLOCK_LINES: usize = 50;

/// Loop constructs above this count trigger a hint
const LOOP_HINT_THRESHOLD: usize = 3;

/// Conditional constructs above this count trigger a hint
const BRANCH_HINT_THRESHOLD: usize = 5;

/// Structural summary of a code snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeReport {
    pub language: String,
    pub line_count: usize,
    pub function_count: usize,
    pub class_count: usize,
    pub complexity_hints: Vec<String>,
}

impl fmt::Display for CodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hints = if self.complexity_hints.is_empty() {
            "Simple structure".to_string()
        } else {
            self.complexity_hints.join(", ")
        };
        write!(
            f,
            "Code Analysis:\n\
             - Language: {}\n\
             - Lines: {}\n\
             - Functions: {}\n\
             - Classes: {}\n\
             - Complexity hints: {}",
            self.language, self.line_count, self.function_count, self.class_count, hints
        )
    }
}

/// Guess the language from common surface patterns. Closed set; anything
/// unrecognized is "unknown".
fn detect_language(code: &str) -> &'static str {
    if code.contains("def ") || code.contains("import ") || code.contains("class ") {
        "Python"
    } else if code.contains("function")
        || code.contains("const ")
        || code.contains("let ")
        || code.contains("=>")
    {
        "JavaScript"
    } else if code.contains("public class") || code.contains("private ") || code.contains("void ") {
        "Java"
    } else if code.contains("#include") || code.contains("int main") {
        "C/C++"
    } else if code.contains("fn ") || code.contains("impl ") {
        "Rust"
    } else {
        "unknown"
    }
}

/// Analyze a code snippet and return its structural summary
pub fn analyze(code: &str) -> CodeReport {
    let line_count = code.trim().lines().count();

    let function_count = FUNCTION_RE.find_iter(code).count();
    let class_count = CLASS_RE.find_iter(code).count();

    let loop_count = code.matches("for ").count() + code.matches("while ").count();
    let branch_count = code.matches("if ").count();

    let mut complexity_hints = Vec::new();
    if line_count > LARGE_BLOCK_LINES {
        complexity_hints.push(format!("Large code block (>{} lines)", LARGE_BLOCK_LINES));
    }
    if loop_count > LOOP_HINT_THRESHOLD {
        complexity_hints.push("Multiple loops detected".to_string());
    }
    if branch_count > BRANCH_HINT_THRESHOLD {
        complexity_hints.push("High branching complexity".to_string());
    }

    CodeReport {
        language: detect_language(code).to_string(),
        line_count,
        function_count,
        class_count,
        complexity_hints,
    }
}

/// Whether an input looks code-like enough to be worth analyzing.
/// Length must clear a minimal threshold and a code-indicating keyword must
/// be present.
pub fn needs_analysis(input: &str) -> bool {
    const MIN_LEN: usize = 20;
    let lower = input.to_lowercase();
    input.len() > MIN_LEN
        && ["def ", "function", "class "]
            .iter()
            .any(|kw| lower.contains(kw))
}
