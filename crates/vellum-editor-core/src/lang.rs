//! Code block languages and best-effort language detection.
//!
//! The language set is closed: anything a caller passes that is not on the
//! list resolves to plaintext, so a "bad language" state cannot exist in the
//! document. Detection is a heuristic prefix scan over the whole sample in a
//! fixed priority order; the first matching family wins and nothing ever
//! fails (the fallback is plaintext).

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Languages a code block can be tagged with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    #[default]
    Plaintext,
    Typescript,
    Javascript,
    Python,
    Sql,
    Shell,
    Json,
    Html,
    Css,
    Rust,
    Go,
    Yaml,
    Markdown,
}

impl CodeLanguage {
    /// Every supported language, in display order.
    pub const ALL: &'static [CodeLanguage] = &[
        CodeLanguage::Plaintext,
        CodeLanguage::Typescript,
        CodeLanguage::Javascript,
        CodeLanguage::Python,
        CodeLanguage::Sql,
        CodeLanguage::Shell,
        CodeLanguage::Json,
        CodeLanguage::Html,
        CodeLanguage::Css,
        CodeLanguage::Rust,
        CodeLanguage::Go,
        CodeLanguage::Yaml,
        CodeLanguage::Markdown,
    ];

    /// Canonical token, as used in `language-<token>` class names and
    /// `data-language` attributes.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Plaintext => "plaintext",
            Self::Typescript => "typescript",
            Self::Javascript => "javascript",
            Self::Python => "python",
            Self::Sql => "sql",
            Self::Shell => "shell",
            Self::Json => "json",
            Self::Html => "html",
            Self::Css => "css",
            Self::Rust => "rust",
            Self::Go => "go",
            Self::Yaml => "yaml",
            Self::Markdown => "markdown",
        }
    }

    /// Resolve a raw token to a language, case-insensitively.
    ///
    /// Common fence aliases (`js`, `ts`, `py`, `sh`, `bash`, ...) resolve to
    /// their canonical language. Unknown tokens fall back to plaintext.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "plaintext" | "text" | "txt" => Self::Plaintext,
            "typescript" | "ts" | "tsx" => Self::Typescript,
            "javascript" | "js" | "jsx" => Self::Javascript,
            "python" | "py" => Self::Python,
            "sql" => Self::Sql,
            "shell" | "sh" | "bash" | "zsh" => Self::Shell,
            "json" => Self::Json,
            "html" => Self::Html,
            "css" => Self::Css,
            "rust" | "rs" => Self::Rust,
            "go" | "golang" => Self::Go,
            "yaml" | "yml" => Self::Yaml,
            "markdown" | "md" => Self::Markdown,
            _ => Self::Plaintext,
        }
    }
}

impl fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// === Detection ===

const TS_JS_KEYWORDS: &[&str] = &[
    "import",
    "export",
    "const",
    "let",
    "var",
    "function",
    "class",
    "interface",
    "type",
];

const PYTHON_PREFIXES: &[&str] = &["def ", "class ", "import ", "from ", "async def ", "print("];

const SQL_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "create", "alter", "drop", "with",
];

const SHELL_COMMANDS: &[&str] = &["npm", "yarn", "pnpm", "git", "cd", "ls", "mkdir", "echo"];

fn arrow_fn_pattern() -> &'static Regex {
    static RE_ARROW: OnceLock<Regex> = OnceLock::new();
    RE_ARROW.get_or_init(|| Regex::new(r"(\)|\w)\s*=>").unwrap())
}

fn css_pattern() -> &'static Regex {
    static RE_CSS: OnceLock<Regex> = OnceLock::new();
    // At-rules, selector-brace openings, or characteristic property values.
    RE_CSS.get_or_init(|| {
        Regex::new(r"(?m)^\s*@[a-zA-Z-]+|^\s*[^{}\s][^{}\n]*\{|:\s*#[0-9a-fA-F]{3,8}\b|:\s*rgba?\(|:\s*\d+px\b")
            .unwrap()
    })
}

/// Does the sample start with `word` as a whole word?
fn starts_with_word(sample: &str, word: &str) -> bool {
    match sample.strip_prefix(word) {
        Some(rest) => rest
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric() && c != '_')
            .unwrap_or(true),
        None => false,
    }
}

fn detect_ts_js(sample: &str) -> Option<CodeLanguage> {
    let keyword = TS_JS_KEYWORDS.iter().any(|kw| starts_with_word(sample, kw));
    if !keyword && !arrow_fn_pattern().is_match(sample) {
        return None;
    }
    // Type annotations and declarations mark TypeScript.
    if sample.contains("interface ") || sample.contains("type ") || sample.contains(": ") {
        Some(CodeLanguage::Typescript)
    } else {
        Some(CodeLanguage::Javascript)
    }
}

fn detect_python(sample: &str) -> bool {
    PYTHON_PREFIXES.iter().any(|p| sample.starts_with(p))
        || sample.contains("if __name__")
        || sample
            .lines()
            .next()
            .is_some_and(|line| line.trim_end().ends_with(':'))
}

fn detect_sql(sample: &str) -> bool {
    let first = sample.split_whitespace().next().unwrap_or("");
    SQL_KEYWORDS.iter().any(|kw| first.eq_ignore_ascii_case(kw))
}

fn detect_shell(sample: &str) -> bool {
    if sample.starts_with("#!") {
        return true;
    }
    let first = sample.split_whitespace().next().unwrap_or("");
    SHELL_COMMANDS.contains(&first)
}

fn detect_json(sample: &str) -> bool {
    let bracketed = (sample.starts_with('{') && sample.ends_with('}'))
        || (sample.starts_with('[') && sample.ends_with(']'));
    // Bracket shape alone is not enough; the sample must actually parse.
    bracketed && serde_json::from_str::<serde_json::Value>(sample).is_ok()
}

fn detect_html(sample: &str) -> bool {
    let mut chars = sample.chars();
    chars.next() == Some('<')
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '!' || c == '/')
}

fn detect_css(sample: &str) -> bool {
    css_pattern().is_match(sample)
}

/// Guess the language of a code sample.
///
/// The checks run in a fixed priority order and the first match wins:
/// TypeScript/JavaScript, Python, SQL, shell, JSON, HTML, CSS. JSON is
/// checked before CSS so that brace-delimited JSON never reads as a
/// selector block. Never fails; unmatched samples are plaintext.
pub fn detect_language(sample: &str) -> CodeLanguage {
    let trimmed = sample.trim();
    if trimmed.is_empty() {
        return CodeLanguage::Plaintext;
    }
    if let Some(lang) = detect_ts_js(trimmed) {
        return lang;
    }
    if detect_python(trimmed) {
        return CodeLanguage::Python;
    }
    if detect_sql(trimmed) {
        return CodeLanguage::Sql;
    }
    if detect_shell(trimmed) {
        return CodeLanguage::Shell;
    }
    if detect_json(trimmed) {
        return CodeLanguage::Json;
    }
    if detect_html(trimmed) {
        return CodeLanguage::Html;
    }
    if detect_css(trimmed) {
        return CodeLanguage::Css;
    }
    CodeLanguage::Plaintext
}
