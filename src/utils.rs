//! Common utility functions shared across the codebase.

use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

static NON_IDENTIFIER_CHARS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_$]+").unwrap());

/// Words that can never be used as a binding in emitted code.
pub const RESERVED_WORDS: &[&str] = &[
    "arguments",
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "eval",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "Infinity",
    "instanceof",
    "interface",
    "let",
    "NaN",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "undefined",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

/// Names the CommonJS wrapper puts in scope.
pub const MODULE_SCOPE_NAMES: &[&str] = &["module", "exports", "require"];

/// Checks if `name` is a plain ASCII JavaScript identifier.
///
/// # Examples
///
/// ```
/// use schemapack::utils::is_identifier;
///
/// assert!(is_identifier("validate"));
/// assert!(is_identifier("$ref_1"));
/// assert!(!is_identifier("1ref"));
/// assert!(!is_identifier("date-time"));
/// assert!(!is_identifier(""));
/// ```
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}

/// Turn a schema id, slot name or keyword name into an identifier candidate.
///
/// Only the last meaningful segment of URI-like ids is kept, and a trailing
/// `.json` is dropped. Returns `None` when nothing usable is left.
///
/// # Examples
///
/// ```
/// use schemapack::utils::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("http://example.com/country.json#"), Some("country".to_string()));
/// assert_eq!(sanitize_identifier("#/definitions/foo"), Some("foo".to_string()));
/// assert_eq!(sanitize_identifier("format_date-time"), Some("format_date_time".to_string()));
/// assert_eq!(sanitize_identifier("2019"), Some("_2019".to_string()));
/// assert_eq!(sanitize_identifier("#"), None);
/// ```
pub fn sanitize_identifier(raw: &str) -> Option<String> {
    let segment = raw
        .split(['/', '#', ':', '?'])
        .rev()
        .find(|s| !s.trim().is_empty())?;
    let segment = segment.strip_suffix(".json").unwrap_or(segment);

    let replaced = NON_IDENTIFIER_CHARS_REGEX.replace_all(segment, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        Some(format!("_{}", trimmed))
    } else {
        Some(trimmed.to_string())
    }
}

/// Escape text for use inside a single-quoted JavaScript string literal.
///
/// # Examples
///
/// ```
/// use schemapack::utils::escape_quotes;
///
/// assert_eq!(escape_quotes(r"^\d+$"), r"^\\d+$");
/// assert_eq!(escape_quotes("it's"), r"it\'s");
/// assert_eq!(escape_quotes("a\nb"), r"a\nb");
/// ```
pub fn escape_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{000C}' => out.push_str("\\f"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}
