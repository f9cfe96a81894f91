use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sentinel file names the upstream reviewer uses for findings that have
/// no real file target (provider errors, whole-diff commentary).
pub const SENTINEL_FILES: [&str; 2] = ["error", "general"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    Warning,
    Suggestion,
    Info,
    /// Any label outside the closed set, kept verbatim.
    Other(String),
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        match raw.to_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "WARNING" => Severity::Warning,
            "SUGGESTION" => Severity::Suggestion,
            "INFO" => Severity::Info,
            _ => Severity::Other(raw),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.label().to_string()
    }
}

impl Severity {
    /// Display label, uppercase for the known set, verbatim otherwise.
    pub fn label(&self) -> &str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Suggestion => "SUGGESTION",
            Severity::Info => "INFO",
            Severity::Other(raw) => raw,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Info
    }
}

/// One review finding as produced by the upstream reviewer.
///
/// `line` is untrusted: 0 means "unknown", and nothing stops a model from
/// emitting a negative or absurdly large value, so it stays a plain `i64`
/// until the locator anchors it to a real changed line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Finding {
    pub file: String,
    pub line: i64,
    #[serde(default)]
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    /// Whether this finding can never be anchored inline: sentinel file
    /// names and unknown line numbers always go to the general bucket.
    pub fn is_general(&self) -> bool {
        SENTINEL_FILES.contains(&self.file.as_str()) || self.line == 0
    }

    /// The synthetic finding substituted when upstream output cannot be
    /// parsed: the raw text survives as a general suggestion.
    pub fn fallback(raw: &str) -> Self {
        Finding {
            file: "general".to_string(),
            line: 0,
            severity: Severity::Suggestion,
            message: raw.to_string(),
            suggestion: None,
        }
    }

    /// The synthetic finding substituted when the provider call itself
    /// fails.
    pub fn provider_error(detail: &str) -> Self {
        Finding {
            file: "error".to_string(),
            line: 0,
            severity: Severity::Critical,
            message: detail.to_string(),
            suggestion: None,
        }
    }
}

/// Strip markdown code fences (` ```json ... ``` `) that models sometimes
/// wrap output in, then parse as a findings array.
pub fn parse_findings(raw: &str) -> Result<Vec<Finding>> {
    let json = strip_markdown_fences(raw);
    serde_json::from_str(&json)
        .map_err(|e| Error::Findings(format!("failed to parse findings JSON: {e}")))
}

/// Like [`parse_findings`], but a malformed payload degrades to a single
/// general finding carrying the raw text instead of an error.
pub fn parse_findings_lenient(raw: &str) -> Vec<Finding> {
    match parse_findings(raw) {
        Ok(findings) => findings,
        Err(e) => {
            tracing::warn!(error = %e, "treating unparseable reviewer output as plain text");
            vec![Finding::fallback(raw.trim())]
        }
    }
}

/// Remove markdown code fences from a string, returning the inner content.
/// Handles ` ```json `, ` ``` `, and bare JSON.
fn strip_markdown_fences(input: &str) -> String {
    let trimmed = input.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the optional language tag (e.g. "json") on the opening fence line
        let after_tag = if let Some(pos) = rest.find('\n') {
            &rest[pos + 1..]
        } else {
            return String::new();
        };

        if let Some(pos) = after_tag.rfind("```") {
            return after_tag[..pos].trim().to_string();
        }
        // No closing fence — return everything after opening
        return after_tag.trim().to_string();
    }

    trimmed.to_string()
}
