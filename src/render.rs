use crate::findings::{Finding, Severity};

/// Glyph shown before the severity label. Unknown labels share one glyph.
pub fn severity_glyph(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴",
        Severity::Warning => "🟡",
        Severity::Suggestion => "🟢",
        Severity::Info => "💡",
        Severity::Other(_) => "💬",
    }
}

/// Render one finding as a review-comment body: glyph + bold severity
/// label, the message, and a fenced suggestion block when one is present
/// and non-empty.
pub fn comment_body(finding: &Finding) -> String {
    let mut body = format!(
        "{} **{}**\n\n{}",
        severity_glyph(&finding.severity),
        finding.severity.label(),
        finding.message
    );

    if let Some(suggestion) = finding.suggestion.as_deref()
        && !suggestion.is_empty()
    {
        body.push_str(&format!("\n\n**Suggested fix:**\n```\n{suggestion}\n```"));
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity, suggestion: Option<&str>) -> Finding {
        Finding {
            file: "src/main.rs".to_string(),
            line: 3,
            severity,
            message: "Something is off here".to_string(),
            suggestion: suggestion.map(str::to_string),
        }
    }

    #[test]
    fn test_body_without_suggestion() {
        let body = comment_body(&finding(Severity::Critical, None));
        assert_eq!(body, "🔴 **CRITICAL**\n\nSomething is off here");
    }

    #[test]
    fn test_body_with_suggestion_fence() {
        let body = comment_body(&finding(Severity::Warning, Some("use checked_add")));
        assert_eq!(
            body,
            "🟡 **WARNING**\n\nSomething is off here\n\n**Suggested fix:**\n```\nuse checked_add\n```"
        );
    }

    #[test]
    fn test_empty_suggestion_omits_fence() {
        let body = comment_body(&finding(Severity::Info, Some("")));
        assert!(!body.contains("Suggested fix"));
        assert!(body.starts_with("💡 **INFO**"));
    }

    #[test]
    fn test_glyphs_cover_known_severities() {
        assert_eq!(severity_glyph(&Severity::Critical), "🔴");
        assert_eq!(severity_glyph(&Severity::Warning), "🟡");
        assert_eq!(severity_glyph(&Severity::Suggestion), "🟢");
        assert_eq!(severity_glyph(&Severity::Info), "💡");
        assert_eq!(severity_glyph(&Severity::Other("style".to_string())), "💬");
    }

    #[test]
    fn test_unknown_severity_label_kept_verbatim() {
        let body = comment_body(&finding(Severity::Other("Nitpick".to_string()), None));
        assert!(body.starts_with("💬 **Nitpick**"));
    }
}
