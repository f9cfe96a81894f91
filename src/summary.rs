use crate::findings::{Finding, Severity};
use crate::render::severity_glyph;

/// Render a findings list as a standalone markdown report: a count
/// summary, then one section per severity class with numbered items.
pub fn format_findings(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "✅ No issues found! Code looks good.".to_string();
    }

    let critical: Vec<&Finding> = by_severity(findings, &Severity::Critical);
    let warnings: Vec<&Finding> = by_severity(findings, &Severity::Warning);
    let suggestions: Vec<&Finding> = by_severity(findings, &Severity::Suggestion);
    let others: Vec<&Finding> = findings
        .iter()
        .filter(|f| {
            !matches!(
                f.severity,
                Severity::Critical | Severity::Warning | Severity::Suggestion
            )
        })
        .collect();

    let mut out: Vec<String> = Vec::new();

    out.push("## Summary".to_string());
    out.push(format!("Found **{}** review items:", findings.len()));
    if !critical.is_empty() {
        out.push(format!("- 🔴 {} Critical", critical.len()));
    }
    if !warnings.is_empty() {
        out.push(format!("- 🟡 {} Warnings", warnings.len()));
    }
    if !suggestions.is_empty() {
        out.push(format!("- 🟢 {} Suggestions", suggestions.len()));
    }
    out.push(String::new());

    for (heading, items) in [
        ("Critical Issues", critical),
        ("Warnings", warnings),
        ("Suggestions", suggestions),
        ("Other", others),
    ] {
        if items.is_empty() {
            continue;
        }

        out.push(format!("## {heading}"));
        out.push(String::new());

        for (i, finding) in items.iter().enumerate() {
            out.push(format!(
                "### {}. {} {}",
                i + 1,
                severity_glyph(&finding.severity),
                finding.file
            ));
            if finding.line > 0 {
                out.push(format!("**Line {}**", finding.line));
            }
            out.push(String::new());
            out.push(finding.message.clone());

            if let Some(suggestion) = finding.suggestion.as_deref()
                && !suggestion.is_empty()
            {
                out.push(String::new());
                out.push("**Suggested fix:**".to_string());
                out.push("```".to_string());
                out.push(suggestion.to_string());
                out.push("```".to_string());
            }

            out.push(String::new());
            out.push("---".to_string());
            out.push(String::new());
        }
    }

    out.join("\n")
}

fn by_severity<'a>(findings: &'a [Finding], severity: &Severity) -> Vec<&'a Finding> {
    findings.iter().filter(|f| f.severity == *severity).collect()
}
