use serde::Serialize;
use tracing::debug;

use crate::diff::ChangedLineIndex;
use crate::findings::Finding;
use crate::render::comment_body;

/// Separator between general comment bodies in the aggregate review body.
const GENERAL_SEPARATOR: &str = "\n\n---\n\n";

/// A comment anchored to a changed line. Serializes directly into the
/// review-creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineComment {
    pub path: String,
    pub line: u64,
    pub body: String,
}

/// The routed output for one run: every finding lands in exactly one of
/// the two buckets, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPlan {
    pub inline: Vec<InlineComment>,
    pub general: Vec<String>,
}

impl ReviewPlan {
    pub fn is_empty(&self) -> bool {
        self.inline.is_empty() && self.general.is_empty()
    }

    /// Aggregate body for the general bucket: the title followed by each
    /// body, separated by a horizontal rule. `None` when there is nothing
    /// to say.
    pub fn summary_body(&self, title: &str) -> Option<String> {
        if self.general.is_empty() {
            return None;
        }
        Some(format!(
            "{title}\n\n{}",
            self.general.join(GENERAL_SEPARATOR)
        ))
    }
}

/// Stable partition of findings into inline and general comments.
///
/// Sentinel files and unknown lines go straight to the general bucket.
/// Everything else is anchored to the nearest changed line of its file;
/// findings that cannot be anchored keep their claimed location as a
/// `**file:line**` prefix so the context survives in the summary body.
pub fn route(findings: &[Finding], index: &ChangedLineIndex) -> ReviewPlan {
    let mut plan = ReviewPlan::default();

    for finding in findings {
        if finding.is_general() {
            plan.general.push(comment_body(finding));
            continue;
        }

        match index.nearest_line(&finding.file, finding.line) {
            Some(line) => {
                debug!(
                    file = %finding.file,
                    claimed = finding.line,
                    resolved = line,
                    "anchored finding to changed line"
                );
                plan.inline.push(InlineComment {
                    path: finding.file.clone(),
                    line,
                    body: comment_body(finding),
                });
            }
            None => {
                debug!(file = %finding.file, line = finding.line, "finding has no inline anchor");
                plan.general.push(format!(
                    "**{}:{}**\n{}",
                    finding.file,
                    finding.line,
                    comment_body(finding)
                ));
            }
        }
    }

    plan
}
