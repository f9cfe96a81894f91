use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Env vars the binary reads; cleared so the host environment cannot leak
/// into assertions.
const CONFIG_ENV_VARS: &[&str] = &[
    "GITHUB_TOKEN",
    "GITHUB_REPOSITORY",
    "PR_NUMBER",
    "COMMIT_SHA",
    "GROQ_API_KEY",
    "MODEL",
    "COMMIT_TITLE",
    "COMMIT_BODY",
    "MAX_LENGTH",
    "REVIEW_TITLE",
    "DIFF_FILE",
];

#[allow(deprecated)]
fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("revq").unwrap();
    cmd.current_dir(dir.path());
    for var in CONFIG_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

const FINDINGS: &str = r#"[
    {"file": "a.py", "line": 15, "severity": "CRITICAL", "message": "overflow risk"},
    {"file": "general", "line": 0, "severity": "INFO", "message": "overall fine"}
]"#;

const DIFF: &str = "\
--- a/a.py
+++ b/a.py
@@ -10,2 +10,3 @@
 context
+added1
+added2
";

// --- Help & version ---

#[test]
fn help_flag() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pull-request reviewer"));
}

#[test]
fn version_flag() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("revq"));
}

// --- format ---

#[test]
fn format_empty_array_reports_clean() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("format")
        .write_stdin("[]")
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn format_renders_grouped_report() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("format")
        .write_stdin(FINDINGS)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found **2** review items:"))
        .stdout(predicate::str::contains("## Critical Issues"))
        .stdout(predicate::str::contains("**Line 15**"));
}

#[test]
fn format_rejects_malformed_json() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("format")
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse findings JSON"));
}

// --- post (dry run; never talks to the network) ---

#[test]
fn post_dry_run_prints_planned_review() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("diff.txt"), DIFF).unwrap();

    cmd(&dir)
        .args(["post", "--pr", "7", "--dry-run"])
        .env("COMMIT_SHA", "abc123")
        .write_stdin(FINDINGS)
        .assert()
        .success()
        // 15 resolves to the nearest changed line, 12.
        .stdout(predicate::str::contains(r#""line": 12"#))
        .stdout(predicate::str::contains(r#""path": "a.py""#))
        .stdout(predicate::str::contains(r#""commit_id": "abc123""#))
        .stdout(predicate::str::contains("# Code Review"));
}

#[test]
fn post_dry_run_unresolved_finding_keeps_location_prefix() {
    let dir = TempDir::new().unwrap();
    // No diff file at all: everything routes to the summary body.

    cmd(&dir)
        .args(["post", "--pr", "7", "--dry-run"])
        .env("COMMIT_SHA", "abc123")
        .write_stdin(r#"[{"file": "missing.py", "line": 5, "message": "hm"}]"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("missing.py:5"))
        .stdout(predicate::str::contains(r#""comments": []"#));
}

#[test]
fn post_empty_findings_posts_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("diff.txt"), DIFF).unwrap();

    cmd(&dir)
        .args(["post", "--pr", "7", "--dry-run"])
        .env("COMMIT_SHA", "abc123")
        .write_stdin("[]")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn post_requires_pr_number() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["post", "--dry-run"])
        .write_stdin("[]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pull request number not set"));
}

#[test]
fn post_requires_commit_sha() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["post", "--pr", "7", "--dry-run"])
        .write_stdin(FINDINGS)
        .assert()
        .failure()
        .stderr(predicate::str::contains("COMMIT_SHA"));
}

// --- analyze / review credential checks ---

#[test]
fn analyze_requires_api_key() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("analyze")
        .write_stdin(DIFF)
        .assert()
        .failure()
        .stderr(predicate::str::contains("GROQ_API_KEY"));
}

#[test]
fn review_requires_github_credentials() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["review", "--pr", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_TOKEN"));
}
