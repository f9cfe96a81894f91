use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::router::InlineComment;

const GITHUB_API: &str = "https://api.github.com";
const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const USER_AGENT: &str = concat!("revq/", env!("CARGO_PKG_VERSION"));
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Abstraction over GitHub REST calls (for testability).
pub trait GitHubApi {
    fn get(&self, url: &str, accept: &str) -> Result<String>;
    fn post(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value>;
}

/// Real REST client with Bearer auth, retry and exponential backoff.
struct DefaultGitHubClient {
    token: String,
}

impl DefaultGitHubClient {
    fn request(&self, req: ureq::Request) -> ureq::Request {
        req.set("Authorization", &format!("Bearer {}", self.token))
            .set("User-Agent", USER_AGENT)
    }
}

impl GitHubApi for DefaultGitHubClient {
    fn get(&self, url: &str, accept: &str) -> Result<String> {
        retry_with_backoff(|| {
            self.request(ureq::get(url))
                .set("Accept", accept)
                .call()
                .map_err(classify_error)?
                .into_string()
                .map_err(|e| Error::GitHub(format!("failed to read response: {e}")))
        })
    }

    fn post(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        retry_with_backoff(|| {
            self.request(ureq::post(url))
                .set("Accept", JSON_MEDIA_TYPE)
                .send_json(body)
                .map_err(classify_error)?
                .into_json()
                .map_err(|e| Error::GitHub(format!("failed to parse response: {e}")))
        })
    }
}

/// Map a ureq error to ours, flagging which ones are worth retrying.
fn classify_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            let retryable = code == 429 || code >= 500;
            Error::GitHub(format!(
                "{}HTTP {code}: {body}",
                if retryable { "transient " } else { "" }
            ))
        }
        ureq::Error::Transport(t) => Error::GitHub(format!("transient transport error: {t}")),
    }
}

fn is_transient(err: &Error) -> bool {
    matches!(err, Error::GitHub(msg) if msg.starts_with("transient "))
}

fn retry_with_backoff<F, T>(f: F) -> Result<T>
where
    F: Fn() -> Result<T>,
{
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    for attempt in 1..=MAX_RETRIES {
        match f() {
            Ok(val) => return Ok(val),
            Err(e) if attempt < MAX_RETRIES && is_transient(&e) => {
                warn!(attempt, error = %e, backoff_ms, "retrying GitHub API after transient error");
                thread::sleep(Duration::from_millis(backoff_ms));
                backoff_ms *= 2;
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!()
}

/// One review-creation transaction: inline comments plus an optional
/// aggregate body, attached to a commit.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest {
    pub commit_id: String,
    pub event: String,
    pub comments: Vec<InlineComment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ReviewRequest {
    /// A non-blocking COMMENT review.
    pub fn comment(commit_id: String, comments: Vec<InlineComment>, body: Option<String>) -> Self {
        Self {
            commit_id,
            event: "COMMENT".to_string(),
            comments,
            body,
        }
    }
}

/// GitHub pull-request operations scoped to one `owner/name` repository.
pub struct GitHub {
    repo: String,
    client: Box<dyn GitHubApi>,
}

impl GitHub {
    pub fn new(token: &str, repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            client: Box::new(DefaultGitHubClient {
                token: token.to_string(),
            }),
        }
    }

    #[cfg(test)]
    fn with_client(repo: &str, client: Box<dyn GitHubApi>) -> Self {
        Self {
            repo: repo.to_string(),
            client,
        }
    }

    fn pull_url(&self, pr: u64, suffix: &str) -> String {
        format!("{GITHUB_API}/repos/{}/pulls/{pr}{suffix}", self.repo)
    }

    /// Fetch the PR's unified diff via the diff media type.
    pub fn fetch_pr_diff(&self, pr: u64) -> Result<String> {
        self.client.get(&self.pull_url(pr, ""), DIFF_MEDIA_TYPE)
    }

    /// Fetch the PR's current head commit SHA.
    pub fn fetch_pr_head_sha(&self, pr: u64) -> Result<String> {
        let raw = self.client.get(&self.pull_url(pr, ""), JSON_MEDIA_TYPE)?;
        let json: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| Error::GitHub(format!("failed to parse PR payload: {e}")))?;
        json.pointer("/head/sha")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::GitHub("PR payload missing head.sha".to_string()))
    }

    /// Submit one review transaction. All-or-nothing: on error nothing was
    /// applied and the caller reports a failed run.
    pub fn create_review(&self, pr: u64, review: &ReviewRequest) -> Result<()> {
        let body = serde_json::to_value(review)
            .map_err(|e| Error::GitHub(format!("failed to encode review: {e}")))?;
        self.client.post(&self.pull_url(pr, "/reviews"), &body)?;
        info!(
            pr,
            inline = review.comments.len(),
            has_body = review.body.is_some(),
            "posted review"
        );
        Ok(())
    }
}
