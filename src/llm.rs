use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::findings::{Finding, parse_findings_lenient};
use crate::prompts::PromptEngine;

pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

const SYSTEM_MESSAGE: &str = "You are an expert code reviewer. Always respond with valid JSON.";
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Abstraction over the chat-completions call (for testability).
pub trait ChatClient {
    /// Send one system + user message pair, return the assistant text.
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI-compatible chat-completions client with retry and backoff.
pub struct GroqClient {
    api_key: String,
    api_base: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        Self {
            api_key,
            api_base,
            model,
        }
    }
}

impl ChatClient for GroqClient {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0.3,
            "max_tokens": 2048,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let mut backoff_ms = INITIAL_BACKOFF_MS;
        for attempt in 1..=MAX_RETRIES {
            match ureq::post(&url)
                .set("Authorization", &format!("Bearer {}", self.api_key))
                .set("Content-Type", "application/json")
                .send_json(&body)
            {
                Ok(response) => {
                    let json: serde_json::Value = response
                        .into_json()
                        .map_err(|e| Error::Llm(format!("failed to parse provider response: {e}")))?;

                    return json
                        .pointer("/choices/0/message/content")
                        .and_then(|v| v.as_str())
                        .map(|s| s.trim().to_string())
                        .ok_or_else(|| Error::Llm(format!("no completion in response: {json}")));
                }
                Err(ref e) if attempt < MAX_RETRIES && is_retryable(e) => {
                    warn!(
                        attempt,
                        error = %e,
                        backoff_ms,
                        "retrying provider call after transient error"
                    );
                    thread::sleep(Duration::from_millis(backoff_ms));
                    backoff_ms *= 2;
                }
                Err(e) => {
                    return Err(Error::Llm(format!("provider request failed: {e}")));
                }
            }
        }
        unreachable!()
    }
}

/// Only retry rate-limits (429), server errors (5xx), and transport/network errors.
fn is_retryable(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Status(code, _) => *code == 429 || *code >= 500,
        ureq::Error::Transport(_) => true,
    }
}

/// Ask the reviewer model for findings on a diff.
///
/// Never fails: a provider error becomes one synthetic `error` finding
/// and unparseable output becomes one synthetic `general` finding, so the
/// pipeline downstream always has a findings list to route.
pub fn review_diff(
    client: &dyn ChatClient,
    prompts: &PromptEngine,
    diff: &str,
    commit_title: &str,
    commit_message: &str,
    max_prompt_chars: usize,
) -> Vec<Finding> {
    let vars = HashMap::from([
        ("diff".to_string(), diff.to_string()),
        ("commit_title".to_string(), commit_title.to_string()),
        ("commit_message".to_string(), commit_message.to_string()),
    ]);

    let prompt = match prompts.render_phase("review", &vars) {
        Ok(p) => p,
        Err(e) => return vec![Finding::provider_error(&format!("prompt error: {e}"))],
    };

    let prompt = if prompt.chars().count() > max_prompt_chars {
        warn!(
            chars = prompt.chars().count(),
            max = max_prompt_chars,
            "prompt too long, sending truncated prefix"
        );
        truncate_chars(&prompt, max_prompt_chars)
    } else {
        prompt
    };

    match client.complete(SYSTEM_MESSAGE, &prompt) {
        Ok(text) => {
            debug!(bytes = text.len(), "got reviewer response");
            parse_findings_lenient(&text)
        }
        Err(e) => vec![Finding::provider_error(&format!("provider error: {e}"))],
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
