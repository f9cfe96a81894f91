use std::path::Path;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::llm::DEFAULT_API_BASE;

const DEFAULT_CONFIG_PATH: &str = "revq.toml";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_REVIEW_TITLE: &str = "# Code Review";
const DEFAULT_DIFF_FILE: &str = "diff.txt";
const DEFAULT_MAX_PROMPT_CHARS: usize = 60_000;

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub review_title: Option<String>,
    pub diff_file: Option<String>,
    pub max_prompt_chars: Option<usize>,
    pub prompt_dir: Option<String>,
}

/// Fully-merged runtime configuration. Credentials and PR coordinates are
/// optional here; each subcommand demands the ones it actually uses.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub model: String,
    pub api_base: String,
    pub review_title: String,
    pub diff_file: String,
    pub max_prompt_chars: usize,
    pub prompt_dir: Option<String>,
    pub commit_title: String,
    pub commit_body: String,
    pub github_token: Option<String>,
    pub repository: Option<String>,
    pub pr_number: Option<u64>,
    pub commit_sha: Option<String>,
    pub api_key: Option<String>,
    pub dry_run: bool,
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match &cli.config {
            Some(path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(path)?)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    parse_config(&std::fs::read_to_string(path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        merge(file_config, cli, &|key| std::env::var(key).ok())
    }

    /// Token and repository, required by anything that talks to GitHub.
    pub fn require_github(&self) -> Result<(&str, &str)> {
        let token = self
            .github_token
            .as_deref()
            .ok_or_else(|| Error::ConfigValidation("GITHUB_TOKEN is not set".to_string()))?;
        let repo = self
            .repository
            .as_deref()
            .ok_or_else(|| Error::ConfigValidation("GITHUB_REPOSITORY is not set".to_string()))?;
        Ok((token, repo))
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::ConfigValidation("GROQ_API_KEY is not set".to_string()))
    }

    /// PR number from the subcommand flag, falling back to $PR_NUMBER.
    pub fn require_pr(&self, flag: Option<u64>) -> Result<u64> {
        flag.or(self.pr_number).ok_or_else(|| {
            Error::ConfigValidation("pull request number not set (--pr or $PR_NUMBER)".to_string())
        })
    }

    pub fn require_commit_sha(&self) -> Result<&str> {
        self.commit_sha
            .as_deref()
            .ok_or_else(|| Error::ConfigValidation("COMMIT_SHA is not set".to_string()))
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    Ok(config)
}

fn parse_env_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::ConfigValidation(format!("{name} is not a valid number: {raw}")))
}

pub fn merge(file: ConfigFile, cli: &Cli, env: &dyn Fn(&str) -> Option<String>) -> Result<Config> {
    let pr_number = match env("PR_NUMBER") {
        Some(raw) => Some(parse_env_number("PR_NUMBER", &raw)?),
        None => None,
    };

    let max_prompt_chars = match env("MAX_LENGTH") {
        Some(raw) => parse_env_number("MAX_LENGTH", &raw)?,
        None => file.max_prompt_chars.unwrap_or(DEFAULT_MAX_PROMPT_CHARS),
    };
    if max_prompt_chars == 0 {
        return Err(Error::ConfigValidation(
            "max_prompt_chars must be > 0".to_string(),
        ));
    }

    Ok(Config {
        model: cli
            .model
            .clone()
            .or(env("MODEL"))
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        api_base: file
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        review_title: cli
            .review_title
            .clone()
            .or(env("REVIEW_TITLE"))
            .or(file.review_title)
            .unwrap_or_else(|| DEFAULT_REVIEW_TITLE.to_string()),
        diff_file: cli
            .diff_file
            .clone()
            .or(env("DIFF_FILE"))
            .or(file.diff_file)
            .unwrap_or_else(|| DEFAULT_DIFF_FILE.to_string()),
        max_prompt_chars,
        prompt_dir: cli.prompt_dir.clone().or(file.prompt_dir),
        commit_title: env("COMMIT_TITLE").unwrap_or_default(),
        commit_body: env("COMMIT_BODY").unwrap_or_default(),
        github_token: env("GITHUB_TOKEN"),
        repository: env("GITHUB_REPOSITORY"),
        pr_number,
        commit_sha: env("COMMIT_SHA"),
        api_key: env("GROQ_API_KEY"),
        dry_run: cli.dry_run,
    })
}
