use std::io::Read;

use clap::Parser;
use tracing::{info, warn};

use revq::cli::{Cli, CliCommand};
use revq::config::Config;
use revq::diff::parse_diff;
use revq::error::{Error, Result};
use revq::findings::parse_findings;
use revq::github::{GitHub, ReviewRequest};
use revq::llm::{GroqClient, review_diff};
use revq::prompts::PromptEngine;
use revq::router::{ReviewPlan, route};
use revq::summary::format_findings;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, &config) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    match cli.command {
        CliCommand::Analyze => cmd_analyze(config),
        CliCommand::Format => cmd_format(),
        CliCommand::Post { pr } => cmd_post(config, pr),
        CliCommand::Review { pr } => cmd_review(config, pr),
    }
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Findings(format!("failed to encode JSON: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Diff on stdin → findings JSON on stdout.
fn cmd_analyze(config: &Config) -> Result<()> {
    let api_key = config.require_api_key()?;
    let diff = read_stdin()?;

    let client = GroqClient::new(
        api_key.to_string(),
        config.api_base.clone(),
        config.model.clone(),
    );
    let prompts = PromptEngine::new(config.prompt_dir.clone());
    let findings = review_diff(
        &client,
        &prompts,
        &diff,
        &config.commit_title,
        &config.commit_body,
        config.max_prompt_chars,
    );
    info!(count = findings.len(), "analysis complete");
    print_json(&findings)
}

/// Findings JSON on stdin → markdown report on stdout.
fn cmd_format() -> Result<()> {
    let findings = parse_findings(&read_stdin()?)?;
    println!("{}", format_findings(&findings));
    Ok(())
}

/// Findings JSON on stdin + diff file → one review on the PR.
fn cmd_post(config: &Config, pr: Option<u64>) -> Result<()> {
    let pr = config.require_pr(pr)?;
    let findings = parse_findings(&read_stdin()?)?;

    let diff = match std::fs::read_to_string(&config.diff_file) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                file = %config.diff_file,
                error = %e,
                "diff file not readable, all findings will go to the summary body"
            );
            String::new()
        }
    };

    let plan = route(&findings, &parse_diff(&diff));
    submit(config, pr, plan, config.require_commit_sha()?.to_string())
}

/// End to end: fetch the PR diff, analyze, post.
fn cmd_review(config: &Config, pr: Option<u64>) -> Result<()> {
    let pr = config.require_pr(pr)?;
    let (token, repo) = config.require_github()?;
    let api_key = config.require_api_key()?;

    let gh = GitHub::new(token, repo);
    let diff = gh.fetch_pr_diff(pr)?;
    info!(pr, bytes = diff.len(), "fetched PR diff");

    let client = GroqClient::new(
        api_key.to_string(),
        config.api_base.clone(),
        config.model.clone(),
    );
    let prompts = PromptEngine::new(config.prompt_dir.clone());
    let findings = review_diff(
        &client,
        &prompts,
        &diff,
        &config.commit_title,
        &config.commit_body,
        config.max_prompt_chars,
    );

    let plan = route(&findings, &parse_diff(&diff));
    let commit_sha = match &config.commit_sha {
        Some(sha) => sha.clone(),
        None => gh.fetch_pr_head_sha(pr)?,
    };
    submit(config, pr, plan, commit_sha)
}

/// Turn a routed plan into one review transaction, or nothing at all.
fn submit(config: &Config, pr: u64, plan: ReviewPlan, commit_sha: String) -> Result<()> {
    if plan.is_empty() {
        info!(pr, "no issues found, nothing to post");
        return Ok(());
    }

    let body = plan.summary_body(&config.review_title);
    let review = ReviewRequest::comment(commit_sha, plan.inline, body);

    if config.dry_run {
        info!(pr, "dry run, review not posted");
        return print_json(&review);
    }

    let (token, repo) = config.require_github()?;
    GitHub::new(token, repo).create_review(pr, &review)
}
