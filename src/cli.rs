use clap::{Parser, Subcommand};

/// revq — LLM-driven pull-request reviewer
#[derive(Parser, Debug, Clone)]
#[command(name = "revq", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Path to config file (default: revq.toml if present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Model to request from the provider
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Title line for the aggregate review body
    #[arg(long = "review-title", global = true)]
    pub review_title: Option<String>,

    /// File holding the unified diff (post subcommand)
    #[arg(long = "diff-file", global = true)]
    pub diff_file: Option<String>,

    /// Directory with prompt template overrides
    #[arg(long = "prompt-dir", global = true)]
    pub prompt_dir: Option<String>,

    /// Compute the review but print it instead of posting
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Read a unified diff on stdin, print review findings as JSON
    Analyze,

    /// Read findings JSON on stdin, print a markdown report
    Format,

    /// Read findings JSON on stdin, map them onto the diff and post one
    /// review to the configured pull request
    Post {
        /// Pull request number (overrides $PR_NUMBER)
        #[arg(long)]
        pr: Option<u64>,
    },

    /// Fetch the pull request diff, analyze it, and post the review
    Review {
        /// Pull request number (overrides $PR_NUMBER)
        #[arg(long)]
        pr: Option<u64>,
    },
}
