pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod findings;
pub mod github;
pub mod llm;
pub mod prompts;
pub mod render;
pub mod router;
pub mod summary;
