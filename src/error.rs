use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("findings parse error: {0}")]
    Findings(String),

    #[error("prompt error: {0}")]
    Prompt(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("github error: {0}")]
    GitHub(String),
}

pub type Result<T> = std::result::Result<T, Error>;
