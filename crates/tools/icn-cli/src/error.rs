use icn_committee::{CommitteeError, ErrorKind};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O Error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON Serialization/Deserialization Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Committee(#[from] CommitteeError),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Invalid Key: {0}")]
    InvalidKey(String),

    #[error("Invalid Input: {0}")]
    Input(String),

    #[error("{0:#}")]
    Any(#[from] anyhow::Error),
}

impl CliError {
    /// Short label printed in front of the message
    pub fn label(&self) -> &'static str {
        match self {
            CliError::Committee(e) => match e.kind() {
                ErrorKind::Validation => "validation",
                ErrorKind::Authorization => "authorization",
                ErrorKind::NotFound => "not_found",
                ErrorKind::Conflict => "conflict",
                ErrorKind::State => "state",
                ErrorKind::Crypto => "crypto",
                ErrorKind::Storage => "storage",
            },
            CliError::Config(_) | CliError::Any(_) => "config",
            CliError::InvalidKey(_) => "key",
            CliError::Input(_) | CliError::Json(_) => "input",
            CliError::Io(_) => "io",
        }
    }

    /// Process exit code; committee failures get distinct codes per kind
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Committee(e) => match e.kind() {
                ErrorKind::Validation => 10,
                ErrorKind::Authorization => 11,
                ErrorKind::NotFound => 12,
                ErrorKind::Conflict => 13,
                ErrorKind::State => 14,
                ErrorKind::Crypto => 15,
                ErrorKind::Storage => 16,
            },
            _ => 1,
        }
    }
}

pub type CliResult<T = ()> = Result<T, CliError>;
