// Service error types

use std::io;
use thiserror::Error;

/// Errors raised while loading run data or configuration
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid run id '{0}': expected <job>#<number>")]
    InvalidRunId(String),

    #[error("Duplicate run id in history: {0}")]
    DuplicateRun(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
