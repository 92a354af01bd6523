use thiserror::Error;

pub type Result<T> = std::result::Result<T, ColloquyError>;

#[derive(Debug, Error)]
pub enum ColloquyError {
    #[error("{0}")]
    Validation(String),

    #[error("agent loop exceeded {0} iterations without a final response")]
    IterationLimit(u32),

    #[error("model provider error: {0}")]
    Upstream(String),

    #[error("session `{0}` not found")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
