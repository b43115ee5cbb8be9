use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemandError {
    #[error("demand grid parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DemandResult<T> = Result<T, DemandError>;
