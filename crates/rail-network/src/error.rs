//! Network-subsystem error type.

use thiserror::Error;

/// Errors produced by `rail-network`.
///
/// Routing failures are not errors: an unreachable destination is reported
/// as `None` by [`Router::route`](crate::Router::route).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("network description parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
