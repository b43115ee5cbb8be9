use rail_demand::DemandError;
use rail_network::NetworkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("demand error: {0}")]
    Demand(#[from] DemandError),

    #[error("host loop has shut down")]
    HostClosed,
}

pub type SimResult<T> = Result<T, SimError>;
