use crate::upstream::WorkerCallError;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Preserves the concrete `WorkerCallError` from engine construction.
    #[error("Worker client error: {0}")]
    Worker(#[from] WorkerCallError),
}
