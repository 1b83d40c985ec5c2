// Error types for svcherd

use thiserror::Error;

/// Result type alias using anyhow::Error
pub type Result<T> = anyhow::Result<T>;

/// Svcherd-specific error types
#[derive(Error, Debug)]
pub enum SvcherdError {
    #[error("Remote call to '{target}' exceeded its time limit")]
    TransportTimeout { target: String },

    #[error("Failed to invoke runner for '{target}': {message}")]
    TransportFault { target: String, message: String },

    #[error("Runner reported failure for '{target}' (exit code {code})")]
    RemoteFailure { target: String, code: String },

    #[error("Operator '{actor}' is not authorized for this operation")]
    Unauthorized { actor: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audit log error: {0}")]
    Audit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
