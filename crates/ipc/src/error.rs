//! Error types for IPC operations.

/// Errors that can occur during IPC operations.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid arguments for {method}: {reason}")]
    InvalidArguments { method: String, reason: String },
}

impl IpcError {
    /// Stable error code reported back to the host.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Serialize(_) => "serialization_failed",
            Self::UnknownMethod(_) => "not_implemented",
            Self::InvalidArguments { .. } => "invalid_arguments",
        }
    }
}
