//! Error types for JavaScript evaluation

use thiserror::Error;

/// Terminal result of one evaluation request: the encoded value or an error.
pub type EvalOutcome = Result<String, EvalError>;

/// Error delivered to the caller of an evaluation request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The engine reported an error or the script threw
    #[error("{message}")]
    Failed { message: String },

    /// The request was still queued when the window went away
    #[error("WebView window was closed")]
    WindowClosed,

    /// The request was in flight when the window went away
    #[error("WebView window was destroyed")]
    WindowDestroyed,
}

impl EvalError {
    /// Stable error code reported to the host
    pub fn code(&self) -> &'static str {
        match self {
            Self::Failed { .. } => "eval_failed",
            Self::WindowClosed => "window_closed",
            Self::WindowDestroyed => "window_destroyed",
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Failure reported by a [`ScriptEngine`](crate::ScriptEngine)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("JavaScript execution failed: {0}")]
    Failed(String),

    #[error("JavaScript exception: {0}")]
    Exception(String),

    #[error("JavaScript execution returned null value")]
    NoValue,
}

impl From<EngineError> for EvalError {
    fn from(err: EngineError) -> Self {
        let message = match err {
            EngineError::Failed(message) if message.is_empty() => {
                "JavaScript execution failed".to_string()
            }
            EngineError::Exception(message) if message.is_empty() => {
                "JavaScript exception".to_string()
            }
            EngineError::Failed(message) | EngineError::Exception(message) => message,
            EngineError::NoValue => "JavaScript execution returned null value".to_string(),
        };
        Self::Failed { message }
    }
}
