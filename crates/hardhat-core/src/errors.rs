use std::time::Duration;

/// Typed error hierarchy for classification service calls.
/// Classifies errors as fatal (don't retry), retryable, or operational.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClassifierError {
    // Fatal: don't retry
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    // Retryable
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("service overloaded")]
    Overloaded,
    #[error("network error: {0}")]
    NetworkError(String),

    // Operational
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("circuit open")]
    CircuitOpen,
}

impl ClassifierError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ServerError { .. } | Self::Overloaded | Self::NetworkError(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_) | Self::InvalidRequest(_) | Self::InvalidResponse(_)
        )
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::ModelNotFound(_) => "model_not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidResponse(_) => "invalid_response",
            Self::ServerError { .. } => "server_error",
            Self::Overloaded => "overloaded",
            Self::NetworkError(_) => "network_error",
            Self::Timeout(_) => "timeout",
            Self::CircuitOpen => "circuit_open",
        }
    }

    /// Classify an HTTP status code into the appropriate error variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => Self::ModelNotFound(body),
            400 => Self::InvalidRequest(body),
            429 | 503 => Self::Overloaded,
            500..=599 => Self::ServerError { status, body },
            _ => Self::InvalidRequest(format!("unexpected status {status}: {body}")),
        }
    }
}
