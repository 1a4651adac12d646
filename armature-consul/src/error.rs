//! Consul client error types.

use thiserror::Error;

/// Result type for Consul client operations.
pub type Result<T> = std::result::Result<T, ConsulError>;

/// Consul client errors.
///
/// Each variant names the pipeline phase that produced it. Errors are never
/// wrapped: the first one raised during a call is the one the caller sees.
#[derive(Debug, Clone, Error)]
pub enum ConsulError {
    /// No transport configured, or the transport failed to complete the call.
    #[error("Error seen while executing \"{uri}\": {message}")]
    Transport {
        /// Request URI that was being executed.
        uri: String,
        /// Underlying failure message.
        message: String,
    },

    /// A response arrived with a status code other than the one required.
    #[error("Non-{expected} response seen. Response code: {actual}. Message: {reason}")]
    Status {
        /// Status code the call required.
        expected: u16,
        /// Status code actually returned.
        actual: u16,
        /// Reason phrase of the response.
        reason: String,
    },

    /// The response, or its decoded body, did not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// The response body could not be parsed as JSON.
    #[error("Unable to parse response as JSON: {0}")]
    Decode(String),

    /// Client configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Caller input was rejected before anything was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ConsulError {
    /// Get the actual HTTP status code if this is a status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    /// Check if the agent answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Check if this error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
