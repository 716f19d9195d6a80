/*
[INPUT]:  Error sources (transport, socket frames, callbacks, serialization, config)
[OUTPUT]: Structured error types with retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the Aqueduct client
#[derive(Error, Debug)]
pub enum AqueductError {
    /// Subscribe/unsubscribe/send attempted before a transport was attached
    #[error("Transport not initialized; call Aqueduct::initialize first")]
    TransportNotInitialized,

    /// Inbound frame did not match the `{channel, data}` envelope
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// A user callback panicked or could not decode its payload
    #[error("Callback failed on channel {channel}: {reason}")]
    CallbackFailure { channel: String, reason: String },

    /// Transport stayed unavailable for the whole retry budget
    #[error("Send abandoned after {attempts} attempts")]
    SendTransientFailure { attempts: u32 },

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AqueductError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AqueductError::WebSocket(_) | AqueductError::SendTransientFailure { .. }
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AqueductError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        AqueductError::WebSocket(err.to_string())
    }
}

/// Result type alias for Aqueduct operations
pub type Result<T> = std::result::Result<T, AqueductError>;
