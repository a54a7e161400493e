//! Error types shared by the provider adapters and the engine.

/// Errors raised on the live generation path.
///
/// Every variant is caught by [`crate::Engine::generate`] and degrades to mock
/// output; only [`crate::Engine::test_connection`] and
/// [`crate::Engine::generate_live`] surface them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Authentication failed: {message}")]
    ProviderAuth { message: String },

    #[error("HTTP {status}: {message}")]
    ProviderHttp { status: u16, message: String },

    #[error("Custom provider requires an endpoint")]
    MissingEndpoint,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unrecognized response shape: no content field found")]
    UnrecognizedResponseShape,
}

impl LlmError {
    /// Map a reqwest transport failure.
    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout_secs)
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
