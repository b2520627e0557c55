use thiserror::Error;

/// Errors surfaced by the messaging adapter. Every variant carries a
/// human-readable cause; nothing is swallowed silently.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient number could not be normalized to an international
    /// channel address.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The request never produced an HTTP response (DNS, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("Provider API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The adapter configuration is incomplete (missing credentials).
    #[error("Configuration error: {0}")]
    Config(String),
}
