use thiserror::Error;

/// Errors surfaced by the client library.
///
/// Failures on inbound traffic (decryption, parsing) are never returned to
/// callers; they are logged and the offending event is dropped. Everything
/// here originates from a caller's own command or from construction.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("private key must be 64 hex chars or a bech32 nsec")]
    InvalidKeyFormat,

    #[error("malformed bech32 nsec key")]
    InvalidBech32,

    #[error("no private key loaded")]
    KeyNotSet,

    #[error("no mostro pubkey configured")]
    MostroPubkeyNotSet,

    #[error("order has no id")]
    MissingOrderId,

    #[error("relay list is empty")]
    EmptyRelayList,

    #[error("gateway is not connected")]
    NotConnected,

    #[error("no relay accepted the event")]
    PublishFailed,

    #[error("message decryption failed")]
    DecryptFailed,

    #[error("malformed protocol message")]
    MalformedMessage,

    #[error("timed out waiting for a reply")]
    Timeout,

    #[error("client disconnected")]
    Disconnected,

    #[error("amounts must be non-negative")]
    InvalidAmount,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("relay error: {0}")]
    Relay(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
