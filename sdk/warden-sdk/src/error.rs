use thiserror::Error;
use warden_program::WardenError;

/// SDK-specific error types for Warden operations
#[derive(Debug, Error)]
pub enum SdkError {
    /// Signer refused or failed to sign
    #[error("Signing error: {0}")]
    Signing(String),

    /// Secret key bytes are not a valid secp256k1 scalar
    #[error("Invalid secret key")]
    InvalidSecretKey,

    /// Session index outside the tree
    #[error("Session {0} not found in tree")]
    SessionNotFound(usize),

    /// Session tree built from no sessions
    #[error("Session tree is empty")]
    EmptySessionTree,

    /// Malformed grant document or address
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// Borsh serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] std::io::Error),

    /// JSON grant parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error surfaced by the authorization core
    #[error("Core error: {0}")]
    Core(#[from] WardenError),
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
