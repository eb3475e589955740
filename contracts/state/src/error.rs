use thiserror::Error;

/// Error types related to state management operations.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The identifier is zero or the reserved sentinel
    #[error("Invalid identifier")]
    InvalidIdentifier,
    /// The identifier is already present
    #[error("Identifier already exists")]
    AlreadyExists,
    /// The identifier is not present
    #[error("Identifier not found")]
    NotFound,
    /// The supplied predecessor does not point at the identifier
    #[error("Stale predecessor hint")]
    StalePredecessor,
    /// Plugin state already initialized for this wallet
    #[error("Already initialized")]
    AlreadyInitialized,
    /// Plugin state not initialized for this wallet
    #[error("Not initialized")]
    NotInitialized,
    /// Usage cost exceeds the remaining budget
    #[error("Usage exceeds remaining budget")]
    ExceedUsage,
    /// Validity window is empty or does not fit 48 bits
    #[error("Invalid validation duration")]
    InvalidValidationDuration,
}

impl StateError {
    /// Stable numeric code, offset to avoid collision with program errors.
    pub fn code(&self) -> u32 {
        *self as u32 + 2000
    }
}
