//! Warden Error Types

use thiserror::Error;
use warden_interface::PluginError;
use warden_state::StateError;

/// Hard-abort errors. Soft failures never travel through this type; they are
/// reported as a failed [`warden_state::ValidationData`].
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum WardenError {
    #[error("Not authorized")]
    Unauthorized,

    #[error("Plugin failed the capability probe")]
    ProbeFailed,

    #[error("Operation would leave the wallet without a sudo validator")]
    LastSudoGuard,

    #[error("Validator not found")]
    ValidatorNotFound,

    #[error("Invalid permit")]
    InvalidPermit,

    #[error("No permission for operator")]
    PermissionNotFound,

    #[error("Invalid wallet operation")]
    InvalidWalletOperation,

    #[error("Unsupported")]
    Unsupported,

    #[error("Gas fee exceeds remaining budget")]
    GasFeeExceedsRemaining,

    #[error("Invalid batch length")]
    InvalidBatchLength,

    #[error("Usage exceeds remaining budget")]
    ExceedUsage,

    #[error("Rule tree shape does not match the argument layout")]
    RuleShapeMismatch,

    #[error("Invalid target")]
    InvalidTarget,

    #[error("Invalid selector")]
    InvalidSelector,

    #[error("Invalid arguments")]
    InvalidArguments,

    #[error("Invalid paymaster")]
    InvalidPaymaster,

    #[error("Invalid session root")]
    InvalidSessionRoot,

    #[error("Invalid validation duration")]
    InvalidValidationDuration,

    #[error("Invalid arguments length")]
    InvalidArgumentsLength,

    #[error("Value mismatch")]
    ValueMismatch,

    #[error("Invalid predicate tag")]
    InvalidPredicateTag,

    #[error("Malformed predicate buffer")]
    MalformedPredicate,

    #[error("Predicate tree too deep")]
    PredicateTooDeep,

    #[error("Predicate tree too large")]
    PredicateTooLarge,

    #[error("Invalid configuration")]
    InvalidConfig,

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),
}

impl WardenError {
    /// Stable numeric code for hosts that surface errors as integers.
    pub fn code(&self) -> u32 {
        match self {
            WardenError::Unauthorized => 1,
            WardenError::ProbeFailed => 2,
            WardenError::LastSudoGuard => 3,
            WardenError::ValidatorNotFound => 4,
            WardenError::InvalidPermit => 5,
            WardenError::PermissionNotFound => 6,
            WardenError::InvalidWalletOperation => 7,
            WardenError::Unsupported => 8,
            WardenError::GasFeeExceedsRemaining => 9,
            WardenError::InvalidBatchLength => 10,
            WardenError::ExceedUsage => 11,
            WardenError::RuleShapeMismatch => 12,
            WardenError::InvalidTarget => 13,
            WardenError::InvalidSelector => 14,
            WardenError::InvalidArguments => 15,
            WardenError::InvalidPaymaster => 16,
            WardenError::InvalidSessionRoot => 17,
            WardenError::InvalidValidationDuration => 18,
            WardenError::InvalidArgumentsLength => 19,
            WardenError::ValueMismatch => 20,
            WardenError::InvalidPredicateTag => 21,
            WardenError::MalformedPredicate => 22,
            WardenError::PredicateTooDeep => 23,
            WardenError::PredicateTooLarge => 24,
            WardenError::InvalidConfig => 25,
            WardenError::State(e) => e.code(),
            WardenError::Plugin(e) => e.code(),
        }
    }
}
