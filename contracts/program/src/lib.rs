//! Warden Program - Authorization Core
//!
//! Decides, for every requested wallet operation, whether the presented
//! credential authorizes it: plugin and validator registries, the
//! authorization blob codec, the calldata predicate engine and the session
//! authority with its usage ledger.

pub mod abi;
pub mod codec;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod governance;
pub mod predicate;
pub mod processor;
pub mod registry;
pub mod validator_registry;
pub mod validators;

pub use abi::{encode_arguments, Argument, MAX_ARGUMENT_DEPTH};
pub use codec::{IntentKind, Schedule, SignatureCodec, SignedIntent};
pub use config::WardenConfig;
pub use error::WardenError;
pub use governance::GovernanceContext;
pub use predicate::{Literal, PredicateLimits, PredicateNode};
pub use processor::AuthorizationCore;
pub use registry::{DisableReport, PluginRegistry};
pub use validator_registry::{ClassCounts, ValidatorClass, ValidatorRegistry};
pub use validators::{
    EcdsaValidator, MultisigConfig, MultisigValidator, Permit, SessionAuthority, SessionClaim,
    SessionPayload, Simulation, ValidationContext, Validator,
};
