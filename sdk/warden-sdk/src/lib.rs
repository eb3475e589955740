pub mod basic;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::basic::intent::IntentBuilder;
pub use crate::basic::permit::PermitBuilder;
pub use crate::basic::session::{RuleBuilder, SessionTree};
pub use crate::core::signer::{LocalSigner, WardenSigner};
pub use crate::error::{Result, SdkError};
pub use crate::types::{PermissionGrant, ValidatorInfo};
pub use crate::utils::{authorizes, decode_validation, list_validators};

pub mod state {
    pub use warden_state::{Address, OperatorPermission, Session, ValidationData, B256};
}
