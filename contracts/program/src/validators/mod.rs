//! Validators: plugins that authorize wallet operations.

pub mod ecdsa;
pub mod multisig;
pub mod session;

use std::any::Any;

use warden_interface::{MerkleProofVerifier, Plugin, SignerRecovery, WalletOperation};
use warden_state::{Address, ValidationData, ValidityWindow, B256};

use crate::codec::SignedIntent;
use crate::config::WardenConfig;
use crate::crypto::recover_with_fallback;
use crate::error::WardenError;

pub use ecdsa::EcdsaValidator;
pub use multisig::{MultisigConfig, MultisigValidator};
pub use session::{Permit, SessionAuthority, SessionClaim, SessionPayload, Simulation};

/// Everything a validator may consult besides its own state.
pub struct ValidationContext<'a> {
    pub wallet: Address,
    /// Current timestamp, used to reject already expired windows
    pub now: u64,
    /// Signer currently holding Sudo authority over the wallet
    pub sudo_signer: Option<Address>,
    pub config: &'a WardenConfig,
    pub recovery: &'a dyn SignerRecovery,
    pub merkle: &'a dyn MerkleProofVerifier,
}

impl<'a> ValidationContext<'a> {
    /// True when `signature` over `hash` was produced by `expected`.
    pub fn signed_by(&self, hash: &B256, signature: &[u8; 65], expected: &Address) -> bool {
        recover_with_fallback(
            self.recovery,
            hash,
            signature,
            expected,
            self.config.accept_prefixed_signatures,
        )
    }

    pub fn recover(&self, hash: &B256, signature: &[u8; 65]) -> Option<Address> {
        self.recovery.recover_signer(hash, signature)
    }

    /// Intent window, or `None` when it is empty or already over.
    pub fn live_window(&self, window: ValidityWindow) -> Option<ValidityWindow> {
        if window.validate().is_err() || window.is_expired(self.now) {
            return None;
        }
        Some(window)
    }
}

pub trait Validator: Plugin {
    /// Decides whether `op` is authorized. Credential mismatches come back as
    /// a failed [`ValidationData`]; only invariant violations are errors.
    fn validate_operation(
        &mut self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<ValidationData, WardenError>;

    /// Off-chain message verification; `signature` excludes the validator prefix.
    fn is_valid_signature(
        &self,
        ctx: &ValidationContext,
        hash: &B256,
        signature: &[u8],
    ) -> Result<bool, WardenError>;

    /// Single signer this validator answers to for `wallet`, if it has one.
    fn signer_of(&self, _wallet: &Address) -> Option<Address> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Soft failure with a logged reason.
pub(crate) fn reject(validator: &Address, wallet: &Address, reason: &'static str) -> ValidationData {
    tracing::warn!(validator = %validator, wallet = %wallet, reason, "validation failed");
    ValidationData::failed()
}

/// Shared checks of single-signer style validators: fee ceiling, window.
pub(crate) fn intent_window(
    ctx: &ValidationContext,
    intent: &SignedIntent,
    op: &WalletOperation,
) -> Result<ValidityWindow, &'static str> {
    if !intent.admits(op) {
        return Err("fee exceeds signed ceiling");
    }
    ctx.live_window(intent.window())
        .ok_or("validity window empty or expired")
}
