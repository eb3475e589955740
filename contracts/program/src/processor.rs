//! Authorization core facade.
//!
//! Routes an operation to the validator named by its authorization blob,
//! after confirming the validator is enabled for the wallet in a class
//! strong enough for what the operation does.

use warden_interface::{
    Execution, MerkleProofVerifier, SignerRecovery, SudoSignerLookup, WalletOperation,
};
use warden_state::{Address, OperatorPermission, ValidationData, B256};

use crate::codec::SignatureCodec;
use crate::config::WardenConfig;
use crate::crypto::{KeccakMerkleVerifier, Secp256k1Recovery};
use crate::error::WardenError;
use crate::governance::GovernanceContext;
use crate::registry::DisableReport;
use crate::validator_registry::{ValidatorClass, ValidatorRegistry};
use crate::validators::{Permit, SessionAuthority, Simulation, ValidationContext, Validator};

pub struct AuthorizationCore {
    config: WardenConfig,
    validators: ValidatorRegistry,
    recovery: Box<dyn SignerRecovery>,
    merkle: Box<dyn MerkleProofVerifier>,
}

impl AuthorizationCore {
    pub fn new(config: WardenConfig) -> Result<Self, WardenError> {
        Self::with_backends(
            config,
            Box::new(Secp256k1Recovery),
            Box::new(KeccakMerkleVerifier),
        )
    }

    pub fn with_backends(
        config: WardenConfig,
        recovery: Box<dyn SignerRecovery>,
        merkle: Box<dyn MerkleProofVerifier>,
    ) -> Result<Self, WardenError> {
        config.validate()?;
        Ok(Self {
            validators: ValidatorRegistry::new(config.max_page_size),
            config,
            recovery,
            merkle,
        })
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    pub fn deploy_validator(&mut self, validator: Box<dyn Validator>) -> Result<Address, WardenError> {
        self.validators.deploy(validator)
    }

    pub fn install_validator(
        &mut self,
        gov: &GovernanceContext,
        id: Address,
        class: ValidatorClass,
        init_data: &[u8],
    ) -> Result<(), WardenError> {
        self.validators.enable(gov, id, class, init_data)
    }

    pub fn uninstall_validator(
        &mut self,
        gov: &GovernanceContext,
        prev: Address,
        id: Address,
    ) -> Result<DisableReport, WardenError> {
        self.validators.disable(gov, prev, id)
    }

    pub fn uninstall_validator_auto(
        &mut self,
        gov: &GovernanceContext,
        id: Address,
    ) -> Result<DisableReport, WardenError> {
        self.validators.disable_auto(gov, id)
    }

    pub fn reclassify_validator(
        &mut self,
        gov: &GovernanceContext,
        id: Address,
        class: ValidatorClass,
    ) -> Result<(), WardenError> {
        self.validators.reclassify(gov, id, class)
    }

    /// Class an operation needs: anything touching the wallet itself is Sudo.
    pub fn required_class(op: &WalletOperation) -> ValidatorClass {
        if op.targets_self() {
            ValidatorClass::Sudo
        } else {
            ValidatorClass::Normal
        }
    }

    fn context(&self, wallet: Address, now: u64) -> ValidationContext<'_> {
        ValidationContext {
            wallet,
            now,
            sudo_signer: self.validators.sudo_signer(&wallet),
            config: &self.config,
            recovery: &*self.recovery,
            merkle: &*self.merkle,
        }
    }

    /// Validates `op` for its sender wallet and returns the packed validation word.
    pub fn validate_signature(
        &mut self,
        op: &WalletOperation,
        op_hash: &B256,
        now: u64,
    ) -> Result<B256, WardenError> {
        let wallet = op.sender;
        let Some(id) = SignatureCodec::validator_of(&op.signature) else {
            tracing::warn!(wallet = %wallet, "authorization blob too short");
            return Ok(ValidationData::failed().pack());
        };
        let class = self.validators.class_of(&wallet, &id);
        let required = Self::required_class(op);
        let permitted = match class {
            ValidatorClass::Sudo => true,
            ValidatorClass::Normal => required == ValidatorClass::Normal,
            ValidatorClass::Disabled => false,
        };
        if !permitted {
            tracing::warn!(wallet = %wallet, validator = %id, ?class, ?required, "validator not permitted");
            return Ok(ValidationData::failed().pack());
        }

        let sudo_signer = self.validators.sudo_signer(&wallet);
        let AuthorizationCore {
            config,
            validators,
            recovery,
            merkle,
        } = self;
        let ctx = ValidationContext {
            wallet,
            now,
            sudo_signer,
            config,
            recovery: &**recovery,
            merkle: &**merkle,
        };
        let validator = validators
            .validator_mut(&id)
            .ok_or(WardenError::ValidatorNotFound)?;
        Ok(validator.validate_operation(&ctx, op, op_hash)?.pack())
    }

    /// Off-chain verification of `signature` (`[20B validator][material]`) over `hash`.
    pub fn is_valid_signature(&self, wallet: &Address, hash: &B256, signature: &[u8], now: u64) -> bool {
        let Some(id) = SignatureCodec::validator_of(signature) else {
            return false;
        };
        if self.validators.class_of(wallet, &id) == ValidatorClass::Disabled {
            return false;
        }
        let ctx = self.context(*wallet, now);
        self.validators
            .validator(&id)
            .map(|validator| validator.is_valid_signature(&ctx, hash, &signature[20..]))
            .map_or(false, |result| result.unwrap_or(false))
    }

    pub fn session_authority(&self, id: &Address) -> Option<&SessionAuthority> {
        self.validators
            .validator(id)
            .and_then(|v| v.as_any().downcast_ref::<SessionAuthority>())
    }

    pub fn session_authority_mut(&mut self, id: &Address) -> Option<&mut SessionAuthority> {
        self.validators
            .validator_mut(id)
            .and_then(|v| v.as_any_mut().downcast_mut::<SessionAuthority>())
    }

    /// Dry run of `op` against session authority `id`; nothing is committed.
    pub fn simulate_session(
        &self,
        id: &Address,
        op: &WalletOperation,
        op_hash: &B256,
        now: u64,
    ) -> Result<Simulation, WardenError> {
        if !self.validators.is_enabled(&op.sender, id) {
            return Err(WardenError::ValidatorNotFound);
        }
        let authority = self.session_authority(id).ok_or(WardenError::Unsupported)?;
        let ctx = self.context(op.sender, now);
        match op.execution {
            Execution::Single(_) => authority.simulate_single_execute(&ctx, op, op_hash),
            Execution::Batch(_) => authority.simulate_batch_execute(&ctx, op, op_hash),
        }
    }

    /// Redeems an owner permit on the wallet's session authority `id`.
    pub fn activate_permission(
        &mut self,
        wallet: Address,
        id: &Address,
        permit: &Permit,
        now: u64,
    ) -> Result<(), WardenError> {
        if !self.validators.is_enabled(&wallet, id) {
            return Err(WardenError::ValidatorNotFound);
        }
        let sudo_signer = self.validators.sudo_signer(&wallet);
        let AuthorizationCore {
            config,
            validators,
            recovery,
            merkle,
        } = self;
        let ctx = ValidationContext {
            wallet,
            now,
            sudo_signer,
            config,
            recovery: &**recovery,
            merkle: &**merkle,
        };
        let authority = validators
            .validator_mut(id)
            .and_then(|v| v.as_any_mut().downcast_mut::<SessionAuthority>())
            .ok_or(WardenError::Unsupported)?;
        authority.activate_permission(&ctx, permit)
    }

    /// Wallet-governed permission overwrite on session authority `id`.
    pub fn set_permission(
        &mut self,
        gov: &GovernanceContext,
        id: &Address,
        operator: Address,
        permission: OperatorPermission,
    ) -> Result<(), WardenError> {
        gov.require_self()?;
        if !self.validators.is_enabled(&gov.wallet, id) {
            return Err(WardenError::ValidatorNotFound);
        }
        self.session_authority_mut(id)
            .ok_or(WardenError::Unsupported)?
            .set_permission(gov, operator, permission)
    }
}
