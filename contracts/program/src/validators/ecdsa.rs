//! Single-owner secp256k1 validator.

use std::any::Any;
use std::collections::HashMap;

use warden_interface::{
    InterfaceId, Plugin, PluginError, WalletOperation, PLUGIN_INTERFACE_ID, VALIDATOR_INTERFACE_ID,
};
use warden_state::{Address, PluginState, ValidationData, B256};

use super::{intent_window, reject, ValidationContext, Validator};
use crate::codec::SignatureCodec;
use crate::error::WardenError;

/// Authorizes operations signed by one owner address per wallet.
///
/// Enable data is the 20-byte owner address.
pub struct EcdsaValidator {
    id: Address,
    state: PluginState,
    owners: HashMap<Address, Address>,
}

impl EcdsaValidator {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            state: PluginState::new(),
            owners: HashMap::new(),
        }
    }

    pub fn owner_of(&self, wallet: &Address) -> Option<Address> {
        self.owners.get(wallet).copied()
    }
}

impl Plugin for EcdsaValidator {
    fn id(&self) -> Address {
        self.id
    }

    fn supports_interface(&self, interface_id: InterfaceId) -> bool {
        interface_id == PLUGIN_INTERFACE_ID || interface_id == VALIDATOR_INTERFACE_ID
    }

    fn on_enable(&mut self, wallet: Address, init_data: &[u8]) -> Result<(), PluginError> {
        let owner = Address::from_slice(init_data)
            .filter(|owner| !owner.is_zero())
            .ok_or(PluginError::InvalidInitData)?;
        self.state.initialize(wallet)?;
        self.owners.insert(wallet, owner);
        Ok(())
    }

    fn on_disable(&mut self, wallet: &Address) -> Result<(), PluginError> {
        self.state.clear(wallet)?;
        self.owners.remove(wallet);
        Ok(())
    }

    fn is_initialized(&self, wallet: &Address) -> bool {
        self.state.is_initialized(wallet)
    }
}

impl Validator for EcdsaValidator {
    fn validate_operation(
        &mut self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<ValidationData, WardenError> {
        let Some(owner) = self.owner_of(&ctx.wallet) else {
            return Ok(reject(&self.id, &ctx.wallet, "validator not initialized"));
        };
        let Some(intent) = SignatureCodec::decode(&op.signature, op_hash) else {
            return Ok(reject(&self.id, &ctx.wallet, "malformed authorization blob"));
        };
        let window = match intent_window(ctx, &intent, op) {
            Ok(window) => window,
            Err(reason) => return Ok(reject(&self.id, &ctx.wallet, reason)),
        };
        if !ctx.signed_by(&intent.canonical_hash, &intent.signature, &owner) {
            return Ok(reject(&self.id, &ctx.wallet, "signer is not the owner"));
        }
        tracing::debug!(validator = %self.id, wallet = %ctx.wallet, kind = ?intent.kind, "operation authorized");
        Ok(ValidationData::success(window))
    }

    fn is_valid_signature(
        &self,
        ctx: &ValidationContext,
        hash: &B256,
        signature: &[u8],
    ) -> Result<bool, WardenError> {
        let (Some(owner), Ok(signature)) = (self.owner_of(&ctx.wallet), <&[u8; 65]>::try_from(signature))
        else {
            return Ok(false);
        };
        Ok(ctx.signed_by(hash, signature, &owner))
    }

    fn signer_of(&self, wallet: &Address) -> Option<Address> {
        self.owner_of(wallet)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
