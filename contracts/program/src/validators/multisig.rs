//! Threshold secp256k1 validator.
//!
//! The blob's own signature is the first approval; further 65-byte
//! signatures follow the fixed layout. Recovered signers must be strictly
//! ascending, which rules out counting one signer twice.

use std::any::Any;
use std::collections::HashMap;

use borsh::{BorshDeserialize, BorshSerialize};
use warden_interface::{
    InterfaceId, Plugin, PluginError, WalletOperation, PLUGIN_INTERFACE_ID, VALIDATOR_INTERFACE_ID,
};
use warden_state::{Address, PluginState, ValidationData, B256};

use super::{intent_window, reject, ValidationContext, Validator};
use crate::codec::SignatureCodec;
use crate::constants::SIGNATURE_LEN;
use crate::crypto::eth_signed_message_hash;
use crate::error::WardenError;

/// Enable data of the multisig validator (borsh).
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MultisigConfig {
    pub threshold: u8,
    pub signers: Vec<Address>,
}

impl MultisigConfig {
    /// Sorted copy, or `None` if the set is unusable.
    fn normalized(mut self) -> Option<Self> {
        self.signers.sort();
        let distinct = self.signers.windows(2).all(|pair| pair[0] != pair[1]);
        let usable = self.threshold > 0
            && usize::from(self.threshold) <= self.signers.len()
            && self.signers.iter().all(|s| !s.is_zero());
        (distinct && usable).then_some(self)
    }
}

pub struct MultisigValidator {
    id: Address,
    state: PluginState,
    configs: HashMap<Address, MultisigConfig>,
}

impl MultisigValidator {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            state: PluginState::new(),
            configs: HashMap::new(),
        }
    }

    pub fn config_of(&self, wallet: &Address) -> Option<&MultisigConfig> {
        self.configs.get(wallet)
    }

    /// Counts distinct members approving `hash`, enforcing ascending order.
    fn approvals<'s>(
        ctx: &ValidationContext,
        config: &MultisigConfig,
        hash: &B256,
        signatures: impl Iterator<Item = &'s [u8; SIGNATURE_LEN]>,
    ) -> Option<usize> {
        let prefixed = eth_signed_message_hash(hash);
        let mut last: Option<Address> = None;
        let mut count = 0;
        for signature in signatures {
            let signer = ctx
                .recover(hash, signature)
                .filter(|s| config.signers.binary_search(s).is_ok())
                .or_else(|| {
                    ctx.config
                        .accept_prefixed_signatures
                        .then(|| ctx.recover(&prefixed, signature))
                        .flatten()
                        .filter(|s| config.signers.binary_search(s).is_ok())
                })?;
            if last.map_or(false, |prev| signer <= prev) {
                return None;
            }
            last = Some(signer);
            count += 1;
        }
        Some(count)
    }

    fn split_signatures(trailer: &[u8]) -> Option<Vec<&[u8; SIGNATURE_LEN]>> {
        if trailer.len() % SIGNATURE_LEN != 0 {
            return None;
        }
        trailer
            .chunks(SIGNATURE_LEN)
            .map(|chunk| <&[u8; SIGNATURE_LEN]>::try_from(chunk).ok())
            .collect()
    }
}

impl Plugin for MultisigValidator {
    fn id(&self) -> Address {
        self.id
    }

    fn supports_interface(&self, interface_id: InterfaceId) -> bool {
        interface_id == PLUGIN_INTERFACE_ID || interface_id == VALIDATOR_INTERFACE_ID
    }

    fn on_enable(&mut self, wallet: Address, init_data: &[u8]) -> Result<(), PluginError> {
        let config = MultisigConfig::try_from_slice(init_data)
            .ok()
            .and_then(MultisigConfig::normalized)
            .ok_or(PluginError::InvalidInitData)?;
        self.state.initialize(wallet)?;
        self.configs.insert(wallet, config);
        Ok(())
    }

    fn on_disable(&mut self, wallet: &Address) -> Result<(), PluginError> {
        self.state.clear(wallet)?;
        self.configs.remove(wallet);
        Ok(())
    }

    fn is_initialized(&self, wallet: &Address) -> bool {
        self.state.is_initialized(wallet)
    }
}

impl Validator for MultisigValidator {
    fn validate_operation(
        &mut self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<ValidationData, WardenError> {
        let Some(config) = self.configs.get(&ctx.wallet) else {
            return Ok(reject(&self.id, &ctx.wallet, "validator not initialized"));
        };
        let Some((intent, trailer)) = SignatureCodec::decode_extended(&op.signature, op_hash) else {
            return Ok(reject(&self.id, &ctx.wallet, "malformed authorization blob"));
        };
        let Some(extra) = Self::split_signatures(trailer) else {
            return Ok(reject(&self.id, &ctx.wallet, "ragged signature trailer"));
        };
        let window = match intent_window(ctx, &intent, op) {
            Ok(window) => window,
            Err(reason) => return Ok(reject(&self.id, &ctx.wallet, reason)),
        };
        let signatures = core::iter::once(&intent.signature).chain(extra);
        match Self::approvals(ctx, config, &intent.canonical_hash, signatures) {
            Some(count) if count >= usize::from(config.threshold) => {
                tracing::debug!(validator = %self.id, wallet = %ctx.wallet, approvals = count, "operation authorized");
                Ok(ValidationData::success(window))
            },
            Some(_) => Ok(reject(&self.id, &ctx.wallet, "threshold not met")),
            None => Ok(reject(&self.id, &ctx.wallet, "unknown or unordered signer")),
        }
    }

    fn is_valid_signature(
        &self,
        ctx: &ValidationContext,
        hash: &B256,
        signature: &[u8],
    ) -> Result<bool, WardenError> {
        let (Some(config), Some(signatures)) =
            (self.configs.get(&ctx.wallet), Self::split_signatures(signature))
        else {
            return Ok(false);
        };
        Ok(
            Self::approvals(ctx, config, hash, signatures.into_iter())
                .map_or(false, |count| count >= usize::from(config.threshold)),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
