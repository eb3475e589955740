use warden_interface::WalletOperation;
use warden_program::{Schedule, SessionPayload, SignatureCodec};
use warden_state::{Address, B256};

use crate::core::signer::{sign_with, WardenSigner};
use crate::error::{Result, SdkError};

/// Builds the authorization blob a validator reads from an operation.
///
/// Extra approvers (multisig) go after the fixed layout sorted by address,
/// with the lowest one taking the primary signature slot. A session payload
/// is appended as-is. No validator reads both.
pub struct IntentBuilder<'a> {
    validator: Address,
    schedule: Option<Schedule>,
    cosigners: Vec<&'a dyn WardenSigner>,
    trailer: Vec<u8>,
}

impl<'a> IntentBuilder<'a> {
    pub fn new(validator: Address) -> Self {
        Self {
            validator,
            schedule: None,
            cosigners: Vec::new(),
            trailer: Vec::new(),
        }
    }

    /// Bind the signature to a validity window and fee ceiling.
    pub fn scheduled(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn cosigner(mut self, signer: &'a dyn WardenSigner) -> Self {
        self.cosigners.push(signer);
        self
    }

    pub fn session(mut self, payload: &SessionPayload) -> Result<Self> {
        self.trailer = borsh::to_vec(payload)?;
        Ok(self)
    }

    /// Digest the signers sign for `op_hash`.
    pub fn digest(&self, op_hash: &B256) -> B256 {
        match &self.schedule {
            Some(schedule) => schedule.canonical_hash(op_hash),
            None => *op_hash,
        }
    }

    pub async fn sign(self, op_hash: &B256, signer: &dyn WardenSigner) -> Result<Vec<u8>> {
        let digest = self.digest(op_hash);
        let mut signers: Vec<&dyn WardenSigner> = Vec::with_capacity(self.cosigners.len() + 1);
        signers.push(signer);
        signers.extend(self.cosigners.iter().copied());
        signers.sort_by_key(|s| s.address());

        let mut signatures = Vec::with_capacity(signers.len());
        for s in signers {
            signatures.push(sign_with(s, &digest).await?);
        }
        let (primary, extra) = signatures
            .split_first()
            .ok_or_else(|| SdkError::Signing("no signer".to_string()))?;

        let mut blob = match &self.schedule {
            Some(schedule) => SignatureCodec::encode_scheduled(&self.validator, schedule, primary),
            None => SignatureCodec::encode_instant(&self.validator, primary),
        };
        for signature in extra {
            blob.extend_from_slice(signature);
        }
        blob.extend_from_slice(&self.trailer);
        Ok(blob)
    }

    /// Signs `op` in place and returns its hash.
    pub async fn sign_operation(
        self,
        op: &mut WalletOperation,
        entry_point: &Address,
        chain_id: u64,
        signer: &dyn WardenSigner,
    ) -> Result<B256> {
        let op_hash = op.hash(entry_point, chain_id);
        op.signature = self.sign(&op_hash, signer).await?;
        Ok(op_hash)
    }
}
