use warden_program::Permit;
use warden_state::{Address, OperatorPermission, B256};

use crate::core::signer::{sign_with, WardenSigner};
use crate::error::Result;

/// Owner-side construction of a session permit.
pub struct PermitBuilder {
    wallet: Address,
    operator: Address,
    permission: OperatorPermission,
    spending_limit_config_hash: B256,
}

impl PermitBuilder {
    pub fn new(wallet: Address, operator: Address, permission: OperatorPermission) -> Self {
        Self {
            wallet,
            operator,
            permission,
            spending_limit_config_hash: [0u8; 32],
        }
    }

    pub fn spending_limit_config_hash(mut self, hash: B256) -> Self {
        self.spending_limit_config_hash = hash;
        self
    }

    pub fn digest(&self) -> B256 {
        Permit::digest(
            &self.wallet,
            &self.operator,
            &self.permission,
            &self.spending_limit_config_hash,
        )
    }

    /// `owner` must be the wallet's Sudo signer for the permit to redeem.
    pub async fn sign(self, owner: &dyn WardenSigner) -> Result<Permit> {
        let signature = sign_with(owner, &self.digest()).await?;
        Ok(Permit {
            operator: self.operator,
            permission: self.permission,
            spending_limit_config_hash: self.spending_limit_config_hash,
            signature,
        })
    }
}
