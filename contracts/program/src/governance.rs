use warden_state::Address;

use crate::error::WardenError;

/// Who is asking to mutate which wallet's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernanceContext {
    pub wallet: Address,
    pub caller: Address,
}

impl GovernanceContext {
    pub fn new(wallet: Address, caller: Address) -> Self {
        Self { wallet, caller }
    }

    /// Context of a wallet acting on itself.
    pub fn self_call(wallet: Address) -> Self {
        Self {
            wallet,
            caller: wallet,
        }
    }

    /// Only the wallet may reconfigure itself.
    pub fn require_self(&self) -> Result<(), WardenError> {
        if self.caller != self.wallet || self.wallet.is_zero() {
            tracing::warn!(wallet = %self.wallet, caller = %self.caller, "unauthorized governance call");
            return Err(WardenError::Unauthorized);
        }
        Ok(())
    }
}
