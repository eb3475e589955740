//! Operator permission envelope and the usage ledger it seeds.

use borsh::{BorshDeserialize, BorshSerialize};
use warden_assertions::check_fits_bits;

use crate::{be_u48, keccak256, Address, StateError, B256, MAX_U48};

/// `[valid_after, valid_until]` in 48-bit timestamps; `valid_until == 0` means no expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ValidityWindow {
    pub valid_after: u64,
    pub valid_until: u64,
}

impl ValidityWindow {
    pub const UNBOUNDED: ValidityWindow = ValidityWindow {
        valid_after: 0,
        valid_until: 0,
    };

    pub fn new(valid_after: u64, valid_until: u64) -> Self {
        Self {
            valid_after,
            valid_until,
        }
    }

    fn effective_until(&self) -> u64 {
        if self.valid_until == 0 {
            MAX_U48
        } else {
            self.valid_until
        }
    }

    /// Both bounds fit 48 bits and the window is not empty.
    pub fn validate(&self) -> Result<(), StateError> {
        check_fits_bits(self.valid_after, 48, StateError::InvalidValidationDuration)?;
        check_fits_bits(self.valid_until, 48, StateError::InvalidValidationDuration)?;
        if self.valid_after > self.effective_until() {
            return Err(StateError::InvalidValidationDuration);
        }
        Ok(())
    }

    /// Overlap of two windows, `None` when they are disjoint.
    pub fn intersect(&self, other: &ValidityWindow) -> Option<ValidityWindow> {
        let valid_after = self.valid_after.max(other.valid_after);
        let valid_until = if self.valid_until == 0 && other.valid_until == 0 {
            0
        } else {
            self.effective_until().min(other.effective_until())
        };
        let window = ValidityWindow {
            valid_after,
            valid_until,
        };
        (valid_after <= window.effective_until()).then_some(window)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.valid_until != 0 && now > self.valid_until
    }

    pub fn is_active(&self, now: u64) -> bool {
        !self.is_expired(now) && now >= self.valid_after
    }
}

/// Envelope an owner grants to one operator of one wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct OperatorPermission {
    /// Merkle root over the operator's sessions
    pub session_root: B256,
    /// Only fee sponsor the operator may name; zero means none
    pub allowed_paymaster: Address,
    pub valid_until: u64,
    pub valid_after: u64,
    /// Gas budget in fee units
    pub gas_remaining: u128,
    /// Number of session calls allowed
    pub time_remaining: u64,
}

impl OperatorPermission {
    pub fn window(&self) -> ValidityWindow {
        ValidityWindow::new(self.valid_after, self.valid_until)
    }

    pub fn validate(&self) -> Result<(), StateError> {
        self.window().validate()
    }

    /// Hash bound into the owner's permit.
    pub fn hash(&self) -> B256 {
        keccak256(&[
            &self.session_root,
            self.allowed_paymaster.as_ref(),
            &be_u48(self.valid_until),
            &be_u48(self.valid_after),
            &self.gas_remaining.to_be_bytes(),
            &self.time_remaining.to_be_bytes(),
        ])
    }

    /// Fresh ledger holding the envelope's full budget.
    pub fn ledger(&self) -> UsageLedger {
        UsageLedger {
            gas_remaining: self.gas_remaining,
            time_remaining: self.time_remaining,
        }
    }
}

/// Cost of one authorization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCost {
    pub gas: u128,
    pub time: u64,
}

/// Remaining quota for one (wallet, operator); never increases through use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UsageLedger {
    pub gas_remaining: u128,
    pub time_remaining: u64,
}

impl UsageLedger {
    /// Ledger after paying `cost`, without mutating `self`.
    pub fn check(&self, cost: &UsageCost) -> Result<UsageLedger, StateError> {
        let gas_remaining = self
            .gas_remaining
            .checked_sub(cost.gas)
            .ok_or(StateError::ExceedUsage)?;
        let time_remaining = self
            .time_remaining
            .checked_sub(cost.time)
            .ok_or(StateError::ExceedUsage)?;
        Ok(UsageLedger {
            gas_remaining,
            time_remaining,
        })
    }

    /// Pays `cost` or leaves the ledger untouched.
    pub fn debit(&mut self, cost: &UsageCost) -> Result<(), StateError> {
        *self = self.check(cost)?;
        Ok(())
    }
}
