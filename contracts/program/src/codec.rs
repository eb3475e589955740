//! Authorization blob codec.
//!
//! ```text
//! Instant   [20B validator][0x00][65B signature]                                    86 bytes
//! Scheduled [20B validator][0x01][6B until][6B after][32B maxFee][32B maxPriority]
//!           [65B signature]                                                         162 bytes
//! ```
//!
//! Validators that need more material (extra signatures, session claims)
//! append it after the fixed layout; [`SignatureCodec::decode_extended`]
//! hands that trailer back untouched.

use warden_assertions::{check_array_32, check_split};
use warden_interface::WalletOperation;
use warden_state::{be_u48, be_word_u128, keccak256, read_be_u48, Address, ValidityWindow, B256};

use crate::constants::{
    INSTANT_BLOB_LEN, KIND_INSTANT, KIND_SCHEDULED, SCHEDULED_BLOB_LEN, SIGNATURE_LEN,
    VALIDATOR_ID_LEN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    /// Valid immediately, signed over the operation hash
    Instant,
    /// Bound to a window and a fee ceiling
    Scheduled,
}

/// Window and fee ceiling signed into a scheduled intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Schedule {
    pub valid_until: u64,
    pub valid_after: u64,
    pub max_fee_per_gas: B256,
    pub max_priority_fee_per_gas: B256,
}

impl Schedule {
    pub fn new(valid_until: u64, valid_after: u64, max_fee_per_gas: u128, max_priority: u128) -> Self {
        Self {
            valid_until,
            valid_after,
            max_fee_per_gas: be_word_u128(max_fee_per_gas),
            max_priority_fee_per_gas: be_word_u128(max_priority),
        }
    }

    pub fn window(&self) -> ValidityWindow {
        ValidityWindow::new(self.valid_after, self.valid_until)
    }

    /// Hash the signer commits to for `op_hash` under this schedule.
    pub fn canonical_hash(&self, op_hash: &B256) -> B256 {
        keccak256(&[
            op_hash,
            &be_u48(self.valid_until),
            &be_u48(self.valid_after),
            &self.max_fee_per_gas,
            &self.max_priority_fee_per_gas,
        ])
    }

    /// Both actual fees must stay strictly below the signed ceilings.
    pub fn admits_fees(&self, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> bool {
        be_word_u128(max_fee_per_gas) < self.max_fee_per_gas
            && be_word_u128(max_priority_fee_per_gas) < self.max_priority_fee_per_gas
    }
}

/// Decoded authorization blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIntent {
    pub validator: Address,
    pub kind: IntentKind,
    pub signature: [u8; SIGNATURE_LEN],
    /// Zeroed for instant intents
    pub schedule: Schedule,
    /// Hash the signature must cover
    pub canonical_hash: B256,
}

impl SignedIntent {
    pub fn window(&self) -> ValidityWindow {
        match self.kind {
            IntentKind::Instant => ValidityWindow::UNBOUNDED,
            IntentKind::Scheduled => self.schedule.window(),
        }
    }

    /// Instant intents carry no ceiling; scheduled ones must admit the operation's fees.
    pub fn admits(&self, op: &WalletOperation) -> bool {
        match self.kind {
            IntentKind::Instant => true,
            IntentKind::Scheduled => self
                .schedule
                .admits_fees(op.max_fee_per_gas, op.max_priority_fee_per_gas),
        }
    }
}

pub struct SignatureCodec;

impl SignatureCodec {
    /// Validator named by the blob prefix.
    pub fn validator_of(blob: &[u8]) -> Option<Address> {
        blob.get(..VALIDATOR_ID_LEN).and_then(Address::from_slice)
    }

    /// Strict decode: the blob must be exactly 86 or 162 bytes.
    pub fn decode(blob: &[u8], op_hash: &B256) -> Option<SignedIntent> {
        match Self::decode_extended(blob, op_hash)? {
            (intent, []) => Some(intent),
            _ => None,
        }
    }

    /// Decodes the fixed layout and returns whatever follows it.
    pub fn decode_extended<'a>(blob: &'a [u8], op_hash: &B256) -> Option<(SignedIntent, &'a [u8])> {
        let (validator, rest) = check_split(blob, VALIDATOR_ID_LEN, ()).ok()?;
        let validator = Address::from_slice(validator)?;
        let (kind, rest) = check_split(rest, 1, ()).ok()?;
        match kind[0] {
            KIND_INSTANT => {
                let (signature, trailer) = check_split(rest, SIGNATURE_LEN, ()).ok()?;
                let intent = SignedIntent {
                    validator,
                    kind: IntentKind::Instant,
                    signature: signature.try_into().ok()?,
                    schedule: Schedule::default(),
                    canonical_hash: *op_hash,
                };
                Some((intent, trailer))
            },
            KIND_SCHEDULED => {
                let (until, rest) = check_split(rest, 6, ()).ok()?;
                let (after, rest) = check_split(rest, 6, ()).ok()?;
                let (max_fee, rest) = check_split(rest, 32, ()).ok()?;
                let (max_priority, rest) = check_split(rest, 32, ()).ok()?;
                let (signature, trailer) = check_split(rest, SIGNATURE_LEN, ()).ok()?;
                let schedule = Schedule {
                    valid_until: read_be_u48(until.try_into().ok()?),
                    valid_after: read_be_u48(after.try_into().ok()?),
                    max_fee_per_gas: check_array_32(max_fee, ()).ok()?,
                    max_priority_fee_per_gas: check_array_32(max_priority, ()).ok()?,
                };
                let intent = SignedIntent {
                    validator,
                    kind: IntentKind::Scheduled,
                    signature: signature.try_into().ok()?,
                    canonical_hash: schedule.canonical_hash(op_hash),
                    schedule,
                };
                Some((intent, trailer))
            },
            kind => {
                tracing::debug!(kind, "unrecognized intent kind");
                None
            },
        }
    }

    pub fn encode_instant(validator: &Address, signature: &[u8; SIGNATURE_LEN]) -> Vec<u8> {
        let mut blob = Vec::with_capacity(INSTANT_BLOB_LEN);
        blob.extend_from_slice(validator.as_ref());
        blob.push(KIND_INSTANT);
        blob.extend_from_slice(signature);
        blob
    }

    pub fn encode_scheduled(
        validator: &Address,
        schedule: &Schedule,
        signature: &[u8; SIGNATURE_LEN],
    ) -> Vec<u8> {
        let mut blob = Vec::with_capacity(SCHEDULED_BLOB_LEN);
        blob.extend_from_slice(validator.as_ref());
        blob.push(KIND_SCHEDULED);
        blob.extend_from_slice(&be_u48(schedule.valid_until));
        blob.extend_from_slice(&be_u48(schedule.valid_after));
        blob.extend_from_slice(&schedule.max_fee_per_gas);
        blob.extend_from_slice(&schedule.max_priority_fee_per_gas);
        blob.extend_from_slice(signature);
        blob
    }
}
