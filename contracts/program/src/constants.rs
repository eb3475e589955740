/// Validator identifier prefix of every authorization blob
pub const VALIDATOR_ID_LEN: usize = 20;

/// `r || s || v`
pub const SIGNATURE_LEN: usize = 65;

pub const KIND_INSTANT: u8 = 0;
pub const KIND_SCHEDULED: u8 = 1;

/// `[20B validator][1B kind][65B signature]`
pub const INSTANT_BLOB_LEN: usize = VALIDATOR_ID_LEN + 1 + SIGNATURE_LEN;

/// `[20B validator][1B kind][6B until][6B after][32B maxFee][32B maxPriorityFee][65B signature]`
pub const SCHEDULED_BLOB_LEN: usize = VALIDATOR_ID_LEN + 1 + 6 + 6 + 32 + 32 + SIGNATURE_LEN;

/// Prefix applied by `eth_sign` style signers to a 32-byte digest
pub const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Time cost charged per consumed session
pub const TIME_COST_PER_SESSION: u64 = 1;
