//! Warden State Module
//!
//! Wallet-scoped state shared by the authorization program: identifiers, the
//! ordered identifier set backing every registry, plugin initialization flags,
//! operator permissions with their usage ledger, session leaves and the packed
//! validation word.

pub mod error;
pub mod merkle;
pub mod ordered_set;
pub mod permission;
pub mod plugin_state;
pub mod session;
pub mod validation;

use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use sha3::{Digest, Keccak256};

pub use error::StateError;
pub use ordered_set::{OrderedIdentifierSet, Page};
pub use permission::{OperatorPermission, UsageCost, UsageLedger, ValidityWindow};
pub use plugin_state::PluginState;
pub use session::Session;
pub use validation::ValidationData;

/// 32-byte hash / word.
pub type B256 = [u8; 32];

/// 20-byte identifier for wallets, plugins, operators and call targets.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const LEN: usize = 20;
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Reads an address from exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(bytes).ok().map(Self)
    }

    /// Address occupying the low 20 bytes of a 32-byte word.
    pub fn from_word(word: &B256) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Self(bytes)
    }

    /// Left-pads the address into a 32-byte word.
    pub fn to_word(&self) -> B256 {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Reserved head/tail marker of every [`OrderedIdentifierSet`].
pub const SENTINEL: Address = Address([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
]);

/// Largest value representable in the 48-bit timestamp fields.
pub const MAX_U48: u64 = (1 << 48) - 1;

/// Keccak-256 over the concatenation of `parts`.
pub fn keccak256(parts: &[&[u8]]) -> B256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Big-endian encoding of the low 48 bits of `value`.
pub fn be_u48(value: u64) -> [u8; 6] {
    let bytes = value.to_be_bytes();
    let mut out = [0u8; 6];
    out.copy_from_slice(&bytes[2..]);
    out
}

/// Reads a big-endian 48-bit integer.
pub fn read_be_u48(bytes: &[u8; 6]) -> u64 {
    let mut buf = [0u8; 8];
    buf[2..].copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

/// Big-endian u128 left-padded into a 32-byte word.
pub fn be_word_u128(value: u128) -> B256 {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}
