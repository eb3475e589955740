//! secp256k1 recovery and Merkle proof backends.
//!
//! Signatures are `r || s || v` with `v` in `{27, 28}` or `{0, 1}`. High-s
//! signatures are rejected so every authorization has a single encoding.

use warden_interface::{MerkleProofVerifier, SignerRecovery};
use warden_state::{keccak256, merkle, Address, B256};

use crate::constants::{ETH_SIGNED_MESSAGE_PREFIX, SIGNATURE_LEN};

/// Digest an `eth_sign` signer actually signs for `hash`.
pub fn eth_signed_message_hash(hash: &B256) -> B256 {
    keccak256(&[ETH_SIGNED_MESSAGE_PREFIX, hash])
}

/// Address of an uncompressed public key: low 20 bytes of `keccak(x || y)`.
pub fn address_from_public_key(public_key: &libsecp256k1::PublicKey) -> Address {
    let serialized = public_key.serialize();
    Address::from_word(&keccak256(&[&serialized[1..]]))
}

fn recovery_id(v: u8) -> Option<libsecp256k1::RecoveryId> {
    let normalized = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        _ => return None,
    };
    libsecp256k1::RecoveryId::parse(normalized).ok()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Recovery;

impl SignerRecovery for Secp256k1Recovery {
    fn recover_signer(&self, hash: &B256, signature: &[u8; SIGNATURE_LEN]) -> Option<Address> {
        let parsed = libsecp256k1::Signature::parse_standard_slice(&signature[..64]).ok()?;
        if parsed.s.is_high() {
            tracing::debug!("rejecting high-s signature");
            return None;
        }
        let recovery_id = recovery_id(signature[64])?;
        let message = libsecp256k1::Message::parse(hash);
        let public_key = libsecp256k1::recover(&message, &parsed, &recovery_id).ok()?;
        Some(address_from_public_key(&public_key))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeccakMerkleVerifier;

impl MerkleProofVerifier for KeccakMerkleVerifier {
    fn verify_merkle_proof(&self, proof: &[B256], root: &B256, leaf: &B256) -> bool {
        merkle::verify(proof, root, leaf)
    }
}

/// Recovers against `hash`, then against its `eth_sign` digest when `allow_prefixed`.
pub fn recover_with_fallback(
    recovery: &dyn SignerRecovery,
    hash: &B256,
    signature: &[u8; SIGNATURE_LEN],
    expected: &Address,
    allow_prefixed: bool,
) -> bool {
    if recovery.recover_signer(hash, signature).as_ref() == Some(expected) {
        return true;
    }
    allow_prefixed
        && recovery
            .recover_signer(&eth_signed_message_hash(hash), signature)
            .as_ref()
            == Some(expected)
}
