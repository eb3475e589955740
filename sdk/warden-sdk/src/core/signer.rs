use async_trait::async_trait;
use warden_program::crypto::address_from_public_key;
use warden_state::{Address, B256};

use crate::error::{Result, SdkError};

/// Abstraction for an entity that can sign 32-byte digests.
/// This allows the SDK to work with:
/// 1. Local keys (Backend/CLI)
/// 2. Remote signers and hardware wallets behind an async boundary
#[async_trait]
pub trait WardenSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign a digest, returning `r || s || v` with `v` in {27, 28}.
    /// Returns Err if not supported or failed.
    async fn sign_hash(&self, hash: &B256) -> std::result::Result<[u8; 65], String>;
}

/// In-process secp256k1 key.
pub struct LocalSigner {
    secret: libsecp256k1::SecretKey,
    address: Address,
}

impl LocalSigner {
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self> {
        let secret =
            libsecp256k1::SecretKey::parse(secret).map_err(|_| SdkError::InvalidSecretKey)?;
        let address = address_from_public_key(&libsecp256k1::PublicKey::from_secret_key(&secret));
        Ok(Self { secret, address })
    }

    /// Synchronous signing, for callers that hold the key directly.
    pub fn sign_hash_sync(&self, hash: &B256) -> [u8; 65] {
        let (signature, recovery_id) =
            libsecp256k1::sign(&libsecp256k1::Message::parse(hash), &self.secret);
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.serialize());
        out[64] = recovery_id.serialize() + 27;
        out
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WardenSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_hash(&self, hash: &B256) -> std::result::Result<[u8; 65], String> {
        Ok(self.sign_hash_sync(hash))
    }
}

/// Signs through `signer`, mapping refusals into [`SdkError::Signing`].
pub(crate) async fn sign_with(signer: &dyn WardenSigner, hash: &B256) -> Result<[u8; 65]> {
    signer.sign_hash(hash).await.map_err(SdkError::Signing)
}
