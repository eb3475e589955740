//! Warden Plugin Interface
//!
//! Types exchanged between the wallet core and its plugins: the operation
//! being authorized, the lifecycle every plugin implements, and the small
//! capability traits that keep cryptographic backends swappable.

pub mod operation;

use thiserror::Error;
use warden_state::{Address, B256};

pub use operation::{Call, Execution, WalletOperation};

/// ERC-165 style interface identifier.
pub type InterfaceId = [u8; 4];

/// Every plugin answers true for this identifier.
pub const PLUGIN_INTERFACE_ID: InterfaceId = [0x89, 0x72, 0x30, 0x49];

/// Plugins that can authorize wallet operations.
pub const VALIDATOR_INTERFACE_ID: InterfaceId = [0x1b, 0x9e, 0x4c, 0x06];

/// Capability a registry probes for before accepting a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Plugin,
    Validator,
}

impl Capability {
    pub fn interface_id(&self) -> InterfaceId {
        match self {
            Capability::Plugin => PLUGIN_INTERFACE_ID,
            Capability::Validator => VALIDATOR_INTERFACE_ID,
        }
    }
}

/// Error codes for plugin lifecycle hooks
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginError {
    #[error("Plugin already initialized for wallet")]
    AlreadyInitialized,
    #[error("Plugin not initialized for wallet")]
    NotInitialized,
    #[error("Invalid plugin init data")]
    InvalidInitData,
    #[error("Plugin rejected the request")]
    Rejected,
}

impl PluginError {
    pub fn code(&self) -> u32 {
        *self as u32 + 1000
    }
}

impl From<warden_state::StateError> for PluginError {
    fn from(e: warden_state::StateError) -> Self {
        match e {
            warden_state::StateError::AlreadyInitialized => PluginError::AlreadyInitialized,
            warden_state::StateError::NotInitialized => PluginError::NotInitialized,
            _ => PluginError::Rejected,
        }
    }
}

/// Lifecycle shared by every wallet plugin.
///
/// A plugin instance is shared by all wallets; everything it stores must be
/// keyed by the wallet passed to each hook. Hooks either complete or return
/// an error without having changed the plugin's state.
pub trait Plugin {
    /// Identifier the plugin is registered under.
    fn id(&self) -> Address;

    /// Capability probe answered before the plugin is accepted.
    fn supports_interface(&self, interface_id: InterfaceId) -> bool;

    fn on_enable(&mut self, wallet: Address, init_data: &[u8]) -> Result<(), PluginError>;

    /// Erases the plugin's wallet-scoped state.
    fn on_disable(&mut self, wallet: &Address) -> Result<(), PluginError>;

    fn is_initialized(&self, wallet: &Address) -> bool;
}

/// Recovers the address that produced a 65-byte `r || s || v` signature.
pub trait SignerRecovery {
    fn recover_signer(&self, hash: &B256, signature: &[u8; 65]) -> Option<Address>;
}

/// Resolves the signer currently holding Sudo authority over a wallet.
pub trait SudoSignerLookup {
    fn sudo_signer(&self, wallet: &Address) -> Option<Address>;
}

/// Proves a leaf belongs to the tree committed to by `root`.
pub trait MerkleProofVerifier {
    fn verify_merkle_proof(&self, proof: &[B256], root: &B256, leaf: &B256) -> bool;
}
