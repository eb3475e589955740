#![allow(dead_code)]

use warden_interface::{Call, Execution, WalletOperation};
use warden_program::{
    AuthorizationCore, EcdsaValidator, GovernanceContext, MultisigValidator, SessionAuthority,
    ValidatorClass, WardenConfig,
};
use warden_sdk::{LocalSigner, WardenSigner};
use warden_state::Address;

pub const WALLET: Address = Address([0xee; 20]);
pub const ENTRY_POINT: Address = Address([0xe0; 20]);
pub const CHAIN_ID: u64 = 10;

pub const ECDSA_ID: Address = Address([0x10; 20]);
pub const MULTISIG_ID: Address = Address([0x20; 20]);
pub const SESSION_ID: Address = Address([0x30; 20]);

pub fn signer(seed: u8) -> LocalSigner {
    LocalSigner::from_bytes(&[seed; 32]).expect("valid secret key")
}

pub fn gov() -> GovernanceContext {
    GovernanceContext::self_call(WALLET)
}

/// Wallet owned by `owner` through the ECDSA validator, with the multisig
/// and session validators deployed but not installed.
pub fn wallet(owner: &LocalSigner) -> AuthorizationCore {
    let mut core = AuthorizationCore::new(WardenConfig::default()).expect("default config");
    core.deploy_validator(Box::new(EcdsaValidator::new(ECDSA_ID)))
        .expect("deploy ecdsa");
    core.deploy_validator(Box::new(MultisigValidator::new(MULTISIG_ID)))
        .expect("deploy multisig");
    core.deploy_validator(Box::new(SessionAuthority::new(SESSION_ID)))
        .expect("deploy session");
    core.install_validator(&gov(), ECDSA_ID, ValidatorClass::Sudo, owner.address().as_ref())
        .expect("install owner");
    core
}

pub fn operation(calls: Vec<Call>) -> WalletOperation {
    let execution = match <[Call; 1]>::try_from(calls) {
        Ok([call]) => Execution::Single(call),
        Err(calls) => Execution::Batch(calls),
    };
    WalletOperation {
        sender: WALLET,
        nonce: 7,
        execution,
        call_gas_limit: 60_000,
        verification_gas_limit: 30_000,
        pre_verification_gas: 10_000,
        max_fee_per_gas: 20,
        max_priority_fee_per_gas: 2,
        paymaster: None,
        signature: vec![],
    }
}
