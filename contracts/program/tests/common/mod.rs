//! Common test utilities for the Warden authorization core

#![allow(dead_code)]

use warden_interface::{Call, Execution, WalletOperation};
use warden_program::{
    crypto::address_from_public_key, AuthorizationCore, EcdsaValidator, GovernanceContext,
    MultisigValidator, Schedule, SessionAuthority, SignatureCodec, ValidatorClass, WardenConfig,
};
use warden_state::{Address, B256};

pub const WALLET: Address = Address([0xee; 20]);
pub const ENTRY_POINT: Address = Address([0xe0; 20]);
pub const CHAIN_ID: u64 = 1;

pub const ECDSA_ID: Address = Address([0x10; 20]);
pub const MULTISIG_ID: Address = Address([0x20; 20]);
pub const SESSION_ID: Address = Address([0x30; 20]);

/// Deterministic secp256k1 key for tests.
pub struct TestKey {
    pub secret: libsecp256k1::SecretKey,
    pub address: Address,
}

impl TestKey {
    pub fn from_seed(seed: u8) -> Self {
        let secret = libsecp256k1::SecretKey::parse(&[seed; 32]).expect("valid secret key");
        let address = address_from_public_key(&libsecp256k1::PublicKey::from_secret_key(&secret));
        Self { secret, address }
    }

    /// `r || s || v` with `v` in {27, 28}.
    pub fn sign(&self, hash: &B256) -> [u8; 65] {
        let (signature, recovery_id) =
            libsecp256k1::sign(&libsecp256k1::Message::parse(hash), &self.secret);
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.serialize());
        out[64] = recovery_id.serialize() + 27;
        out
    }
}

pub fn gov() -> GovernanceContext {
    GovernanceContext::self_call(WALLET)
}

/// Core with the three validators deployed and `owner` installed as Sudo
/// through the ECDSA validator.
pub fn setup_core(owner: &TestKey) -> AuthorizationCore {
    let mut core = AuthorizationCore::new(WardenConfig::default()).expect("default config");
    core.deploy_validator(Box::new(EcdsaValidator::new(ECDSA_ID)))
        .expect("deploy ecdsa");
    core.deploy_validator(Box::new(MultisigValidator::new(MULTISIG_ID)))
        .expect("deploy multisig");
    core.deploy_validator(Box::new(SessionAuthority::new(SESSION_ID)))
        .expect("deploy session");
    core.install_validator(&gov(), ECDSA_ID, ValidatorClass::Sudo, owner.address.as_ref())
        .expect("install owner");
    core
}

pub fn operation(execution: Execution) -> WalletOperation {
    WalletOperation {
        sender: WALLET,
        nonce: 0,
        execution,
        call_gas_limit: 50_000,
        verification_gas_limit: 30_000,
        pre_verification_gas: 20_000,
        max_fee_per_gas: 99,
        max_priority_fee_per_gas: 1,
        paymaster: None,
        signature: vec![],
    }
}

pub fn transfer(to: Address, value: u128) -> Execution {
    Execution::Single(Call::new(to, value, vec![]))
}

pub fn op_hash(op: &WalletOperation) -> B256 {
    op.hash(&ENTRY_POINT, CHAIN_ID)
}

/// Signs `op` as an instant intent for `validator`.
pub fn sign_instant(op: &mut WalletOperation, validator: &Address, key: &TestKey) -> B256 {
    let hash = op_hash(op);
    op.signature = SignatureCodec::encode_instant(validator, &key.sign(&hash));
    hash
}

/// Signs `op` as a scheduled intent for `validator`.
pub fn sign_scheduled(
    op: &mut WalletOperation,
    validator: &Address,
    schedule: &Schedule,
    key: &TestKey,
) -> B256 {
    let hash = op_hash(op);
    let signature = key.sign(&schedule.canonical_hash(&hash));
    op.signature = SignatureCodec::encode_scheduled(validator, schedule, &signature);
    hash
}

/// Word returned for a clean success with an unbounded window.
pub const SUCCESS: B256 = [0u8; 32];

pub fn failure() -> B256 {
    let mut word = [0u8; 32];
    word[31] = 1;
    word
}
