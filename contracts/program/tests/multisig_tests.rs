//! Threshold authorization through the multisig validator.

mod common;
use common::*;

use warden_interface::WalletOperation;
use warden_program::{
    AuthorizationCore, MultisigConfig, Schedule, SignatureCodec, ValidatorClass, WardenError,
};
use warden_state::{validation::pack_validation_data, Address, B256};

/// Three members sorted by address, with `core` running them 2-of-3.
fn setup_multisig() -> (AuthorizationCore, Vec<TestKey>) {
    let owner = TestKey::from_seed(1);
    let mut core = setup_core(&owner);
    let mut members: Vec<TestKey> = (10..13).map(TestKey::from_seed).collect();
    members.sort_by_key(|key| key.address);
    let config = MultisigConfig {
        threshold: 2,
        signers: members.iter().rev().map(|key| key.address).collect(),
    };
    core.install_validator(
        &gov(),
        MULTISIG_ID,
        ValidatorClass::Sudo,
        &borsh::to_vec(&config).expect("config encodes"),
    )
    .expect("install multisig");
    (core, members)
}

/// Instant blob whose own signature is `signers[0]` and whose trailer
/// carries the rest, in the order given.
fn sign_with(op: &mut WalletOperation, signers: &[&TestKey]) -> B256 {
    let hash = op_hash(op);
    let mut blob = SignatureCodec::encode_instant(&MULTISIG_ID, &signers[0].sign(&hash));
    for signer in &signers[1..] {
        blob.extend_from_slice(&signer.sign(&hash));
    }
    op.signature = blob;
    hash
}

#[test_log::test]
fn test_two_of_three() -> anyhow::Result<()> {
    let (mut core, m) = setup_multisig();
    let mut op = operation(transfer(Address([0x44; 20]), 1));

    let hash = sign_with(&mut op, &[&m[0], &m[2]]);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, SUCCESS);

    let hash = sign_with(&mut op, &[&m[1], &m[2]]);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, SUCCESS);

    let hash = sign_with(&mut op, &[&m[0], &m[1], &m[2]]);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, SUCCESS);
    Ok(())
}

#[test_log::test]
fn test_threshold_not_met() -> anyhow::Result<()> {
    let (mut core, m) = setup_multisig();
    let mut op = operation(transfer(Address([0x44; 20]), 1));
    let hash = sign_with(&mut op, &[&m[1]]);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, failure());
    Ok(())
}

#[test_log::test]
fn test_signers_must_ascend() -> anyhow::Result<()> {
    let (mut core, m) = setup_multisig();
    let mut op = operation(transfer(Address([0x44; 20]), 1));

    let hash = sign_with(&mut op, &[&m[2], &m[0]]);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, failure());

    // the same member twice never counts as two approvals
    let hash = sign_with(&mut op, &[&m[1], &m[1]]);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, failure());
    Ok(())
}

#[test_log::test]
fn test_outsider_and_ragged_trailer() -> anyhow::Result<()> {
    let (mut core, m) = setup_multisig();
    let outsider = TestKey::from_seed(42);
    let mut op = operation(transfer(Address([0x44; 20]), 1));

    let mut signers = vec![&m[0], &outsider];
    signers.sort_by_key(|key| key.address);
    let hash = sign_with(&mut op, &signers);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, failure());

    let hash = sign_with(&mut op, &[&m[0], &m[1]]);
    op.signature.push(0);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, failure());
    Ok(())
}

#[test_log::test]
fn test_scheduled_multisig() -> anyhow::Result<()> {
    let (mut core, m) = setup_multisig();
    let schedule = Schedule::new(900, 100, 1_000, 1_000);
    let mut op = operation(transfer(Address([0x44; 20]), 1));
    let hash = op_hash(&op);
    let canonical = schedule.canonical_hash(&hash);
    let mut blob = SignatureCodec::encode_scheduled(&MULTISIG_ID, &schedule, &m[0].sign(&canonical));
    blob.extend_from_slice(&m[1].sign(&canonical));
    op.signature = blob;

    assert_eq!(
        core.validate_signature(&op, &hash, 500)?,
        pack_validation_data(false, 900, 100)
    );
    assert_eq!(core.validate_signature(&op, &hash, 901)?, failure());
    Ok(())
}

#[test_log::test]
fn test_erc1271_threshold() -> anyhow::Result<()> {
    let (core, m) = setup_multisig();
    let message = warden_state::keccak256(&[b"multisig"]);

    let mut approved = MULTISIG_ID.as_ref().to_vec();
    approved.extend_from_slice(&m[0].sign(&message));
    approved.extend_from_slice(&m[2].sign(&message));
    assert!(core.is_valid_signature(&WALLET, &message, &approved, 0));

    let mut single = MULTISIG_ID.as_ref().to_vec();
    single.extend_from_slice(&m[0].sign(&message));
    assert!(!core.is_valid_signature(&WALLET, &message, &single, 0));
    Ok(())
}

#[test_log::test]
fn test_unusable_config_rejected() {
    let owner = TestKey::from_seed(1);
    let mut core = setup_core(&owner);
    let member = TestKey::from_seed(10).address;
    let bad = [
        MultisigConfig {
            threshold: 0,
            signers: vec![member],
        },
        MultisigConfig {
            threshold: 2,
            signers: vec![member],
        },
        MultisigConfig {
            threshold: 1,
            signers: vec![member, member],
        },
        MultisigConfig {
            threshold: 1,
            signers: vec![Address::ZERO],
        },
    ];
    for config in bad {
        let init = borsh::to_vec(&config).expect("config encodes");
        assert_eq!(
            core.install_validator(&gov(), MULTISIG_ID, ValidatorClass::Normal, &init),
            Err(WardenError::Plugin(warden_interface::PluginError::InvalidInitData))
        );
    }
    assert!(!core.validators().is_enabled(&WALLET, &MULTISIG_ID));
}
