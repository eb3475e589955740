//! Owner-signed authorization through the ECDSA validator.

mod common;
use common::*;

use warden_interface::{Call, Execution};
use warden_program::{crypto::eth_signed_message_hash, Schedule, SignatureCodec, ValidatorClass};
use warden_state::{validation::pack_validation_data, Address, ValidationData};

#[test_log::test]
fn test_instant_blob_signed_by_owner() -> anyhow::Result<()> {
    let owner = TestKey::from_seed(1);
    let mut core = setup_core(&owner);

    let mut op = operation(transfer(Address([0x44; 20]), 5));
    let hash = sign_instant(&mut op, &ECDSA_ID, &owner);
    assert_eq!(op.signature.len(), 86);
    assert_eq!(core.validate_signature(&op, &hash, 1_000)?, SUCCESS);
    Ok(())
}

#[test_log::test]
fn test_instant_blob_signed_by_stranger() -> anyhow::Result<()> {
    let owner = TestKey::from_seed(1);
    let stranger = TestKey::from_seed(2);
    let mut core = setup_core(&owner);

    let mut op = operation(transfer(Address([0x44; 20]), 5));
    let hash = sign_instant(&mut op, &ECDSA_ID, &stranger);
    assert_eq!(core.validate_signature(&op, &hash, 1_000)?, failure());
    Ok(())
}

#[test_log::test]
fn test_scheduled_fee_ceiling_is_strict() -> anyhow::Result<()> {
    let owner = TestKey::from_seed(1);
    let mut core = setup_core(&owner);
    let t = 1_700_000_000u64;
    let schedule = Schedule::new(t + 100, t, 100, 100);

    let mut at_ceiling = operation(transfer(Address([0x44; 20]), 5));
    at_ceiling.max_fee_per_gas = 100;
    let hash = sign_scheduled(&mut at_ceiling, &ECDSA_ID, &schedule, &owner);
    assert_eq!(at_ceiling.signature.len(), 162);
    let word = core.validate_signature(&at_ceiling, &hash, t)?;
    assert!(ValidationData::unpack(&word).is_failed());

    let mut below = operation(transfer(Address([0x44; 20]), 5));
    below.max_fee_per_gas = 99;
    let hash = sign_scheduled(&mut below, &ECDSA_ID, &schedule, &owner);
    let word = core.validate_signature(&below, &hash, t)?;
    assert_eq!(word, pack_validation_data(false, t + 100, t));

    // validAfter occupies the top 48 bits, validUntil the next 48
    assert_eq!(&word[..6], &warden_state::be_u48(t));
    assert_eq!(&word[6..12], &warden_state::be_u48(t + 100));
    assert!(word[12..].iter().all(|b| *b == 0));
    Ok(())
}

#[test_log::test]
fn test_scheduled_blob_cannot_be_replayed_with_other_ceiling() -> anyhow::Result<()> {
    let owner = TestKey::from_seed(1);
    let mut core = setup_core(&owner);
    let signed = Schedule::new(0, 0, 50, 50);
    let mut op = operation(transfer(Address([0x44; 20]), 5));
    op.max_fee_per_gas = 10;
    let hash = sign_scheduled(&mut op, &ECDSA_ID, &signed, &owner);

    // same signature presented under a raised ceiling
    let raised = Schedule::new(0, 0, 500, 500);
    let signature = SignatureCodec::decode(&op.signature, &hash)
        .map(|intent| intent.signature)
        .ok_or_else(|| anyhow::anyhow!("blob should decode"))?;
    op.signature = SignatureCodec::encode_scheduled(&ECDSA_ID, &raised, &signature);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, failure());
    Ok(())
}

#[test_log::test]
fn test_expired_schedule_is_soft_failure() -> anyhow::Result<()> {
    let owner = TestKey::from_seed(1);
    let mut core = setup_core(&owner);
    let schedule = Schedule::new(200, 100, 1_000, 1_000);
    let mut op = operation(transfer(Address([0x44; 20]), 5));
    let hash = sign_scheduled(&mut op, &ECDSA_ID, &schedule, &owner);
    assert_eq!(core.validate_signature(&op, &hash, 201)?, failure());
    assert_eq!(
        core.validate_signature(&op, &hash, 150)?,
        pack_validation_data(false, 200, 100)
    );
    Ok(())
}

#[test_log::test]
fn test_malformed_blobs_are_soft_failures() -> anyhow::Result<()> {
    let owner = TestKey::from_seed(1);
    let mut core = setup_core(&owner);
    let mut op = operation(transfer(Address([0x44; 20]), 5));
    let hash = sign_instant(&mut op, &ECDSA_ID, &owner);

    let mut truncated = op.clone();
    truncated.signature.pop();
    assert_eq!(core.validate_signature(&truncated, &hash, 0)?, failure());

    let mut unknown_kind = op.clone();
    unknown_kind.signature[20] = 7;
    assert_eq!(core.validate_signature(&unknown_kind, &hash, 0)?, failure());

    let mut unknown_validator = op;
    unknown_validator.signature[..20].copy_from_slice(&[0x99; 20]);
    assert_eq!(core.validate_signature(&unknown_validator, &hash, 0)?, failure());
    Ok(())
}

#[test_log::test]
fn test_prefixed_signature_accepted_when_configured() -> anyhow::Result<()> {
    let owner = TestKey::from_seed(1);
    let mut core = setup_core(&owner);
    let mut op = operation(transfer(Address([0x44; 20]), 5));
    let hash = op_hash(&op);
    let signature = owner.sign(&eth_signed_message_hash(&hash));
    op.signature = SignatureCodec::encode_instant(&ECDSA_ID, &signature);
    assert_eq!(core.validate_signature(&op, &hash, 0)?, SUCCESS);
    Ok(())
}

#[test_log::test]
fn test_normal_validator_cannot_govern_wallet() -> anyhow::Result<()> {
    let owner = TestKey::from_seed(1);
    let delegate = TestKey::from_seed(3);
    let mut core = setup_core(&owner);
    let second = Address([0x11; 20]);
    core.deploy_validator(Box::new(warden_program::EcdsaValidator::new(second)))?;
    core.install_validator(&gov(), second, ValidatorClass::Normal, delegate.address.as_ref())?;

    let mut external = operation(transfer(Address([0x44; 20]), 5));
    let hash = sign_instant(&mut external, &second, &delegate);
    assert_eq!(core.validate_signature(&external, &hash, 0)?, SUCCESS);

    let mut governance = operation(Execution::Batch(vec![
        Call::new(Address([0x44; 20]), 0, vec![]),
        Call::new(WALLET, 0, vec![0xde, 0xad, 0xbe, 0xef]),
    ]));
    let hash = sign_instant(&mut governance, &second, &delegate);
    assert_eq!(core.validate_signature(&governance, &hash, 0)?, failure());

    let hash = sign_instant(&mut governance, &ECDSA_ID, &owner);
    assert_eq!(core.validate_signature(&governance, &hash, 0)?, SUCCESS);
    Ok(())
}

#[test_log::test]
fn test_is_valid_signature() -> anyhow::Result<()> {
    let owner = TestKey::from_seed(1);
    let core = setup_core(&owner);
    let message = warden_state::keccak256(&[b"hello"]);

    let mut signature = ECDSA_ID.as_ref().to_vec();
    signature.extend_from_slice(&owner.sign(&message));
    assert!(core.is_valid_signature(&WALLET, &message, &signature, 0));

    let mut forged = ECDSA_ID.as_ref().to_vec();
    forged.extend_from_slice(&TestKey::from_seed(9).sign(&message));
    assert!(!core.is_valid_signature(&WALLET, &message, &forged, 0));

    let mut via_session = SESSION_ID.as_ref().to_vec();
    via_session.extend_from_slice(&owner.sign(&message));
    assert!(!core.is_valid_signature(&WALLET, &message, &via_session, 0));
    Ok(())
}
