//! Session authority: delegated, narrowly scoped operator access.
//!
//! An owner grants an operator an [`OperatorPermission`]: a Merkle root over
//! [`Session`] leaves, an optional fee sponsor, a validity window and a usage
//! budget. The operator then signs operations whose every call is justified by
//! one session claim. Authorization runs the whole pipeline against staged
//! values and commits the permit and the ledger debit only once every check
//! has passed.
//!
//! The blob trailer after the fixed codec layout is a borsh [`SessionPayload`].

use std::any::Any;
use std::collections::{HashMap, HashSet};

use borsh::{BorshDeserialize, BorshSerialize};
use warden_interface::{
    Call, Execution, InterfaceId, Plugin, PluginError, WalletOperation, PLUGIN_INTERFACE_ID,
    VALIDATOR_INTERFACE_ID,
};
use warden_state::{
    keccak256, Address, OperatorPermission, PluginState, Session, StateError, UsageCost,
    UsageLedger, ValidationData, ValidityWindow, B256,
};

use super::{reject, ValidationContext, Validator};
use crate::abi::{encode_arguments, Argument};
use crate::codec::SignatureCodec;
use crate::constants::{SIGNATURE_LEN, TIME_COST_PER_SESSION};
use crate::error::WardenError;
use crate::governance::GovernanceContext;
use crate::predicate::{check_rules_shape, decode_rules, evaluate_rules, PredicateLimits};

/// Owner-signed grant redeemed by the operator.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Permit {
    pub operator: Address,
    pub permission: OperatorPermission,
    pub spending_limit_config_hash: B256,
    pub signature: [u8; SIGNATURE_LEN],
}

impl Permit {
    /// Digest the Sudo signer signs to grant `permission` to `operator`.
    pub fn digest(
        wallet: &Address,
        operator: &Address,
        permission: &OperatorPermission,
        spending_limit_config_hash: &B256,
    ) -> B256 {
        keccak256(&[
            wallet.as_ref(),
            operator.as_ref(),
            &permission.hash(),
            spending_limit_config_hash,
        ])
    }
}

/// One call's justification: the session leaf, its proof and the call's
/// decoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SessionClaim {
    pub session: Session,
    pub proof: Vec<B256>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SessionPayload {
    pub operator: Address,
    /// Redeemed together with this operation when present
    pub permit: Option<Permit>,
    /// One claim per call, in call order
    pub claims: Vec<SessionClaim>,
}

/// Result of a non-committing dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation {
    pub data: ValidationData,
    /// Ledger the operation would leave behind, if it would be authorized
    pub ledger_after: Option<UsageLedger>,
}

type GrantKey = (Address, Address);

/// Everything a successful run would write.
struct Approval {
    key: GrantKey,
    window: ValidityWindow,
    permit: Option<(OperatorPermission, B256)>,
    ledger_after: UsageLedger,
}

enum Verdict {
    Approved(Approval),
    Rejected(&'static str),
}

pub struct SessionAuthority {
    id: Address,
    state: PluginState,
    permissions: HashMap<GrantKey, OperatorPermission>,
    ledgers: HashMap<GrantKey, UsageLedger>,
    redeemed: HashSet<B256>,
}

impl SessionAuthority {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            state: PluginState::new(),
            permissions: HashMap::new(),
            ledgers: HashMap::new(),
            redeemed: HashSet::new(),
        }
    }

    pub fn permission_of(&self, wallet: &Address, operator: &Address) -> Option<&OperatorPermission> {
        self.permissions.get(&(*wallet, *operator))
    }

    pub fn usage_of(&self, wallet: &Address, operator: &Address) -> Option<&UsageLedger> {
        self.ledgers.get(&(*wallet, *operator))
    }

    fn require_initialized(&self, wallet: &Address) -> Result<(), WardenError> {
        self.state
            .require_initialized(wallet)
            .map_err(|_| WardenError::Plugin(PluginError::NotInitialized))
    }

    fn check_permission(permission: &OperatorPermission) -> Result<(), WardenError> {
        permission
            .validate()
            .map_err(|_| WardenError::InvalidValidationDuration)
    }

    /// Verifies a permit against the wallet's Sudo signer and returns its digest.
    fn verify_permit(&self, ctx: &ValidationContext, permit: &Permit) -> Result<B256, WardenError> {
        Self::check_permission(&permit.permission)?;
        let digest = Permit::digest(
            &ctx.wallet,
            &permit.operator,
            &permit.permission,
            &permit.spending_limit_config_hash,
        );
        let sudo = ctx.sudo_signer.ok_or(WardenError::InvalidPermit)?;
        if self.redeemed.contains(&digest) || !ctx.signed_by(&digest, &permit.signature, &sudo) {
            tracing::warn!(wallet = %ctx.wallet, operator = %permit.operator, "permit rejected");
            return Err(WardenError::InvalidPermit);
        }
        Ok(digest)
    }

    fn store_permission(&mut self, key: GrantKey, permission: OperatorPermission) {
        self.ledgers.insert(key, permission.ledger());
        self.permissions.insert(key, permission);
    }

    /// Redeems an owner permit, replacing any earlier permission and resetting
    /// the operator's ledger. A permit can be redeemed once.
    pub fn activate_permission(
        &mut self,
        ctx: &ValidationContext,
        permit: &Permit,
    ) -> Result<(), WardenError> {
        self.require_initialized(&ctx.wallet)?;
        let digest = self.verify_permit(ctx, permit)?;
        self.store_permission((ctx.wallet, permit.operator), permit.permission);
        self.redeemed.insert(digest);
        tracing::debug!(wallet = %ctx.wallet, operator = %permit.operator, "permission activated");
        Ok(())
    }

    /// Wallet-governed overwrite of an operator's permission.
    pub fn set_permission(
        &mut self,
        gov: &GovernanceContext,
        operator: Address,
        permission: OperatorPermission,
    ) -> Result<(), WardenError> {
        gov.require_self()?;
        self.require_initialized(&gov.wallet)?;
        Self::check_permission(&permission)?;
        self.store_permission((gov.wallet, operator), permission);
        tracing::debug!(wallet = %gov.wallet, operator = %operator, "permission set");
        Ok(())
    }

    pub fn revoke_permission(
        &mut self,
        gov: &GovernanceContext,
        operator: Address,
    ) -> Result<OperatorPermission, WardenError> {
        gov.require_self()?;
        let key = (gov.wallet, operator);
        let permission = self
            .permissions
            .remove(&key)
            .ok_or(WardenError::PermissionNotFound)?;
        self.ledgers.remove(&key);
        tracing::debug!(wallet = %gov.wallet, operator = %operator, "permission revoked");
        Ok(permission)
    }

    pub fn validate_single_execute(
        &mut self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<ValidationData, WardenError> {
        if op.execution.is_batch() {
            return Err(WardenError::InvalidWalletOperation);
        }
        self.validate_and_commit(ctx, op, op_hash)
    }

    pub fn validate_batch_execute(
        &mut self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<ValidationData, WardenError> {
        if !op.execution.is_batch() {
            return Err(WardenError::InvalidWalletOperation);
        }
        self.validate_and_commit(ctx, op, op_hash)
    }

    /// Runs the full pipeline without touching state. The outcome may be
    /// stale by the time a real operation lands.
    pub fn simulate_single_execute(
        &self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<Simulation, WardenError> {
        if op.execution.is_batch() {
            return Err(WardenError::InvalidWalletOperation);
        }
        self.simulate(ctx, op, op_hash)
    }

    pub fn simulate_batch_execute(
        &self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<Simulation, WardenError> {
        if !op.execution.is_batch() {
            return Err(WardenError::InvalidWalletOperation);
        }
        self.simulate(ctx, op, op_hash)
    }

    fn simulate(
        &self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<Simulation, WardenError> {
        Ok(match self.authorize(ctx, op, op_hash)? {
            Verdict::Approved(approval) => Simulation {
                data: ValidationData::success(approval.window),
                ledger_after: Some(approval.ledger_after),
            },
            Verdict::Rejected(reason) => Simulation {
                data: reject(&self.id, &ctx.wallet, reason),
                ledger_after: None,
            },
        })
    }

    fn validate_and_commit(
        &mut self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<ValidationData, WardenError> {
        let approval = match self.authorize(ctx, op, op_hash)? {
            Verdict::Approved(approval) => approval,
            Verdict::Rejected(reason) => return Ok(reject(&self.id, &ctx.wallet, reason)),
        };
        if let Some((permission, digest)) = approval.permit {
            self.permissions.insert(approval.key, permission);
            self.redeemed.insert(digest);
        }
        self.ledgers.insert(approval.key, approval.ledger_after);
        tracing::debug!(
            wallet = %ctx.wallet,
            operator = %approval.key.1,
            gas_remaining = approval.ledger_after.gas_remaining,
            time_remaining = approval.ledger_after.time_remaining,
            "session operation authorized"
        );
        Ok(ValidationData::success(approval.window))
    }

    /// The pipeline proper. Reads state, never writes it.
    fn authorize(
        &self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<Verdict, WardenError> {
        self.require_initialized(&ctx.wallet)?;
        let Some((intent, trailer)) = SignatureCodec::decode_extended(&op.signature, op_hash) else {
            return Ok(Verdict::Rejected("malformed authorization blob"));
        };
        let Ok(payload) = SessionPayload::try_from_slice(trailer) else {
            return Ok(Verdict::Rejected("malformed session payload"));
        };
        let key = (ctx.wallet, payload.operator);

        let (permission, ledger, permit) = match &payload.permit {
            Some(permit) => {
                if permit.operator != payload.operator {
                    return Err(WardenError::InvalidPermit);
                }
                let digest = self.verify_permit(ctx, permit)?;
                (
                    permit.permission,
                    permit.permission.ledger(),
                    Some((permit.permission, digest)),
                )
            },
            None => {
                let permission = self
                    .permissions
                    .get(&key)
                    .copied()
                    .ok_or(WardenError::PermissionNotFound)?;
                let ledger = self
                    .ledgers
                    .get(&key)
                    .copied()
                    .unwrap_or_else(|| permission.ledger());
                (permission, ledger, None)
            },
        };

        let Some(window) = intent
            .window()
            .intersect(&permission.window())
            .and_then(|window| ctx.live_window(window))
        else {
            return Ok(Verdict::Rejected("validity window empty or expired"));
        };

        let calls = op.execution.calls();
        if calls.is_empty()
            || calls.len() > ctx.config.max_batch_length
            || calls.len() != payload.claims.len()
        {
            return Err(WardenError::InvalidBatchLength);
        }
        let limits = PredicateLimits::from_config(ctx.config);
        for (call, claim) in calls.iter().zip(&payload.claims) {
            self.check_call(ctx, &permission, call, claim, &limits)?;
        }

        if let Some(paymaster) = op.paymaster {
            if permission.allowed_paymaster.is_zero() || paymaster != permission.allowed_paymaster {
                return Err(WardenError::InvalidPaymaster);
            }
        }

        if !intent.admits(op) {
            return Ok(Verdict::Rejected("fee exceeds signed ceiling"));
        }
        if !ctx.signed_by(&intent.canonical_hash, &intent.signature, &payload.operator) {
            return Ok(Verdict::Rejected("signer is not the operator"));
        }

        let cost = Self::usage_cost(op, payload.claims.len())?;
        let ledger_after = ledger.check(&cost).map_err(|e| match e {
            StateError::ExceedUsage => WardenError::ExceedUsage,
            other => WardenError::State(other),
        })?;

        Ok(Verdict::Approved(Approval {
            key,
            window,
            permit,
            ledger_after,
        }))
    }

    fn check_call(
        &self,
        ctx: &ValidationContext,
        permission: &OperatorPermission,
        call: &Call,
        claim: &SessionClaim,
        limits: &PredicateLimits,
    ) -> Result<(), WardenError> {
        let session = &claim.session;
        if !ctx
            .merkle
            .verify_merkle_proof(&claim.proof, &permission.session_root, &session.leaf())
        {
            return Err(WardenError::InvalidSessionRoot);
        }
        if call.target != session.target {
            return Err(WardenError::InvalidTarget);
        }
        // plain transfers carry no calldata and match the zero selector
        let selector = match call.data.len() {
            0 => [0u8; 4],
            1..=3 => return Err(WardenError::InvalidSelector),
            _ => call.selector().ok_or(WardenError::InvalidSelector)?,
        };
        if selector != session.selector {
            return Err(WardenError::InvalidSelector);
        }
        if call.value > session.value_limit {
            return Err(WardenError::ValueMismatch);
        }
        if encode_arguments(&claim.arguments) != call.arguments() {
            return Err(WardenError::InvalidArguments);
        }

        let mut slots = Vec::with_capacity(claim.arguments.len() + 1);
        slots.push(Argument::uint(call.value));
        slots.extend(claim.arguments.iter().cloned());

        let rules = decode_rules(&session.rules, limits)?;
        check_rules_shape(&rules, &slots)?;
        if !evaluate_rules(&rules, &slots)? {
            tracing::warn!(wallet = %ctx.wallet, target = %call.target, "call arguments rejected by session rules");
            return Err(WardenError::InvalidArguments);
        }
        Ok(())
    }

    /// Gas cost is the operation's gas limits at its fee rate; time cost is
    /// one unit per consumed session.
    pub fn usage_cost(op: &WalletOperation, sessions: usize) -> Result<UsageCost, WardenError> {
        let gas = op
            .total_gas()
            .checked_mul(op.max_fee_per_gas)
            .ok_or(WardenError::GasFeeExceedsRemaining)?;
        let time = (sessions as u64)
            .checked_mul(TIME_COST_PER_SESSION)
            .ok_or(WardenError::ExceedUsage)?;
        Ok(UsageCost { gas, time })
    }
}

impl Plugin for SessionAuthority {
    fn id(&self) -> Address {
        self.id
    }

    fn supports_interface(&self, interface_id: InterfaceId) -> bool {
        interface_id == PLUGIN_INTERFACE_ID || interface_id == VALIDATOR_INTERFACE_ID
    }

    fn on_enable(&mut self, wallet: Address, init_data: &[u8]) -> Result<(), PluginError> {
        if !init_data.is_empty() {
            return Err(PluginError::InvalidInitData);
        }
        self.state.initialize(wallet)?;
        Ok(())
    }

    fn on_disable(&mut self, wallet: &Address) -> Result<(), PluginError> {
        self.state.clear(wallet)?;
        self.permissions.retain(|(w, _), _| w != wallet);
        self.ledgers.retain(|(w, _), _| w != wallet);
        Ok(())
    }

    fn is_initialized(&self, wallet: &Address) -> bool {
        self.state.is_initialized(wallet)
    }
}

impl Validator for SessionAuthority {
    fn validate_operation(
        &mut self,
        ctx: &ValidationContext,
        op: &WalletOperation,
        op_hash: &B256,
    ) -> Result<ValidationData, WardenError> {
        match op.execution {
            Execution::Single(_) => self.validate_single_execute(ctx, op, op_hash),
            Execution::Batch(_) => self.validate_batch_execute(ctx, op, op_hash),
        }
    }

    fn is_valid_signature(
        &self,
        _ctx: &ValidationContext,
        _hash: &B256,
        _signature: &[u8],
    ) -> Result<bool, WardenError> {
        Err(WardenError::Unsupported)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(total_gas_each: u64, fee: u128) -> WalletOperation {
        WalletOperation {
            sender: Address([1; 20]),
            nonce: 0,
            execution: Execution::Single(Call::new(Address([2; 20]), 0, vec![])),
            call_gas_limit: total_gas_each,
            verification_gas_limit: total_gas_each,
            pre_verification_gas: total_gas_each,
            max_fee_per_gas: fee,
            max_priority_fee_per_gas: 0,
            paymaster: None,
            signature: vec![],
        }
    }

    #[test]
    fn test_usage_cost() {
        let cost = SessionAuthority::usage_cost(&op(100, 7), 2).unwrap();
        assert_eq!(cost, UsageCost { gas: 2_100, time: 2 });
        assert_eq!(
            SessionAuthority::usage_cost(&op(u64::MAX, u128::MAX), 1),
            Err(WardenError::GasFeeExceedsRemaining)
        );
    }

    #[test]
    fn test_enable_and_disable_scope_state_to_wallet() {
        let mut authority = SessionAuthority::new(Address([0x5e; 20]));
        let (a, b) = (Address([0xa; 20]), Address([0xb; 20]));
        assert_eq!(authority.on_enable(a, &[1]), Err(PluginError::InvalidInitData));
        authority.on_enable(a, &[]).unwrap();
        authority.on_enable(b, &[]).unwrap();

        let permission = OperatorPermission {
            session_root: [1; 32],
            allowed_paymaster: Address::ZERO,
            valid_until: 0,
            valid_after: 0,
            gas_remaining: 10,
            time_remaining: 1,
        };
        let operator = Address([0x0b; 20]);
        for wallet in [a, b] {
            authority
                .set_permission(&GovernanceContext::self_call(wallet), operator, permission)
                .unwrap();
        }
        authority.on_disable(&a).unwrap();
        assert!(authority.permission_of(&a, &operator).is_none());
        assert_eq!(authority.permission_of(&b, &operator), Some(&permission));
        assert_eq!(authority.usage_of(&b, &operator), Some(&permission.ledger()));
    }

    #[test]
    fn test_permission_governance() {
        let mut authority = SessionAuthority::new(Address([0x5e; 20]));
        let wallet = Address([0xa; 20]);
        let operator = Address([0x0b; 20]);
        let permission = OperatorPermission {
            session_root: [1; 32],
            allowed_paymaster: Address::ZERO,
            valid_until: 10,
            valid_after: 20,
            gas_remaining: 10,
            time_remaining: 1,
        };
        let gov = GovernanceContext::self_call(wallet);
        assert_eq!(
            authority.set_permission(&gov, operator, permission),
            Err(WardenError::Plugin(PluginError::NotInitialized))
        );
        authority.on_enable(wallet, &[]).unwrap();
        assert_eq!(
            authority.set_permission(&gov, operator, permission),
            Err(WardenError::InvalidValidationDuration)
        );
        let outsider = GovernanceContext::new(wallet, operator);
        assert_eq!(
            authority.revoke_permission(&outsider, operator),
            Err(WardenError::Unauthorized)
        );
        assert_eq!(
            authority.revoke_permission(&gov, operator),
            Err(WardenError::PermissionNotFound)
        );
    }
}
