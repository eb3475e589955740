//! Wallet operation presented for authorization.

use borsh::{BorshDeserialize, BorshSerialize};
use warden_state::{keccak256, Address, B256};

/// One call the wallet would dispatch after authorization.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Call {
    pub target: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

impl Call {
    pub fn new(target: Address, value: u128, data: Vec<u8>) -> Self {
        Self {
            target,
            value,
            data,
        }
    }

    /// Leading four bytes of the calldata, if present.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| <[u8; 4]>::try_from(s).ok())
    }

    /// Calldata after the selector.
    pub fn arguments(&self) -> &[u8] {
        self.data.get(4..).unwrap_or(&[])
    }

    fn hash(&self) -> B256 {
        keccak256(&[
            self.target.as_ref(),
            &self.value.to_be_bytes(),
            &keccak256(&[&self.data]),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Execution {
    Single(Call),
    Batch(Vec<Call>),
}

impl Execution {
    pub fn calls(&self) -> &[Call] {
        match self {
            Execution::Single(call) => core::slice::from_ref(call),
            Execution::Batch(calls) => calls,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Execution::Batch(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct WalletOperation {
    pub sender: Address,
    pub nonce: u128,
    pub execution: Execution,
    pub call_gas_limit: u64,
    pub verification_gas_limit: u64,
    pub pre_verification_gas: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    /// Fee sponsor, if any
    pub paymaster: Option<Address>,
    /// Authorization blob
    pub signature: Vec<u8>,
}

impl WalletOperation {
    /// Sum of the operation's gas limits.
    pub fn total_gas(&self) -> u128 {
        self.call_gas_limit as u128
            + self.verification_gas_limit as u128
            + self.pre_verification_gas as u128
    }

    /// True when any call targets the wallet itself (self-governance).
    pub fn targets_self(&self) -> bool {
        self.execution
            .calls()
            .iter()
            .any(|call| call.target == self.sender)
    }

    /// Operation hash over everything except the signature, bound to the
    /// entry point and chain.
    pub fn hash(&self, entry_point: &Address, chain_id: u64) -> B256 {
        let (kind, calls): (u8, Vec<B256>) = match &self.execution {
            Execution::Single(call) => (0, vec![call.hash()]),
            Execution::Batch(calls) => (1, calls.iter().map(Call::hash).collect()),
        };
        let calls_hash = keccak256(&calls.iter().map(|c| c.as_slice()).collect::<Vec<_>>());
        let paymaster = self.paymaster.unwrap_or(Address::ZERO);
        let inner = keccak256(&[
            self.sender.as_ref(),
            &self.nonce.to_be_bytes(),
            &[kind],
            &calls_hash,
            &self.call_gas_limit.to_be_bytes(),
            &self.verification_gas_limit.to_be_bytes(),
            &self.pre_verification_gas.to_be_bytes(),
            &self.max_fee_per_gas.to_be_bytes(),
            &self.max_priority_fee_per_gas.to_be_bytes(),
            paymaster.as_ref(),
        ]);
        keccak256(&[&inner, entry_point.as_ref(), &chain_id.to_be_bytes()])
    }
}
