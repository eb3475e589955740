//! Session trees and rule construction for operators.

use warden_interface::Call;
use warden_program::{
    abi::encode_arguments, predicate::encode_rules, Argument, Literal, PredicateNode, SessionClaim,
};
use warden_state::{merkle::MerkleTree, Address, Session, B256};

use crate::error::{Result, SdkError};

/// Sessions granted to one operator, with the Merkle tree over their leaves.
#[derive(Debug, Clone)]
pub struct SessionTree {
    sessions: Vec<Session>,
    tree: MerkleTree,
}

impl SessionTree {
    pub fn new(sessions: Vec<Session>) -> Result<Self> {
        if sessions.is_empty() {
            return Err(SdkError::EmptySessionTree);
        }
        let tree = MerkleTree::new(sessions.iter().map(Session::leaf).collect());
        Ok(Self { sessions, tree })
    }

    /// Root to put in the operator's permission.
    pub fn root(&self) -> B256 {
        self.tree.root()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// First session that could justify a call to `target` with `selector`.
    pub fn find(&self, target: &Address, selector: [u8; 4]) -> Option<usize> {
        self.sessions
            .iter()
            .position(|s| s.target == *target && s.selector == selector)
    }

    pub fn claim(&self, index: usize, arguments: Vec<Argument>) -> Result<SessionClaim> {
        let session = self
            .sessions
            .get(index)
            .ok_or(SdkError::SessionNotFound(index))?;
        let proof = self
            .tree
            .proof(index)
            .ok_or(SdkError::SessionNotFound(index))?;
        Ok(SessionClaim {
            session: session.clone(),
            proof,
            arguments,
        })
    }
}

/// Collects one rule per argument slot; slot 0 is the call value.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    value: PredicateNode,
    arguments: Vec<PredicateNode>,
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self {
            value: PredicateNode::Any,
            arguments: Vec::new(),
        }
    }

    pub fn value(mut self, rule: PredicateNode) -> Self {
        self.value = rule;
        self
    }

    pub fn argument(mut self, rule: PredicateNode) -> Self {
        self.arguments.push(rule);
        self
    }

    pub fn rules(&self) -> Vec<PredicateNode> {
        std::iter::once(self.value.clone())
            .chain(self.arguments.iter().cloned())
            .collect()
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        Ok(encode_rules(&self.rules())?)
    }
}

pub fn uint(value: u128) -> Literal {
    Literal::Bytes(value.to_be_bytes().to_vec())
}

pub fn address(address: &Address) -> Literal {
    Literal::Bytes(address.as_ref().to_vec())
}

/// Calldata for `selector` applied to `arguments`.
pub fn calldata(selector: [u8; 4], arguments: &[Argument]) -> Vec<u8> {
    let mut data = selector.to_vec();
    data.extend_from_slice(&encode_arguments(arguments));
    data
}

pub fn contract_call(
    target: Address,
    value: u128,
    selector: [u8; 4],
    arguments: &[Argument],
) -> Call {
    Call::new(target, value, calldata(selector, arguments))
}
