//! Session leaf definition.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{keccak256, Address, B256};

/// One narrowly scoped call permission; a leaf of an operator's session tree.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Session {
    pub target: Address,
    /// Ceiling on the value transferred with the call
    pub value_limit: u128,
    pub selector: [u8; 4],
    /// Encoded rule tree applied to `[value, args...]`
    pub rules: Vec<u8>,
}

impl Session {
    /// Merkle leaf: `keccak(target || value_limit || selector || keccak(rules))`.
    pub fn leaf(&self) -> B256 {
        let rules_hash = keccak256(&[&self.rules]);
        keccak256(&[
            self.target.as_ref(),
            &self.value_limit.to_be_bytes(),
            &self.selector,
            &rules_hash,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_depends_on_rules() {
        let a = Session {
            target: Address([1; 20]),
            value_limit: 0,
            selector: [0xa9, 0x05, 0x9c, 0xbb],
            rules: vec![0],
        };
        let mut b = a.clone();
        b.rules = vec![1];
        assert_ne!(a.leaf(), b.leaf());
        assert_eq!(a.leaf(), a.clone().leaf());
    }
}
