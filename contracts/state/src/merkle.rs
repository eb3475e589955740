//! Sorted-pair keccak Merkle trees over session leaves.

use crate::{keccak256, B256};

pub fn hash_pair(a: &B256, b: &B256) -> B256 {
    if a <= b {
        keccak256(&[a, b])
    } else {
        keccak256(&[b, a])
    }
}

/// Folds `proof` over `leaf` and compares against `root`.
pub fn verify(proof: &[B256], root: &B256, leaf: &B256) -> bool {
    let computed = proof
        .iter()
        .fold(*leaf, |node, sibling| hash_pair(&node, sibling));
    computed == *root
}

/// Tree built bottom-up; an unpaired node is promoted to the next layer.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<B256>) -> Self {
        let mut layers = vec![leaves];
        while layers.last().map_or(false, |layer| layer.len() > 1) {
            let next = layers
                .last()
                .map(|layer| {
                    layer
                        .chunks(2)
                        .map(|pair| match pair.get(1) {
                            Some(b) => hash_pair(&pair[0], b),
                            None => pair[0],
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            layers.push(next);
        }
        Self { layers }
    }

    /// Root of the tree; all zero for an empty tree.
    pub fn root(&self) -> B256 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Sibling path for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<Vec<B256>> {
        if index >= self.leaf_count() {
            return None;
        }
        let mut proof = Vec::new();
        let mut position = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = position ^ 1;
            if let Some(node) = layer.get(sibling) {
                proof.push(*node);
            }
            position /= 2;
        }
        Some(proof)
    }
}
