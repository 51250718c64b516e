//! Salted binary Merkle tree.
//!
//! Uses the same `sha3::Sha3_256` hash for both leaves and internal nodes
//! as the wider codebase's Merkle backend, generalized with a
//! fresh random salt folded into every leaf hash so that an unqueried leaf
//! cannot be recovered from the commitment via a rainbow-table attack —
//! the sole reason for the salt.

use crate::error::MerkleError;
use rand::RngCore;
use sha3::{Digest, Sha3_256};

pub type Root = [u8; 32];
pub type Salt = [u8; 32];

fn hash_leaf(salt: &Salt, data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(salt);
    hasher.update(data);
    finalize(hasher)
}

fn hash_parent(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(left);
    hasher.update(right);
    finalize(hasher)
}

fn finalize(hasher: Sha3_256) -> [u8; 32] {
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// A salted Merkle tree over a fixed set of leaves. Once built it is
/// read-only; its lifetime is scoped to a single FRI round.
#[derive(Clone, Debug)]
pub struct SaltedMerkleTree {
    /// `layers[0]` holds the leaf hashes; `layers.last()` holds the root.
    layers: Vec<Vec<[u8; 32]>>,
    salts: Vec<Salt>,
}

impl SaltedMerkleTree {
    pub fn build(leaves: &[Vec<u8>]) -> Result<Self, MerkleError> {
        let n = leaves.len();
        if n == 0 || !n.is_power_of_two() {
            return Err(MerkleError::NotPowerOfTwo(n));
        }
        let mut rng = rand::thread_rng();
        let salts: Vec<Salt> = (0..n)
            .map(|_| {
                let mut salt = [0u8; 32];
                rng.fill_bytes(&mut salt);
                salt
            })
            .collect();

        let leaf_hashes: Vec<[u8; 32]> = leaves
            .iter()
            .zip(&salts)
            .map(|(data, salt)| hash_leaf(salt, data))
            .collect();

        let mut layers = vec![leaf_hashes];
        while layers.last().unwrap().len() > 1 {
            let prev = layers.last().unwrap();
            let next = prev
                .chunks(2)
                .map(|pair| hash_parent(&pair[0], &pair[1]))
                .collect();
            layers.push(next);
        }

        Ok(Self { layers, salts })
    }

    pub fn root(&self) -> Root {
        self.layers.last().unwrap()[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Returns `(salt, sibling_path)` for leaf `i`, path ordered leaf-to-root.
    pub fn open(&self, i: usize) -> Result<(Salt, Vec<[u8; 32]>), MerkleError> {
        let n = self.leaf_count();
        if i >= n {
            return Err(MerkleError::IndexOutOfRange {
                index: i,
                leaf_count: n,
            });
        }
        let mut path = Vec::with_capacity(self.layers.len() - 1);
        let mut idx = i;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = idx ^ 1;
            path.push(layer[sibling]);
            idx >>= 1;
        }
        Ok((self.salts[i], path))
    }

    /// Stateless verification: recomputes the root from `(i, salt, path,
    /// leaf)` and compares it to `root`.
    pub fn verify(root: &Root, i: usize, salt: &Salt, path: &[[u8; 32]], leaf: &[u8]) -> bool {
        let mut node = hash_leaf(salt, leaf);
        let mut idx = i;
        for sibling in path {
            node = if idx & 1 == 0 {
                hash_parent(&node, sibling)
            } else {
                hash_parent(sibling, &node)
            };
            idx >>= 1;
        }
        &node == root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves_of(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| vec![i as u8; 4]).collect()
    }

    #[test]
    fn open_then_verify_round_trips() {
        let leaves = leaves_of(8);
        let tree = SaltedMerkleTree::build(&leaves).unwrap();
        let root = tree.root();
        for (i, leaf) in leaves.iter().enumerate() {
            let (salt, path) = tree.open(i).unwrap();
            assert!(SaltedMerkleTree::verify(&root, i, &salt, &path, leaf));
        }
    }

    #[test]
    fn tampered_leaf_fails_verification() {
        let leaves = leaves_of(8);
        let tree = SaltedMerkleTree::build(&leaves).unwrap();
        let root = tree.root();
        let (salt, path) = tree.open(3).unwrap();
        assert!(!SaltedMerkleTree::verify(&root, 3, &salt, &path, b"wrong"));
    }

    #[test]
    fn non_power_of_two_is_rejected() {
        assert!(SaltedMerkleTree::build(&leaves_of(5)).is_err());
    }
}
