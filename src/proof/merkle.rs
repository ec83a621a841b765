//! Merkle Tree Commitments
//!
//! Binary Merkle tree using SHA-256 with commutative pair hashing.
//! Single proofs are plain sibling lists; multiproofs use the
//! `(leaves, proof, proof_flags)` shape so a batch of leaves can be
//! checked against one root without positional information.
//!
//! Verification functions are pure and never panic on malformed input:
//! a proof with the wrong shape simply fails to verify.

use sha2::{Sha256, Digest};
use crate::core::hash::Hash256;

/// Domain separator for Merkle tree internal nodes.
const MERKLE_NODE_DOMAIN: &[u8] = b"BATTLESHIP_NODE_V1";

/// Hash two child nodes with domain separation.
///
/// Children are ordered before hashing, so `hash_pair(a, b) == hash_pair(b, a)`.
pub fn hash_pair(a: &Hash256, b: &Hash256) -> Hash256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(MERKLE_NODE_DOMAIN);
    hasher.update(lo);
    hasher.update(hi);
    hasher.finalize().into()
}

/// Verify a single inclusion proof.
pub fn verify_proof(root: &Hash256, leaf: &Hash256, proof: &[Hash256]) -> bool {
    process_proof(leaf, proof) == *root
}

/// Fold a leaf up through its sibling path.
pub fn process_proof(leaf: &Hash256, proof: &[Hash256]) -> Hash256 {
    proof.iter().fold(*leaf, |acc, sibling| hash_pair(&acc, sibling))
}

/// Verify several leaves against one root with a combined proof.
///
/// Leaves must be supplied in the order the proof was generated for.
/// Returns `false` for any malformed proof shape.
pub fn verify_multi_proof(
    root: &Hash256,
    leaves: &[Hash256],
    proof: &[Hash256],
    proof_flags: &[bool],
) -> bool {
    process_multi_proof(leaves, proof, proof_flags)
        .map(|computed| computed == *root)
        .unwrap_or(false)
}

/// Rebuild the root implied by a multiproof.
///
/// Each flag consumes one hash: its first operand always comes from the
/// leaf queue (then from already-computed hashes); its second operand comes
/// from that same queue when the flag is set, otherwise from `proof`.
pub fn process_multi_proof(
    leaves: &[Hash256],
    proof: &[Hash256],
    proof_flags: &[bool],
) -> Option<Hash256> {
    let total_hashes = proof_flags.len();
    if leaves.len() + proof.len() != total_hashes + 1 {
        return None;
    }

    let mut hashes: Vec<Hash256> = Vec::with_capacity(total_hashes);
    let mut leaf_pos = 0;
    let mut hash_pos = 0;
    let mut proof_pos = 0;

    for &flag in proof_flags {
        let a = next_operand(leaves, &hashes, &mut leaf_pos, &mut hash_pos)?;
        let b = if flag {
            next_operand(leaves, &hashes, &mut leaf_pos, &mut hash_pos)?
        } else {
            let p = *proof.get(proof_pos)?;
            proof_pos += 1;
            p
        };
        hashes.push(hash_pair(&a, &b));
    }

    if total_hashes > 0 {
        if proof_pos != proof.len() {
            return None;
        }
        hashes.last().copied()
    } else if let Some(leaf) = leaves.first() {
        Some(*leaf)
    } else {
        proof.first().copied()
    }
}

fn next_operand(
    leaves: &[Hash256],
    hashes: &[Hash256],
    leaf_pos: &mut usize,
    hash_pos: &mut usize,
) -> Option<Hash256> {
    if *leaf_pos < leaves.len() {
        let leaf = leaves[*leaf_pos];
        *leaf_pos += 1;
        Some(leaf)
    } else {
        let hash = *hashes.get(*hash_pos)?;
        *hash_pos += 1;
        Some(hash)
    }
}

/// Multiproof for a set of leaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiProof {
    /// Leaf indices, in the order their hashes must be fed to the verifier.
    pub leaf_indices: Vec<usize>,
    /// Sibling hashes not derivable from the proven leaves.
    pub proof: Vec<Hash256>,
    /// Operand source for each internal hash.
    pub proof_flags: Vec<bool>,
}

/// Complete binary Merkle tree stored as a flat array.
///
/// For `n` leaves the array holds `2n - 1` nodes, root at position 0,
/// leaf `i` at position `2n - 2 - i`.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    nodes: Vec<Hash256>,
    leaf_count: usize,
}

impl MerkleTree {
    /// Build a tree from pre-hashed leaves.
    ///
    /// Returns None for an empty leaf set.
    pub fn from_leaf_hashes(leaves: &[Hash256]) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }

        let len = 2 * leaves.len() - 1;
        let mut nodes = vec![[0u8; 32]; len];
        for (i, leaf) in leaves.iter().enumerate() {
            nodes[len - 1 - i] = *leaf;
        }
        for i in (0..len - leaves.len()).rev() {
            nodes[i] = hash_pair(&nodes[left_child(i)], &nodes[right_child(i)]);
        }

        Some(Self {
            nodes,
            leaf_count: leaves.len(),
        })
    }

    /// Root hash.
    pub fn root(&self) -> Hash256 {
        self.nodes[0]
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Hash stored for leaf `index`.
    pub fn leaf(&self, index: usize) -> Option<Hash256> {
        self.leaf_position(index).map(|pos| self.nodes[pos])
    }

    fn leaf_position(&self, index: usize) -> Option<usize> {
        (index < self.leaf_count).then(|| self.nodes.len() - 1 - index)
    }

    /// Generate an inclusion proof for the leaf at `index`.
    ///
    /// Returns None if index is out of bounds.
    pub fn proof(&self, index: usize) -> Option<Vec<Hash256>> {
        let mut pos = self.leaf_position(index)?;
        let mut siblings = Vec::new();

        while pos > 0 {
            siblings.push(self.nodes[sibling(pos)]);
            pos = parent(pos);
        }

        Some(siblings)
    }

    /// Generate a multiproof covering `indices`.
    ///
    /// Returns None on an out-of-range or duplicate index.
    pub fn multi_proof(&self, indices: &[usize]) -> Option<MultiProof> {
        let mut positions = indices
            .iter()
            .map(|&i| self.leaf_position(i))
            .collect::<Option<Vec<_>>>()?;
        positions.sort_unstable_by(|a, b| b.cmp(a));
        if positions.windows(2).any(|w| w[0] == w[1]) {
            return None;
        }

        let leaf_indices = positions
            .iter()
            .map(|&pos| self.nodes.len() - 1 - pos)
            .collect();

        let mut queue: std::collections::VecDeque<usize> = positions.into();
        let mut proof = Vec::new();
        let mut proof_flags = Vec::new();

        while let Some(&pos) = queue.front() {
            if pos == 0 {
                break;
            }
            queue.pop_front();
            let s = sibling(pos);
            if queue.front() == Some(&s) {
                proof_flags.push(true);
                queue.pop_front();
            } else {
                proof_flags.push(false);
                proof.push(self.nodes[s]);
            }
            queue.push_back(parent(pos));
        }

        if indices.is_empty() {
            proof.push(self.nodes[0]);
        }

        Some(MultiProof {
            leaf_indices,
            proof,
            proof_flags,
        })
    }
}

#[inline]
fn left_child(i: usize) -> usize {
    2 * i + 1
}

#[inline]
fn right_child(i: usize) -> usize {
    2 * i + 2
}

#[inline]
fn parent(i: usize) -> usize {
    (i - 1) / 2
}

#[inline]
fn sibling(i: usize) -> usize {
    if i % 2 == 1 { i + 1 } else { i - 1 }
}
